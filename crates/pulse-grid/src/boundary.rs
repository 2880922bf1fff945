//! Reflection of particles off the grid boundary.
//!
//! Each of the eight boundary regions (four single-cell corners and four edge
//! strips that exclude the corners) carries its own substitution table from
//! incoming to reflected direction. A direction that already points into the
//! grid maps to itself.

use crate::grid::{Cell, Grid};
use crate::object::GridObject;
use pulse_core::{Direction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryRegion {
    NorthWestCorner,
    NorthEastCorner,
    SouthWestCorner,
    SouthEastCorner,
    NorthEdge,
    SouthEdge,
    WestEdge,
    EastEdge,
}

impl BoundaryRegion {
    /// Region containing `pos`, or `None` for interior cells.
    ///
    /// Corners are checked first, in the order NW, NE, SW, SE, which only
    /// matters when a dimension is a single cell wide. Edge strips cover
    /// `1..=extent-2` along their axis and are empty when the extent is below 3.
    pub fn classify(pos: Position, width: i32, height: i32) -> Option<BoundaryRegion> {
        let (x, y) = (pos.x, pos.y);
        let (east, south) = (width - 1, height - 1);
        let interior_x = 1..=width - 2;
        let interior_y = 1..=height - 2;

        let region = match (x, y) {
            (0, 0) => BoundaryRegion::NorthWestCorner,
            _ if x == east && y == 0 => BoundaryRegion::NorthEastCorner,
            _ if x == 0 && y == south => BoundaryRegion::SouthWestCorner,
            _ if x == east && y == south => BoundaryRegion::SouthEastCorner,
            _ if y == 0 && interior_x.contains(&x) => BoundaryRegion::NorthEdge,
            _ if y == south && interior_x.contains(&x) => BoundaryRegion::SouthEdge,
            _ if x == 0 && interior_y.contains(&y) => BoundaryRegion::WestEdge,
            _ if x == east && interior_y.contains(&y) => BoundaryRegion::EastEdge,
            _ => return None,
        };
        Some(region)
    }

    /// Substitution table for this region
    pub fn reflect(&self, direction: Direction) -> Direction {
        use Direction::*;

        match (self, direction) {
            (BoundaryRegion::NorthWestCorner, West) => East,
            (BoundaryRegion::NorthWestCorner, NorthWest) => SouthEast,
            (BoundaryRegion::NorthWestCorner, North) => South,
            // Diagonals that graze one wall leave the grid too; every corner turns them
            (BoundaryRegion::NorthWestCorner, SouthWest) => SouthEast,
            (BoundaryRegion::NorthWestCorner, NorthEast) => SouthEast,

            (BoundaryRegion::NorthEastCorner, East) => West,
            (BoundaryRegion::NorthEastCorner, NorthEast) => SouthWest,
            (BoundaryRegion::NorthEastCorner, North) => South,
            (BoundaryRegion::NorthEastCorner, SouthEast) => SouthWest,
            (BoundaryRegion::NorthEastCorner, NorthWest) => SouthWest,

            (BoundaryRegion::SouthWestCorner, West) => East,
            (BoundaryRegion::SouthWestCorner, SouthWest) => NorthEast,
            (BoundaryRegion::SouthWestCorner, South) => North,
            (BoundaryRegion::SouthWestCorner, NorthWest) => NorthEast,
            (BoundaryRegion::SouthWestCorner, SouthEast) => NorthEast,

            (BoundaryRegion::SouthEastCorner, East) => West,
            (BoundaryRegion::SouthEastCorner, SouthEast) => NorthWest,
            (BoundaryRegion::SouthEastCorner, South) => North,
            (BoundaryRegion::SouthEastCorner, NorthEast) => NorthWest,
            (BoundaryRegion::SouthEastCorner, SouthWest) => NorthWest,

            (BoundaryRegion::NorthEdge, North) => South,
            (BoundaryRegion::NorthEdge, NorthEast) => SouthEast,
            (BoundaryRegion::NorthEdge, NorthWest) => SouthWest,

            (BoundaryRegion::SouthEdge, South) => North,
            (BoundaryRegion::SouthEdge, SouthEast) => NorthEast,
            (BoundaryRegion::SouthEdge, SouthWest) => NorthWest,

            (BoundaryRegion::WestEdge, West) => East,
            (BoundaryRegion::WestEdge, NorthWest) => NorthEast,
            (BoundaryRegion::WestEdge, SouthWest) => SouthEast,

            (BoundaryRegion::EastEdge, East) => West,
            (BoundaryRegion::EastEdge, NorthEast) => NorthWest,
            (BoundaryRegion::EastEdge, SouthEast) => SouthWest,

            (_, unchanged) => unchanged,
        }
    }
}

/// Reflect every particle in one cell. Detectors pass through untouched.
pub fn reflect_cell(pos: Position, cell: &Cell, width: i32, height: i32) -> Cell {
    let Some(region) = BoundaryRegion::classify(pos, width, height) else {
        return cell.clone();
    };

    cell.iter()
        .map(|object| match object {
            GridObject::Particle(p) => {
                let mut reflected = *p;
                reflected.direction = region.reflect(p.direction);
                GridObject::Particle(reflected)
            }
            GridObject::Detector(d) => GridObject::Detector(*d),
        })
        .collect()
}

/// First pass of a tick: redirect particles sitting on the boundary.
pub fn reflect_boundaries(grid: &Grid) -> Grid {
    let (width, height) = (grid.width, grid.height);
    grid.map_cells(|pos, cell| reflect_cell(pos, cell, width, height))
}
