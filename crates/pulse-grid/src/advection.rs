//! Movement of particles between cells.
//!
//! The next grid is built from the previous one cell by cell: a target cell
//! gathers its own detectors plus every particle in a neighbouring cell whose
//! heading points at it. Nothing is moved in place.

use crate::grid::{Cell, Grid};
use crate::object::{GridObject, Particle};
use pulse_core::{Direction, Position};

/// `(dx, dy, direction)`: a particle at `target + (dx, dy)` heading `direction`
/// arrives at `target`. One entry per direction, so every particle matches
/// exactly one neighbour.
pub const ARRIVALS: [(i32, i32, Direction); 8] = [
    (0, 1, Direction::North),
    (-1, 1, Direction::NorthEast),
    (-1, 0, Direction::East),
    (-1, -1, Direction::SouthEast),
    (0, -1, Direction::South),
    (1, -1, Direction::SouthWest),
    (1, 0, Direction::West),
    (1, 1, Direction::NorthWest),
];

/// Cell a particle at `pos` occupies after advection.
///
/// A particle whose step would leave the grid stays where it is. After the
/// boundary pass this only happens on grids a single cell wide, or when a
/// collision re-randomised a boundary particle's heading.
pub fn destination(pos: Position, particle: &Particle, width: i32, height: i32) -> Position {
    let next = pos.step(particle.direction);
    if next.in_bounds(width, height) {
        next
    } else {
        pos
    }
}

fn stranded(pos: Position, particle: &Particle, width: i32, height: i32) -> bool {
    !pos.step(particle.direction).in_bounds(width, height)
}

/// Next contents of the cell at `target`
pub fn advect_cell(grid: &Grid, target: Position) -> Cell {
    let (width, height) = (grid.width, grid.height);
    let here = grid.cell(target);

    let mut next: Cell = here
        .iter()
        .filter(|object| match object {
            GridObject::Detector(_) => true,
            GridObject::Particle(p) => stranded(target, p, width, height),
        })
        .copied()
        .collect();

    for (dx, dy, direction) in ARRIVALS {
        let source = target.add(dx, dy);
        next.extend(
            grid.cell(source)
                .iter()
                .filter_map(GridObject::as_particle)
                .filter(|p| p.direction == direction)
                .map(|p| GridObject::Particle(*p)),
        );
    }

    next
}

/// Final pass of a tick: rebuild every cell from the previous grid.
pub fn advect(grid: &Grid) -> Grid {
    grid.map_cells(|pos, _| advect_cell(grid, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Detector;
    use std::collections::HashMap;

    #[test]
    fn test_arrival_table_matches_deltas() {
        let mut seen = std::collections::HashSet::new();
        for (dx, dy, direction) in ARRIVALS {
            assert_eq!(direction.to_delta(), (-dx, -dy));
            assert!(seen.insert(direction));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_particle_moves_one_step() {
        for direction in Direction::all() {
            let mut grid = Grid::new(5, 5).unwrap();
            let start = Position::new(2, 2);
            grid.insert(start, Particle::new(0, direction, 100)).unwrap();

            let next = advect(&grid);
            let positions: Vec<Position> = next.particles().map(|(pos, _)| pos).collect();
            assert_eq!(positions, vec![start.step(direction)]);
        }
    }

    #[test]
    fn test_detectors_stay_put() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.insert(Position::new(1, 1), Detector::new(0)).unwrap();
        grid.insert(Position::new(1, 1), Detector::new(1)).unwrap();
        grid.insert(Position::new(1, 1), Particle::new(0, Direction::East, 10))
            .unwrap();

        let next = advect(&grid);
        let detectors: Vec<(Position, u32)> = next.detectors().map(|(pos, d)| (pos, d.id)).collect();
        assert_eq!(
            detectors,
            vec![(Position::new(1, 1), 0), (Position::new(1, 1), 1)]
        );
        let (pos, _) = next.particles().next().unwrap();
        assert_eq!(pos, Position::new(2, 1));
    }

    #[test]
    fn test_converging_particles_share_a_cell() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.insert(Position::new(0, 1), Particle::new(0, Direction::East, 10))
            .unwrap();
        grid.insert(Position::new(2, 1), Particle::new(1, Direction::West, 10))
            .unwrap();
        grid.insert(Position::new(1, 0), Particle::new(2, Direction::South, 10))
            .unwrap();

        let next = advect(&grid);
        assert_eq!(next.cell(Position::new(1, 1)).len(), 3);
    }

    #[test]
    fn test_outward_particle_is_not_lost() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.insert(Position::new(0, 1), Particle::new(0, Direction::West, 10))
            .unwrap();

        let next = advect(&grid);
        let (pos, p) = next.particles().next().unwrap();
        assert_eq!(pos, Position::new(0, 1));
        assert_eq!(p.slice, 0);
    }

    #[test]
    fn test_every_particle_lands_at_its_destination() {
        let mut grid = Grid::new(4, 3).unwrap();
        let mut slice = 0;
        let mut expected = HashMap::new();
        for pos in grid.positions().collect::<Vec<_>>() {
            for direction in Direction::all() {
                let particle = Particle::new(slice, direction, 1);
                expected.insert(slice, destination(pos, &particle, 4, 3));
                grid.insert(pos, particle).unwrap();
                slice += 1;
            }
        }

        let next = advect(&grid);
        assert_eq!(next.particle_count(), expected.len());
        for (pos, p) in next.particles() {
            assert_eq!(expected[&p.slice], pos);
        }
    }
}
