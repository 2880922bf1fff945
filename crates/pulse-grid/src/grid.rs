//! 2D grid of cells for the world.

use crate::object::{Detector, GridObject, Particle};
use pulse_core::{Direction, Error, GridConfig, Position, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Contents of a single cell. Order is insertion order and stays stable within a tick.
pub type Cell = Vec<GridObject>;

/// A bounded (non-wrapping) 2D grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty grid
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let size = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            cells: vec![Vec::new(); size],
        })
    }

    /// Build a grid of the same dimensions by transforming every cell
    pub fn map_cells<F>(&self, mut f: F) -> Grid
    where
        F: FnMut(Position, &Cell) -> Cell,
    {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| f(self.index_to_pos(i), cell))
            .collect();
        Grid {
            width: self.width,
            height: self.height,
            cells,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Cell at position, `None` outside the grid
    pub fn get(&self, pos: Position) -> Option<&Cell> {
        if self.contains(pos) {
            Some(&self.cells[self.pos_to_index(pos)])
        } else {
            None
        }
    }

    /// Cell at position; outside the grid reads as an empty cell
    pub fn cell(&self, pos: Position) -> &[GridObject] {
        self.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Place an object by hand
    pub fn insert(&mut self, pos: Position, object: impl Into<GridObject>) -> Result<()> {
        if !self.contains(pos) {
            return Err(Error::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            });
        }
        let index = self.pos_to_index(pos);
        self.cells[index].push(object.into());
        Ok(())
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all positions, row-major
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all cells with positions, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }

    pub fn particles(&self) -> impl Iterator<Item = (Position, &Particle)> + '_ {
        self.iter().flat_map(|(pos, cell)| {
            cell.iter()
                .filter_map(GridObject::as_particle)
                .map(move |p| (pos, p))
        })
    }

    pub fn detectors(&self) -> impl Iterator<Item = (Position, &Detector)> + '_ {
        self.iter().flat_map(|(pos, cell)| {
            cell.iter()
                .filter_map(GridObject::as_detector)
                .map(move |d| (pos, d))
        })
    }

    pub fn particle_count(&self) -> usize {
        self.particles().count()
    }

    pub fn detector_count(&self) -> usize {
        self.detectors().count()
    }

    pub fn total_energy(&self) -> u64 {
        self.particles().map(|(_, p)| p.energy as u64).sum()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}

/// Randomly populate a grid from configuration.
///
/// Particles get slices `0..particle_count` and a random heading; detectors get
/// ids `0..detector_count`. Objects are dealt onto a shuffled list of every
/// coordinate; when there are more objects than cells the deal wraps around and
/// cells are shared.
pub fn create_grid<R: Rng + ?Sized>(config: &GridConfig, rng: &mut R) -> Result<Grid> {
    config.validate()?;
    let mut grid = Grid::new(config.width, config.height)?;

    let particles = (0..config.particle_count).map(|slice| {
        GridObject::Particle(Particle::new(
            slice,
            Direction::random(rng),
            config.initial_energy,
        ))
    });
    let mut objects: Vec<GridObject> = particles.collect();
    objects.extend((0..config.detector_count).map(|id| GridObject::Detector(Detector::new(id))));

    let mut coordinates: Vec<Position> = grid.positions().collect();
    coordinates.shuffle(rng);

    for (k, object) in objects.into_iter().enumerate() {
        let pos = coordinates[k % coordinates.len()];
        grid.insert(pos, object)?;
    }

    debug!(
        width = config.width,
        height = config.height,
        particles = config.particle_count,
        detectors = config.detector_count,
        "Created grid"
    );

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 8).unwrap();
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 8);
        assert_eq!(grid.cells.len(), 80);
        assert_eq!(grid.occupied_cells(), 0);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(Grid::new(0, 5), Err(Error::InvalidConfig(_))));
        assert!(matches!(Grid::new(5, -2), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_out_of_bounds_reads_empty() {
        let grid = Grid::new(4, 4).unwrap();
        assert!(grid.get(Position::new(-1, 0)).is_none());
        assert!(grid.get(Position::new(4, 0)).is_none());
        assert!(grid.cell(Position::new(0, 4)).is_empty());
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let mut grid = Grid::new(4, 4).unwrap();
        let err = grid.insert(Position::new(4, 1), Detector::new(0)).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { x: 4, y: 1, .. }));
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = Grid::new(7, 3).unwrap();
        for (i, pos) in grid.positions().enumerate() {
            assert_eq!(grid.pos_to_index(pos), i);
        }
    }

    #[test]
    fn test_create_grid_places_every_object_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let config = GridConfig {
            width: 6,
            height: 5,
            particle_count: 10,
            detector_count: 4,
            initial_energy: 100,
        };

        let grid = create_grid(&config, &mut rng).unwrap();
        assert_eq!(grid.particle_count(), 10);
        assert_eq!(grid.detector_count(), 4);
        // Fewer objects than cells: one per cell
        assert_eq!(grid.occupied_cells(), 14);

        let slices: HashSet<u32> = grid.particles().map(|(_, p)| p.slice).collect();
        assert_eq!(slices, (0..10).collect());
        let ids: HashSet<u32> = grid.detectors().map(|(_, d)| d.id).collect();
        assert_eq!(ids, (0..4).collect());

        assert!(grid.particles().all(|(_, p)| p.energy == 100));
        assert_eq!(grid.total_energy(), 1000);
    }

    #[test]
    fn test_create_grid_overfull_shares_cells() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = GridConfig {
            width: 2,
            height: 2,
            particle_count: 7,
            detector_count: 2,
            initial_energy: 100,
        };

        let grid = create_grid(&config, &mut rng).unwrap();
        assert_eq!(grid.particle_count() + grid.detector_count(), 9);
        assert_eq!(grid.occupied_cells(), 4);
    }

    #[test]
    fn test_create_grid_is_deterministic_per_seed() {
        let config = GridConfig::default();
        let a = create_grid(&config, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = create_grid(&config, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_create_grid_rejects_bad_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = GridConfig {
            width: 0,
            ..Default::default()
        };
        assert!(create_grid(&config, &mut rng).is_err());
    }
}
