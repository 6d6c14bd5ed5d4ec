mod caves;
mod grid;
mod ores;
mod terrain;
mod tile;

pub use caves::{cave_count, generate_cave, Cave, CaveGenerator, CaveRect, CaveSet, CaveSize};
pub use grid::TerrainGrid;
pub use ores::{OreChanceTable, OreModel};
pub use terrain::{DamageOutcome, GameObject, ObjectKind, OreDamage, Terrain};
pub use tile::{Coord, Direction, Edges, TerrainType, Tile};

pub const MIN_GRID_SIZE: usize = 10;
pub const MAX_GRID_SIZE: usize = 100;

/// Callbacks from the terrain core to whoever draws it.
///
/// Invoked synchronously, in the order the core mutates the grid.
pub trait TerrainObserver {
    /// Tiles turned into floor. A whole cave arrives as one batch.
    fn on_tile_broken(&mut self, coords: &[Coord], gold_granted: f64);

    /// Remaining-tile counter reached zero.
    fn on_cave_cleared(&mut self);
}

/// Observer that ignores everything
impl TerrainObserver for () {
    fn on_tile_broken(&mut self, _coords: &[Coord], _gold_granted: f64) {}

    fn on_cave_cleared(&mut self) {}
}

/// Observer that keeps every callback, in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingObserver {
    pub broken: Vec<(Vec<Coord>, f64)>,
    pub caves_cleared: u32,
}

impl TerrainObserver for RecordingObserver {
    fn on_tile_broken(&mut self, coords: &[Coord], gold_granted: f64) {
        self.broken.push((coords.to_vec(), gold_granted));
    }

    fn on_cave_cleared(&mut self) {
        self.caves_cleared += 1;
    }
}
