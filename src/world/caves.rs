//! Hidden cave pockets: placement search plus two-pass cellular automata.
//!
//! Caves are generated once per terrain and stay hidden until a broken tile
//! touches one of their floor cells.

use crate::tuning::CaveTuning;
use crate::world::tile::{Coord, TerrainType};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

/// Discrete cave footprints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaveSize {
    Medium,
    Large,
}

impl CaveSize {
    pub fn side(self, tuning: &CaveTuning) -> usize {
        match self {
            CaveSize::Medium => tuning.medium_size,
            CaveSize::Large => tuning.large_size,
        }
    }
}

/// Inclusive tile rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaveRect {
    pub min: Coord,
    pub max: Coord,
}

impl CaveRect {
    pub fn from_origin(origin: Coord, width: usize, height: usize) -> Self {
        Self {
            min: origin,
            max: (origin.0 + width - 1, origin.1 + height - 1),
        }
    }

    pub fn contains(&self, (x, y): Coord) -> bool {
        (self.min.0..=self.max.0).contains(&x) && (self.min.1..=self.max.1).contains(&y)
    }

    pub fn intersects(&self, other: &CaveRect) -> bool {
        self.min.0 <= other.max.0
            && other.min.0 <= self.max.0
            && self.min.1 <= other.max.1
            && other.min.1 <= self.max.1
    }

    /// Grown by `buffer` on every side (saturating at the grid origin).
    pub fn expanded(&self, buffer: usize) -> Self {
        Self {
            min: (self.min.0.saturating_sub(buffer), self.min.1.saturating_sub(buffer)),
            max: (self.max.0 + buffer, self.max.1 + buffer),
        }
    }
}

/// One generated cave pocket.
#[derive(Debug, Clone, PartialEq)]
pub struct Cave {
    pub id: u32,
    /// Global coordinates of every floor cell, row-major
    pub floor_coords: Vec<Coord>,
    /// `local_grid[y][x]`, relative to `bounds.min`
    pub local_grid: Vec<Vec<TerrainType>>,
    pub bounds: CaveRect,
    pub rendered: bool,
}

impl Cave {
    /// Is the global `coord` a floor cell of this cave?
    pub fn is_floor_at(&self, coord: Coord) -> bool {
        if !self.bounds.contains(coord) {
            return false;
        }
        let (lx, ly) = (coord.0 - self.bounds.min.0, coord.1 - self.bounds.min.1);
        self.local_grid
            .get(ly)
            .and_then(|row| row.get(lx))
            .is_some_and(|kind| kind.is_floor())
    }
}

/// Caves still waiting to be discovered, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaveSet {
    caves: BTreeMap<u32, Cave>,
}

impl CaveSet {
    pub fn len(&self) -> usize {
        self.caves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cave> {
        self.caves.values()
    }

    pub fn insert(&mut self, cave: Cave) {
        self.caves.insert(cave.id, cave);
    }

    /// Remove and return every hidden cave that has a floor cell cardinally
    /// adjacent to `coord`. Returned caves are marked rendered.
    pub fn take_discovered(&mut self, coord: Coord) -> Vec<Cave> {
        let (x, y) = coord;
        let neighbors = [
            x.checked_add(1).map(|nx| (nx, y)),
            x.checked_sub(1).map(|nx| (nx, y)),
            y.checked_add(1).map(|ny| (x, ny)),
            y.checked_sub(1).map(|ny| (x, ny)),
        ];

        let found: Vec<u32> = self
            .caves
            .values()
            .filter(|cave| !cave.rendered)
            .filter(|cave| neighbors.iter().flatten().any(|n| cave.is_floor_at(*n)))
            .map(|cave| cave.id)
            .collect();

        found
            .into_iter()
            .filter_map(|id| self.caves.remove(&id))
            .map(|mut cave| {
                cave.rendered = true;
                cave
            })
            .collect()
    }
}

/// Number of caves to attempt for a grid.
pub fn cave_count(grid_size: usize) -> usize {
    match grid_size {
        0..=19 => 0,
        20..=50 => (grid_size - 10) / 2,
        _ => grid_size / 5,
    }
}

/// Places and carves caves for one terrain.
pub struct CaveGenerator<'a> {
    grid_size: usize,
    tuning: &'a CaveTuning,
}

impl<'a> CaveGenerator<'a> {
    pub fn new(grid_size: usize, tuning: &'a CaveTuning) -> Self {
        Self { grid_size, tuning }
    }

    /// Protected spawn zone around the grid middle
    pub fn middle_zone(&self) -> CaveRect {
        let middle = self.grid_size / 2;
        let buffer = self.tuning.middle_buffer;
        CaveRect {
            min: (middle.saturating_sub(buffer), middle.saturating_sub(buffer)),
            max: (middle + buffer, middle + buffer),
        }
    }

    /// Best-effort packing: caves that find no valid spot are skipped.
    pub fn generate_caves<R: Rng + ?Sized>(&self, rng: &mut R) -> CaveSet {
        let mut set = CaveSet::default();
        let mut next_id = 0u32;

        for _ in 0..cave_count(self.grid_size) {
            let mut size = self.pick_size(rng);
            let mut origin = self.find_valid_location(size.side(self.tuning), &set, rng);
            if origin.is_none() && size == CaveSize::Large {
                size = CaveSize::Medium;
                origin = self.find_valid_location(size.side(self.tuning), &set, rng);
            }

            let Some(origin) = origin else {
                debug!(
                    "No valid cave location after {} attempts, skipping",
                    self.tuning.placement_attempts
                );
                continue;
            };

            next_id += 1;
            let side = size.side(self.tuning);
            let cave = generate_cave(next_id, origin, side, side, self.tuning.wall_probability, rng);
            set.insert(cave);
        }

        set
    }

    fn pick_size<R: Rng + ?Sized>(&self, rng: &mut R) -> CaveSize {
        let total = self.tuning.medium_weight + self.tuning.large_weight;
        if total == 0 {
            return CaveSize::Medium;
        }
        if rng.gen_range(0..total) < self.tuning.large_weight {
            CaveSize::Large
        } else {
            CaveSize::Medium
        }
    }

    fn find_valid_location<R: Rng + ?Sized>(
        &self,
        side: usize,
        placed: &CaveSet,
        rng: &mut R,
    ) -> Option<Coord> {
        if side == 0 || side > self.grid_size {
            return None;
        }
        let max_origin = self.grid_size - side;
        for _ in 0..self.tuning.placement_attempts {
            let origin = (rng.gen_range(0..=max_origin), rng.gen_range(0..=max_origin));
            if self.is_location_valid(CaveRect::from_origin(origin, side, side), placed) {
                return Some(origin);
            }
        }
        None
    }

    pub fn is_location_valid(&self, candidate: CaveRect, placed: &CaveSet) -> bool {
        if candidate.intersects(&self.middle_zone()) {
            return false;
        }
        placed
            .iter()
            .all(|cave| !candidate.intersects(&cave.bounds.expanded(self.tuning.cave_buffer)))
    }
}

/// Carve one cave with two smoothing passes.
///
/// 1. Seed cells as Stone with `wall_probability`.
/// 2. A cell becomes Stone when its 8-neighborhood holds at least 4 Stone
///    (5 when it started as Floor); out-of-bounds neighbors do not count.
/// 3. Scanning row by row, Floor cells with fewer than 2 cardinal Floor
///    neighbors are turned back into Stone. The scan sees its own earlier
///    flips, so a pruned cell no longer supports the cells after it.
pub fn generate_cave<R: Rng + ?Sized>(
    id: u32,
    origin: Coord,
    width: usize,
    height: usize,
    wall_probability: f64,
    rng: &mut R,
) -> Cave {
    let seeded: WallGrid = (0..height)
        .map(|_| (0..width).map(|_| rng.gen_bool(wall_probability)).collect())
        .collect();

    let mut pruned = smooth(&seeded);
    prune_strands(&mut pruned);

    let mut floor_coords = Vec::new();
    let local_grid = pruned
        .iter()
        .enumerate()
        .map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(|(x, &wall)| {
                    if wall {
                        TerrainType::Stone
                    } else {
                        floor_coords.push((origin.0 + x, origin.1 + y));
                        TerrainType::Floor
                    }
                })
                .collect()
        })
        .collect();

    Cave {
        id,
        floor_coords,
        local_grid,
        bounds: CaveRect::from_origin(origin, width, height),
        rendered: false,
    }
}

/// `true` marks Stone, indexed `[y][x]`
type WallGrid = Vec<Vec<bool>>;

fn wall_at(grid: &WallGrid, x: isize, y: isize) -> Option<bool> {
    let row = grid.get(usize::try_from(y).ok()?)?;
    row.get(usize::try_from(x).ok()?).copied()
}

fn smooth(seeded: &WallGrid) -> WallGrid {
    let mut smoothed = seeded.clone();
    for (y, row) in seeded.iter().enumerate() {
        for (x, &wall) in row.iter().enumerate() {
            let (ix, iy) = (x as isize, y as isize);
            let walls = (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
                .filter(|&(dx, dy)| !(dx == 0 && dy == 0))
                .filter(|&(dx, dy)| wall_at(seeded, ix + dx, iy + dy) == Some(true))
                .count();
            let threshold = if wall { 4 } else { 5 };
            smoothed[y][x] = walls >= threshold;
        }
    }
    smoothed
}

fn prune_strands(grid: &mut WallGrid) {
    let height = grid.len();
    for y in 0..height {
        let width = grid[y].len();
        for x in 0..width {
            if grid[y][x] {
                continue;
            }
            let (ix, iy) = (x as isize, y as isize);
            let floors = [(0, -1), (0, 1), (-1, 0), (1, 0)]
                .into_iter()
                .filter(|&(dx, dy)| wall_at(grid, ix + dx, iy + dy) == Some(false))
                .count();
            if floors < 2 {
                grid[y][x] = true;
            }
        }
    }
}
