//! Terrain store and the reveal/break engine.
//!
//! Every cell starts as Stone. A cell only receives its real ore type when it
//! first becomes visible, so luck upgrades apply to everything not yet revealed.

use crate::error::GameError;
use crate::tuning::CaveTuning;
use crate::world::caves::{Cave, CaveGenerator, CaveSet};
use crate::world::grid::TerrainGrid;
use crate::world::ores::OreModel;
use crate::world::tile::{Coord, Direction, Edges, TerrainType, Tile};
use crate::world::{TerrainObserver, MAX_GRID_SIZE, MIN_GRID_SIZE};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Health bar state of a damaged, still standing tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OreDamage {
    pub health: f64,
    pub max_health: f64,
    /// Seconds left before the entry is dropped
    pub timer: f32,
}

impl OreDamage {
    pub fn health_percent(&self) -> f64 {
        if self.max_health > 0.0 {
            (self.health / self.max_health * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Out of bounds or already floor
    Ignored,
    Damaged { health: f64 },
    Destroyed { gold: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Ladder,
}

/// Static prop placed on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameObject {
    pub kind: ObjectKind,
    pub position: Coord,
    pub on_floor: bool,
}

#[derive(Debug, Clone)]
pub struct Terrain {
    grid: TerrainGrid,
    visible: HashSet<Coord>,
    edges: HashMap<Coord, Edges>,
    caves: CaveSet,
    ores: OreModel,
    damaged: HashMap<Coord, OreDamage>,
    objects: HashMap<Coord, GameObject>,
    remaining: usize,
    cleared: bool,
    damage_display_secs: f32,
}

impl Terrain {
    /// Empty terrain; call [`Terrain::initialize`] before use.
    pub fn new(ores: OreModel, damage_display_secs: f32) -> Self {
        Self {
            grid: TerrainGrid::from_fn(0, Tile::floor),
            visible: HashSet::new(),
            edges: HashMap::new(),
            caves: CaveSet::default(),
            ores,
            damaged: HashMap::new(),
            objects: HashMap::new(),
            remaining: 0,
            cleared: false,
            damage_display_secs,
        }
    }

    /// Restore terrain from an existing grid and visibility set.
    /// Edge entries are rebuilt for every floor tile; no caves are pending.
    pub fn from_grid(
        grid: TerrainGrid,
        visible: HashSet<Coord>,
        ores: OreModel,
        damage_display_secs: f32,
    ) -> Self {
        let remaining = grid.solid_count();
        let mut terrain = Self {
            grid,
            visible,
            edges: HashMap::new(),
            caves: CaveSet::default(),
            ores,
            damaged: HashMap::new(),
            objects: HashMap::new(),
            remaining,
            cleared: remaining == 0,
            damage_display_secs,
        };
        let floors: Vec<Coord> = terrain
            .grid
            .tiles()
            .iter()
            .filter(|tile| tile.is_floor())
            .map(|tile| tile.position)
            .collect();
        for coord in floors {
            terrain.refresh_edges(coord);
        }
        terrain
    }

    /// Fresh all-Stone grid, hidden caves, a ladder at the middle and the
    /// middle tile broken open.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        grid_size: usize,
        cave_tuning: &CaveTuning,
        rng: &mut R,
        observer: &mut dyn TerrainObserver,
    ) -> Result<(), GameError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
            return Err(GameError::GridSizeOutOfRange(grid_size));
        }

        let stone_health = self.ores.health(TerrainType::Stone);
        let stone_gold = self.ores.gold(TerrainType::Stone);
        self.grid = TerrainGrid::from_fn(grid_size, |pos| {
            Tile::solid(TerrainType::Stone, stone_health, stone_gold, pos)
        });
        self.visible.clear();
        self.edges.clear();
        self.damaged.clear();
        self.remaining = grid_size * grid_size;
        self.cleared = false;

        let middle = self.grid.middle();
        self.objects.clear();
        self.objects.insert(
            middle,
            GameObject {
                kind: ObjectKind::Ladder,
                position: middle,
                on_floor: true,
            },
        );

        self.caves = CaveGenerator::new(grid_size, cave_tuning).generate_caves(rng);
        info!(
            "Terrain initialized: {}x{} grid, {} hidden caves",
            grid_size,
            grid_size,
            self.caves.len()
        );

        if self.convert(middle, false, rng, observer).is_some() {
            observer.on_tile_broken(&[middle], 0.0);
        }
        self.check_cleared(observer);
        Ok(())
    }

    /// Turn `coord` into Floor and cascade: visibility, cave discovery,
    /// edge map and ore assignment for newly exposed neighbors.
    ///
    /// Returns the gold granted, `None` when the tile was already floor or out
    /// of bounds. Initialization breaks grant nothing and do not expose neighbors.
    pub fn break_tile<R: Rng + ?Sized>(
        &mut self,
        coord: Coord,
        is_initialization: bool,
        rng: &mut R,
        observer: &mut dyn TerrainObserver,
    ) -> Option<f64> {
        let gold = self.convert(coord, is_initialization, rng, observer)?;
        let gold = if is_initialization { 0.0 } else { gold };
        observer.on_tile_broken(&[coord], gold);
        self.check_cleared(observer);
        Some(gold)
    }

    /// Apply primary damage; a tile reaching zero health breaks.
    pub fn damage_tile<R: Rng + ?Sized>(
        &mut self,
        coord: Coord,
        amount: f64,
        rng: &mut R,
        observer: &mut dyn TerrainObserver,
    ) -> DamageOutcome {
        let Some(tile) = self.grid.get_mut(coord) else {
            return DamageOutcome::Ignored;
        };
        if tile.destroyed {
            return DamageOutcome::Ignored;
        }

        tile.health -= amount;
        if tile.health <= 0.0 {
            return match self.break_tile(coord, false, rng, observer) {
                Some(gold) => DamageOutcome::Destroyed { gold },
                None => DamageOutcome::Ignored,
            };
        }

        let (health, max_health) = (tile.health, tile.max_health);
        self.track_damage(coord, health, max_health);
        DamageOutcome::Damaged { health }
    }

    /// Secondary damage (splash, chain links). Never breaks a tile: health
    /// stops at `min(current, 1.0)`.
    pub fn wear_tile(&mut self, coord: Coord, amount: f64) -> bool {
        let Some(tile) = self.grid.get_mut(coord) else {
            return false;
        };
        if tile.destroyed {
            return false;
        }
        let floor = tile.health.min(1.0);
        tile.health = (tile.health - amount).max(floor);
        let (health, max_health) = (tile.health, tile.max_health);
        self.track_damage(coord, health, max_health);
        true
    }

    /// Advance damage display timers and forget broken or expired entries.
    pub fn tick_damage_timers(&mut self, dt: f32) {
        let grid = &self.grid;
        self.damaged.retain(|coord, damage| {
            damage.timer = (damage.timer - dt).max(0.0);
            damage.timer > 0.0 && grid.is_solid(*coord)
        });
    }

    fn track_damage(&mut self, coord: Coord, health: f64, max_health: f64) {
        self.damaged.insert(
            coord,
            OreDamage {
                health,
                max_health,
                timer: self.damage_display_secs,
            },
        );
    }

    fn convert<R: Rng + ?Sized>(
        &mut self,
        coord: Coord,
        is_initialization: bool,
        rng: &mut R,
        observer: &mut dyn TerrainObserver,
    ) -> Option<f64> {
        let tile = self.grid.get_mut(coord)?;
        if tile.destroyed || tile.is_floor() {
            return None;
        }
        let gold = tile.gold_value;
        *tile = Tile::floor(coord);

        self.damaged.remove(&coord);
        self.visible.insert(coord);
        self.remaining = self.remaining.saturating_sub(1);

        for cave in self.caves.take_discovered(coord) {
            self.reveal_cave(cave, rng, observer);
        }

        if !is_initialization {
            let exposed = self.expose_neighbors(coord);
            self.assign_ores(&exposed, rng);
        }
        Some(gold)
    }

    fn reveal_cave<R: Rng + ?Sized>(
        &mut self,
        cave: Cave,
        rng: &mut R,
        observer: &mut dyn TerrainObserver,
    ) {
        info!(
            "Cave {} discovered at {:?}, revealing {} floor tiles",
            cave.id,
            cave.bounds.min,
            cave.floor_coords.len()
        );
        let mut revealed = Vec::with_capacity(cave.floor_coords.len());
        for &coord in &cave.floor_coords {
            if self.convert(coord, true, rng, observer).is_some() {
                revealed.push(coord);
            }
        }
        // the cave lights up as a whole: its walls become visible and get their ore
        let mut walls = Vec::new();
        for &coord in &revealed {
            walls.extend(self.expose_neighbors(coord));
        }
        self.assign_ores(&walls, rng);
        if !revealed.is_empty() {
            observer.on_tile_broken(&revealed, 0.0);
        }
    }

    /// Mark the 8-neighborhood visible, update cardinal edges and return the
    /// solid tiles that just became visible.
    fn expose_neighbors(&mut self, coord: Coord) -> Vec<Coord> {
        for (dir, neighbor) in self.grid.cardinal_neighbors(coord) {
            self.update_edge(coord, dir, neighbor);
        }

        let mut exposed = Vec::new();
        for neighbor in self.grid.neighbors_8(coord) {
            if self.visible.insert(neighbor) && self.grid.is_solid(neighbor) {
                exposed.push(neighbor);
            }
        }
        exposed
    }

    fn refresh_edges(&mut self, coord: Coord) {
        for (dir, neighbor) in self.grid.cardinal_neighbors(coord) {
            self.update_edge(coord, dir, neighbor);
        }
    }

    /// `coord` is floor. A solid neighbor gets an outline on `coord`'s side; a
    /// floor neighbor loses its outline toward `coord`.
    fn update_edge(&mut self, coord: Coord, dir: Direction, neighbor: Coord) {
        if self.grid.is_solid(neighbor) {
            self.edges.entry(coord).or_default().insert(dir);
        } else {
            remove_edge(&mut self.edges, coord, dir);
            remove_edge(&mut self.edges, neighbor, dir.opposite());
        }
    }

    fn assign_ores<R: Rng + ?Sized>(&mut self, coords: &[Coord], rng: &mut R) {
        for &coord in coords {
            let kind = self.ores.choose_ore_type(rng);
            let health = self.ores.health(kind);
            let gold = self.ores.gold(kind);
            if let Some(tile) = self.grid.get_mut(coord) {
                *tile = Tile::solid(kind, health, gold, coord);
            }
        }
        if !coords.is_empty() {
            debug!("Assigned ore types to {} newly visible tiles", coords.len());
        }
    }

    fn check_cleared(&mut self, observer: &mut dyn TerrainObserver) {
        if self.remaining == 0 && !self.cleared {
            self.cleared = true;
            info!("Cave cleared, every tile is broken");
            observer.on_cave_cleared();
        }
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.grid.get(coord)
    }

    pub fn grid_size(&self) -> usize {
        self.grid.size()
    }

    pub fn middle(&self) -> Coord {
        self.grid.middle()
    }

    pub fn is_visible(&self, coord: Coord) -> bool {
        self.visible.contains(&coord)
    }

    pub fn visible_tiles(&self) -> &HashSet<Coord> {
        &self.visible
    }

    /// In-bounds, visible and not floor: something a miner may swing at
    pub fn is_minable(&self, coord: Coord) -> bool {
        self.grid.is_solid(coord) && self.is_visible(coord)
    }

    pub fn edges_at(&self, coord: Coord) -> Edges {
        self.edges.get(&coord).copied().unwrap_or_default()
    }

    pub fn edge_map(&self) -> &HashMap<Coord, Edges> {
        &self.edges
    }

    pub fn pending_caves(&self) -> &CaveSet {
        &self.caves
    }

    pub fn remaining_tiles(&self) -> usize {
        self.remaining
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn damaged_ores(&self) -> &HashMap<Coord, OreDamage> {
        &self.damaged
    }

    /// Remaining health of `coord` in percent; floor and out-of-bounds read 0 %.
    pub fn health_percent(&self, coord: Coord) -> f64 {
        self.grid.get(coord).map_or(0.0, Tile::health_percent)
    }

    pub fn objects(&self) -> &HashMap<Coord, GameObject> {
        &self.objects
    }

    pub fn ore_model(&self) -> &OreModel {
        &self.ores
    }

    pub fn set_luck(&mut self, luck: f64) {
        self.ores.set_luck(luck);
    }

    pub fn set_value_mult(&mut self, value_mult: f64) {
        self.ores.set_value_mult(value_mult);
    }
}

fn remove_edge(edges: &mut HashMap<Coord, Edges>, coord: Coord, dir: Direction) {
    if let Some(set) = edges.get_mut(&coord) {
        set.remove(dir);
        if set.is_empty() {
            edges.remove(&coord);
        }
    }
}
