use crate::miners::pathing;
use crate::progression::ProgressionState;
use crate::tuning::MinerTuning;
use crate::world::{Coord, DamageOutcome, Terrain, TerrainObserver};
use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::trace;

/// Pixels per tile, used for pixel positions and move speed
pub const TILE_SIZE: f32 = 32.0;

/// Shortest pickaxe cooldown reachable through upgrades (seconds)
pub const MIN_MINE_COOLDOWN: f32 = 0.05;

/// Miner variants, differing only in what a pickaxe swing does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinerKind {
    Normal,
    /// Passive: splash onto the target's orthogonal neighbors
    AreaDamage,
    /// Passive: damage a chain of connected rock starting at the target
    ChainDamage,
}

/// Why the miner is walking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIntent {
    /// Following a path; search again on arrival
    GridMoving,
    /// Stepping up to a block; start mining on arrival
    MiningBlock,
}

/// Miner behavior state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinerState {
    /// Looking for the next block
    Searching,
    Moving(MoveIntent),
    /// Swinging at `target`
    Mining,
}

/// A point the miner walks to, with the tile it stands on when reached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub pixel: Vec2,
    pub tile: Coord,
}

#[derive(Debug, Clone)]
pub struct Miner {
    pub id: u32,
    pub kind: MinerKind,
    pub grid_pos: Coord,
    pub pixel_pos: Vec2,
    pub state: MinerState,
    pub path: VecDeque<Waypoint>,
    pub target: Option<Coord>,
    pub damage: f64,
    /// Tiles per second
    pub move_speed: f32,
    /// Seconds between swings
    pub mine_cooldown: f32,
    pub cooldown_timer: f32,
    pub passive_chance: f64,
    pub area_damage_fraction: f64,
    pub chain_damage_fraction: f64,
    pub chain_length: usize,
}

/// Pixel position of a tile's centre
pub fn tile_center((x, y): Coord) -> Vec2 {
    Vec2::new((x as f32 + 0.5) * TILE_SIZE, (y as f32 + 0.5) * TILE_SIZE)
}

impl Miner {
    pub fn new(id: u32, kind: MinerKind, tuning: &MinerTuning) -> Self {
        Self {
            id,
            kind,
            grid_pos: (0, 0),
            pixel_pos: tile_center((0, 0)),
            state: MinerState::Searching,
            path: VecDeque::new(),
            target: None,
            damage: tuning.damage,
            move_speed: tuning.move_speed,
            mine_cooldown: tuning.mine_cooldown,
            cooldown_timer: 0.0,
            passive_chance: tuning.passive_chance,
            area_damage_fraction: tuning.area_damage_fraction,
            chain_damage_fraction: tuning.chain_damage_fraction,
            chain_length: tuning.chain_length,
        }
    }

    /// Place the miner on `middle` and forget any path, target or state.
    pub fn spawn(&mut self, middle: Coord) {
        self.grid_pos = middle;
        self.pixel_pos = tile_center(middle);
        self.state = MinerState::Searching;
        self.path.clear();
        self.target = None;
        self.cooldown_timer = 0.0;
    }

    /// Advance the state machine by `dt` seconds. Returns the gold earned by
    /// tiles this miner broke.
    pub fn decision_make<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        terrain: &mut Terrain,
        progression: &ProgressionState,
        rng: &mut R,
        observer: &mut dyn TerrainObserver,
    ) -> f64 {
        let boost = progression.speed_boost();
        match self.state {
            MinerState::Searching => {
                self.search(terrain, rng);
                0.0
            }
            MinerState::Moving(intent) => {
                self.advance(dt, boost, intent);
                0.0
            }
            MinerState::Mining => self.mine(dt, boost, terrain, rng, observer),
        }
    }

    fn search<R: Rng + ?Sized>(&mut self, terrain: &Terrain, rng: &mut R) {
        let adjacent: SmallVec<[_; 4]> = terrain
            .grid()
            .cardinal_neighbors(self.grid_pos)
            .into_iter()
            .filter(|(_, coord)| terrain.is_minable(*coord))
            .collect();

        if let Some(&(dir, coord)) = adjacent.choose(rng) {
            let (dx, dy) = dir.offset();
            let nudge = Vec2::new(dx as f32, dy as f32) * (TILE_SIZE / 4.0);
            self.path.clear();
            self.path.push_back(Waypoint {
                pixel: tile_center(self.grid_pos) + nudge,
                tile: self.grid_pos,
            });
            self.target = Some(coord);
            self.state = MinerState::Moving(MoveIntent::MiningBlock);
            return;
        }

        // Nothing adjacent: walk toward the nearest visible rock
        let Some(mut steps) = pathing::path_to_nearest_minable(terrain, self.grid_pos) else {
            return;
        };
        let target = steps.pop();
        self.path = steps
            .into_iter()
            .map(|tile| Waypoint {
                pixel: tile_center(tile),
                tile,
            })
            .collect();
        self.target = target;
        self.state = MinerState::Moving(MoveIntent::GridMoving);
    }

    fn advance(&mut self, dt: f32, boost: f32, intent: MoveIntent) {
        if let Some(waypoint) = self.path.front().copied() {
            let step = self.effective_move_speed(boost) * TILE_SIZE * dt;
            let offset = waypoint.pixel - self.pixel_pos;
            if offset.length() <= step {
                self.pixel_pos = waypoint.pixel;
                self.grid_pos = waypoint.tile;
                self.path.pop_front();
            } else {
                self.pixel_pos += offset.normalize_or_zero() * step;
            }
        }

        if self.path.is_empty() {
            self.state = match intent {
                MoveIntent::MiningBlock => MinerState::Mining,
                MoveIntent::GridMoving => MinerState::Searching,
            };
        }
    }

    fn mine<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        boost: f32,
        terrain: &mut Terrain,
        rng: &mut R,
        observer: &mut dyn TerrainObserver,
    ) -> f64 {
        let Some(target) = self.target.filter(|coord| terrain.grid().is_solid(*coord)) else {
            // someone else broke it first
            self.target = None;
            self.state = MinerState::Searching;
            return 0.0;
        };

        self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);
        if self.cooldown_timer > 0.0 {
            return 0.0;
        }
        self.cooldown_timer = self.effective_cooldown(boost);

        self.apply_passive(target, terrain, rng);

        match terrain.damage_tile(target, self.damage, rng, observer) {
            DamageOutcome::Destroyed { gold } => {
                trace!("Miner {} broke {:?} for {} gold", self.id, target, gold);
                self.path.clear();
                self.path.push_back(Waypoint {
                    pixel: tile_center(target),
                    tile: target,
                });
                self.target = None;
                self.state = MinerState::Moving(MoveIntent::GridMoving);
                gold
            }
            DamageOutcome::Damaged { .. } => 0.0,
            DamageOutcome::Ignored => {
                self.target = None;
                self.state = MinerState::Searching;
                0.0
            }
        }
    }

    /// Secondary damage for the variants. Never breaks anything.
    fn apply_passive<R: Rng + ?Sized>(&self, target: Coord, terrain: &mut Terrain, rng: &mut R) {
        if self.kind == MinerKind::Normal || !rng.gen_bool(self.passive_chance.clamp(0.0, 1.0)) {
            return;
        }

        match self.kind {
            MinerKind::Normal => {}
            MinerKind::AreaDamage => {
                let splash = self.damage * self.area_damage_fraction;
                let around: SmallVec<[Coord; 4]> = terrain
                    .grid()
                    .cardinal_neighbors(target)
                    .into_iter()
                    .map(|(_, coord)| coord)
                    .filter(|coord| terrain.is_minable(*coord))
                    .collect();
                for coord in around {
                    terrain.wear_tile(coord, splash);
                }
            }
            MinerKind::ChainDamage => {
                let link = self.damage * self.chain_damage_fraction;
                let chain = pathing::longest_chain(terrain, target, self.chain_length, rng);
                for &coord in chain.iter().skip(1) {
                    terrain.wear_tile(coord, link);
                }
            }
        }
    }

    pub fn effective_cooldown(&self, boost: f32) -> f32 {
        self.mine_cooldown / boost.max(1.0)
    }

    pub fn effective_move_speed(&self, boost: f32) -> f32 {
        self.move_speed * boost.max(1.0)
    }

    pub fn upgrade_speed(&mut self, amount: f32) {
        self.move_speed = (self.move_speed + amount).max(0.0);
    }

    pub fn upgrade_pickaxe_strength(&mut self, multiplier: f64) {
        self.damage = (self.damage * multiplier).max(0.0);
    }

    pub fn upgrade_pickaxe_speed(&mut self, amount: f32) {
        self.mine_cooldown = (self.mine_cooldown - amount).max(MIN_MINE_COOLDOWN);
    }
}
