//! The mining session: terrain, miners and progression behind one facade,
//! advanced one tick at a time.

use crate::error::GameError;
use crate::miners::{CameraCommand, Miner, MinerCamera, MinerKind};
use crate::progression::ProgressionState;
use crate::tuning::GameTuning;
use crate::world::{Coord, OreModel, Terrain, TerrainObserver};
use bevy::prelude::Resource;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Session random source. Every roll in the game goes through it.
pub type GameRng = StdRng;

/// Ticks between two summary log lines
pub const SUMMARY_INTERVAL: u64 = 600;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub ticks: u64,
    pub tiles_broken: u64,
    pub caves_cleared: u32,
    pub gold_earned: f64,
}

/// Counts what passes through before handing it on.
struct StatsObserver<'a> {
    inner: &'a mut dyn TerrainObserver,
    stats: &'a mut SessionStats,
}

impl TerrainObserver for StatsObserver<'_> {
    fn on_tile_broken(&mut self, coords: &[Coord], gold_granted: f64) {
        self.stats.tiles_broken += coords.len() as u64;
        self.inner.on_tile_broken(coords, gold_granted);
    }

    fn on_cave_cleared(&mut self) {
        self.stats.caves_cleared += 1;
        self.inner.on_cave_cleared();
    }
}

#[derive(Resource)]
pub struct MiningSession {
    tuning: GameTuning,
    terrain: Terrain,
    /// Ascending id order, which is also the tick order
    miners: Vec<Miner>,
    progression: ProgressionState,
    camera: MinerCamera,
    rng: GameRng,
    stats: SessionStats,
    grid_size: usize,
}

impl MiningSession {
    /// Validated tuning, miners created but not yet placed. Call
    /// [`MiningSession::initialize_terrain`] before ticking.
    pub fn new(tuning: GameTuning) -> Result<Self, GameError> {
        tuning.validate()?;
        let rng = match tuning.seed {
            Some(seed) => GameRng::seed_from_u64(seed),
            None => GameRng::from_entropy(),
        };

        let kinds = std::iter::repeat(MinerKind::Normal)
            .take(tuning.miners.normal_count)
            .chain(std::iter::repeat(MinerKind::AreaDamage).take(tuning.miners.area_count))
            .chain(std::iter::repeat(MinerKind::ChainDamage).take(tuning.miners.chain_count));
        let miners = (1..)
            .zip(kinds)
            .map(|(id, kind)| Miner::new(id, kind, &tuning.miners))
            .collect();

        Ok(Self {
            terrain: Terrain::new(
                OreModel::new(&tuning.terrain),
                tuning.terrain.damage_display_secs,
            ),
            miners,
            progression: ProgressionState::new(tuning.boost.clone()),
            camera: MinerCamera::default(),
            rng,
            stats: SessionStats::default(),
            grid_size: tuning.terrain.grid_size,
            tuning,
        })
    }

    /// Build a fresh cave of `grid_size` and respawn every miner at its middle.
    pub fn initialize_terrain(
        &mut self,
        grid_size: usize,
        observer: &mut dyn TerrainObserver,
    ) -> Result<(), GameError> {
        let mut observer = StatsObserver {
            inner: observer,
            stats: &mut self.stats,
        };
        self.terrain
            .initialize(grid_size, &self.tuning.caves, &mut self.rng, &mut observer)?;
        self.grid_size = grid_size;

        let middle = self.terrain.middle();
        for miner in &mut self.miners {
            miner.spawn(middle);
        }
        self.camera.reset();
        info!(
            "New cave ready: {} miners spawned at {:?}",
            self.miners.len(),
            middle
        );
        Ok(())
    }

    /// Replace the current cave with a new one of the same size.
    pub fn request_new_cave(&mut self, observer: &mut dyn TerrainObserver) -> Result<(), GameError> {
        self.initialize_terrain(self.grid_size, observer)
    }

    /// Multiply ore luck; only tiles revealed from now on feel it.
    pub fn apply_luck_upgrade(&mut self, multiplier: f64) {
        let luck = self.progression.multiply_luck(multiplier);
        self.terrain.set_luck(luck);
        info!("Ore luck upgraded x{} -> {:.3}", multiplier, luck);
    }

    /// Multiply ore value; only tiles revealed from now on feel it.
    pub fn apply_value_upgrade(&mut self, multiplier: f64) {
        let value = self.progression.multiply_value(multiplier);
        self.terrain.set_value_mult(value);
        info!("Ore value upgraded x{} -> {:.3}", multiplier, value);
    }

    pub fn apply_gold(&mut self, amount: f64) {
        self.progression.apply_gold(amount);
    }

    pub fn register_boost_click(&mut self) {
        self.progression.register_boost_click();
    }

    /// Break `coord` directly from player input. Also counts as a boost click.
    /// Returns the gold granted, `None` when nothing broke.
    pub fn player_break(&mut self, coord: Coord, observer: &mut dyn TerrainObserver) -> Option<f64> {
        self.progression.register_boost_click();
        let mut observer = StatsObserver {
            inner: observer,
            stats: &mut self.stats,
        };
        let gold = self
            .terrain
            .break_tile(coord, false, &mut self.rng, &mut observer)?;
        self.progression.apply_gold(gold);
        self.stats.gold_earned += gold;
        Some(gold)
    }

    pub fn upgrade_miner_speed(&mut self, id: u32, amount: f32) -> Result<(), GameError> {
        self.miner_mut(id)?.upgrade_speed(amount);
        Ok(())
    }

    pub fn upgrade_pickaxe_strength(&mut self, id: u32, multiplier: f64) -> Result<(), GameError> {
        self.miner_mut(id)?.upgrade_pickaxe_strength(multiplier);
        Ok(())
    }

    pub fn upgrade_pickaxe_speed(&mut self, id: u32, amount: f32) -> Result<(), GameError> {
        self.miner_mut(id)?.upgrade_pickaxe_speed(amount);
        Ok(())
    }

    fn miner_mut(&mut self, id: u32) -> Result<&mut Miner, GameError> {
        self.miners
            .iter_mut()
            .find(|miner| miner.id == id)
            .ok_or(GameError::UnknownMiner(id))
    }

    /// One frame: boost, every miner, damage bookkeeping, gold.
    /// Returns the gold earned by miners this tick.
    pub fn tick(&mut self, dt: f32, observer: &mut dyn TerrainObserver) -> f64 {
        let dt = dt.max(0.0);
        self.progression.tick_boost(dt);

        let mut observer = StatsObserver {
            inner: observer,
            stats: &mut self.stats,
        };
        let mut gold = 0.0;
        for miner in &mut self.miners {
            gold += miner.decision_make(
                dt,
                &mut self.terrain,
                &self.progression,
                &mut self.rng,
                &mut observer,
            );
        }

        self.terrain.tick_damage_timers(dt);

        self.progression.apply_gold(gold);
        self.stats.gold_earned += gold;
        self.stats.ticks += 1;
        if self.stats.ticks % SUMMARY_INTERVAL == 0 {
            self.log_summary();
        }
        gold
    }

    fn log_summary(&self) {
        info!(
            "Tick {}: gold {:.1}, luck x{:.2}, value x{:.2}, {} tiles left, {} caves pending, boost x{:.2}, {} tiles broken, {} caves cleared",
            self.stats.ticks,
            self.progression.gold(),
            self.progression.ore_luck(),
            self.progression.ore_value_mult(),
            self.terrain.remaining_tiles(),
            self.terrain.pending_caves().len(),
            self.progression.speed_boost(),
            self.stats.tiles_broken,
            self.stats.caves_cleared
        );
    }

    pub fn switch_camera(&mut self, command: CameraCommand, dt: f32) {
        self.camera.switch(command, dt, self.miners.len());
    }

    /// Pixel position of the followed miner and whether it moved since last asked
    pub fn camera_focus(&mut self) -> Option<(Vec2, bool)> {
        self.camera.follow(&self.miners)
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn miners(&self) -> &[Miner] {
        &self.miners
    }

    pub fn miner(&self, id: u32) -> Option<&Miner> {
        self.miners.iter().find(|miner| miner.id == id)
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::RecordingObserver;

    fn seeded(seed: u64) -> GameTuning {
        GameTuning {
            seed: Some(seed),
            ..GameTuning::quick_clear()
        }
    }

    fn session(seed: u64) -> (MiningSession, RecordingObserver) {
        let mut observer = RecordingObserver::default();
        let mut session = MiningSession::new(seeded(seed)).expect("valid tuning");
        session
            .initialize_terrain(20, &mut observer)
            .expect("valid grid");
        (session, observer)
    }

    #[test]
    fn miners_are_created_in_id_order() {
        let session = MiningSession::new(GameTuning::default()).expect("valid tuning");
        let ids: Vec<u32> = session.miners().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(session.miners()[2].kind, MinerKind::AreaDamage);
        assert_eq!(session.miners()[3].kind, MinerKind::ChainDamage);
    }

    #[test]
    fn rejects_bad_grid_size_and_unknown_miners() {
        let (mut session, mut observer) = session(1);
        assert!(matches!(
            session.initialize_terrain(5, &mut observer),
            Err(GameError::GridSizeOutOfRange(5))
        ));
        assert!(matches!(
            session.upgrade_pickaxe_strength(99, 2.0),
            Err(GameError::UnknownMiner(99))
        ));
        session.upgrade_pickaxe_strength(1, 2.0).expect("miner 1 exists");
        assert_eq!(session.miner(1).map(|m| m.damage), Some(100.0));
    }

    #[test]
    fn miners_earn_gold_over_time() {
        let (mut session, mut observer) = session(2);
        let mut earned = 0.0;
        for _ in 0..600 {
            earned += session.tick(1.0 / 30.0, &mut observer);
        }
        assert!(earned > 0.0);
        assert_eq!(session.progression().gold(), earned);
        assert!(session.terrain().remaining_tiles() < 400);
        assert_eq!(session.stats().ticks, 600);
    }

    #[test]
    fn session_runs_to_cave_cleared_exactly_once() {
        let (mut session, mut observer) = session(3);
        for _ in 0..200_000 {
            session.tick(0.1, &mut observer);
            if session.terrain().is_cleared() {
                break;
            }
        }
        assert!(session.terrain().is_cleared());
        assert_eq!(observer.caves_cleared, 1);
        for _ in 0..10 {
            session.tick(0.1, &mut observer);
        }
        assert_eq!(observer.caves_cleared, 1);
        assert_eq!(session.stats().caves_cleared, 1);
        assert_eq!(session.stats().tiles_broken, 400);

        session.request_new_cave(&mut observer).expect("same size");
        assert!(!session.terrain().is_cleared());
        let middle = session.terrain().middle();
        assert!(session.miners().iter().all(|m| m.grid_pos == middle));
    }

    #[test]
    fn luck_upgrade_reaches_the_ore_model() {
        let (mut session, _) = session(4);
        session.apply_luck_upgrade(1.25);
        session.apply_luck_upgrade(2.0);
        assert!((session.terrain().ore_model().luck() - 2.5).abs() < 1e-12);
        session.apply_value_upgrade(1.5);
        assert_eq!(session.terrain().ore_model().value_mult(), 1.5);
    }

    #[test]
    fn player_break_pays_and_boosts() {
        let (mut session, mut observer) = session(5);
        let (mx, my) = session.terrain().middle();
        let gold = session
            .player_break((mx + 1, my), &mut observer)
            .expect("solid next to the middle");
        assert!(gold > 0.0);
        assert_eq!(session.progression().gold(), gold);
        assert!(session.progression().speed_boost() > 1.0);
        assert!(session.player_break((mx + 1, my), &mut observer).is_none());
    }
}
