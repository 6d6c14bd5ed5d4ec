use crate::error::ConfigError;
use crate::world::{MAX_GRID_SIZE, MIN_GRID_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every balance knob of the mining game in one place.
/// Loaded once at startup (JSON) or built from one of the presets below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    /// Seed for the session RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub terrain: TerrainTuning,
    pub caves: CaveTuning,
    pub miners: MinerTuning,
    pub boost: BoostTuning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    pub grid_size: usize,
    /// Number of ore tiers above Stone
    pub ore_tiers: u8,
    /// Share (percent) of newly revealed tiles that become ore instead of Stone
    pub ore_appearance_rate: f64,

    // Base chance curve (tier 1 ends up most common)
    pub ore_chance_init: f64,
    pub ore_chance_change_rate: f64,

    // Luck compression
    pub luck_soft_cap: f64,
    pub luck_decay_rate: f64,

    // Geometric health/gold curves, Stone is tier 0
    pub base_health: f64,
    pub health_growth: f64,
    pub base_gold: f64,
    pub gold_growth: f64,

    /// Seconds a damaged ore stays in the damage tracker after its last hit
    pub damage_display_secs: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveTuning {
    /// Chance for a cave cell to be seeded as Stone before smoothing
    pub wall_probability: f64,
    pub placement_attempts: u32,
    /// Minimum tiles kept between two caves
    pub cave_buffer: usize,
    /// Half-width of the protected spawn zone around the grid middle
    pub middle_buffer: usize,
    pub medium_size: usize,
    pub large_size: usize,
    pub medium_weight: u32,
    pub large_weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerTuning {
    pub normal_count: usize,
    pub area_count: usize,
    pub chain_count: usize,
    pub damage: f64,
    /// Tiles per second
    pub move_speed: f32,
    /// Seconds between pickaxe swings
    pub mine_cooldown: f32,
    /// Per-swing chance for a variant's passive ability
    pub passive_chance: f64,
    pub area_damage_fraction: f64,
    pub chain_damage_fraction: f64,
    pub chain_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostTuning {
    pub increment: f32,
    pub max: f32,
    /// Inactivity before the boost starts decaying
    pub grace_secs: f32,
    /// Boost lost per second once decaying
    pub decay_per_sec: f32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            seed: None,
            terrain: TerrainTuning::default(),
            caves: CaveTuning::default(),
            miners: MinerTuning::default(),
            boost: BoostTuning::default(),
        }
    }
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            grid_size: 50,
            ore_tiers: 3,
            ore_appearance_rate: 30.0,
            ore_chance_init: 1.5,
            ore_chance_change_rate: 4.0,
            luck_soft_cap: 65.0,
            luck_decay_rate: 0.5,
            base_health: 5.0,
            health_growth: 5.0,
            base_gold: 1.0,
            gold_growth: 2.5,
            damage_display_secs: 2.0,
        }
    }
}

impl Default for CaveTuning {
    fn default() -> Self {
        Self {
            wall_probability: 0.35,
            placement_attempts: 200,
            cave_buffer: 1,
            middle_buffer: 3,
            medium_size: 7,
            large_size: 14,
            medium_weight: 3,
            large_weight: 1,
        }
    }
}

impl Default for MinerTuning {
    fn default() -> Self {
        Self {
            normal_count: 2,
            area_count: 1,
            chain_count: 1,
            damage: 5.0,
            move_speed: 2.0,
            mine_cooldown: 1.0,
            passive_chance: 0.3,
            area_damage_fraction: 0.1,
            chain_damage_fraction: 0.5,
            chain_length: 4,
        }
    }
}

impl Default for BoostTuning {
    fn default() -> Self {
        Self {
            increment: 0.1,
            max: 3.0,
            grace_secs: 2.0,
            decay_per_sec: 0.5,
        }
    }
}

impl GameTuning {
    /// Default balance
    pub fn balanced() -> Self {
        Self::default()
    }

    /// More ore tiers and a richer reveal rate
    pub fn rich_veins() -> Self {
        let mut tuning = Self::default();
        tuning.terrain.ore_tiers = 6;
        tuning.terrain.ore_appearance_rate = 45.0;
        tuning
    }

    /// Small grid, strong miners: a cave is cleared in a couple of minutes
    pub fn quick_clear() -> Self {
        let mut tuning = Self::default();
        tuning.terrain.grid_size = 20;
        tuning.miners.normal_count = 4;
        tuning.miners.damage = 50.0;
        tuning.miners.mine_cooldown = 0.25;
        tuning
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Reject values that would break an invariant of the generators.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terrain;
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&t.grid_size) {
            return Err(ConfigError::invalid("terrain.grid_size", "must be within 10..=100"));
        }
        if !(1..=10).contains(&t.ore_tiers) {
            return Err(ConfigError::invalid("terrain.ore_tiers", "must be within 1..=10"));
        }
        if !(0.0..=100.0).contains(&t.ore_appearance_rate) {
            return Err(ConfigError::invalid(
                "terrain.ore_appearance_rate",
                "must be a percentage",
            ));
        }
        if t.health_growth <= 1.0 || t.gold_growth <= 1.0 {
            return Err(ConfigError::invalid(
                "terrain.health_growth/gold_growth",
                "must be greater than 1 so higher tiers are strictly tougher and richer",
            ));
        }
        if t.base_health <= 0.0 || t.base_gold <= 0.0 {
            return Err(ConfigError::invalid("terrain.base_health/base_gold", "must be positive"));
        }

        let c = &self.caves;
        if !(0.0..=1.0).contains(&c.wall_probability) {
            return Err(ConfigError::invalid("caves.wall_probability", "must be within 0..=1"));
        }
        if c.medium_size == 0 || c.large_size < c.medium_size {
            return Err(ConfigError::invalid(
                "caves.medium_size/large_size",
                "need 0 < medium_size <= large_size",
            ));
        }
        if c.medium_weight + c.large_weight == 0 {
            return Err(ConfigError::invalid("caves.*_weight", "at least one weight must be non-zero"));
        }

        let m = &self.miners;
        if !(0.0..=1.0).contains(&m.passive_chance) {
            return Err(ConfigError::invalid("miners.passive_chance", "must be within 0..=1"));
        }
        if m.move_speed <= 0.0 || m.mine_cooldown <= 0.0 || m.damage <= 0.0 {
            return Err(ConfigError::invalid(
                "miners.move_speed/mine_cooldown/damage",
                "must be positive",
            ));
        }

        let b = &self.boost;
        if b.max < 1.0 || b.increment < 0.0 || b.decay_per_sec < 0.0 {
            return Err(ConfigError::invalid("boost", "max must be >= 1 and rates non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for tuning in [
            GameTuning::balanced(),
            GameTuning::rich_veins(),
            GameTuning::quick_clear(),
        ] {
            assert!(tuning.validate().is_ok(), "{tuning:?}");
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let tuning = GameTuning::from_json_str(r#"{ "seed": 7, "terrain": { "grid_size": 30 } }"#)
            .expect("valid tuning");
        assert_eq!(tuning.seed, Some(7));
        assert_eq!(tuning.terrain.grid_size, 30);
        assert_eq!(tuning.terrain.ore_tiers, 3);
        assert_eq!(tuning.caves, CaveTuning::default());
    }

    #[test]
    fn flat_growth_is_rejected() {
        let err = GameTuning::from_json_str(r#"{ "terrain": { "health_growth": 1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn grid_size_must_be_supported() {
        let err = GameTuning::from_json_str(r#"{ "terrain": { "grid_size": 101 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "terrain.grid_size", .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameTuning::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
