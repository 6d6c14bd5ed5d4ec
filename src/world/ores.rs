//! Ore tiers: base spawn chances, luck modulation, weighted choice and the
//! geometric health/gold curves.

use crate::tuning::TerrainTuning;
use crate::world::tile::TerrainType;
use rand::Rng;

/// Chances below this are dropped from the table
const NEGLIGIBLE_CHANCE: f64 = 0.01;

/// Weighted percentages for the next revealed tile.
/// Stone always holds `100 - ore_appearance_rate`, the tiers share the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct OreChanceTable {
    pub stone: f64,
    /// `(tier, chance)` in ascending tier order
    pub tiers: Vec<(u8, f64)>,
}

impl OreChanceTable {
    pub fn total(&self) -> f64 {
        self.stone + self.ore_total()
    }

    pub fn ore_total(&self) -> f64 {
        self.tiers.iter().map(|(_, chance)| chance).sum()
    }

    pub fn chance_of(&self, kind: TerrainType) -> f64 {
        match kind {
            TerrainType::Floor => 0.0,
            TerrainType::Stone => self.stone,
            TerrainType::Ore(tier) => self
                .tiers
                .iter()
                .find(|(t, _)| *t == tier)
                .map_or(0.0, |(_, chance)| *chance),
        }
    }

    /// Weighted draw: walk Stone then tiers ascending and return the first
    /// entry whose cumulative weight reaches the draw.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> TerrainType {
        let total = self.total();
        if total <= 0.0 {
            return TerrainType::Stone;
        }
        let draw = rng.gen_range(0.0..total);

        let mut cumulative = self.stone;
        if draw <= cumulative {
            return TerrainType::Stone;
        }
        for &(tier, chance) in &self.tiers {
            cumulative += chance;
            if draw <= cumulative {
                return TerrainType::Ore(tier);
            }
        }

        // float rounding
        if self.tiers.iter().any(|(tier, _)| *tier == 1) {
            TerrainType::Ore(1)
        } else {
            TerrainType::Stone
        }
    }
}

/// Per-tier constants plus the live luck/value multipliers.
#[derive(Debug, Clone)]
pub struct OreModel {
    tiers: u8,
    appearance_rate: f64,
    soft_cap: f64,
    decay_rate: f64,
    /// Index `i` holds the base chance of tier `i + 1`
    base_chances: Vec<f64>,
    base_health: f64,
    health_growth: f64,
    base_gold: f64,
    gold_growth: f64,
    luck: f64,
    value_mult: f64,
    table: OreChanceTable,
}

impl OreModel {
    pub fn new(tuning: &TerrainTuning) -> Self {
        let base_chances = base_chances(
            tuning.ore_tiers,
            tuning.ore_chance_init,
            tuning.ore_chance_change_rate,
        );
        Self::with_base_chances(tuning, base_chances)
    }

    /// Like [`OreModel::new`] but with explicit per-tier base chances (tier 1 first).
    pub fn with_base_chances(tuning: &TerrainTuning, base_chances: Vec<f64>) -> Self {
        let mut model = Self {
            tiers: u8::try_from(base_chances.len()).unwrap_or(u8::MAX),
            appearance_rate: tuning.ore_appearance_rate,
            soft_cap: tuning.luck_soft_cap,
            decay_rate: tuning.luck_decay_rate,
            base_chances,
            base_health: tuning.base_health,
            health_growth: tuning.health_growth,
            base_gold: tuning.base_gold,
            gold_growth: tuning.gold_growth,
            luck: 1.0,
            value_mult: 1.0,
            table: OreChanceTable {
                stone: 100.0,
                tiers: Vec::new(),
            },
        };
        model.recompute();
        model
    }

    pub fn tiers(&self) -> u8 {
        self.tiers
    }

    pub fn luck(&self) -> f64 {
        self.luck
    }

    pub fn value_mult(&self) -> f64 {
        self.value_mult
    }

    pub fn base_chances(&self) -> &[f64] {
        &self.base_chances
    }

    pub fn chance_table(&self) -> &OreChanceTable {
        &self.table
    }

    pub fn set_luck(&mut self, luck: f64) {
        self.luck = luck.max(0.0);
        self.recompute();
    }

    /// Only affects tiles whose type is assigned afterwards.
    pub fn set_value_mult(&mut self, value_mult: f64) {
        self.value_mult = value_mult.max(0.0);
    }

    /// Luck-scaled and soft-capped chances before normalization, `(tier, chance)`.
    pub fn luck_weighted_chances(&self) -> Vec<(u8, f64)> {
        let last_tier = self.tiers;
        let mut modified = Vec::with_capacity(self.base_chances.len());
        for (tier, &base) in (1..=self.tiers).zip(&self.base_chances) {
            let mut chance = self.luck * base;
            if chance > self.soft_cap {
                let overflow = chance - self.soft_cap;
                chance = self.soft_cap - overflow * self.decay_rate;
                if tier == last_tier {
                    // the most valuable ore keeps spawning however far luck overshoots
                    chance = chance.max(1.0);
                }
            }
            if chance <= NEGLIGIBLE_CHANCE {
                continue;
            }
            modified.push((tier, chance));
        }
        modified
    }

    fn recompute(&mut self) {
        let mut modified = self.luck_weighted_chances();
        if modified.is_empty() {
            // luck too low to weigh anything: fall back to the base spread
            modified = (1..=self.tiers).zip(self.base_chances.iter().copied()).collect();
        }
        let total: f64 = modified.iter().map(|(_, chance)| chance).sum();
        let tiers = if total > 0.0 {
            modified
                .into_iter()
                .map(|(tier, chance)| (tier, chance / total * self.appearance_rate))
                .collect()
        } else {
            Vec::new()
        };
        self.table = OreChanceTable {
            stone: 100.0 - self.appearance_rate,
            tiers,
        };
    }

    pub fn choose_ore_type<R: Rng + ?Sized>(&self, rng: &mut R) -> TerrainType {
        self.table.choose(rng)
    }

    pub fn health(&self, kind: TerrainType) -> f64 {
        kind.tier().map_or(0.0, |tier| {
            self.base_health * self.health_growth.powi(i32::from(tier))
        })
    }

    pub fn gold(&self, kind: TerrainType) -> f64 {
        kind.tier().map_or(0.0, |tier| {
            self.base_gold * self.value_mult * self.gold_growth.powi(i32::from(tier))
        })
    }
}

/// `init * max(1, rate^i * i * 1.05)` for `i = 0..tiers`, reversed so tier 1 is most common.
fn base_chances(tiers: u8, init: f64, rate: f64) -> Vec<f64> {
    let mut chances: Vec<f64> = (0..tiers)
        .map(|i| {
            let i = f64::from(i);
            init * (rate.powf(i) * i * 1.05).max(1.0)
        })
        .collect();
    chances.reverse();
    chances
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> OreModel {
        OreModel::new(&TerrainTuning::default())
    }

    #[test]
    fn tier_one_is_most_common() {
        let chances = model().base_chances().to_vec();
        assert_eq!(chances.len(), 3);
        assert!((chances[0] - 50.4).abs() < 1e-9);
        assert!((chances[1] - 6.3).abs() < 1e-9);
        assert!((chances[2] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn table_sums_to_one_hundred_for_any_luck() {
        let mut model = model();
        for luck in [0.0, 0.001, 0.5, 1.0, 1.25, 2.0, 10.0, 100.0, 10_000.0] {
            model.set_luck(luck);
            let table = model.chance_table();
            assert_eq!(table.stone, 70.0, "luck {luck}");
            let ore_total = table.ore_total();
            assert!((ore_total - 30.0).abs() < 1e-9, "luck {luck}: {ore_total}");
            assert!((table.total() - 100.0).abs() < 1e-9, "luck {luck}");
        }
    }

    #[test]
    fn negligible_luck_keeps_the_base_spread() {
        let mut model = model();
        for luck in [0.0, 0.0001] {
            model.set_luck(luck);
            let table = model.chance_table();
            assert_eq!(table.tiers.len(), 3, "luck {luck}");
            // 50.4 / 58.2 of the 30% ore share
            let common = table.chance_of(TerrainType::Ore(1));
            assert!((common - 50.4 / 58.2 * 30.0).abs() < 1e-9, "luck {luck}: {common}");
            assert!((table.total() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn high_luck_compresses_the_common_tier() {
        let mut model = model();
        let before = model.chance_table().chance_of(TerrainType::Ore(3));
        model.set_luck(4.0);
        let after = model.chance_table().chance_of(TerrainType::Ore(3));
        assert!(after > before, "rarest tier should gain share: {before} -> {after}");

        let weighted = model.luck_weighted_chances();
        // 50.4 * 4 = 201.6 → 65 - 136.6 * 0.5 < 0.01 → dropped
        assert!(weighted.iter().all(|(tier, _)| *tier != 1));
    }

    #[test]
    fn most_valuable_tier_never_drops_out() {
        let tuning = TerrainTuning::default();
        let mut model = OreModel::with_base_chances(&tuning, vec![1.0, 1.0, 1.0]);
        model.set_luck(1_000.0);
        let weighted = model.luck_weighted_chances();
        assert_eq!(weighted, vec![(3, 1.0)]);
    }

    #[test]
    fn health_and_gold_grow_with_tier() {
        let model = model();
        let kinds = [
            TerrainType::Stone,
            TerrainType::Ore(1),
            TerrainType::Ore(2),
            TerrainType::Ore(3),
        ];
        for pair in kinds.windows(2) {
            assert!(model.health(pair[1]) > model.health(pair[0]));
            assert!(model.gold(pair[1]) > model.gold(pair[0]));
        }
        assert_eq!(model.health(TerrainType::Stone), 5.0);
        assert_eq!(model.health(TerrainType::Ore(2)), 125.0);
        assert_eq!(model.health(TerrainType::Floor), 0.0);
    }

    #[test]
    fn value_multiplier_scales_gold() {
        let mut model = model();
        let before = model.gold(TerrainType::Ore(1));
        model.set_value_mult(1.5);
        assert!((model.gold(TerrainType::Ore(1)) - before * 1.5).abs() < 1e-9);
    }

    #[test]
    fn weighted_choice_roughly_matches_table() {
        let model = model();
        let mut rng = StdRng::seed_from_u64(11);
        let draws = 20_000;
        let stone = (0..draws)
            .filter(|_| model.choose_ore_type(&mut rng) == TerrainType::Stone)
            .count();
        let share = stone as f64 / draws as f64;
        assert!((share - 0.70).abs() < 0.02, "stone share {share}");
    }

    #[test]
    fn empty_ore_table_always_yields_stone() {
        let table = OreChanceTable {
            stone: 0.0,
            tiers: Vec::new(),
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(table.choose(&mut rng), TerrainType::Stone);
    }
}
