//! Player-facing economy: gold, ore luck, ore value and the shared miner
//! speed boost.

use crate::tuning::BoostTuning;

/// Player progression, read by the ore model and every miner each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionState {
    gold: f64,
    ore_luck: f64,
    ore_value_mult: f64,
    speed_boost: f32,
    /// Seconds since the last boost click
    idle: f32,
    boost: BoostTuning,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new(BoostTuning::default())
    }
}

impl ProgressionState {
    pub fn new(boost: BoostTuning) -> Self {
        Self {
            gold: 0.0,
            ore_luck: 1.0,
            ore_value_mult: 1.0,
            speed_boost: 1.0,
            idle: 0.0,
            boost,
        }
    }

    pub fn gold(&self) -> f64 {
        self.gold
    }

    pub fn ore_luck(&self) -> f64 {
        self.ore_luck
    }

    pub fn ore_value_mult(&self) -> f64 {
        self.ore_value_mult
    }

    /// Shared multiplier on every miner's speed, `1.0..=max`
    pub fn speed_boost(&self) -> f32 {
        self.speed_boost
    }

    pub fn apply_gold(&mut self, amount: f64) {
        self.gold += amount;
    }

    /// Multiply ore luck; returns the new value.
    pub fn multiply_luck(&mut self, multiplier: f64) -> f64 {
        self.ore_luck = (self.ore_luck * multiplier).max(0.0);
        self.ore_luck
    }

    /// Multiply ore value; returns the new value.
    pub fn multiply_value(&mut self, multiplier: f64) -> f64 {
        self.ore_value_mult = (self.ore_value_mult * multiplier).max(0.0);
        self.ore_value_mult
    }

    pub fn register_boost_click(&mut self) {
        self.speed_boost = (self.speed_boost + self.boost.increment).min(self.boost.max.max(1.0));
        self.idle = 0.0;
    }

    /// Linear decay toward 1.0 once the grace period has passed.
    pub fn tick_boost(&mut self, dt: f32) {
        self.idle += dt;
        if self.idle <= self.boost.grace_secs {
            return;
        }
        // only the part of dt past the grace period decays
        let decaying = (self.idle - self.boost.grace_secs).min(dt);
        self.speed_boost = (self.speed_boost - self.boost.decay_per_sec * decaying).max(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrades_compound() {
        let mut progression = ProgressionState::default();
        progression.multiply_luck(1.25);
        progression.multiply_luck(1.25);
        assert!((progression.ore_luck() - 1.5625).abs() < 1e-12);
        assert_eq!(progression.multiply_value(1.5), 1.5);
        assert_eq!(progression.ore_value_mult(), 1.5);
        progression.apply_gold(10.0);
        progression.apply_gold(2.5);
        assert_eq!(progression.gold(), 12.5);
    }

    #[test]
    fn boost_is_capped() {
        let mut progression = ProgressionState::default();
        for _ in 0..100 {
            progression.register_boost_click();
        }
        assert_eq!(progression.speed_boost(), 3.0);
    }

    #[test]
    fn boost_decays_after_grace() {
        let mut progression = ProgressionState::default();
        for _ in 0..10 {
            progression.register_boost_click();
        }
        let peak = progression.speed_boost();
        assert!(peak > 1.9);

        progression.tick_boost(1.5);
        assert_eq!(progression.speed_boost(), peak);

        // 0.5 s of the next second is past the grace period
        progression.tick_boost(1.0);
        assert!((progression.speed_boost() - (peak - 0.25)).abs() < 1e-5);

        progression.tick_boost(60.0);
        assert_eq!(progression.speed_boost(), 1.0);
    }

    #[test]
    fn click_resets_the_grace_period() {
        let mut progression = ProgressionState::default();
        progression.register_boost_click();
        progression.tick_boost(1.9);
        progression.register_boost_click();
        progression.tick_boost(1.9);
        assert!((progression.speed_boost() - 1.2).abs() < 1e-5);
    }
}
