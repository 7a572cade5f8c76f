//! Game configuration: which variant is played and its economy constants.
//!
//! The near-duplicate cookie/pizza games differ only in the values here,
//! so one simulation covers all of them. Presets live in `config/*.toml`
//! and are embedded into the binary.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Cookie variant: power-law prestige points, escalating threshold.
pub const COOKIE_PRESET: &str = include_str!("../../config/cookie.toml");

/// Pizza variant: power-law points, fixed threshold, lifetime reset.
pub const PIZZA_PRESET: &str = include_str!("../../config/pizza.toml");

/// Pizza catalog on the doubling economy.
pub const RUSH_PRESET: &str = include_str!("../../config/rush.toml");

/// How a rebirth is rewarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrestigeFormula {
    /// `floor((balance / divisor) ^ exponent)` spendable prestige points.
    PowerLaw,
    /// Every rebirth doubles a permanent multiplier. No points.
    DoublingMultiplier,
}

/// A purchasable producer type. Immutable once the game starts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProducerType {
    pub id: String,
    pub name: String,
    pub base_cost: f64,
    #[serde(default = "default_growth_rate")]
    pub growth_rate: f64,
    /// Currency per second per owned unit.
    pub base_rate: f64,
}

fn default_growth_rate() -> f64 {
    1.15
}

impl ProducerType {
    pub fn new(id: &str, name: &str, base_cost: f64, base_rate: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_cost,
            growth_rate: default_growth_rate(),
            base_rate,
        }
    }
}

/// Rebirth threshold and reward constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RebirthConfig {
    /// Lifetime earnings required for the first rebirth.
    pub base_threshold: f64,
    /// Threshold multiplier per completed rebirth. 1.0 keeps it fixed.
    pub scale_factor: f64,
    pub divisor: f64,
    pub exponent: f64,
    /// Starting balance granted per level of the starting-bonus upgrade.
    pub starting_bonus: f64,
}

impl Default for RebirthConfig {
    fn default() -> Self {
        Self {
            base_threshold: 1_000.0,
            scale_factor: 2.0,
            divisor: 1_000.0,
            exponent: 0.5,
            starting_bonus: 1_000.0,
        }
    }
}

/// Background timer periods, in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub autosave_ms: u32,
    pub leaderboard_refresh_ms: u32,
    /// How long an achievement toast stays on screen.
    pub toast_ms: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            autosave_ms: 10_000,
            leaderboard_refresh_ms: 5_000,
            toast_ms: 5_000,
        }
    }
}

/// Full configuration of one game variant.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    /// Display name of the currency ("cookies", "pizzas").
    pub currency: String,
    pub has_rebirth: bool,
    pub prestige_formula: PrestigeFormula,
    /// Length of one production tick. The per-second rate is scaled by
    /// `tick_interval_ms / 1000` on every tick.
    pub tick_interval_ms: u32,
    /// When set, rebirth also zeroes lifetime earnings. Otherwise they
    /// survive so "total earned" achievements keep their meaning.
    pub reset_lifetime_on_rebirth: bool,
    pub click_value: f64,
    /// Prefix for every key written to the key-value store.
    pub storage_prefix: String,
    pub rebirth: RebirthConfig,
    pub timers: TimerConfig,
    pub producers: Vec<ProducerType>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "Cookie Clicker".into(),
            currency: "cookies".into(),
            has_rebirth: true,
            prestige_formula: PrestigeFormula::PowerLaw,
            tick_interval_ms: 100,
            reset_lifetime_on_rebirth: false,
            click_value: 1.0,
            storage_prefix: "cookie_clicker".into(),
            rebirth: RebirthConfig::default(),
            timers: TimerConfig::default(),
            producers: vec![
                ProducerType::new("cursor", "Cursor", 15.0, 0.1),
                ProducerType::new("grandma", "Grandma", 100.0, 1.0),
                ProducerType::new("farm", "Farm", 1_100.0, 8.0),
                ProducerType::new("mine", "Mine", 12_000.0, 47.0),
                ProducerType::new("factory", "Factory", 130_000.0, 260.0),
            ],
        }
    }
}

impl GameConfig {
    /// Parse and validate a TOML config.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up an embedded preset by name ("cookie", "pizza" or "rush").
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "cookie" => Self::from_toml_str(COOKIE_PRESET),
            "pizza" => Self::from_toml_str(PIZZA_PRESET),
            "rush" => Self::from_toml_str(RUSH_PRESET),
            other => Err(ConfigError::Invalid(format!("unknown preset: {other}"))),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.producers.is_empty() {
            return Err(ConfigError::Invalid("at least one producer is required".into()));
        }
        for (i, p) in self.producers.iter().enumerate() {
            if p.id.is_empty() {
                return Err(ConfigError::Invalid(format!("producer #{i} has an empty id")));
            }
            if self.producers[..i].iter().any(|q| q.id == p.id) {
                return Err(ConfigError::Invalid(format!("duplicate producer id: {}", p.id)));
            }
            if !(p.base_cost >= 1.0 && p.base_cost.is_finite()) {
                return Err(ConfigError::Invalid(format!("{}: base_cost must be >= 1", p.id)));
            }
            if !(p.growth_rate > 1.0 && p.growth_rate.is_finite()) {
                return Err(ConfigError::Invalid(format!("{}: growth_rate must be > 1", p.id)));
            }
            if !(p.base_rate >= 0.0 && p.base_rate.is_finite()) {
                return Err(ConfigError::Invalid(format!("{}: base_rate must be >= 0", p.id)));
            }
        }
        let r = &self.rebirth;
        if !(r.base_threshold > 0.0) || !(r.scale_factor >= 1.0) {
            return Err(ConfigError::Invalid(
                "rebirth threshold must be positive and non-decreasing".into(),
            ));
        }
        if !(r.divisor > 0.0) || !(r.exponent > 0.0) {
            return Err(ConfigError::Invalid("rebirth divisor and exponent must be positive".into()));
        }
        if !(self.click_value >= 0.0) {
            return Err(ConfigError::Invalid("click_value must be >= 0".into()));
        }
        Ok(())
    }

    /// Number of ticks spanning `ms`, at least one.
    pub fn ticks_for(&self, ms: u32) -> u32 {
        (ms / self.tick_interval_ms.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_preset_matches_default() {
        let parsed = GameConfig::preset("cookie").unwrap();
        assert_eq!(parsed, GameConfig::default());
    }

    #[test]
    fn pizza_preset_uses_points_and_fixed_threshold() {
        let cfg = GameConfig::preset("pizza").unwrap();
        assert_eq!(cfg.prestige_formula, PrestigeFormula::PowerLaw);
        assert!((cfg.rebirth.base_threshold - 1_000.0).abs() < f64::EPSILON);
        assert!((cfg.rebirth.exponent - 0.5).abs() < f64::EPSILON);
        assert!((cfg.rebirth.scale_factor - 1.0).abs() < f64::EPSILON);
        assert!(cfg.reset_lifetime_on_rebirth);
        assert_eq!(cfg.tick_interval_ms, 1000);
        assert_eq!(cfg.producers.len(), 5);
        assert_eq!(cfg.producers[4].id, "portal");
        // growth rate falls back to the standard curve
        assert!((cfg.producers[1].growth_rate - 1.15).abs() < f64::EPSILON);
        // missing table falls back to defaults
        assert_eq!(cfg.timers, TimerConfig::default());
    }

    #[test]
    fn rush_preset_differs_from_pizza_only_in_economy() {
        let pizza = GameConfig::preset("pizza").unwrap();
        let rush = GameConfig::preset("rush").unwrap();
        assert_eq!(rush.prestige_formula, PrestigeFormula::DoublingMultiplier);
        assert_eq!(rush.storage_prefix, "pizza_rush");
        assert_eq!(rush.producers, pizza.producers);
        assert_eq!(rush.rebirth, pizza.rebirth);
    }

    #[test]
    fn unknown_preset_rejected() {
        assert!(matches!(
            GameConfig::preset("waffle"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            GameConfig::from_toml_str("tick_interval_ms = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let cfg = GameConfig {
            tick_interval_ms: 0,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn growth_rate_must_exceed_one() {
        let mut cfg = GameConfig::default();
        cfg.producers[0].growth_rate = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn duplicate_producer_ids_rejected() {
        let mut cfg = GameConfig::default();
        cfg.producers[1].id = "cursor".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn ticks_for_rounds_down_to_at_least_one() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.ticks_for(10_000), 100);
        assert_eq!(cfg.ticks_for(50), 1);
    }
}
