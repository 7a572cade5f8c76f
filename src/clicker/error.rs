//! Error types for the clicker simulation.

use thiserror::Error;

/// Result alias for player commands.
pub type Result<T, E = GameError> = std::result::Result<T, E>;

/// Rejections of player commands. None of these mutate state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("not enough currency: need {needed:.0}, have {available:.0}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("amount must be positive and finite, got {0}")]
    InvalidAmount(f64),

    #[error("unknown producer: {0}")]
    UnknownProducer(String),

    #[error("rebirth is not available in this game")]
    RebirthDisabled,

    #[error("rebirth requires {required:.0} earned in total, you have {earned:.0}")]
    RebirthNotEligible { required: f64, earned: f64 },

    #[error("rebirth with {balance:.0} would award no prestige points")]
    NoPrestigeGain { balance: f64 },

    #[error("no rebirth is waiting for confirmation")]
    NoPendingRebirth,

    #[error("{upgrade} is already at max level {max_level}")]
    MaxLevelReached { upgrade: &'static str, max_level: u32 },

    #[error("not enough prestige points: need {needed}, have {available}")]
    InsufficientPrestigePoints { needed: u64, available: u64 },

    #[error("prestige upgrades are not available with the doubling economy")]
    UpgradesUnavailable,
}

/// Failures of the key-value store behind the persistence gateway.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to serialize save data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("corrupt save data: {0}")]
    Corrupt(String),
}

/// Invalid game configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
