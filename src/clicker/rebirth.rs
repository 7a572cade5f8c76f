//! Rebirth (prestige): a confirmed full-progress reset for permanent bonuses.
//!
//! Phases: `Accumulating` until lifetime earnings reach the threshold,
//! then `Eligible`. `request_rebirth` moves to `AwaitingConfirmation`;
//! `confirm_rebirth` re-validates, resets the run and returns to
//! `Accumulating` with a higher threshold.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::achievements;
use super::config::{GameConfig, PrestigeFormula, RebirthConfig};
use super::error::{GameError, Result};
use super::logic::refresh_rate;
use super::state::GameState;

/// Cost growth of a prestige upgrade per purchased level.
pub const UPGRADE_COST_GROWTH: f64 = 1.5;

/// Meta-upgrades bought with prestige points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrestigeUpgradeKind {
    ClickPower,
    Production,
    CostReduction,
    StartingBonus,
}

impl PrestigeUpgradeKind {
    pub fn all() -> &'static [PrestigeUpgradeKind] {
        &[
            PrestigeUpgradeKind::ClickPower,
            PrestigeUpgradeKind::Production,
            PrestigeUpgradeKind::CostReduction,
            PrestigeUpgradeKind::StartingBonus,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            PrestigeUpgradeKind::ClickPower => 0,
            PrestigeUpgradeKind::Production => 1,
            PrestigeUpgradeKind::CostReduction => 2,
            PrestigeUpgradeKind::StartingBonus => 3,
        }
    }

    /// Stable identifier used in save records.
    pub fn key(self) -> &'static str {
        match self {
            PrestigeUpgradeKind::ClickPower => "click_power",
            PrestigeUpgradeKind::Production => "production",
            PrestigeUpgradeKind::CostReduction => "cost_reduction",
            PrestigeUpgradeKind::StartingBonus => "starting_bonus",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrestigeUpgradeKind::ClickPower => "Click Power",
            PrestigeUpgradeKind::Production => "Production",
            PrestigeUpgradeKind::CostReduction => "Cost Reduction",
            PrestigeUpgradeKind::StartingBonus => "Starting Bonus",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PrestigeUpgradeKind::ClickPower => "click value x2 per level",
            PrestigeUpgradeKind::Production => "production x1.5 per level",
            PrestigeUpgradeKind::CostReduction => "producer costs -10% per level",
            PrestigeUpgradeKind::StartingBonus => "start each run with a bonus",
        }
    }

    pub fn base_cost(self) -> u64 {
        match self {
            PrestigeUpgradeKind::StartingBonus => 5,
            _ => 1,
        }
    }

    pub fn max_level(self) -> u32 {
        match self {
            PrestigeUpgradeKind::ClickPower | PrestigeUpgradeKind::Production => 10,
            PrestigeUpgradeKind::CostReduction | PrestigeUpgradeKind::StartingBonus => 5,
        }
    }

    /// Price of the next level: `ceil(base_cost * 1.5^level)`.
    pub fn cost_at(self, level: u32) -> u64 {
        let exponent = level.min(i32::MAX as u32) as i32;
        (self.base_cost() as f64 * UPGRADE_COST_GROWTH.powi(exponent)).ceil() as u64
    }
}

/// What a confirmed rebirth would award, computed at request time.
#[derive(Clone, Debug, PartialEq)]
pub struct RebirthQuote {
    pub points: u64,
    /// Production multiplier after the rebirth.
    pub multiplier_after: f64,
    pub threshold: f64,
}

/// Result of a completed rebirth.
#[derive(Clone, Debug, PartialEq)]
pub struct RebirthOutcome {
    pub points_awarded: u64,
    pub rebirths: u32,
    pub starting_balance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebirthPhase {
    Disabled,
    Accumulating,
    Eligible,
    AwaitingConfirmation,
}

/// Prestige progress. Survives rebirths and full resets.
#[derive(Clone, Debug, PartialEq)]
pub struct RebirthState {
    pub rebirths: u32,
    pub prestige_points: u64,
    /// Doubling-economy multiplier; stays 1.0 under the power law.
    pub multiplier: f64,
    levels: [u32; 4],
    pub pending: Option<RebirthQuote>,
}

impl Default for RebirthState {
    fn default() -> Self {
        Self {
            rebirths: 0,
            prestige_points: 0,
            multiplier: 1.0,
            levels: [0; 4],
            pending: None,
        }
    }
}

impl RebirthState {
    pub fn level(&self, kind: PrestigeUpgradeKind) -> u32 {
        self.levels[kind.index()]
    }

    /// Set a level from persisted data, clamped to the kind's max.
    pub fn set_level(&mut self, kind: PrestigeUpgradeKind, level: u32) {
        self.levels[kind.index()] = level.min(kind.max_level());
    }

    pub fn click_multiplier(&self) -> f64 {
        self.multiplier * 2.0_f64.powi(self.level(PrestigeUpgradeKind::ClickPower) as i32)
    }

    pub fn production_multiplier(&self) -> f64 {
        self.multiplier * 1.5_f64.powi(self.level(PrestigeUpgradeKind::Production) as i32)
    }

    /// Factor applied to producer costs.
    pub fn cost_discount(&self) -> f64 {
        0.9_f64.powi(self.level(PrestigeUpgradeKind::CostReduction) as i32)
    }

    pub fn starting_bonus(&self, per_level: f64) -> f64 {
        self.level(PrestigeUpgradeKind::StartingBonus) as f64 * per_level
    }

    /// `base_threshold * scale_factor^rebirths`.
    pub fn threshold(&self, config: &RebirthConfig) -> f64 {
        config.base_threshold * config.scale_factor.powi(self.rebirths.min(i32::MAX as u32) as i32)
    }
}

/// `floor((balance / divisor) ^ exponent)`, zero for non-positive input
/// and capped at `u64::MAX` for balances past that.
pub fn points_for(config: &RebirthConfig, balance: f64) -> u64 {
    let ratio = balance / config.divisor;
    if !(ratio > 0.0) {
        return 0;
    }
    let points = ratio.powf(config.exponent).floor();
    if points >= u64::MAX as f64 {
        u64::MAX
    } else {
        points as u64
    }
}

pub fn phase(state: &GameState) -> RebirthPhase {
    if !state.config.has_rebirth {
        RebirthPhase::Disabled
    } else if state.rebirth.pending.is_some() {
        RebirthPhase::AwaitingConfirmation
    } else if state.ledger.lifetime_earned() >= state.rebirth.threshold(&state.config.rebirth) {
        RebirthPhase::Eligible
    } else {
        RebirthPhase::Accumulating
    }
}

/// Evaluate whether a rebirth is allowed right now and what it awards.
pub fn quote(state: &GameState) -> Result<RebirthQuote> {
    let config: &GameConfig = &state.config;
    if !config.has_rebirth {
        return Err(GameError::RebirthDisabled);
    }
    let threshold = state.rebirth.threshold(&config.rebirth);
    let earned = state.ledger.lifetime_earned();
    if earned < threshold {
        return Err(GameError::RebirthNotEligible {
            required: threshold,
            earned,
        });
    }

    match config.prestige_formula {
        PrestigeFormula::PowerLaw => {
            let balance = state.ledger.balance();
            let points = points_for(&config.rebirth, balance);
            if points == 0 {
                return Err(GameError::NoPrestigeGain { balance });
            }
            Ok(RebirthQuote {
                points,
                multiplier_after: state.rebirth.production_multiplier(),
                threshold,
            })
        }
        PrestigeFormula::DoublingMultiplier => Ok(RebirthQuote {
            points: 0,
            multiplier_after: state.rebirth.production_multiplier() * 2.0,
            threshold,
        }),
    }
}

/// First step: check eligibility and hold the quote for confirmation.
pub fn request_rebirth(state: &mut GameState) -> Result<RebirthQuote> {
    let q = quote(state)?;
    debug!(points = q.points, "rebirth awaiting confirmation");
    state.rebirth.pending = Some(q.clone());
    Ok(q)
}

pub fn cancel_rebirth(state: &mut GameState) {
    state.rebirth.pending = None;
}

/// Second step: re-validate against the current state and reset the run.
///
/// The award is recomputed here, since production keeps running while
/// the confirmation is on screen.
pub fn confirm_rebirth(state: &mut GameState) -> Result<RebirthOutcome> {
    if state.rebirth.pending.take().is_none() {
        return Err(GameError::NoPendingRebirth);
    }
    let q = quote(state)?;

    match state.config.prestige_formula {
        PrestigeFormula::PowerLaw => {
            state.rebirth.prestige_points = state.rebirth.prestige_points.saturating_add(q.points)
        }
        PrestigeFormula::DoublingMultiplier => state.rebirth.multiplier *= 2.0,
    }
    state.rebirth.rebirths += 1;

    let starting_balance = state
        .rebirth
        .starting_bonus(state.config.rebirth.starting_bonus);
    state.ledger.reset_to(starting_balance);
    if state.config.reset_lifetime_on_rebirth {
        state.ledger.clear_lifetime();
    }
    for p in &mut state.producers {
        p.owned = 0;
    }
    refresh_rate(state);

    info!(
        rebirths = state.rebirth.rebirths,
        points = q.points,
        multiplier = state.rebirth.production_multiplier(),
        "rebirth complete"
    );
    let msg = match state.config.prestige_formula {
        PrestigeFormula::PowerLaw => format!(
            "🔄 Rebirth #{}! +{} prestige points ({} total)",
            state.rebirth.rebirths, q.points, state.rebirth.prestige_points
        ),
        PrestigeFormula::DoublingMultiplier => format!(
            "🔄 Rebirth #{}! Multiplier is now x{}",
            state.rebirth.rebirths, state.rebirth.multiplier
        ),
    };
    state.add_log(&msg, true);
    achievements::check(state);

    Ok(RebirthOutcome {
        points_awarded: q.points,
        rebirths: state.rebirth.rebirths,
        starting_balance,
    })
}

/// Spend prestige points on one level of `kind`. Returns the new level.
pub fn buy_prestige_upgrade(state: &mut GameState, kind: PrestigeUpgradeKind) -> Result<u32> {
    if !state.config.has_rebirth {
        return Err(GameError::RebirthDisabled);
    }
    if state.config.prestige_formula == PrestigeFormula::DoublingMultiplier {
        return Err(GameError::UpgradesUnavailable);
    }
    let level = state.rebirth.level(kind);
    if level >= kind.max_level() {
        return Err(GameError::MaxLevelReached {
            upgrade: kind.name(),
            max_level: kind.max_level(),
        });
    }
    let cost = kind.cost_at(level);
    if state.rebirth.prestige_points < cost {
        return Err(GameError::InsufficientPrestigePoints {
            needed: cost,
            available: state.rebirth.prestige_points,
        });
    }

    state.rebirth.prestige_points -= cost;
    state.rebirth.levels[kind.index()] = level + 1;
    refresh_rate(state);

    info!(upgrade = kind.name(), level = level + 1, "prestige upgrade bought");
    state.add_log(
        &format!("✦ {} upgraded to level {}", kind.name(), level + 1),
        true,
    );
    Ok(level + 1)
}
