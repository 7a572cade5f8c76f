//! Clicker game commands: pure functions over `GameState`.

use tracing::{debug, info};

use super::achievements;
use super::error::{GameError, Result};
use super::state::GameState;

/// Manual click. Returns the amount earned.
pub fn click(state: &mut GameState) -> f64 {
    let earned = state.config.click_value * state.rebirth.click_multiplier();
    state.ledger.add_currency(earned);
    state.total_clicks += 1;
    achievements::check(state);
    earned
}

/// Buy one unit of producer `id`. Returns the price paid.
pub fn buy_producer(state: &mut GameState, id: &str) -> Result<f64> {
    let idx = state
        .producer_index(id)
        .ok_or_else(|| GameError::UnknownProducer(id.to_string()))?;
    buy_producer_at(state, idx)
}

/// Buy by catalog position.
pub fn buy_producer_at(state: &mut GameState, idx: usize) -> Result<f64> {
    let cost = match state.cost_at(idx) {
        Some(c) => c,
        None => return Err(GameError::UnknownProducer(format!("#{idx}"))),
    };
    state.ledger.spend(cost)?;
    state.producers[idx].owned += 1;
    refresh_rate(state);

    let p = &state.producers[idx];
    debug!(producer = %p.kind.id, owned = p.owned, cost, "producer bought");
    let msg = format!("Bought {} ({} owned)", p.kind.name, p.owned);
    state.add_log(&msg, false);
    achievements::check(state);
    Ok(cost)
}

/// Advance the simulation by `delta_ticks` ticks.
pub fn tick(state: &mut GameState, delta_ticks: u32) {
    if delta_ticks == 0 {
        return;
    }
    state.scheduler.tick(&mut state.ledger, delta_ticks);
    state.total_ticks += delta_ticks as u64;

    for toast in &mut state.toasts {
        toast.ticks_left = toast.ticks_left.saturating_sub(delta_ticks);
    }
    state.toasts.retain(|t| t.ticks_left > 0);

    achievements::check(state);
}

/// Rebuild the cached production rate from the catalog and multipliers.
pub fn refresh_rate(state: &mut GameState) {
    let multiplier = state.rebirth.production_multiplier();
    state.scheduler.recompute(&state.producers, multiplier);
}

/// Wipe the current run: ledger, producers, achievements and clicks.
/// Rebirth progress and the player name survive.
pub fn hard_reset(state: &mut GameState) {
    state.ledger = Default::default();
    for p in &mut state.producers {
        p.owned = 0;
    }
    state.achievements.clear();
    state.total_clicks = 0;
    state.toasts.clear();
    state.rebirth.pending = None;
    refresh_rate(state);
    info!("progress reset");
    state.add_log("Progress reset. Prestige kept.", true);
}

/// Format a number with K/M/B/T suffixes (two decimals) from 1000 up,
/// and as a whole number below.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "0".to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }
    const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    for (scale, suffix) in SUFFIXES {
        if n >= scale {
            return format!("{:.2}{}", n / scale, suffix);
        }
    }
    format!("{}", n.floor() as u64)
}

/// Format a per-second rate; keeps one decimal below 10.
pub fn format_rate(n: f64) -> String {
    if n > 0.0 && n < 10.0 {
        format!("{:.1}", n)
    } else {
        format_number(n)
    }
}
