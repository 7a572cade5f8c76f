//! Clicker game state definitions.

use super::achievements::AchievementTracker;
use super::config::{GameConfig, ProducerType};
use super::error::{GameError, Result};
use super::rebirth::RebirthState;
use super::scheduler::ProductionScheduler;

/// Balance and lifetime earnings. The only place currency lives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    balance: f64,
    lifetime_earned: f64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted values.
    pub fn restore(balance: f64, lifetime_earned: f64) -> Self {
        Self {
            balance: balance.max(0.0),
            lifetime_earned: lifetime_earned.max(0.0),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn lifetime_earned(&self) -> f64 {
        self.lifetime_earned
    }

    /// Credit earned currency. Negative and non-finite amounts are ignored.
    pub fn add_currency(&mut self, amount: f64) {
        if !(amount.is_finite() && amount > 0.0) {
            return;
        }
        self.balance += amount;
        self.lifetime_earned += amount;
    }

    /// Deduct a positive `amount` if the balance covers it. No mutation on failure.
    pub fn spend(&mut self, amount: f64) -> Result<()> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(GameError::InvalidAmount(amount));
        }
        if self.balance >= amount {
            self.balance = (self.balance - amount).max(0.0);
            Ok(())
        } else {
            Err(GameError::InsufficientFunds {
                needed: amount,
                available: self.balance,
            })
        }
    }

    /// Set the balance to a granted seed. Lifetime earnings are untouched.
    pub fn reset_to(&mut self, seed: f64) {
        self.balance = if seed.is_finite() { seed.max(0.0) } else { 0.0 };
    }

    pub(crate) fn clear_lifetime(&mut self) {
        self.lifetime_earned = 0.0;
    }
}

/// Cost of the next unit: `floor(base_cost * growth^owned * discount)`,
/// never below 1.
pub fn cost_of(kind: &ProducerType, owned: u32, discount: f64) -> f64 {
    let exponent = owned.min(i32::MAX as u32) as i32;
    (kind.base_cost * kind.growth_rate.powi(exponent) * discount)
        .floor()
        .max(1.0)
}

/// One producer type and how many the player owns.
#[derive(Clone, Debug, PartialEq)]
pub struct Producer {
    pub kind: ProducerType,
    pub owned: u32,
}

impl Producer {
    pub fn new(kind: ProducerType) -> Self {
        Self { kind, owned: 0 }
    }

    pub fn cost(&self, discount: f64) -> f64 {
        cost_of(&self.kind, self.owned, discount)
    }

    /// Unmultiplied currency per second from this producer type.
    pub fn rate(&self) -> f64 {
        self.owned as f64 * self.kind.base_rate
    }
}

/// Log entry shown in the message panel.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub text: String,
    pub is_important: bool,
}

/// Achievement notification, removed when `ticks_left` reaches zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub text: String,
    pub ticks_left: u32,
}

const MAX_LOG: usize = 50;

/// Full state of one game session.
#[derive(Clone, Debug)]
pub struct GameState {
    pub config: GameConfig,
    pub ledger: Ledger,
    pub producers: Vec<Producer>,
    pub total_clicks: u64,
    pub total_ticks: u64,
    pub player_name: String,
    pub achievements: AchievementTracker,
    pub rebirth: RebirthState,
    pub scheduler: ProductionScheduler,
    pub log: Vec<LogEntry>,
    pub toasts: Vec<Toast>,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        let producers = config
            .producers
            .iter()
            .map(|k| Producer::new(k.clone()))
            .collect();
        let scheduler = ProductionScheduler::new(config.tick_interval_ms);
        let welcome = format!("Welcome to {}!", config.title);

        Self {
            config,
            ledger: Ledger::new(),
            producers,
            total_clicks: 0,
            total_ticks: 0,
            player_name: String::new(),
            achievements: AchievementTracker::default(),
            rebirth: RebirthState::default(),
            scheduler,
            log: vec![LogEntry {
                text: welcome,
                is_important: true,
            }],
            toasts: Vec::new(),
        }
    }

    pub fn producer(&self, id: &str) -> Option<&Producer> {
        self.producers.iter().find(|p| p.kind.id == id)
    }

    pub fn producer_index(&self, id: &str) -> Option<usize> {
        self.producers.iter().position(|p| p.kind.id == id)
    }

    pub fn owned(&self, id: &str) -> u32 {
        self.producer(id).map_or(0, |p| p.owned)
    }

    /// Current price of the next unit of producer `idx`, discount applied.
    pub fn cost_at(&self, idx: usize) -> Option<f64> {
        self.producers
            .get(idx)
            .map(|p| p.cost(self.rebirth.cost_discount()))
    }

    /// Currency per second, multipliers applied.
    pub fn rate(&self) -> f64 {
        self.scheduler.rate()
    }

    pub fn add_log(&mut self, text: &str, is_important: bool) {
        self.log.push(LogEntry {
            text: text.to_string(),
            is_important,
        });
        if self.log.len() > MAX_LOG {
            self.log.remove(0);
        }
    }

    pub fn push_toast(&mut self, text: String) {
        let ticks_left = self.config.ticks_for(self.config.timers.toast_ms);
        self.toasts.push(Toast { text, ticks_left });
    }
}
