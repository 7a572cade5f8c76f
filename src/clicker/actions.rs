//! Semantic action ids for click targets.
//!
//! Registered during render and dispatched back through `InputEvent::Click`.

// ── Core ────────────────────────────────────────────────────────
pub const CLICK_ICON: u16 = 0;

// ── Producer purchase (base + catalog index) ────────────────────
pub const BUY_PRODUCER_BASE: u16 = 100;

// ── Rebirth panel ───────────────────────────────────────────────
pub const REQUEST_REBIRTH: u16 = 500;
pub const REQUEST_RESET: u16 = 510;

// ── Prestige upgrade purchase (base + upgrade index) ────────────
pub const BUY_PRESTIGE_UPGRADE_BASE: u16 = 600;

/// Keyboard shortcuts for the prestige upgrades, in upgrade order.
pub const UPGRADE_KEYS: [char; 4] = ['u', 'i', 'o', 'p'];

// ── Confirmation dialog ─────────────────────────────────────────
pub const CONFIRM: u16 = 900;
pub const CANCEL: u16 = 901;
