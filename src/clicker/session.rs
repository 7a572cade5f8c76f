//! A running game wired to storage: restores on open, autosaves and
//! refreshes the leaderboard on tick-counted timers.

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Frame;
use tracing::{info, warn};

use crate::input::{ClickState, InputEvent};

use super::config::GameConfig;
use super::leaderboard::{Leaderboard, LeaderboardEntry};
use super::logic;
use super::render;
use super::save::{
    KeyValueStore, LoadSource, PersistenceGateway, RebirthRecord, RebirthSave, SaveRecord,
};
use super::state::GameState;
use super::{ClickerGame, Response};

pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

pub struct Session<S: KeyValueStore> {
    pub game: ClickerGame,
    gateway: PersistenceGateway<S>,
    leaderboard: Leaderboard,
    autosave_ticks: u32,
    leaderboard_ticks: u32,
    since_save: u32,
    since_leaderboard: u32,
}

impl<S: KeyValueStore> Session<S> {
    /// Build the game and restore whatever the store holds.
    pub fn open(config: GameConfig, store: S) -> Self {
        let gateway = PersistenceGateway::new(store, &config.storage_prefix);
        let autosave_ticks = config.ticks_for(config.timers.autosave_ms);
        let leaderboard_ticks = config.ticks_for(config.timers.leaderboard_refresh_ms);
        let mut game = ClickerGame::new(config);

        let outcome = gateway.load();
        outcome.record.apply(&mut game.state);
        // The rebirth record is written on every rebirth and outlives a
        // progress reset, so it is the authority for prestige.
        if let Some(record) = gateway.load_rebirth() {
            record.rebirth.apply(&mut game.state.rebirth);
            if game.state.player_name.is_empty() {
                game.state.player_name = record.player_name;
            }
            logic::refresh_rate(&mut game.state);
        }
        match outcome.source {
            LoadSource::Primary => game.state.add_log("Progress loaded.", false),
            LoadSource::Backup => game
                .state
                .add_log("Save was damaged, restored the previous one.", true),
            LoadSource::Fresh => {}
        }
        info!(source = ?outcome.source, rebirths = game.state.rebirth.rebirths, "session opened");

        let leaderboard = gateway.load_leaderboard();
        Self {
            game,
            gateway,
            leaderboard,
            autosave_ticks,
            leaderboard_ticks,
            since_save: 0,
            since_leaderboard: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.game.state
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut PersistenceGateway<S> {
        &mut self.gateway
    }

    /// Name shown on the leaderboard. Blank input keeps the default.
    pub fn set_player_name(&mut self, name: &str) {
        let name = name.trim();
        self.game.state.player_name = if name.is_empty() {
            DEFAULT_PLAYER_NAME.to_string()
        } else {
            name.to_string()
        };
    }

    /// Run `delta_ticks` production ticks and any timers that came due.
    pub fn advance(&mut self, delta_ticks: u32, now_ms: f64) {
        if delta_ticks == 0 {
            return;
        }
        self.game.tick(delta_ticks);

        self.since_save += delta_ticks;
        if self.since_save >= self.autosave_ticks {
            self.since_save = 0;
            self.save_now(now_ms);
        }
        self.since_leaderboard += delta_ticks;
        if self.since_leaderboard >= self.leaderboard_ticks {
            self.since_leaderboard = 0;
            self.refresh_leaderboard();
        }
    }

    /// Persist the snapshot and the rebirth record. A failure is logged
    /// and the next autosave tries again.
    pub fn save_now(&mut self, now_ms: f64) -> bool {
        let record = SaveRecord::capture(&self.game.state);
        let saved = self.gateway.save(&record, now_ms);
        let rebirth = self
            .gateway
            .save_rebirth(&RebirthRecord::capture(&self.game.state));
        match saved.and(rebirth) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "save failed, retrying at next autosave");
                false
            }
        }
    }

    pub fn refresh_leaderboard(&mut self) {
        let state = &self.game.state;
        let name = if state.player_name.is_empty() {
            DEFAULT_PLAYER_NAME.to_string()
        } else {
            state.player_name.clone()
        };
        self.leaderboard.upsert(LeaderboardEntry {
            name,
            balance: state.ledger.balance(),
            rate: state.rate(),
        });
        if let Err(e) = self.gateway.save_leaderboard(&self.leaderboard) {
            warn!(error = %e, "failed to store leaderboard");
        }
    }

    /// Route input to the game and persist what must not wait for the
    /// next autosave: completed rebirths, upgrades and resets.
    pub fn handle_input(&mut self, event: &InputEvent, now_ms: f64) -> Response {
        let before = RebirthSave::capture(&self.game.state.rebirth);
        let response = self.game.handle_input(event);
        if response == Response::ResetConfirmed {
            self.hard_reset();
        } else if RebirthSave::capture(&self.game.state.rebirth) != before {
            self.save_now(now_ms);
        }
        response
    }

    /// Clear the run and its stored snapshots. Prestige is kept.
    pub fn hard_reset(&mut self) {
        logic::hard_reset(&mut self.game.state);
        if let Err(e) = self.gateway.clear_progress() {
            warn!(error = %e, "failed to clear stored progress");
        }
        if let Err(e) = self
            .gateway
            .save_rebirth(&RebirthRecord::capture(&self.game.state))
        {
            warn!(error = %e, "failed to store rebirth record");
        }
        self.since_save = 0;
    }

    pub fn render(&self, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
        render::render(&self.game, &self.leaderboard, f, area, click_state);
    }
}
