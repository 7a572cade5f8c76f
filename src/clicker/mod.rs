/// Clicker game: one economy, configured per variant.

pub mod achievements;
pub mod actions;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod logic;
pub mod rebirth;
pub mod render;
pub mod save;
pub mod scheduler;
pub mod session;
pub mod state;

use crate::input::InputEvent;

use config::GameConfig;
use rebirth::PrestigeUpgradeKind;
use state::GameState;

/// Which confirmation, if any, is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Play,
    ConfirmRebirth,
    ConfirmReset,
}

/// What the caller has to do after an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    Ignored,
    Handled,
    /// The player confirmed a full reset. Stored progress must go too,
    /// which is the session's job.
    ResetConfirmed,
}

pub struct ClickerGame {
    pub state: GameState,
    pub mode: UiMode,
}

impl ClickerGame {
    pub fn new(config: GameConfig) -> Self {
        Self {
            state: GameState::new(config),
            mode: UiMode::Play,
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) -> Response {
        let action = match event {
            InputEvent::Click(id) => Some(*id),
            InputEvent::Key(c) => self.key_action(*c),
        };
        match action {
            Some(id) => self.dispatch(id),
            None => Response::Ignored,
        }
    }

    pub fn tick(&mut self, delta_ticks: u32) {
        logic::tick(&mut self.state, delta_ticks);
    }

    fn key_action(&self, key: char) -> Option<u16> {
        if self.mode != UiMode::Play {
            return match key {
                'y' | 'Y' => Some(actions::CONFIRM),
                'n' | 'N' => Some(actions::CANCEL),
                _ => None,
            };
        }
        match key {
            'c' | ' ' => Some(actions::CLICK_ICON),
            '1'..='9' => Some(actions::BUY_PRODUCER_BASE + (key as u16 - '1' as u16)),
            'r' => Some(actions::REQUEST_REBIRTH),
            'x' => Some(actions::REQUEST_RESET),
            _ => actions::UPGRADE_KEYS
                .iter()
                .position(|&k| k == key)
                .map(|i| actions::BUY_PRESTIGE_UPGRADE_BASE + i as u16),
        }
    }

    fn dispatch(&mut self, action: u16) -> Response {
        let producer_count = self.state.producers.len() as u16;
        let upgrade_count = PrestigeUpgradeKind::all().len() as u16;

        match (self.mode, action) {
            (UiMode::ConfirmRebirth, actions::CONFIRM) => {
                self.mode = UiMode::Play;
                let result = rebirth::confirm_rebirth(&mut self.state);
                self.report(result.map(|_| ()));
            }
            (UiMode::ConfirmRebirth, actions::CANCEL) => {
                rebirth::cancel_rebirth(&mut self.state);
                self.mode = UiMode::Play;
            }
            (UiMode::ConfirmReset, actions::CONFIRM) => {
                self.mode = UiMode::Play;
                return Response::ResetConfirmed;
            }
            (UiMode::ConfirmReset, actions::CANCEL) => self.mode = UiMode::Play,
            (UiMode::Play, actions::CLICK_ICON) => {
                logic::click(&mut self.state);
            }
            (UiMode::Play, id)
                if (actions::BUY_PRODUCER_BASE..actions::BUY_PRODUCER_BASE + producer_count)
                    .contains(&id) =>
            {
                let idx = (id - actions::BUY_PRODUCER_BASE) as usize;
                let result = logic::buy_producer_at(&mut self.state, idx);
                self.report(result.map(|_| ()));
            }
            (UiMode::Play, actions::REQUEST_REBIRTH) => {
                match rebirth::request_rebirth(&mut self.state) {
                    Ok(_) => self.mode = UiMode::ConfirmRebirth,
                    Err(e) => self.report(Err(e)),
                }
            }
            (UiMode::Play, actions::REQUEST_RESET) => self.mode = UiMode::ConfirmReset,
            (UiMode::Play, id)
                if (actions::BUY_PRESTIGE_UPGRADE_BASE
                    ..actions::BUY_PRESTIGE_UPGRADE_BASE + upgrade_count)
                    .contains(&id) =>
            {
                let kind = PrestigeUpgradeKind::all()[(id - actions::BUY_PRESTIGE_UPGRADE_BASE) as usize];
                let result = rebirth::buy_prestige_upgrade(&mut self.state, kind);
                self.report(result.map(|_| ()));
            }
            _ => return Response::Ignored,
        }
        Response::Handled
    }

    /// Rejections go to the message log.
    fn report(&mut self, result: error::Result<()>) {
        if let Err(e) = result {
            self.state.add_log(&format!("✗ {e}"), false);
        }
    }
}
