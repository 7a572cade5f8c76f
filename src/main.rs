use std::{cell::RefCell, io, rc::Rc};

use clicker_sim::clicker::actions;
use clicker_sim::clicker::config::GameConfig;
#[cfg(not(target_arch = "wasm32"))]
use clicker_sim::clicker::save::MemoryStore;
#[cfg(target_arch = "wasm32")]
use clicker_sim::clicker::save::LocalStorage;
use clicker_sim::clicker::session::{Session, DEFAULT_PLAYER_NAME};
use clicker_sim::input::{pixel_x_to_col, pixel_y_to_row, ClickState, InputEvent};
use clicker_sim::logging;
use clicker_sim::time::GameTime;
use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
use ratzilla::ratatui::Terminal;
use ratzilla::{DomBackend, WebRenderer};
use tracing::{debug, warn, Level};

#[cfg(target_arch = "wasm32")]
fn open_store() -> LocalStorage {
    LocalStorage::new()
}

#[cfg(not(target_arch = "wasm32"))]
fn open_store() -> MemoryStore {
    MemoryStore::new()
}

/// Variant named by the URL fragment (`#pizza`), cookie otherwise.
fn preset_name() -> String {
    web_sys::window()
        .and_then(|w| w.location().hash().ok())
        .map(|h| h.trim_start_matches('#').to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "cookie".to_string())
}

fn prompt_player_name() -> String {
    web_sys::window()
        .and_then(|w| {
            w.prompt_with_message_and_default("Enter your name:", DEFAULT_PLAYER_NAME)
                .ok()
                .flatten()
        })
        .unwrap_or_default()
}

/// Map a pointer position to a terminal cell using the grid container's rect.
fn dom_pixel_to_cell(mouse_x: u32, mouse_y: u32, cs: &ClickState) -> Option<(u16, u16)> {
    let document = web_sys::window()?.document()?;
    // DomBackend renders the grid into a <div> directly under <body>.
    let grid = document.query_selector("body > div").ok()??;
    let rect = grid.get_bounding_client_rect();

    let col = pixel_x_to_col(mouse_x as f64 - rect.left(), rect.width(), cs.terminal_cols)?;
    let row = pixel_y_to_row(mouse_y as f64 - rect.top(), rect.height(), cs.terminal_rows)?;
    debug!(col, row, targets = cs.targets.len(), "click");
    Some((col, row))
}

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();
    logging::init(Level::INFO);

    let preset = preset_name();
    let config = GameConfig::preset(&preset).unwrap_or_else(|e| {
        warn!(preset = %preset, error = %e, "unknown variant, playing cookie");
        GameConfig::default()
    });
    let clock = Rc::new(RefCell::new(GameTime::new(config.tick_interval_ms)));

    let mut session = Session::open(config, open_store());
    if session.state().player_name.is_empty() {
        session.set_player_name(&prompt_player_name());
    }
    let session = Rc::new(RefCell::new(session));
    let click_state = Rc::new(RefCell::new(ClickState::new()));

    let backend = DomBackend::new()?;
    let terminal = Terminal::new(backend)?;

    terminal.on_mouse_event({
        let session = session.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.event != MouseEventKind::Pressed
                || mouse_event.button != MouseButton::Left
            {
                return;
            }
            let cs = click_state.borrow();
            if cs.terminal_rows == 0 || cs.terminal_cols == 0 {
                return;
            }
            let action = dom_pixel_to_cell(mouse_event.x, mouse_event.y, &cs)
                .and_then(|(col, row)| cs.hit_test(col, row));
            drop(cs);

            if let Some(id) = action {
                session
                    .borrow_mut()
                    .handle_input(&InputEvent::Click(id), js_sys::Date::now());
            }
        }
    });

    terminal.on_key_event({
        let session = session.clone();
        move |key_event| {
            let event = match key_event.code {
                KeyCode::Char(c) => InputEvent::Key(c),
                KeyCode::Enter => InputEvent::Click(actions::CONFIRM),
                KeyCode::Esc => InputEvent::Click(actions::CANCEL),
                _ => return,
            };
            session
                .borrow_mut()
                .handle_input(&event, js_sys::Date::now());
        }
    });

    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let now = js_sys::Date::now();
            let ticks = clock.borrow_mut().update(now);
            let mut s = session.borrow_mut();
            s.advance(ticks, now);

            let area = f.area();
            {
                let mut cs = click_state.borrow_mut();
                cs.terminal_cols = area.width;
                cs.terminal_rows = area.height;
                cs.clear_targets();
            }
            s.render(f, area, &click_state);
        }
    });

    Ok(())
}
