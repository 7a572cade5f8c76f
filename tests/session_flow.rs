//! Whole-session scenarios against the in-memory store.

use std::cell::RefCell;
use std::rc::Rc;

use clicker_sim::clicker::actions;
use clicker_sim::clicker::config::GameConfig;
use clicker_sim::clicker::save::{KeyValueStore, LoadSource, MemoryStore, PersistenceGateway};
use clicker_sim::clicker::session::Session;
use clicker_sim::clicker::{Response, UiMode};
use clicker_sim::input::{ClickState, InputEvent};
use clicker_sim::time::GameTime;
use ratzilla::ratatui::backend::TestBackend;
use ratzilla::ratatui::Terminal;

fn key(session: &mut Session<MemoryStore>, c: char) -> Response {
    session.handle_input(&InputEvent::Key(c), 0.0)
}

/// Drive the session the way the frame loop does: 60 frames per second.
fn run_seconds(session: &mut Session<MemoryStore>, clock: &mut GameTime, start_ms: f64, secs: u32) -> f64 {
    let mut now = start_ms;
    for _ in 0..secs * 60 {
        now += 1000.0 / 60.0;
        let ticks = clock.update(now);
        session.advance(ticks, now);
    }
    now
}

#[test]
fn play_save_reload() {
    let mut s = Session::open(GameConfig::default(), MemoryStore::new());
    s.set_player_name("Ada");
    for _ in 0..15 {
        key(&mut s, 'c');
    }
    assert_eq!(key(&mut s, '1'), Response::Handled);
    assert_eq!(s.state().owned("cursor"), 1);

    let mut clock = GameTime::new(s.state().config.tick_interval_ms);
    clock.update(0.0);
    run_seconds(&mut s, &mut clock, 0.0, 11);

    // 11 s at 0.1/s on top of nothing left after the purchase
    let balance = s.state().ledger.balance();
    assert!(balance > 0.9 && balance < 1.2, "{balance}");
    assert!(s.gateway().saved_at().is_some());
    assert_eq!(s.leaderboard().rank_of("Ada"), Some(1));

    let reopened = Session::open(GameConfig::default(), s.gateway().store().clone());
    assert_eq!(reopened.state().owned("cursor"), 1);
    assert_eq!(reopened.state().player_name, "Ada");
    assert!(reopened.state().achievements.is_fired("first_click"));
}

#[test]
fn full_prestige_cycle() {
    let mut s = Session::open(GameConfig::default(), MemoryStore::new());
    s.game.state.ledger.add_currency(9_000.0);

    key(&mut s, 'r');
    assert_eq!(s.game.mode, UiMode::ConfirmRebirth);
    key(&mut s, 'y');
    assert_eq!(s.state().rebirth.rebirths, 1);
    assert_eq!(s.state().rebirth.prestige_points, 3);

    // spend points: click power then production
    key(&mut s, 'u');
    key(&mut s, 'i');
    assert_eq!(s.state().rebirth.prestige_points, 1);
    key(&mut s, 'c');
    assert_eq!(s.state().ledger.balance(), 2.0);

    // still eligible on lifetime earnings, but a balance of 2 awards nothing
    key(&mut s, 'r');
    assert_eq!(s.game.mode, UiMode::Play);

    let stored = s.gateway().load_rebirth().unwrap();
    assert_eq!(stored.rebirth.rebirths, 1);
    assert_eq!(stored.rebirth.upgrades.get("click_power"), Some(&1));
}

#[test]
fn pizza_variant_awards_points() {
    let config = GameConfig::preset("pizza").unwrap();
    let mut s = Session::open(config, MemoryStore::new());
    s.game.state.ledger.add_currency(4_000.0);
    key(&mut s, 'r');
    key(&mut s, 'y');
    assert_eq!(s.state().rebirth.prestige_points, 2);
    assert_eq!(s.state().ledger.lifetime_earned(), 0.0);

    key(&mut s, 'u');
    assert_eq!(s.state().rebirth.prestige_points, 1);
    key(&mut s, 'c');
    assert_eq!(s.state().ledger.balance(), 2.0);
    assert!(s.gateway().store().raw("pizza_clicker_rebirth").is_some());
}

#[test]
fn rush_variant_doubles_multiplier() {
    let config = GameConfig::preset("rush").unwrap();
    let mut s = Session::open(config, MemoryStore::new());
    s.game.state.ledger.add_currency(1_000.0);
    key(&mut s, 'r');
    key(&mut s, 'y');
    assert_eq!(s.state().rebirth.multiplier, 2.0);
    assert_eq!(s.state().rebirth.prestige_points, 0);

    key(&mut s, 'c');
    assert_eq!(s.state().ledger.balance(), 2.0);
    assert!(s.gateway().store().raw("pizza_rush_rebirth").is_some());
}

#[test]
fn damaged_primary_falls_back_to_backup() {
    let mut s = Session::open(GameConfig::default(), MemoryStore::new());
    s.game.state.ledger.add_currency(30.0);
    s.save_now(1.0);
    s.game.state.ledger.add_currency(30.0);
    s.save_now(2.0);

    let mut store = s.gateway().store().clone();
    store.insert_raw("cookie_clicker_save", "{\"balance\": 60, \"lifetime");

    let gateway = PersistenceGateway::new(store.clone(), "cookie_clicker");
    assert_eq!(gateway.load().source, LoadSource::Backup);

    let reopened = Session::open(GameConfig::default(), store);
    assert_eq!(reopened.state().ledger.balance(), 30.0);
}

#[test]
fn reset_keeps_leaderboard_and_prestige() {
    let mut s = Session::open(GameConfig::default(), MemoryStore::new());
    s.set_player_name("Bo");
    s.game.state.ledger.add_currency(2_000.0);
    key(&mut s, 'r');
    key(&mut s, 'y');
    s.refresh_leaderboard();

    key(&mut s, 'x');
    assert_eq!(key(&mut s, 'y'), Response::ResetConfirmed);

    let store = s.gateway().store();
    assert!(store.get("cookie_clicker_save").unwrap().is_none());
    assert!(store.get("cookie_clicker_leaderboard").unwrap().is_some());

    let reopened = Session::open(GameConfig::default(), store.clone());
    assert_eq!(reopened.state().rebirth.rebirths, 1);
    assert_eq!(reopened.state().player_name, "Bo");
    assert_eq!(reopened.leaderboard().rank_of("Bo"), Some(1));
}

fn draw(session: &Session<MemoryStore>, width: u16, height: u16) -> (String, Rc<RefCell<ClickState>>) {
    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal
        .draw(|f| {
            let area = f.area();
            session.render(f, area, &click_state);
        })
        .unwrap();
    let text: String = terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect();
    (text, click_state)
}

#[test]
fn every_button_is_clickable() {
    let s = Session::open(GameConfig::default(), MemoryStore::new());
    for (width, height) in [(100, 40), (50, 48)] {
        let (text, cs) = draw(&s, width, height);
        assert!(text.contains("Producers"));
        let ids: Vec<u16> = cs.borrow().targets.iter().map(|t| t.action_id).collect();
        assert!(ids.contains(&actions::CLICK_ICON));
        for i in 0..5 {
            assert!(ids.contains(&(actions::BUY_PRODUCER_BASE + i)), "producer {i} at {width}");
        }
        assert!(ids.contains(&actions::REQUEST_REBIRTH));
        assert!(ids.contains(&actions::REQUEST_RESET));
        assert!(ids.contains(&(actions::BUY_PRESTIGE_UPGRADE_BASE + 3)));
    }
}

#[test]
fn confirmation_dialog_registers_buttons() {
    let mut s = Session::open(GameConfig::default(), MemoryStore::new());
    key(&mut s, 'x');
    let (text, cs) = draw(&s, 100, 40);
    assert!(text.contains("Confirm"));
    let cs = cs.borrow();
    let confirm = cs
        .targets
        .iter()
        .find(|t| t.action_id == actions::CONFIRM)
        .unwrap()
        .rect;
    assert_eq!(cs.hit_test(confirm.x, confirm.y), Some(actions::CONFIRM));
    // the click icon is covered by the modal
    assert_ne!(cs.hit_test(0, 5), Some(actions::CLICK_ICON));
}
