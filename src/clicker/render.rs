//! Clicker rendering: balance header, click icon, producer rows, rebirth
//! panel, log with toasts, leaderboard and confirmation dialogs.

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::input::{is_narrow_layout, ClickState};

use super::actions;
use super::config::PrestigeFormula;
use super::leaderboard::Leaderboard;
use super::logic::{format_number, format_rate};
use super::rebirth::{self, PrestigeUpgradeKind, RebirthPhase};
use super::state::GameState;
use super::{ClickerGame, UiMode};

const ICON_ART: [&str; 3] = ["╭━●━●━╮", "━●━━●━●", "╰━●━●━╯"];

pub fn render(
    game: &ClickerGame,
    leaderboard: &Leaderboard,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let state = &game.state;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(state, f, rows[0]);

    if is_narrow_layout(area.width) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(state.producers.len() as u16 + 2),
                Constraint::Length(rebirth_height(state)),
                Constraint::Min(3),
            ])
            .split(rows[1]);
        render_icon(state, f, chunks[0], click_state);
        render_producers(state, f, chunks[1], click_state);
        render_rebirth(state, f, chunks[2], click_state);
        render_log(state, f, chunks[3]);
    } else {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(state.producers.len() as u16 + 2),
                Constraint::Min(rebirth_height(state)),
            ])
            .split(cols[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(12)])
            .split(cols[1]);
        render_icon(state, f, left[0], click_state);
        render_producers(state, f, left[1], click_state);
        render_rebirth(state, f, left[2], click_state);
        render_log(state, f, right[0]);
        render_leaderboard(state, leaderboard, f, right[1]);
    }

    render_help(game, f, rows[2]);

    match game.mode {
        UiMode::Play => {}
        UiMode::ConfirmRebirth => render_confirm_rebirth(state, f, area, click_state),
        UiMode::ConfirmReset => render_dialog(
            f,
            area,
            " Reset ",
            vec![
                Line::from("Wipe all progress and achievements?"),
                Line::from("Rebirths and prestige are kept."),
            ],
            click_state,
        ),
    }
}

fn rebirth_height(state: &GameState) -> u16 {
    if !state.config.has_rebirth {
        3
    } else if state.config.prestige_formula == PrestigeFormula::PowerLaw {
        4 + PrestigeUpgradeKind::all().len() as u16 + 2
    } else {
        4 + 2
    }
}

fn render_header(state: &GameState, f: &mut Frame, area: Rect) {
    let mut second = vec![Span::styled(
        format!("{}/s", format_rate(state.rate())),
        Style::default().fg(Color::Green),
    )];
    if state.rebirth.rebirths > 0 {
        second.push(Span::styled(
            format!("  ✦ rebirths {}", state.rebirth.rebirths),
            Style::default().fg(Color::Magenta),
        ));
    }
    if !state.player_name.is_empty() {
        second.push(Span::styled(
            format!("  {}", state.player_name),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let lines = vec![
        Line::from(Span::styled(
            format!("{} {}", format_number(state.ledger.balance()), state.config.currency),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(second),
    ];
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} ", state.config.title)),
        );
    f.render_widget(widget, area);
}

fn render_icon(state: &GameState, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let style = Style::default().fg(Color::Yellow);
    let mut lines: Vec<Line> = ICON_ART
        .iter()
        .map(|l| Line::from(Span::styled(*l, style)))
        .collect();
    lines[1].spans.push(Span::styled(
        format!("  [C] +{}", format_rate(state.config.click_value * state.rebirth.click_multiplier())),
        Style::default().fg(Color::White),
    ));
    let widget = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Click! "),
    );
    f.render_widget(widget, area);

    click_state
        .borrow_mut()
        .add_click_target(area, actions::CLICK_ICON);
}

fn render_producers(
    state: &GameState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let lines: Vec<Line> = state
        .producers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let cost = state.cost_at(i).unwrap_or(f64::INFINITY);
            let affordable = state.ledger.balance() >= cost;
            let (key_style, text_style) = if affordable {
                (
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::White),
                )
            } else {
                (
                    Style::default().fg(Color::DarkGray),
                    Style::default().fg(Color::DarkGray),
                )
            };
            Line::from(vec![
                Span::styled(format!(" [{}] ", i + 1), key_style),
                Span::styled(format!("{:<10}", p.kind.name), text_style),
                Span::styled(format!(" x{:<4}", p.owned), Style::default().fg(Color::Cyan)),
                Span::styled(format!(" {:>9}", format_number(cost)), text_style),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Producers "),
    );
    f.render_widget(widget, area);

    let mut cs = click_state.borrow_mut();
    for i in 0..state.producers.len() {
        cs.add_row_target(area, area.y + 1 + i as u16, actions::BUY_PRODUCER_BASE + i as u16);
    }
}

fn render_rebirth(
    state: &GameState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Rebirth ");

    let phase = rebirth::phase(state);
    if phase == RebirthPhase::Disabled {
        let widget = Paragraph::new(Line::from(Span::styled(
            " [X] Reset progress",
            Style::default().fg(Color::Red),
        )))
        .block(block);
        f.render_widget(widget, area);
        click_state
            .borrow_mut()
            .add_row_target(area, area.y + 1, actions::REQUEST_RESET);
        return;
    }

    let threshold = state.rebirth.threshold(&state.config.rebirth);
    let status = match phase {
        RebirthPhase::Eligible | RebirthPhase::AwaitingConfirmation => Span::styled(
            " [R] Rebirth available!",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        _ => Span::styled(
            format!(
                " [R] Rebirth at {} earned ({}%)",
                format_number(threshold),
                ((state.ledger.lifetime_earned() / threshold) * 100.0).min(100.0) as u32
            ),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let summary = match state.config.prestige_formula {
        PrestigeFormula::PowerLaw => format!(
            " Prestige points: {}  (+{} now)",
            state.rebirth.prestige_points,
            rebirth::points_for(&state.config.rebirth, state.ledger.balance())
        ),
        PrestigeFormula::DoublingMultiplier => {
            format!(" Multiplier: x{}", format_rate(state.rebirth.multiplier))
        }
    };

    let mut lines = vec![
        Line::from(status),
        Line::from(Span::styled(summary, Style::default().fg(Color::White))),
        Line::from(Span::styled(
            " [X] Reset progress",
            Style::default().fg(Color::Red),
        )),
    ];
    let upgrades = state.config.prestige_formula == PrestigeFormula::PowerLaw;
    if upgrades {
        for (i, kind) in PrestigeUpgradeKind::all().iter().enumerate() {
            let level = state.rebirth.level(*kind);
            let label = if level >= kind.max_level() {
                "MAX".to_string()
            } else {
                format!("{} pts", kind.cost_at(level))
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" [{}] ", actions::UPGRADE_KEYS[i]),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!("{:<15} {}/{} ", kind.name(), level, kind.max_level()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(label, Style::default().fg(Color::Cyan)),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines).block(block), area);

    let mut cs = click_state.borrow_mut();
    cs.add_row_target(area, area.y + 1, actions::REQUEST_REBIRTH);
    cs.add_row_target(area, area.y + 3, actions::REQUEST_RESET);
    if upgrades {
        for i in 0..PrestigeUpgradeKind::all().len() as u16 {
            cs.add_row_target(area, area.y + 4 + i, actions::BUY_PRESTIGE_UPGRADE_BASE + i);
        }
    }
}

fn render_log(state: &GameState, f: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = state
        .toasts
        .iter()
        .map(|t| {
            Line::from(Span::styled(
                t.text.as_str(),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();

    let visible = (area.height.saturating_sub(2) as usize).saturating_sub(lines.len());
    let start = state.log.len().saturating_sub(visible);
    lines.extend(state.log[start..].iter().map(|entry| {
        let style = if entry.is_important {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Line::from(Span::styled(entry.text.as_str(), style))
    }));

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" Log "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn render_leaderboard(state: &GameState, leaderboard: &Leaderboard, f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = if leaderboard.is_empty() {
        vec![Line::from(Span::styled(
            " no entries yet",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        leaderboard
            .entries()
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let style = if e.name == state.player_name {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(
                    format!(
                        " {:>2}. {:<14} {:>9} {:>7}/s",
                        i + 1,
                        e.name,
                        format_number(e.balance),
                        format_rate(e.rate)
                    ),
                    style,
                ))
            })
            .collect()
    };
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Leaderboard "),
    );
    f.render_widget(widget, area);
}

fn render_help(game: &ClickerGame, f: &mut Frame, area: Rect) {
    let text = match game.mode {
        UiMode::Play => "[C] click  [1-9] buy  [R] rebirth  [U I O P] upgrades  [X] reset",
        UiMode::ConfirmRebirth | UiMode::ConfirmReset => "[Y] confirm  [N] cancel",
    };
    let widget = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(widget, area);
}

fn render_confirm_rebirth(
    state: &GameState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut lines = vec![Line::from("Reset this run for a permanent bonus?")];
    if let Some(q) = &state.rebirth.pending {
        let reward = match state.config.prestige_formula {
            PrestigeFormula::PowerLaw => format!("+{} prestige points", q.points),
            PrestigeFormula::DoublingMultiplier => {
                format!("multiplier becomes x{}", format_rate(q.multiplier_after))
            }
        };
        lines.push(Line::from(Span::styled(
            reward,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )));
    }
    render_dialog(f, area, " Rebirth ", lines, click_state);
}

/// Centered modal with confirm and cancel rows. Its targets cover
/// everything registered before it.
fn render_dialog(
    f: &mut Frame,
    area: Rect,
    title: &str,
    mut lines: Vec<Line<'static>>,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let width = area.width.min(44);
    let height = (lines.len() as u16 + 5).min(area.height);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Y] Confirm",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        "[N] Cancel",
        Style::default().fg(Color::Red),
    )));
    let confirm_row = rect.y + 1 + lines.len() as u16 - 2;

    f.render_widget(Clear, rect);
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta))
                .title(title.to_string()),
        );
    f.render_widget(widget, rect);

    let mut cs = click_state.borrow_mut();
    // modal: clicks outside the buttons do nothing
    cs.add_click_target(area, u16::MAX);
    cs.add_row_target(rect, confirm_row, actions::CONFIRM);
    cs.add_row_target(rect, confirm_row + 1, actions::CANCEL);
}
