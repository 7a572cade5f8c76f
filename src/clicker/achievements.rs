//! One-shot achievements.
//!
//! The list is fixed and evaluated in order after every state change. An
//! id enters the fired set once and stays there until a full reset.

use std::collections::BTreeSet;

use tracing::info;

use super::state::GameState;

/// What has to be true for an achievement to fire.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    LifetimeEarned(f64),
    /// Owned count of a producer id. Ids absent from the catalog never match.
    ProducerOwned { producer: &'static str, count: u32 },
    Rebirths(u32),
}

impl Condition {
    pub fn is_met(&self, state: &GameState) -> bool {
        match self {
            Condition::LifetimeEarned(threshold) => state.ledger.lifetime_earned() >= *threshold,
            Condition::ProducerOwned { producer, count } => {
                state.producer(producer).is_some_and(|p| p.owned >= *count)
            }
            Condition::Rebirths(n) => state.rebirth.rebirths >= *n,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub condition: Condition,
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_click",
        name: "First Click!",
        condition: Condition::LifetimeEarned(1.0),
    },
    AchievementDef {
        id: "hundred_earned",
        name: "100 Earned!",
        condition: Condition::LifetimeEarned(100.0),
    },
    AchievementDef {
        id: "thousand_earned",
        name: "1,000 Earned!",
        condition: Condition::LifetimeEarned(1_000.0),
    },
    AchievementDef {
        id: "million_earned",
        name: "1,000,000 Earned!",
        condition: Condition::LifetimeEarned(1_000_000.0),
    },
    AchievementDef {
        id: "cursor_10",
        name: "10 Cursors!",
        condition: Condition::ProducerOwned {
            producer: "cursor",
            count: 10,
        },
    },
    AchievementDef {
        id: "grandma_10",
        name: "10 Grandmas!",
        condition: Condition::ProducerOwned {
            producer: "grandma",
            count: 10,
        },
    },
    AchievementDef {
        id: "farm_10",
        name: "10 Farms!",
        condition: Condition::ProducerOwned {
            producer: "farm",
            count: 10,
        },
    },
    AchievementDef {
        id: "first_rebirth",
        name: "Born Again",
        condition: Condition::Rebirths(1),
    },
];

/// Ids of achievements that already fired.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AchievementTracker {
    fired: BTreeSet<String>,
}

impl AchievementTracker {
    pub fn is_fired(&self, id: &str) -> bool {
        self.fired.contains(id)
    }

    pub fn fired(&self) -> &BTreeSet<String> {
        &self.fired
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// Replace the fired set with persisted ids. Unknown ids are kept so a
    /// catalog change never loses history.
    pub fn restore<I: IntoIterator<Item = String>>(&mut self, ids: I) {
        self.fired = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.fired.clear();
    }

    /// Returns true if `id` was not fired before.
    fn mark(&mut self, id: &str) -> bool {
        self.fired.insert(id.to_string())
    }
}

/// Fire every achievement whose condition now holds. Each newly fired
/// achievement produces one toast and one log entry.
pub fn check(state: &mut GameState) -> Vec<&'static AchievementDef> {
    let view: &GameState = state;
    let newly: Vec<&'static AchievementDef> = ACHIEVEMENTS
        .iter()
        .filter(|a| !view.achievements.is_fired(a.id) && a.condition.is_met(view))
        .collect();

    for def in &newly {
        if state.achievements.mark(def.id) {
            info!(achievement = def.id, "achievement unlocked");
            state.push_toast(format!("🏆 {}", def.name));
            state.add_log(&format!("🏆 Achievement: {}", def.name), true);
        }
    }
    newly
}
