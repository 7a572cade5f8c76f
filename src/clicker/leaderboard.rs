//! Local top-10 leaderboard, one entry per player name.

use serde::{Deserialize, Serialize};

pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub balance: f64,
    pub rate: f64,
}

/// Entries sorted by balance, highest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Insert or replace the entry for `entry.name`. Last write wins.
    pub fn upsert(&mut self, entry: LeaderboardEntry) {
        self.entries.retain(|e| e.name != entry.name);
        self.entries.push(entry);
        self.normalize();
    }

    /// Restore ordering and size after loading foreign data.
    pub fn normalize(&mut self) {
        self.entries.retain(|e| e.balance.is_finite());
        self.entries.sort_by(|a, b| b.balance.total_cmp(&a.balance));
        let mut seen = Vec::<String>::new();
        self.entries.retain(|e| {
            if seen.contains(&e.name) {
                false
            } else {
                seen.push(e.name.clone());
                true
            }
        });
        self.entries.truncate(LEADERBOARD_SIZE);
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// 1-based rank of `name`, if listed.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
