//! Save/load through a key-value store.
//!
//! Layout under a configurable prefix:
//!
//! - `<prefix>_save`: primary snapshot (JSON)
//! - `<prefix>_save_backup`: the previous valid primary
//! - `<prefix>_saved_at`: save time, ms since the epoch
//! - `<prefix>_rebirth`: rebirth-only record, survives a progress reset
//! - `<prefix>_leaderboard`: top-10 table
//!
//! Loading tries the primary, then the backup, then starts fresh. A
//! corrupt snapshot never reaches the caller.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::PersistenceError;
use super::leaderboard::Leaderboard;
use super::logic::refresh_rate;
use super::rebirth::{PrestigeUpgradeKind, RebirthState};
use super::state::{GameState, Ledger};

type Result<T> = std::result::Result<T, PersistenceError>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerSave {
    pub owned_count: u32,
}

/// Persisted part of `RebirthState`. The pending confirmation is not saved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebirthSave {
    pub rebirths: u32,
    pub prestige_points: u64,
    pub multiplier: f64,
    /// Upgrade level per `PrestigeUpgradeKind::key`.
    pub upgrades: BTreeMap<String, u32>,
}

impl Default for RebirthSave {
    fn default() -> Self {
        Self {
            rebirths: 0,
            prestige_points: 0,
            multiplier: 1.0,
            upgrades: BTreeMap::new(),
        }
    }
}

impl RebirthSave {
    pub fn capture(rebirth: &RebirthState) -> Self {
        let upgrades = PrestigeUpgradeKind::all()
            .iter()
            .filter(|k| rebirth.level(**k) > 0)
            .map(|k| (k.key().to_string(), rebirth.level(*k)))
            .collect();
        Self {
            rebirths: rebirth.rebirths,
            prestige_points: rebirth.prestige_points,
            multiplier: rebirth.multiplier,
            upgrades,
        }
    }

    pub fn apply(&self, rebirth: &mut RebirthState) {
        rebirth.rebirths = self.rebirths;
        rebirth.prestige_points = self.prestige_points;
        rebirth.multiplier = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        for kind in PrestigeUpgradeKind::all() {
            let level = self.upgrades.get(kind.key()).copied().unwrap_or(0);
            rebirth.set_level(*kind, level);
        }
        rebirth.pending = None;
    }
}

/// Rebirth progress stored under its own key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RebirthRecord {
    #[serde(flatten)]
    pub rebirth: RebirthSave,
    #[serde(default)]
    pub player_name: String,
}

impl RebirthRecord {
    pub fn capture(state: &GameState) -> Self {
        Self {
            rebirth: RebirthSave::capture(&state.rebirth),
            player_name: state.player_name.clone(),
        }
    }
}

/// Full snapshot. `balance` and `lifetime_earned` are required; every
/// other field falls back to its default when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub balance: f64,
    pub lifetime_earned: f64,
    #[serde(default)]
    pub producers: BTreeMap<String, ProducerSave>,
    #[serde(default)]
    pub fired_achievements: Vec<String>,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub rebirth: RebirthSave,
    #[serde(default)]
    pub total_clicks: u64,
}

impl SaveRecord {
    pub fn capture(state: &GameState) -> Self {
        Self {
            balance: state.ledger.balance(),
            lifetime_earned: state.ledger.lifetime_earned(),
            producers: state
                .producers
                .iter()
                .map(|p| (p.kind.id.clone(), ProducerSave { owned_count: p.owned }))
                .collect(),
            fired_achievements: state.achievements.fired().iter().cloned().collect(),
            player_name: state.player_name.clone(),
            rebirth: RebirthSave::capture(&state.rebirth),
            total_clicks: state.total_clicks,
        }
    }

    /// Overwrite `state` with this snapshot. Producer ids missing from the
    /// catalog are dropped; catalog entries missing here start at zero.
    pub fn apply(&self, state: &mut GameState) {
        state.ledger = Ledger::restore(self.balance, self.lifetime_earned);
        for p in &mut state.producers {
            p.owned = self.producers.get(&p.kind.id).map_or(0, |s| s.owned_count);
        }
        state
            .achievements
            .restore(self.fired_achievements.iter().cloned());
        if !self.player_name.is_empty() {
            state.player_name = self.player_name.clone();
        }
        self.rebirth.apply(&mut state.rebirth);
        state.total_clicks = self.total_clicks;
        refresh_rate(state);
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("balance", self.balance),
            ("lifetime_earned", self.lifetime_earned),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PersistenceError::Corrupt(format!(
                    "{field} is not a non-negative number: {value}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_record(json: &str) -> Result<SaveRecord> {
    let record: SaveRecord =
        serde_json::from_str(json).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
    record.validate()?;
    Ok(record)
}

/// Minimal string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store. An optional quota (total bytes of keys and values)
/// makes writes fail the way a full localStorage does.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Write without quota checks.
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(PersistenceError::Storage(format!(
                    "quota exceeded writing {key} ({needed} > {quota} bytes)"
                )));
            }
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Browser localStorage.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            warn!("localStorage unavailable, progress will not persist");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| PersistenceError::Storage("localStorage unavailable".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match &self.storage {
            Some(s) => s
                .get_item(key)
                .map_err(|e| PersistenceError::Storage(format!("{e:?}"))),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| PersistenceError::Storage(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| PersistenceError::Storage(format!("{e:?}")))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SaveKeys {
    pub save: String,
    pub backup: String,
    pub saved_at: String,
    pub rebirth: String,
    pub leaderboard: String,
}

impl SaveKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            save: format!("{prefix}_save"),
            backup: format!("{prefix}_save_backup"),
            saved_at: format!("{prefix}_saved_at"),
            rebirth: format!("{prefix}_rebirth"),
            leaderboard: format!("{prefix}_leaderboard"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Primary,
    Backup,
    Fresh,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadOutcome {
    pub record: SaveRecord,
    pub source: LoadSource,
}

pub struct PersistenceGateway<S> {
    store: S,
    keys: SaveKeys,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S, prefix: &str) -> Self {
        Self {
            store,
            keys: SaveKeys::with_prefix(prefix),
        }
    }

    pub fn keys(&self) -> &SaveKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Write `record` as the new primary. A valid previous primary is
    /// copied to the backup slot first.
    pub fn save(&mut self, record: &SaveRecord, now_ms: f64) -> Result<()> {
        let json = serde_json::to_string(record)?;
        if let Some(previous) = self.store.get(&self.keys.save)? {
            if parse_record(&previous).is_ok() {
                self.store.set(&self.keys.backup, &previous)?;
            }
        }
        self.store.set(&self.keys.save, &json)?;
        let stamp = if now_ms.is_finite() && now_ms > 0.0 {
            now_ms as u64
        } else {
            0
        };
        self.store.set(&self.keys.saved_at, &stamp.to_string())?;
        debug!(bytes = json.len(), "game saved");
        Ok(())
    }

    /// Primary, then backup, then a fresh record.
    pub fn load(&self) -> LoadOutcome {
        if let Some(record) = self.read_snapshot(&self.keys.save) {
            return LoadOutcome {
                record,
                source: LoadSource::Primary,
            };
        }
        if let Some(record) = self.read_snapshot(&self.keys.backup) {
            warn!("primary save unusable, restored from backup");
            return LoadOutcome {
                record,
                source: LoadSource::Backup,
            };
        }
        LoadOutcome {
            record: SaveRecord::default(),
            source: LoadSource::Fresh,
        }
    }

    fn read_snapshot(&self, key: &str) -> Option<SaveRecord> {
        let json = match self.store.get(key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read save");
                return None;
            }
        };
        match parse_record(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key, error = %e, "discarding corrupt save");
                None
            }
        }
    }

    /// Time of the last successful save, ms since the epoch.
    pub fn saved_at(&self) -> Option<u64> {
        self.store
            .get(&self.keys.saved_at)
            .ok()
            .flatten()
            .and_then(|s| s.parse().ok())
    }

    pub fn save_rebirth(&mut self, record: &RebirthRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.store.set(&self.keys.rebirth, &json)
    }

    pub fn load_rebirth(&self) -> Option<RebirthRecord> {
        let json = self.store.get(&self.keys.rebirth).ok().flatten()?;
        match serde_json::from_str(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "discarding corrupt rebirth record");
                None
            }
        }
    }

    pub fn save_leaderboard(&mut self, board: &Leaderboard) -> Result<()> {
        let json = serde_json::to_string(board)?;
        self.store.set(&self.keys.leaderboard, &json)
    }

    pub fn load_leaderboard(&self) -> Leaderboard {
        let json = match self.store.get(&self.keys.leaderboard) {
            Ok(Some(json)) => json,
            _ => return Leaderboard::default(),
        };
        match serde_json::from_str::<Leaderboard>(&json) {
            Ok(mut board) => {
                board.normalize();
                board
            }
            Err(e) => {
                warn!(error = %e, "discarding corrupt leaderboard");
                Leaderboard::default()
            }
        }
    }

    /// Remove primary, backup and timestamp. The rebirth record and the
    /// leaderboard stay: the leaderboard holds every player's best run on
    /// this device, and a reset only starts the current player over.
    pub fn clear_progress(&mut self) -> Result<()> {
        self.store.remove(&self.keys.save)?;
        self.store.remove(&self.keys.backup)?;
        self.store.remove(&self.keys.saved_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clicker::config::GameConfig;
    use crate::clicker::leaderboard::LeaderboardEntry;
    use crate::clicker::logic;

    fn gateway() -> PersistenceGateway<MemoryStore> {
        PersistenceGateway::new(MemoryStore::new(), "test")
    }

    fn played_state() -> GameState {
        let mut s = GameState::new(GameConfig::default());
        s.player_name = "Ada".into();
        s.ledger.add_currency(500.0);
        logic::buy_producer(&mut s, "cursor").unwrap();
        logic::buy_producer(&mut s, "grandma").unwrap();
        logic::click(&mut s);
        s.rebirth.rebirths = 1;
        s.rebirth.prestige_points = 3;
        s.rebirth
            .set_level(PrestigeUpgradeKind::Production, 2);
        logic::refresh_rate(&mut s);
        s
    }

    #[test]
    fn keys_use_prefix() {
        let keys = SaveKeys::with_prefix("cookie_clicker");
        assert_eq!(keys.save, "cookie_clicker_save");
        assert_eq!(keys.backup, "cookie_clicker_save_backup");
        assert_eq!(keys.saved_at, "cookie_clicker_saved_at");
        assert_eq!(keys.rebirth, "cookie_clicker_rebirth");
        assert_eq!(keys.leaderboard, "cookie_clicker_leaderboard");
    }

    #[test]
    fn save_load_roundtrip() {
        let original = played_state();
        let mut gw = gateway();
        gw.save(&SaveRecord::capture(&original), 1_700_000_000_000.0)
            .unwrap();

        let outcome = gw.load();
        assert_eq!(outcome.source, LoadSource::Primary);

        let mut restored = GameState::new(GameConfig::default());
        outcome.record.apply(&mut restored);
        assert_eq!(restored.ledger, original.ledger);
        assert_eq!(restored.owned("cursor"), 1);
        assert_eq!(restored.owned("grandma"), 1);
        assert_eq!(restored.achievements, original.achievements);
        assert_eq!(restored.player_name, "Ada");
        assert_eq!(restored.total_clicks, 1);
        assert_eq!(restored.rebirth, original.rebirth);
        assert!((restored.rate() - original.rate()).abs() < 1e-12);
        assert_eq!(gw.saved_at(), Some(1_700_000_000_000));
    }

    #[test]
    fn empty_store_starts_fresh() {
        let outcome = gateway().load();
        assert_eq!(outcome.source, LoadSource::Fresh);
        assert_eq!(outcome.record, SaveRecord::default());
    }

    #[test]
    fn second_save_moves_previous_to_backup() {
        let mut gw = gateway();
        let mut s = GameState::new(GameConfig::default());
        s.ledger.add_currency(10.0);
        gw.save(&SaveRecord::capture(&s), 1.0).unwrap();
        let first = gw.store().raw("test_save").unwrap().to_string();
        assert!(gw.store().raw("test_save_backup").is_none());

        s.ledger.add_currency(10.0);
        gw.save(&SaveRecord::capture(&s), 2.0).unwrap();
        assert_eq!(gw.store().raw("test_save_backup"), Some(first.as_str()));
    }

    #[test]
    fn truncated_primary_recovers_from_backup() {
        let mut gw = gateway();
        let mut s = GameState::new(GameConfig::default());
        s.ledger.add_currency(42.0);
        gw.save(&SaveRecord::capture(&s), 1.0).unwrap();
        s.ledger.add_currency(58.0);
        gw.save(&SaveRecord::capture(&s), 2.0).unwrap();

        let primary = gw.store().raw("test_save").unwrap().to_string();
        let truncated = &primary[..primary.len() / 2];
        gw.store_mut().insert_raw("test_save", truncated);

        let outcome = gw.load();
        assert_eq!(outcome.source, LoadSource::Backup);
        assert_eq!(outcome.record.balance, 42.0);
    }

    #[test]
    fn corrupt_primary_is_not_copied_to_backup() {
        let mut gw = gateway();
        let mut s = GameState::new(GameConfig::default());
        s.ledger.add_currency(7.0);
        gw.save(&SaveRecord::capture(&s), 1.0).unwrap();
        s.ledger.add_currency(1.0);
        gw.save(&SaveRecord::capture(&s), 2.0).unwrap();
        let good_backup = gw.store().raw("test_save_backup").unwrap().to_string();

        gw.store_mut().insert_raw("test_save", "{\"balance\":");
        gw.save(&SaveRecord::capture(&s), 3.0).unwrap();
        assert_eq!(gw.store().raw("test_save_backup"), Some(good_backup.as_str()));
    }

    #[test]
    fn both_slots_corrupt_starts_fresh() {
        let mut gw = gateway();
        gw.store_mut().insert_raw("test_save", "not json");
        gw.store_mut()
            .insert_raw("test_save_backup", r#"{"balance":-5,"lifetime_earned":1}"#);
        assert_eq!(gw.load().source, LoadSource::Fresh);
    }

    #[test]
    fn missing_required_field_is_corrupt() {
        assert!(matches!(
            parse_record(r#"{"balance":10}"#),
            Err(PersistenceError::Corrupt(_))
        ));
        assert!(matches!(
            parse_record(r#"{"balance":null,"lifetime_earned":1}"#),
            Err(PersistenceError::Corrupt(_))
        ));
    }

    #[test]
    fn optional_fields_default() {
        let record = parse_record(r#"{"balance":10,"lifetime_earned":20,"extra":true}"#).unwrap();
        assert!(record.producers.is_empty());
        assert_eq!(record.rebirth, RebirthSave::default());
        assert_eq!(record.rebirth.multiplier, 1.0);
    }

    #[test]
    fn unknown_producer_ids_are_ignored_on_apply() {
        let mut record = SaveRecord {
            balance: 1.0,
            lifetime_earned: 1.0,
            ..Default::default()
        };
        record
            .producers
            .insert("portal".into(), ProducerSave { owned_count: 9 });
        record
            .producers
            .insert("farm".into(), ProducerSave { owned_count: 2 });
        let mut s = GameState::new(GameConfig::default());
        record.apply(&mut s);
        assert_eq!(s.owned("farm"), 2);
        assert!((s.rate() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn quota_failure_keeps_previous_save() {
        let mut gw = PersistenceGateway::new(MemoryStore::with_quota(1_000), "q");
        let mut s = GameState::new(GameConfig::default());
        s.ledger.add_currency(1.0);
        gw.save(&SaveRecord::capture(&s), 1.0).unwrap();
        let before = gw.store().raw("q_save").unwrap().to_string();

        s.player_name = "x".repeat(2_000);
        let err = gw.save(&SaveRecord::capture(&s), 2.0).unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(_)));
        assert_eq!(gw.store().raw("q_save"), Some(before.as_str()));
        assert_eq!(gw.load().source, LoadSource::Primary);
    }

    #[test]
    fn rebirth_record_roundtrip() {
        let s = played_state();
        let mut gw = gateway();
        assert!(gw.load_rebirth().is_none());
        gw.save_rebirth(&RebirthRecord::capture(&s)).unwrap();

        let record = gw.load_rebirth().unwrap();
        assert_eq!(record.player_name, "Ada");
        let mut r = RebirthState::default();
        record.rebirth.apply(&mut r);
        assert_eq!(r, s.rebirth);
    }

    #[test]
    fn rebirth_record_is_flat_json() {
        let mut gw = gateway();
        gw.save_rebirth(&RebirthRecord::default()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(gw.store().raw("test_rebirth").unwrap()).unwrap();
        assert_eq!(value["rebirths"], 0);
        assert_eq!(value["multiplier"], 1.0);
        assert_eq!(value["player_name"], "");
    }

    #[test]
    fn invalid_multiplier_is_sanitized() {
        let save = RebirthSave {
            multiplier: 0.0,
            ..Default::default()
        };
        let mut r = RebirthState::default();
        save.apply(&mut r);
        assert_eq!(r.multiplier, 1.0);
    }

    #[test]
    fn leaderboard_roundtrip_and_corruption() {
        let mut gw = gateway();
        assert!(gw.load_leaderboard().is_empty());

        let mut board = Leaderboard::default();
        board.upsert(LeaderboardEntry {
            name: "Ada".into(),
            balance: 12.0,
            rate: 1.0,
        });
        gw.save_leaderboard(&board).unwrap();
        assert_eq!(gw.load_leaderboard(), board);

        gw.store_mut().insert_raw("test_leaderboard", "[{");
        assert!(gw.load_leaderboard().is_empty());
    }

    #[test]
    fn clear_progress_keeps_rebirth_and_leaderboard() {
        let s = played_state();
        let mut gw = gateway();
        gw.save(&SaveRecord::capture(&s), 1.0).unwrap();
        gw.save(&SaveRecord::capture(&s), 2.0).unwrap();
        gw.save_rebirth(&RebirthRecord::capture(&s)).unwrap();
        gw.save_leaderboard(&Leaderboard::default()).unwrap();

        gw.clear_progress().unwrap();
        assert!(gw.store().raw("test_save").is_none());
        assert!(gw.store().raw("test_save_backup").is_none());
        assert_eq!(gw.saved_at(), None);
        assert!(gw.load_rebirth().is_some());
        assert!(gw.store().raw("test_leaderboard").is_some());
        assert_eq!(gw.load().source, LoadSource::Fresh);
    }
}
