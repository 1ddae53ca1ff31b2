//! Log of finished games
//!
//! One record per completed game. The store-backed log keeps records as
//! JSON lines under a single key.

use serde::{Deserialize, Serialize};

use super::PersistError;
use crate::platform::KeyValueStore;
use crate::settings::Settings;

pub const SESSION_LOG_KEY: &str = "ac_repair_sessions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub stars_earned: u32,
    pub problems_correct: u32,
    pub problems_attempted: u32,
    pub settings: Settings,
    pub timestamp_ms: f64,
}

pub trait SessionLog {
    fn record(&mut self, record: SessionRecord) -> Result<(), PersistError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionLog {
    pub records: Vec<SessionRecord>,
}

impl SessionLog for MemorySessionLog {
    fn record(&mut self, record: SessionRecord) -> Result<(), PersistError> {
        self.records.push(record);
        Ok(())
    }
}

#[derive(Debug)]
pub struct StoreSessionLog<S> {
    store: S,
}

impl<S: KeyValueStore> StoreSessionLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All readable records, oldest first. Damaged lines are skipped.
    pub fn records(&self) -> Result<Vec<SessionRecord>, PersistError> {
        let text = self.store.get(SESSION_LOG_KEY)?.unwrap_or_default();
        Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping damaged session record: {}", e);
                    None
                }
            })
            .collect())
    }
}

impl<S: KeyValueStore> SessionLog for StoreSessionLog<S> {
    fn record(&mut self, record: SessionRecord) -> Result<(), PersistError> {
        let mut text = self.store.get(SESSION_LOG_KEY)?.unwrap_or_default();
        text.push_str(&serde_json::to_string(&record)?);
        text.push('\n');
        self.store.set(SESSION_LOG_KEY, &text)?;
        log::info!(
            "Recorded session: {} stars, {}/{} correct",
            record.stars_earned,
            record.problems_correct,
            record.problems_attempted
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::BrokenStore;
    use crate::platform::MemoryStore;

    fn record(stars: u32) -> SessionRecord {
        SessionRecord {
            stars_earned: stars,
            problems_correct: stars,
            problems_attempted: stars + 2,
            settings: Settings::default(),
            timestamp_ms: 1_700_000_000_000.0,
        }
    }

    #[test]
    fn test_store_log_appends() {
        let mut log = StoreSessionLog::new(MemoryStore::new());
        assert!(log.records().unwrap().is_empty());
        log.record(record(3)).unwrap();
        log.record(record(5)).unwrap();
        assert_eq!(log.records().unwrap(), vec![record(3), record(5)]);
    }

    #[test]
    fn test_damaged_line_skipped() {
        let mut store = MemoryStore::new();
        let good = serde_json::to_string(&record(1)).unwrap();
        store
            .set(SESSION_LOG_KEY, &format!("{good}\n{{oops\n"))
            .unwrap();
        let log = StoreSessionLog::new(store);
        assert_eq!(log.records().unwrap(), vec![record(1)]);
    }

    #[test]
    fn test_broken_store_errors() {
        let mut log = StoreSessionLog::new(BrokenStore);
        assert!(log.record(record(1)).is_err());
    }
}
