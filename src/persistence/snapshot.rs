//! Versioned session snapshot
//!
//! One JSON document holds everything that survives a restart: settings,
//! the star wallet and roster, and the game in progress. Loading never
//! fails; anything unreadable degrades to defaults with a log line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PersistError;
use crate::platform::KeyValueStore;
use crate::rewards::Profile;
use crate::settings::Settings;
use crate::sim::RoundSession;

/// Current snapshot format. Older saves keep only their settings.
pub const SNAPSHOT_VERSION: u32 = 3;

pub const STORAGE_KEY: &str = "ac_repair_game_state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub profile: Profile,
    /// Game to offer under "Continue"
    #[serde(default)]
    pub current_game: Option<RoundSession>,
    #[serde(default)]
    pub last_modified_ms: f64,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            settings: Settings::default(),
            profile: Profile::default(),
            current_game: None,
            last_modified_ms: 0.0,
        }
    }
}

impl SessionSnapshot {
    pub fn has_saved_game(&self) -> bool {
        self.current_game.is_some()
    }

    /// Clamp settings, repair the roster and drop a game that cannot resume
    pub fn sanitized(mut self) -> Self {
        self.version = SNAPSHOT_VERSION;
        self.settings = self.settings.sanitized();
        self.profile = self.profile.sanitized();
        if let Some(game) = &self.current_game {
            if game.game_complete || !game.is_consistent() {
                log::warn!("Dropping saved game at round {}", game.round_index);
                self.current_game = None;
            }
        }
        self
    }

    /// Decode a stored document, migrating old versions.
    ///
    /// Returns None only when the text is not JSON at all.
    pub fn from_json(json: &str) -> Option<Self> {
        let value: Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Saved state is not valid JSON: {}", e);
                return None;
            }
        };

        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let settings = value
            .get("settings")
            .cloned()
            .and_then(|s| serde_json::from_value::<Settings>(s).ok())
            .unwrap_or_default();
        let settings_only = Self {
            settings,
            ..Self::default()
        };

        if version < u64::from(SNAPSHOT_VERSION) {
            log::info!(
                "Migrating save from v{} to v{}: progress reset, settings kept",
                version,
                SNAPSHOT_VERSION
            );
            return Some(settings_only.sanitized());
        }

        match serde_json::from_value::<Self>(value) {
            Ok(snapshot) => Some(snapshot.sanitized()),
            Err(e) => {
                log::warn!("Saved state is damaged ({}), keeping settings only", e);
                Some(settings_only.sanitized())
            }
        }
    }
}

/// Combine the local snapshot with one fetched from a remote store.
///
/// Stars take the larger wallet, unlocks are unioned, settings and
/// character selection follow the remote side, and the game in progress
/// stays local.
pub fn merge(local: &SessionSnapshot, remote: &SessionSnapshot) -> SessionSnapshot {
    let mut unlocked = local.profile.unlocked_characters.clone();
    for id in &remote.profile.unlocked_characters {
        if !unlocked.contains(id) {
            unlocked.push(id.clone());
        }
    }

    let profile = Profile {
        total_stars: local.profile.total_stars.max(remote.profile.total_stars),
        unlocked_characters: unlocked,
        selected_character: remote.profile.selected_character.clone(),
    };

    SessionSnapshot {
        version: SNAPSHOT_VERSION,
        settings: remote.settings.clone(),
        profile,
        current_game: local.current_game.clone(),
        last_modified_ms: local.last_modified_ms.max(remote.last_modified_ms),
    }
    .sanitized()
}

/// Snapshot reader/writer over any key-value backend
#[derive(Debug)]
pub struct SnapshotStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Read the stored snapshot. None when nothing usable is stored.
    pub fn load(&self) -> Option<SessionSnapshot> {
        match self.store.get(&self.key) {
            Ok(Some(json)) => {
                let snapshot = SessionSnapshot::from_json(&json)?;
                log::info!(
                    "Loaded save: {} stars, saved game: {}",
                    snapshot.profile.total_stars,
                    snapshot.has_saved_game()
                );
                Some(snapshot)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read save: {}", e);
                None
            }
        }
    }

    pub fn load_or_default(&self) -> SessionSnapshot {
        self.load().unwrap_or_default()
    }

    pub fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), PersistError> {
        let json = serde_json::to_string(snapshot)?;
        self.store.set(&self.key, &json)?;
        log::debug!("Saved state ({} bytes)", json.len());
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), PersistError> {
        self.store.remove(&self.key)?;
        log::info!("Cleared saved state");
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
