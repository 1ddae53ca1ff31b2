//! Application owner
//!
//! Holds the settings, the star wallet, the game in progress and the
//! storage collaborators, and moves events between them:
//! - every state change is saved locally and queued for remote sync
//! - a finished game pays its stars into the profile and is logged once
//! - starting or resuming a game cancels anything the old one had pending

use crate::persistence::{
    DebouncedSync, MemorySessionLog, SessionLog, SessionRecord, SessionSnapshot, SnapshotStore,
    SyncStatus,
};
use crate::platform::{KeyValueStore, now_ms};
use crate::rewards::{Profile, RewardSink, UnlockError};
use crate::settings::Settings;
use crate::sim::{Command, GameEvent, RoundController, RoundSession, TickInput};

/// Result of the last finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub stars: u32,
    pub problems_correct: u32,
    pub problems_attempted: u32,
}

pub struct App<S: KeyValueStore, L: SessionLog = MemorySessionLog> {
    local: SnapshotStore<S>,
    remote: Option<DebouncedSync<Box<dyn KeyValueStore>>>,
    session_log: L,
    settings: Settings,
    profile: Profile,
    game: Option<RoundController>,
    /// Game waiting behind "Continue"
    saved_game: Option<RoundSession>,
    last_result: Option<GameSummary>,
    events: Vec<GameEvent>,
}

impl<S: KeyValueStore> App<S, MemorySessionLog> {
    pub fn load(store: S) -> Self {
        Self::with_session_log(store, MemorySessionLog::default())
    }
}

impl<S: KeyValueStore, L: SessionLog> App<S, L> {
    pub fn with_session_log(store: S, session_log: L) -> Self {
        let local = SnapshotStore::new(store);
        let snapshot = local.load_or_default();
        Self {
            local,
            remote: None,
            session_log,
            settings: snapshot.settings,
            profile: snapshot.profile,
            game: None,
            saved_game: snapshot.current_game,
            last_result: None,
            events: Vec::new(),
        }
    }

    /// Attach a remote mirror and reconcile with it immediately
    pub fn with_remote(mut self, remote: impl KeyValueStore + 'static) -> Self {
        let boxed: Box<dyn KeyValueStore> = Box::new(remote);
        let mut sync = DebouncedSync::new(boxed);
        let merged = sync.reconcile(&self.snapshot());
        self.settings = merged.settings;
        self.profile = merged.profile;
        self.remote = Some(sync);
        self.save_local();
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings; applies to the next game
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.persist();
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn unlock_character(&mut self, id: &str) -> Result<(), UnlockError> {
        self.profile.unlock(id)?;
        self.persist();
        Ok(())
    }

    pub fn select_character(&mut self, id: &str) -> Result<(), UnlockError> {
        self.profile.select(id)?;
        self.persist();
        Ok(())
    }

    pub fn session_log(&self) -> &L {
        &self.session_log
    }

    pub fn store(&self) -> &S {
        self.local.store()
    }

    pub fn game(&self) -> Option<&RoundController> {
        self.game.as_ref()
    }

    pub fn has_saved_game(&self) -> bool {
        self.saved_game.is_some()
    }

    pub fn last_result(&self) -> Option<GameSummary> {
        self.last_result
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.remote
            .as_ref()
            .map_or(SyncStatus::Idle, DebouncedSync::status)
    }

    /// Start round 1 of a new game, discarding any saved one
    pub fn new_game(&mut self, seed: u64) {
        self.stop_game();
        self.saved_game = None;
        self.last_result = None;
        self.game = Some(RoundController::new_game(&self.settings, seed));
        self.collect_events();
        self.persist();
    }

    /// Pick the saved game back up. False if there is none or it is unusable.
    pub fn resume_game(&mut self) -> bool {
        let Some(session) = self.saved_game.take() else {
            return false;
        };
        self.stop_game();
        self.game = RoundController::resume(session, &self.settings);
        let resumed = self.game.is_some();
        self.persist();
        resumed
    }

    /// Back to the menu; the game stays available under "Continue"
    pub fn leave_game(&mut self) {
        if let Some(mut game) = self.game.take() {
            game.cancel_pending();
            self.saved_game = Some(game.into_session());
        }
        self.persist();
    }

    pub fn apply(&mut self, command: Command) -> bool {
        let Some(game) = self.game.as_mut() else {
            return false;
        };
        let changed = game.apply(command);
        self.collect_events();
        if changed {
            self.persist();
        }
        changed
    }

    /// One fixed step for the game and the sync clock
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        let mut changed = false;
        if let Some(game) = self.game.as_mut() {
            let before = game.session().player.rect;
            game.tick(input, dt);
            changed = game.session().player.rect != before;
        }
        changed |= self.collect_events();
        if changed {
            self.persist();
        }

        if let Some(remote) = self.remote.as_mut() {
            remote.tick(dt);
        }
    }

    /// Take the game events seen since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            settings: self.settings.clone(),
            profile: self.profile.clone(),
            current_game: self
                .game
                .as_ref()
                .map(|g| g.session().clone())
                .or_else(|| self.saved_game.clone()),
            last_modified_ms: now_ms(),
            ..SessionSnapshot::default()
        }
    }

    /// Push any queued remote write out now
    pub fn flush_sync(&mut self) -> SyncStatus {
        self.remote
            .as_mut()
            .map_or(SyncStatus::Idle, DebouncedSync::flush)
    }

    fn stop_game(&mut self) {
        if let Some(mut game) = self.game.take() {
            game.cancel_pending();
        }
    }

    /// Move controller events into the app queue. Returns whether there were any.
    fn collect_events(&mut self) -> bool {
        let Some(game) = self.game.as_mut() else {
            return false;
        };
        let events = game.drain_events();
        if events.is_empty() {
            return false;
        }

        for event in &events {
            if let GameEvent::GameComplete {
                stars,
                problems_correct,
                problems_attempted,
            } = *event
            {
                self.finish_game(GameSummary {
                    stars,
                    problems_correct,
                    problems_attempted,
                });
            }
        }
        self.events.extend(events);
        true
    }

    fn finish_game(&mut self, summary: GameSummary) {
        self.stop_game();
        self.profile.award(summary.stars);

        let record = SessionRecord {
            stars_earned: summary.stars,
            problems_correct: summary.problems_correct,
            problems_attempted: summary.problems_attempted,
            settings: self.settings.clone(),
            timestamp_ms: now_ms(),
        };
        if let Err(e) = self.session_log.record(record) {
            log::error!("Failed to record session: {}", e);
        }
        self.last_result = Some(summary);
    }

    fn save_local(&mut self) -> SessionSnapshot {
        let snapshot = self.snapshot();
        if let Err(e) = self.local.save(&snapshot) {
            log::error!("Failed to save game state: {}", e);
        }
        snapshot
    }

    fn persist(&mut self) {
        let snapshot = self.save_local();
        if let Some(remote) = self.remote.as_mut() {
            remote.request(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{REVEAL_DWELL_SECS, SIM_DT, SYNC_DEBOUNCE_SECS};
    use crate::persistence::test_support::BrokenStore;
    use crate::platform::MemoryStore;
    use crate::sim::{Autopilot, RoundPhase};

    fn small_settings() -> Settings {
        Settings {
            target_count: 1,
            round_count: 1,
            ..Settings::default()
        }
    }

    /// Let the autopilot drive until `done` holds or the tick budget runs out
    fn drive<S: KeyValueStore, L: SessionLog>(
        app: &mut App<S, L>,
        pilot: &mut Autopilot,
        done: impl Fn(&App<S, L>) -> bool,
    ) {
        for _ in 0..100_000 {
            if done(app) {
                return;
            }
            let Some(game) = app.game() else {
                return;
            };
            let action = pilot.next_action(game);
            for command in action.commands {
                app.apply(command);
            }
            app.tick(&action.input, SIM_DT);
        }
    }

    #[test]
    fn test_fresh_app_defaults() {
        let app = App::load(MemoryStore::new());
        assert_eq!(app.settings(), &Settings::default());
        assert_eq!(app.profile(), &Profile::default());
        assert!(!app.has_saved_game());
        assert!(app.game().is_none());
        assert_eq!(app.sync_status(), SyncStatus::Idle);
    }

    #[test]
    fn test_new_game_is_saved() {
        let mut app = App::load(MemoryStore::new());
        app.new_game(4);
        let stored = SnapshotStore::new(app.store().clone()).load().unwrap();
        assert_eq!(
            stored.current_game.as_ref(),
            app.game().map(RoundController::session)
        );
    }

    #[test]
    fn test_completion_awards_stars_once() {
        let mut app = App::load(MemoryStore::new());
        app.set_settings(small_settings());
        app.new_game(3);
        let mut pilot = Autopilot::new(1.0, 9);
        drive(&mut app, &mut pilot, |a| a.game().is_none());

        let summary = app.last_result().unwrap();
        assert_eq!(summary.stars, 1);
        assert_eq!(summary.problems_attempted, 1);
        assert_eq!(app.profile().total_stars, 1);
        assert_eq!(app.session_log().records.len(), 1);
        assert_eq!(app.session_log().records[0].stars_earned, 1);
        assert!(!app.has_saved_game());

        let completions = app
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameComplete { .. }))
            .count();
        assert_eq!(completions, 1);

        for _ in 0..600 {
            app.tick(&TickInput::default(), SIM_DT);
        }
        assert_eq!(app.profile().total_stars, 1);
        assert_eq!(app.session_log().records.len(), 1);

        let stored = SnapshotStore::new(app.store().clone()).load().unwrap();
        assert_eq!(stored.profile.total_stars, 1);
        assert!(stored.current_game.is_none());
    }

    #[test]
    fn test_resume_after_restart() {
        let mut app = App::load(MemoryStore::new());
        app.new_game(8);
        app.tick(
            &TickInput {
                right: true,
                ..TickInput::default()
            },
            SIM_DT,
        );
        let session = app.game().map(|g| g.session().clone());

        let mut restarted = App::load(app.store().clone());
        assert!(restarted.has_saved_game());
        assert!(restarted.resume_game());
        assert_eq!(restarted.game().map(|g| g.session().clone()), session);
        assert!(!restarted.has_saved_game());
    }

    #[test]
    fn test_leave_then_continue() {
        let mut app = App::load(MemoryStore::new());
        app.new_game(8);
        app.leave_game();
        assert!(app.game().is_none());
        assert!(app.has_saved_game());
        assert!(app.resume_game());
        assert!(!app.resume_game());
    }

    #[test]
    fn test_unusable_saved_game_not_resumed() {
        let mut app = App::load(MemoryStore::new());
        app.new_game(2);
        app.leave_game();
        if let Some(saved) = app.saved_game.as_mut() {
            saved.attempt_count = 3;
        }
        assert!(!app.resume_game());
        assert!(app.game().is_none());
        assert!(!app.has_saved_game());
    }

    #[test]
    fn test_new_game_drops_old_reveal() {
        let mut app = App::load(MemoryStore::new());
        app.set_settings(small_settings());
        app.new_game(6);
        let mut pilot = Autopilot::new(0.0, 1);
        drive(&mut app, &mut pilot, |a| {
            a.game().map(RoundController::phase) == Some(RoundPhase::RevealingAnswer)
        });
        assert_eq!(
            app.game().map(RoundController::phase),
            Some(RoundPhase::RevealingAnswer)
        );

        app.new_game(7);
        app.drain_events();
        let steps = (REVEAL_DWELL_SECS / SIM_DT) as usize + 10;
        for _ in 0..steps {
            app.tick(&TickInput::default(), SIM_DT);
        }
        let game = app.game().unwrap();
        assert_eq!(game.phase(), RoundPhase::Idle);
        assert_eq!(game.session().layout.unfixed_count(), 1);
        assert_eq!(app.profile().total_stars, 0);
        assert!(app.drain_events().is_empty());
    }

    #[test]
    fn test_unlock_persists() {
        let mut seeded = SnapshotStore::new(MemoryStore::new());
        seeded
            .save(&SessionSnapshot {
                profile: Profile {
                    total_stars: 30,
                    ..Profile::default()
                },
                ..SessionSnapshot::default()
            })
            .unwrap();

        let mut app = App::load(seeded.store().clone());
        assert_eq!(app.unlock_character("bingo"), Ok(()));
        assert!(matches!(
            app.select_character("orca"),
            Err(UnlockError::Locked { .. })
        ));

        let stored = SnapshotStore::new(app.store().clone()).load().unwrap();
        assert_eq!(stored.profile.total_stars, 5);
        assert_eq!(stored.profile.selected_character, "bingo");
    }

    #[test]
    fn test_remote_failure_does_not_disturb_game() {
        let mut app = App::load(MemoryStore::new()).with_remote(BrokenStore);
        assert_eq!(app.sync_status(), SyncStatus::Error);

        app.new_game(5);
        assert_eq!(app.sync_status(), SyncStatus::Syncing);
        let steps = (SYNC_DEBOUNCE_SECS / SIM_DT) as usize + 10;
        for _ in 0..steps {
            app.tick(&TickInput::default(), SIM_DT);
        }
        assert_eq!(app.sync_status(), SyncStatus::Error);
        assert_eq!(app.game().map(RoundController::phase), Some(RoundPhase::Idle));

        let stored = SnapshotStore::new(app.store().clone()).load().unwrap();
        assert!(stored.current_game.is_some());
    }

    #[test]
    fn test_remote_progress_merged_on_attach() {
        let mut remote = SnapshotStore::new(MemoryStore::new());
        remote
            .save(&SessionSnapshot {
                profile: Profile {
                    total_stars: 50,
                    unlocked_characters: vec!["repairman".into(), "orca".into()],
                    selected_character: "orca".into(),
                },
                ..SessionSnapshot::default()
            })
            .unwrap();

        let mut app = App::load(MemoryStore::new()).with_remote(remote.store().clone());
        assert_eq!(app.profile().total_stars, 50);
        assert_eq!(app.profile().selected_character, "orca");
        assert_eq!(app.sync_status(), SyncStatus::Synced);

        app.set_settings(small_settings());
        assert_eq!(app.sync_status(), SyncStatus::Syncing);
        assert_eq!(app.flush_sync(), SyncStatus::Synced);
    }
}
