//! Round controller
//!
//! Owns the `RoundSession` and drives it through the repair protocol:
//! walk up to a broken target, answer its problem, retry up to
//! `MAX_ATTEMPTS` times, then either earn a star or watch the answer be
//! revealed. Every command is a silent no-op when its preconditions fail.

use super::collision::Rect;
use super::layout::{Layout, MapBounds, generate_layout};
use super::problem::generate_problem;
use super::state::{Direction, GameEvent, PlayerState, RngState, RoundPhase, RoundSession};
use super::timer::{Scheduler, TimerHandle};
use crate::consts::*;
use crate::settings::Settings;

/// Held movement keys for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl TickInput {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// Discrete player intents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// One `MOVE_STEP` along the signs of the deltas
    Move { dx: f32, dy: f32 },
    AttemptRepair,
    InputDigit(char),
    Backspace,
    ClearAnswer,
    SubmitAnswer,
    AdvanceRound,
}

/// Transitions that happen after a delay
#[derive(Debug, Clone, Copy, PartialEq)]
enum Deferred {
    FinishReveal { target_id: u32, round: u32 },
}

/// Sign of a movement delta; a step never covers more than `MOVE_STEP` per axis
fn unit(delta: f32) -> f32 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Where one movement step takes the player, or None if the house is in the way.
///
/// Only the sign of each delta matters. The result is clamped to the map
/// minus `PLAYER_EDGE_MARGIN`.
pub fn step_player(layout: &Layout, rect: &Rect, dx: f32, dy: f32) -> Option<Rect> {
    let (dx, dy) = (unit(dx), unit(dy));
    let max_x = layout.width - rect.width - PLAYER_EDGE_MARGIN;
    let max_y = layout.height - rect.height - PLAYER_EDGE_MARGIN;

    let mut next = *rect;
    next.x = (next.x + dx * MOVE_STEP).min(max_x).max(PLAYER_EDGE_MARGIN);
    next.y = (next.y + dy * MOVE_STEP).min(max_y).max(PLAYER_EDGE_MARGIN);

    (!next.overlaps(&layout.house, 0.0)).then_some(next)
}

/// Drives one game (all of its rounds)
#[derive(Debug)]
pub struct RoundController {
    session: RoundSession,
    settings: Settings,
    bounds: MapBounds,
    scheduler: Scheduler<Deferred>,
    reveal_timer: Option<TimerHandle>,
    events: Vec<GameEvent>,
}

impl RoundController {
    /// Start a new game at round 1 with a generated layout
    pub fn new_game(settings: &Settings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let bounds = MapBounds::default();
        let mut rng_state = RngState::new(seed);
        let layout = generate_layout(&mut rng_state.next_rng(), settings.target_count, bounds);
        Self::start(settings, bounds, RoundSession::new(rng_state, 1, layout))
    }

    /// Start a new game on a prepared layout
    pub fn with_layout(settings: &Settings, seed: u64, layout: Layout) -> Self {
        let bounds = MapBounds {
            width: layout.width,
            height: layout.height,
            ..MapBounds::default()
        };
        Self::start(
            settings.sanitized(),
            bounds,
            RoundSession::new(RngState::new(seed), 1, layout),
        )
    }

    fn start(settings: Settings, bounds: MapBounds, session: RoundSession) -> Self {
        log::info!(
            "New game: seed={}, {} rounds, {} targets",
            session.rng_state.seed,
            settings.round_count,
            settings.target_count
        );
        let mut controller = Self {
            session,
            settings,
            bounds,
            scheduler: Scheduler::new(),
            reveal_timer: None,
            events: Vec::new(),
        };
        controller.check_empty_layout();
        controller
    }

    /// Rebuild a controller from a persisted session.
    ///
    /// Returns None if the snapshot holds an impossible field combination.
    /// A snapshot taken mid-reveal gets a full reveal dwell again.
    pub fn resume(session: RoundSession, settings: &Settings) -> Option<Self> {
        if !session.is_consistent() {
            log::warn!("Discarding inconsistent saved game (round {})", session.round_index);
            return None;
        }

        let bounds = MapBounds {
            width: session.layout.width,
            height: session.layout.height,
            ..MapBounds::default()
        };
        let mut controller = Self {
            session,
            settings: settings.sanitized(),
            bounds,
            scheduler: Scheduler::new(),
            reveal_timer: None,
            events: Vec::new(),
        };

        if controller.session.revealing_answer {
            if let Some(target_id) = controller.session.active_target {
                controller.schedule_reveal(target_id);
            }
        }

        log::info!(
            "Resumed game at round {} ({} targets left)",
            controller.session.round_index,
            controller.session.layout.unfixed_count()
        );
        Some(controller)
    }

    pub fn session(&self) -> &RoundSession {
        &self.session
    }

    pub fn into_session(self) -> RoundSession {
        self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> RoundPhase {
        self.session.phase()
    }

    pub fn is_final_round(&self) -> bool {
        self.session.round_index >= self.settings.round_count
    }

    /// Take all events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop every deferred transition. Call when this session is being replaced.
    pub fn cancel_pending(&mut self) {
        let dropped = self.scheduler.cancel_all();
        self.reveal_timer = None;
        if dropped > 0 {
            log::debug!("Cancelled {} pending transition(s)", dropped);
        }
    }

    /// Route a command to its operation. Returns whether anything changed.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Move { dx, dy } => self.move_player(dx, dy),
            Command::AttemptRepair => self.attempt_repair(),
            Command::InputDigit(digit) => self.input_digit(digit),
            Command::Backspace => self.backspace(),
            Command::ClearAnswer => self.clear_answer(),
            Command::SubmitAnswer => self.submit_answer(),
            Command::AdvanceRound => self.advance_round(),
        }
    }

    /// Advance by one fixed step: integrate held keys, then fire due timers
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        if input.up {
            self.move_player(0.0, -1.0);
        }
        if input.down {
            self.move_player(0.0, 1.0);
        }
        if input.left {
            self.move_player(-1.0, 0.0);
        }
        if input.right {
            self.move_player(1.0, 0.0);
        }
        if !input.any() {
            self.session.player.is_moving = false;
        }

        for action in self.scheduler.advance(dt) {
            self.run_deferred(action);
        }
    }

    fn accepts_input(&self) -> bool {
        !self.session.round_complete && !self.session.game_complete
    }

    /// Step the player by `MOVE_STEP` per unit of delta.
    ///
    /// Blocked while repairing or between rounds. The house is solid;
    /// obstacles are not.
    pub fn move_player(&mut self, dx: f32, dy: f32) -> bool {
        if self.session.active_target.is_some() || !self.accepts_input() {
            return false;
        }
        let Some(direction) = Direction::from_delta(dx, dy) else {
            return false;
        };

        let layout = &self.session.layout;
        let player = &mut self.session.player;
        player.direction = direction;
        match step_player(layout, &player.rect, dx, dy) {
            Some(next) => {
                player.rect = next;
                player.is_moving = true;
                true
            }
            None => {
                player.is_moving = false;
                false
            }
        }
    }

    /// Closest broken target within `REPAIR_RADIUS`; ties go to the lowest id
    pub fn nearby_target(&self) -> Option<u32> {
        let player = &self.session.player.rect;
        self.session
            .layout
            .targets
            .iter()
            .filter(|t| !t.fixed)
            .map(|t| (t.rect.center_distance(player), t.id))
            .filter(|(distance, _)| *distance < REPAIR_RADIUS)
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            })
            .map(|(_, id)| id)
    }

    /// Start repairing the nearest broken target in range
    pub fn attempt_repair(&mut self) -> bool {
        if self.session.active_target.is_some() || !self.accepts_input() {
            return false;
        }
        let Some(target_id) = self.nearby_target() else {
            return false;
        };

        let mut rng = self.session.rng_state.next_rng();
        let problem = generate_problem(
            &mut rng,
            self.settings.arithmetic_mode,
            self.settings.first_range,
            self.settings.second_range,
            self.settings.display_mode,
        );
        log::debug!("Repair started on target {}: {}", target_id, problem);

        let session = &mut self.session;
        session.active_target = Some(target_id);
        session.current_problem = Some(problem);
        session.pending_answer.clear();
        session.attempt_count = 0;
        session.player.is_moving = false;
        self.events.push(GameEvent::RepairStarted { target_id });
        true
    }

    fn editing_allowed(&self) -> bool {
        self.session.current_problem.is_some() && !self.session.revealing_answer
    }

    pub fn input_digit(&mut self, digit: char) -> bool {
        if !self.editing_allowed() || !digit.is_ascii_digit() {
            return false;
        }
        self.session.pending_answer.push(digit);
        true
    }

    pub fn backspace(&mut self) -> bool {
        if !self.editing_allowed() {
            return false;
        }
        self.session.pending_answer.pop().is_some()
    }

    pub fn clear_answer(&mut self) -> bool {
        if !self.editing_allowed() || self.session.pending_answer.is_empty() {
            return false;
        }
        self.session.pending_answer.clear();
        true
    }

    /// Check the typed answer against the current problem
    pub fn submit_answer(&mut self) -> bool {
        if self.session.revealing_answer || self.session.pending_answer.is_empty() {
            return false;
        }
        let (Some(target_id), Some(problem)) =
            (self.session.active_target, self.session.current_problem.as_ref())
        else {
            return false;
        };

        let correct = problem.check(&self.session.pending_answer);
        let answer = problem.expected_answer;
        self.session.problems_attempted += 1;

        if correct {
            self.session.problems_correct += 1;
            self.session.stars_this_session += 1;
            self.events.push(GameEvent::AnswerCorrect { target_id });
            self.resolve_target(target_id, true);
            return true;
        }

        self.session.attempt_count += 1;
        let attempts = self.session.attempt_count;
        self.events.push(GameEvent::AnswerIncorrect {
            target_id,
            attempts,
        });

        if attempts >= MAX_ATTEMPTS {
            log::debug!("Target {}: out of attempts, revealing {}", target_id, answer);
            self.session.revealing_answer = true;
            self.events.push(GameEvent::AnswerRevealed { target_id, answer });
            self.schedule_reveal(target_id);
        } else {
            self.session.pending_answer.clear();
        }
        true
    }

    /// Move on from a completed round to a freshly generated one
    pub fn advance_round(&mut self) -> bool {
        if !self.session.round_complete || self.session.game_complete {
            return false;
        }

        let mut rng = self.session.rng_state.next_rng();
        let layout = generate_layout(&mut rng, self.settings.target_count, self.bounds);
        let session = &mut self.session;
        session.round_index += 1;
        session.player = PlayerState::at_spawn(layout.spawn);
        session.layout = layout;
        session.round_complete = false;

        log::info!("Round {} started", session.round_index);
        self.events.push(GameEvent::RoundStarted {
            round: self.session.round_index,
        });
        self.check_empty_layout();
        true
    }

    fn schedule_reveal(&mut self, target_id: u32) {
        if let Some(handle) = self.reveal_timer.take() {
            self.scheduler.cancel(handle);
        }
        let round = self.session.round_index;
        self.reveal_timer = Some(
            self.scheduler
                .schedule(REVEAL_DWELL_SECS, Deferred::FinishReveal { target_id, round }),
        );
    }

    fn run_deferred(&mut self, action: Deferred) {
        match action {
            Deferred::FinishReveal { target_id, round } => {
                self.reveal_timer = None;
                let session = &self.session;
                if !session.revealing_answer
                    || session.active_target != Some(target_id)
                    || session.round_index != round
                {
                    log::debug!("Stale reveal for target {} ignored", target_id);
                    return;
                }
                self.resolve_target(target_id, false);
            }
        }
    }

    /// Mark the active target fixed and close out the attempt
    fn resolve_target(&mut self, target_id: u32, starred: bool) {
        if let Some(target) = self.session.layout.target_mut(target_id) {
            target.fixed = true;
        }

        let session = &mut self.session;
        session.active_target = None;
        session.current_problem = None;
        session.pending_answer.clear();
        session.attempt_count = 0;
        session.revealing_answer = false;
        self.events.push(GameEvent::TargetFixed { target_id, starred });

        if self.session.layout.all_fixed() {
            self.finish_round();
        }
    }

    /// A round with nothing to repair is over before it starts
    fn check_empty_layout(&mut self) {
        if self.session.layout.targets.is_empty() {
            log::warn!("Round {} has no targets", self.session.round_index);
            self.finish_round();
        }
    }

    fn finish_round(&mut self) {
        let session = &mut self.session;
        if session.round_index >= self.settings.round_count {
            session.game_complete = true;
            log::info!(
                "Game complete: {} stars, {}/{} correct",
                session.stars_this_session,
                session.problems_correct,
                session.problems_attempted
            );
            self.events.push(GameEvent::GameComplete {
                stars: session.stars_this_session,
                problems_correct: session.problems_correct,
                problems_attempted: session.problems_attempted,
            });
        } else {
            session.round_complete = true;
            log::info!("Round {} complete", session.round_index);
            self.events.push(GameEvent::RoundComplete {
                round: session.round_index,
            });
        }
    }
}
