//! Round state and core simulation types
//!
//! All state that must be persisted for Continue lives here.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::layout::Layout;
use super::problem::ArithmeticProblem;
use crate::consts::MAX_ATTEMPTS;

/// Facing direction (presentation hint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Direction implied by a movement delta; horizontal wins on diagonals
    pub fn from_delta(dx: f32, dy: f32) -> Option<Self> {
        if dx < 0.0 {
            Some(Direction::Left)
        } else if dx > 0.0 {
            Some(Direction::Right)
        } else if dy < 0.0 {
            Some(Direction::Up)
        } else if dy > 0.0 {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

/// The player avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub rect: Rect,
    pub direction: Direction,
    pub is_moving: bool,
}

impl PlayerState {
    pub fn at_spawn(spawn: Rect) -> Self {
        Self {
            rect: spawn,
            direction: Direction::Down,
            is_moving: false,
        }
    }
}

/// RNG state wrapper for serialization.
///
/// Every layout and problem draws from its own PCG stream, so a restored
/// session continues the same sequence without storing generator internals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Hand out a generator on a fresh stream
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::new(self.seed, self.stream);
        self.stream += 1;
        rng
    }
}

/// Where the round state machine currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Walking around, no target selected
    Idle,
    /// Target selected, problem on screen
    Repairing,
    /// Retries exhausted, correct answer on screen
    RevealingAnswer,
    /// Every target fixed, waiting for the next round
    RoundComplete,
    /// Final round finished
    GameComplete,
}

/// Things that happened during a command or tick, drained by the owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RepairStarted { target_id: u32 },
    AnswerCorrect { target_id: u32 },
    AnswerIncorrect { target_id: u32, attempts: u32 },
    AnswerRevealed { target_id: u32, answer: u32 },
    TargetFixed { target_id: u32, starred: bool },
    RoundComplete { round: u32 },
    RoundStarted { round: u32 },
    GameComplete {
        stars: u32,
        problems_correct: u32,
        problems_attempted: u32,
    },
}

/// Complete play-session state (serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSession {
    pub rng_state: RngState,
    /// 1-based round number
    pub round_index: u32,
    pub layout: Layout,
    pub player: PlayerState,
    /// Id of the target under repair
    pub active_target: Option<u32>,
    pub current_problem: Option<ArithmeticProblem>,
    /// Digits typed so far
    pub pending_answer: String,
    /// Wrong submissions on the current problem
    pub attempt_count: u32,
    pub revealing_answer: bool,
    pub stars_this_session: u32,
    /// Correct submissions across the whole game
    #[serde(default)]
    pub problems_correct: u32,
    /// Every submission across the whole game
    #[serde(default)]
    pub problems_attempted: u32,
    pub round_complete: bool,
    #[serde(default)]
    pub game_complete: bool,
}

impl RoundSession {
    pub fn new(rng_state: RngState, round_index: u32, layout: Layout) -> Self {
        let player = PlayerState::at_spawn(layout.spawn);
        Self {
            rng_state,
            round_index,
            layout,
            player,
            active_target: None,
            current_problem: None,
            pending_answer: String::new(),
            attempt_count: 0,
            revealing_answer: false,
            stars_this_session: 0,
            problems_correct: 0,
            problems_attempted: 0,
            round_complete: false,
            game_complete: false,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        if self.game_complete {
            RoundPhase::GameComplete
        } else if self.round_complete {
            RoundPhase::RoundComplete
        } else if self.revealing_answer {
            RoundPhase::RevealingAnswer
        } else if self.active_target.is_some() {
            RoundPhase::Repairing
        } else {
            RoundPhase::Idle
        }
    }

    /// Checks the field combinations the controller must never produce
    pub fn is_consistent(&self) -> bool {
        let repairing = self.active_target.is_some();
        let active_is_broken = self
            .active_target
            .map(|id| self.layout.target(id).is_some_and(|t| !t.fixed))
            .unwrap_or(true);

        repairing == self.current_problem.is_some()
            && active_is_broken
            && (repairing || self.pending_answer.is_empty())
            && (repairing || self.attempt_count == 0)
            && (!self.revealing_answer || repairing)
            && (self.revealing_answer || self.attempt_count < MAX_ATTEMPTS)
            && self.pending_answer.chars().all(|c| c.is_ascii_digit())
            && !(self.round_complete && repairing)
            && (!self.round_complete || self.layout.all_fixed())
            && self.problems_correct <= self.problems_attempted
            && self.stars_this_session == self.problems_correct
    }
}
