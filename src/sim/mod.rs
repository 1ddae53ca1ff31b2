//! Seeded simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Time only advances through `tick`
//! - Stable iteration order (by entity ID)
//! - No rendering, storage or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod layout;
pub mod problem;
pub mod state;
pub mod tick;
pub mod timer;

pub use autopilot::{Autopilot, PilotAction, plan_route};
pub use collision::Rect;
pub use layout::{Layout, MapBounds, Obstacle, ObstacleKind, RepairTarget, generate_layout};
pub use problem::{ArithmeticProblem, Operator, generate_problem};
pub use state::{Direction, GameEvent, PlayerState, RngState, RoundPhase, RoundSession};
pub use tick::{Command, RoundController, TickInput, step_player};
pub use timer::{Scheduler, TimerHandle};
