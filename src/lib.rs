//! AC Repair - map generation and round logic for an arithmetic repair game
//!
//! Core modules:
//! - `sim`: Seeded simulation (layout generation, problems, round controller)
//! - `settings`: Player-facing configuration with clamping
//! - `rewards`: Star wallet and character roster
//! - `persistence`: Snapshots, merge, debounced sync, session log
//! - `platform`: Key-value storage backends and clock
//! - `app`: Owner that wires the controller to its collaborators

pub mod app;
pub mod persistence;
pub mod platform;
pub mod rewards;
pub mod settings;
pub mod sim;

pub use app::App;
pub use rewards::{Profile, RewardSink};
pub use settings::{ArithmeticMode, DisplayMode, NumberRange, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one display refresh)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playable area
    pub const MAP_WIDTH: f32 = 1920.0;
    pub const MAP_HEIGHT: f32 = 1080.0;
    pub const MAP_MARGIN: f32 = 150.0;

    /// Player rectangle and spawn
    pub const PLAYER_WIDTH: f32 = 64.0;
    pub const PLAYER_HEIGHT: f32 = 96.0;
    /// Horizontal offset of the spawn from the left margin
    pub const SPAWN_OFFSET_X: f32 = 50.0;
    /// Exclusion zone around the spawn (every side)
    pub const SPAWN_BUFFER_PADDING: f32 = 150.0;

    /// House
    pub const HOUSE_WIDTH: f32 = 280.0;
    pub const HOUSE_HEIGHT: f32 = 240.0;
    pub const HOUSE_SPAWN_PADDING: f32 = 80.0;
    pub const HOUSE_MAX_ATTEMPTS: u32 = 50;

    /// Repair targets
    pub const TARGET_SIZE: f32 = 80.0;
    pub const TARGET_MIN_DIST_FROM_HOUSE: f32 = 140.0;
    pub const TARGET_MAX_DIST_FROM_HOUSE: f32 = 300.0;
    pub const TARGET_PADDING: f32 = 50.0;
    pub const TARGET_GAP: f32 = 40.0;
    pub const TARGET_MAX_ATTEMPTS: u32 = 100;
    pub const TARGET_VARIANTS: u32 = 4;

    /// Decorative obstacles
    pub const OBSTACLE_MIN_COUNT: u32 = 12;
    pub const OBSTACLE_MAX_COUNT: u32 = 19;
    pub const OBSTACLE_MIN_SIZE: f32 = 80.0;
    pub const OBSTACLE_MAX_SIZE: f32 = 140.0;
    /// Clearance from spawn buffer, house and targets
    pub const OBSTACLE_PADDING: f32 = 200.0;
    /// Clearance between obstacles
    pub const OBSTACLE_SPACING: f32 = 20.0;
    pub const OBSTACLE_MAX_ATTEMPTS: u32 = 100;

    /// Movement
    pub const MOVE_STEP: f32 = 10.0;
    pub const PLAYER_EDGE_MARGIN: f32 = 20.0;

    /// Repair protocol
    pub const REPAIR_RADIUS: f32 = 120.0;
    pub const MAX_ATTEMPTS: u32 = 5;
    /// Seconds the correct answer stays on screen after retries run out
    pub const REVEAL_DWELL_SECS: f32 = 3.0;

    /// Remote writes are coalesced within this window (seconds)
    pub const SYNC_DEBOUNCE_SECS: f32 = 2.0;
}

/// Convert polar (r, theta) to cartesian offset (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
