//! Game settings
//!
//! Persisted inside the session snapshot. Anything read back from storage is
//! clamped with [`Settings::sanitized`] before the core sees it.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_TARGETS: u32 = 1;
pub const MAX_TARGETS: u32 = 10;
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 20;
/// Largest operand a range may produce
pub const MAX_OPERAND: u32 = 99;

/// Which operations problems use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArithmeticMode {
    #[default]
    Addition,
    Subtraction,
    /// Coin flip per problem
    Both,
}

impl ArithmeticMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticMode::Addition => "addition",
            ArithmeticMode::Subtraction => "subtraction",
            ArithmeticMode::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "addition" | "add" | "+" => Some(ArithmeticMode::Addition),
            "subtraction" | "sub" | "-" => Some(ArithmeticMode::Subtraction),
            "both" | "mixed" => Some(ArithmeticMode::Both),
            _ => None,
        }
    }
}

/// How a problem is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DisplayMode {
    /// `2 + 3 = ?`
    #[default]
    Standard,
    /// `2 + ? = 5`
    Blank,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Standard => "standard",
            DisplayMode::Blank => "blank",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(DisplayMode::Standard),
            "blank" | "missing" => Some(DisplayMode::Blank),
            _ => None,
        }
    }
}

/// Inclusive operand range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

impl Default for NumberRange {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

impl NumberRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Clamp both ends to `0..=MAX_OPERAND` and put them in order
    pub fn sanitized(self) -> Self {
        let a = self.min.min(MAX_OPERAND);
        let b = self.max.min(MAX_OPERAND);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Uniform inclusive sample
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let r = self.sanitized();
        rng.random_range(r.min..=r.max)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Repair targets per round
    pub target_count: u32,
    /// Rounds per game
    pub round_count: u32,
    pub arithmetic_mode: ArithmeticMode,
    pub display_mode: DisplayMode,
    /// Range of the first operand
    pub first_range: NumberRange,
    /// Range of the second operand (the blank in blank mode)
    pub second_range: NumberRange,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_count: 3,
            round_count: 5,
            arithmetic_mode: ArithmeticMode::Addition,
            display_mode: DisplayMode::Standard,
            first_range: NumberRange::default(),
            second_range: NumberRange::default(),
        }
    }
}

impl Settings {
    /// Copy with every value forced into its legal range
    pub fn sanitized(&self) -> Self {
        Self {
            target_count: self.target_count.clamp(MIN_TARGETS, MAX_TARGETS),
            round_count: self.round_count.clamp(MIN_ROUNDS, MAX_ROUNDS),
            arithmetic_mode: self.arithmetic_mode,
            display_mode: self.display_mode,
            first_range: self.first_range.sanitized(),
            second_range: self.second_range.sanitized(),
        }
    }
}
