//! Arithmetic problem generation
//!
//! Stateless: every call draws fresh operands from the configured ranges.
//! Subtraction swaps operands when needed so nothing shown is ever negative.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::{ArithmeticMode, DisplayMode, NumberRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }

    fn apply(&self, a: u32, b: u32) -> u32 {
        match self {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
        }
    }
}

/// A single problem, immutable once generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticProblem {
    pub first_operand: u32,
    /// Hidden (None) in blank display
    pub second_operand: Option<u32>,
    pub operator: Operator,
    pub result: u32,
    pub display_mode: DisplayMode,
    pub expected_answer: u32,
}

impl ArithmeticProblem {
    /// Check a typed answer. Anything that does not parse is wrong.
    pub fn check(&self, answer: &str) -> bool {
        answer.trim().parse::<u32>().ok() == Some(self.expected_answer)
    }
}

impl fmt::Display for ArithmeticProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operator.symbol();
        match (self.display_mode, self.second_operand) {
            (DisplayMode::Standard, Some(second)) => {
                write!(f, "{} {} {} = ?", self.first_operand, op, second)
            }
            _ => write!(f, "{} {} ? = {}", self.first_operand, op, self.result),
        }
    }
}

/// Generate a problem for the given mode, operand ranges and display style
pub fn generate_problem<R: Rng + ?Sized>(
    rng: &mut R,
    mode: ArithmeticMode,
    first: NumberRange,
    second: NumberRange,
    display: DisplayMode,
) -> ArithmeticProblem {
    let operator = match mode {
        ArithmeticMode::Addition => Operator::Add,
        ArithmeticMode::Subtraction => Operator::Subtract,
        ArithmeticMode::Both => {
            if rng.random_bool(0.5) {
                Operator::Add
            } else {
                Operator::Subtract
            }
        }
    };

    let mut a = first.sample(rng);
    let mut b = second.sample(rng);
    if operator == Operator::Subtract && a < b {
        std::mem::swap(&mut a, &mut b);
    }
    let result = operator.apply(a, b);

    match display {
        DisplayMode::Standard => ArithmeticProblem {
            first_operand: a,
            second_operand: Some(b),
            operator,
            result,
            display_mode: display,
            expected_answer: result,
        },
        // b is the blank
        DisplayMode::Blank => ArithmeticProblem {
            first_operand: a,
            second_operand: None,
            operator,
            result,
            display_mode: display,
            expected_answer: b,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn range(min: u32, max: u32) -> NumberRange {
        NumberRange { min, max }
    }

    #[test]
    fn test_standard_addition() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            let p = generate_problem(
                &mut rng,
                ArithmeticMode::Addition,
                range(1, 5),
                range(1, 5),
                DisplayMode::Standard,
            );
            let b = p.second_operand.unwrap();
            assert!((1..=5).contains(&p.first_operand));
            assert!((1..=5).contains(&b));
            assert_eq!(p.expected_answer, p.first_operand + b);
            assert_eq!(p.result, p.expected_answer);
            assert_eq!(p.operator, Operator::Add);
        }
    }

    #[test]
    fn test_blank_subtraction_scenario() {
        let mut rng = Pcg32::seed_from_u64(2);
        for _ in 0..200 {
            let p = generate_problem(
                &mut rng,
                ArithmeticMode::Subtraction,
                range(5, 5),
                range(1, 3),
                DisplayMode::Blank,
            );
            assert_eq!(p.first_operand, 5);
            assert_eq!(p.second_operand, None);
            assert!((2..=4).contains(&p.result));
            assert!((1..=3).contains(&p.expected_answer));
            assert_eq!(p.first_operand - p.expected_answer, p.result);
        }
    }

    #[test]
    fn test_both_mode_uses_both_operators() {
        let mut rng = Pcg32::seed_from_u64(3);
        let ops: Vec<Operator> = (0..200)
            .map(|_| {
                generate_problem(
                    &mut rng,
                    ArithmeticMode::Both,
                    range(0, 9),
                    range(0, 9),
                    DisplayMode::Standard,
                )
                .operator
            })
            .collect();
        assert!(ops.contains(&Operator::Add));
        assert!(ops.contains(&Operator::Subtract));
    }

    #[test]
    fn test_check_answer() {
        let p = ArithmeticProblem {
            first_operand: 3,
            second_operand: Some(4),
            operator: Operator::Add,
            result: 7,
            display_mode: DisplayMode::Standard,
            expected_answer: 7,
        };
        assert!(p.check("7"));
        assert!(p.check("07"));
        assert!(!p.check("8"));
        assert!(!p.check(""));
        assert!(!p.check("abc"));
        assert!(!p.check("99999999999999999999"));
    }

    #[test]
    fn test_display() {
        let standard = ArithmeticProblem {
            first_operand: 2,
            second_operand: Some(3),
            operator: Operator::Add,
            result: 5,
            display_mode: DisplayMode::Standard,
            expected_answer: 5,
        };
        assert_eq!(standard.to_string(), "2 + 3 = ?");

        let blank = ArithmeticProblem {
            first_operand: 5,
            second_operand: None,
            operator: Operator::Subtract,
            result: 2,
            display_mode: DisplayMode::Blank,
            expected_answer: 3,
        };
        assert_eq!(blank.to_string(), "5 - ? = 2");
    }

    proptest! {
        #[test]
        fn subtraction_never_negative(
            seed in any::<u64>(),
            a in 0u32..=99, b in 0u32..=99, c in 0u32..=99, d in 0u32..=99,
            blank in any::<bool>(),
        ) {
            let first = range(a.min(b), a.max(b));
            let second = range(c.min(d), c.max(d));
            let display = if blank { DisplayMode::Blank } else { DisplayMode::Standard };
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = generate_problem(&mut rng, ArithmeticMode::Subtraction, first, second, display);

            let lo = first.min.min(second.min);
            let hi = first.max.max(second.max);
            prop_assert!(p.first_operand >= lo && p.first_operand <= hi);
            prop_assert!(p.expected_answer <= hi);
            match p.second_operand {
                Some(s) => {
                    prop_assert!(p.first_operand >= s);
                    prop_assert_eq!(p.expected_answer, p.first_operand - s);
                }
                None => {
                    prop_assert!(p.first_operand >= p.expected_answer);
                    prop_assert_eq!(p.result, p.first_operand - p.expected_answer);
                }
            }
        }
    }
}
