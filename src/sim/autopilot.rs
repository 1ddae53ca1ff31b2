//! Computer player for demo mode and end-to-end tests
//!
//! Walks to the nearest reachable broken target with a breadth-first search
//! over real movement steps (so the house is routed around exactly), then
//! answers problems, getting each one right with probability `accuracy`.

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::Rect;
use super::layout::Layout;
use super::state::{Direction, RoundPhase};
use super::tick::{Command, RoundController, TickInput, step_player};
use crate::consts::REPAIR_RADIUS;

/// Upper bound on positions explored per search
const SEARCH_LIMIT: usize = 200_000;

const STEPS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

fn delta(direction: Direction) -> (f32, f32) {
    match direction {
        Direction::Up => (0.0, -1.0),
        Direction::Down => (0.0, 1.0),
        Direction::Left => (-1.0, 0.0),
        Direction::Right => (1.0, 0.0),
    }
}

fn key(rect: &Rect) -> (u32, u32) {
    (rect.x.to_bits(), rect.y.to_bits())
}

fn in_range(layout: &Layout, rect: &Rect) -> bool {
    layout
        .targets
        .iter()
        .any(|t| !t.fixed && t.rect.center_distance(rect) < REPAIR_RADIUS)
}

/// Shortest sequence of steps that brings `start` within repair range of
/// any broken target. None if nothing is reachable.
pub fn plan_route(layout: &Layout, start: &Rect) -> Option<Vec<Direction>> {
    let mut came_from: HashMap<(u32, u32), ((u32, u32), Direction)> = HashMap::new();
    let mut queue = VecDeque::from([*start]);
    let origin = key(start);
    came_from.insert(origin, (origin, Direction::Down));

    while let Some(rect) = queue.pop_front() {
        if in_range(layout, &rect) {
            let mut route = Vec::new();
            let mut at = key(&rect);
            while at != origin {
                let Some(&(prev, step)) = came_from.get(&at) else {
                    break;
                };
                route.push(step);
                at = prev;
            }
            route.reverse();
            return Some(route);
        }
        if came_from.len() > SEARCH_LIMIT {
            break;
        }

        for direction in STEPS {
            let (dx, dy) = delta(direction);
            let Some(next) = step_player(layout, &rect, dx, dy) else {
                continue;
            };
            let next_key = key(&next);
            if came_from.contains_key(&next_key) {
                continue;
            }
            came_from.insert(next_key, (key(&rect), direction));
            queue.push_back(next);
        }
    }

    log::warn!("Autopilot found no route to a broken target");
    None
}

/// What the autopilot wants to do this tick
#[derive(Debug, Clone, Default)]
pub struct PilotAction {
    pub input: TickInput,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    accuracy: f64,
    rng: Pcg32,
    route: VecDeque<Direction>,
    /// Where the player should be before the next step; a mismatch forces a replan
    expected: Option<Rect>,
}

impl Autopilot {
    pub fn new(accuracy: f64, seed: u64) -> Self {
        Self {
            accuracy: accuracy.clamp(0.0, 1.0),
            rng: Pcg32::new(seed, 0xa5),
            route: VecDeque::new(),
            expected: None,
        }
    }

    pub fn next_action(&mut self, controller: &RoundController) -> PilotAction {
        let session = controller.session();
        match controller.phase() {
            RoundPhase::Idle => {
                if controller.nearby_target().is_some() {
                    self.route.clear();
                    return PilotAction {
                        commands: vec![Command::AttemptRepair],
                        ..Default::default()
                    };
                }
                self.walk(&session.layout, &session.player.rect)
            }
            RoundPhase::Repairing => {
                let Some(problem) = session.current_problem.as_ref() else {
                    return PilotAction::default();
                };
                let answer = if self.rng.random_bool(self.accuracy) {
                    problem.expected_answer
                } else {
                    problem.expected_answer + 1
                };
                let mut commands = vec![Command::ClearAnswer];
                commands.extend(answer.to_string().chars().map(Command::InputDigit));
                commands.push(Command::SubmitAnswer);
                PilotAction {
                    commands,
                    ..Default::default()
                }
            }
            RoundPhase::RevealingAnswer | RoundPhase::GameComplete => PilotAction::default(),
            RoundPhase::RoundComplete => {
                self.route.clear();
                PilotAction {
                    commands: vec![Command::AdvanceRound],
                    ..Default::default()
                }
            }
        }
    }

    fn walk(&mut self, layout: &Layout, player: &Rect) -> PilotAction {
        if self.expected.as_ref() != Some(player) || self.route.is_empty() {
            self.route = plan_route(layout, player).unwrap_or_default().into();
        }

        let Some(direction) = self.route.pop_front() else {
            self.expected = None;
            return PilotAction::default();
        };
        let (dx, dy) = delta(direction);
        self.expected = step_player(layout, player, dx, dy);

        let mut input = TickInput::default();
        match direction {
            Direction::Up => input.up = true,
            Direction::Down => input.down = true,
            Direction::Left => input.left = true,
            Direction::Right => input.right = true,
        }
        PilotAction {
            input,
            ..Default::default()
        }
    }
}
