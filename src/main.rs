//! AC Repair entry point
//!
//! On the web this exposes a `WebGame` handle that a page drives from its
//! animation frame and key handlers. Natively it runs a headless game
//! played by the autopilot and prints the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use ac_repair::App;
    use ac_repair::consts::*;
    use ac_repair::platform::LocalStorage;
    use ac_repair::sim::{Command, GameEvent, TickInput};
    use ac_repair::{ArithmeticMode, DisplayMode, Settings};

    /// Game handle owned by the page
    #[wasm_bindgen]
    pub struct WebGame {
        app: App<LocalStorage>,
        input: TickInput,
        accumulator: f32,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new() -> WebGame {
            let app = App::load(LocalStorage);
            log::info!(
                "Loaded profile: {} stars, saved game: {}",
                app.profile().total_stars,
                app.has_saved_game()
            );
            WebGame {
                app,
                input: TickInput::default(),
                accumulator: 0.0,
            }
        }

        pub fn new_game(&mut self) {
            let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
            self.app.new_game(seed);
            self.accumulator = 0.0;
            log::info!("Started new game with seed: {}", seed);
        }

        pub fn resume_game(&mut self) -> bool {
            self.accumulator = 0.0;
            self.app.resume_game()
        }

        pub fn leave_game(&mut self) {
            self.app.leave_game();
        }

        pub fn has_saved_game(&self) -> bool {
            self.app.has_saved_game()
        }

        pub fn set_keys(&mut self, up: bool, down: bool, left: bool, right: bool) {
            self.input = TickInput {
                up,
                down,
                left,
                right,
            };
        }

        /// Run simulation ticks for `dt_ms` of wall time
        pub fn update(&mut self, dt_ms: f32) {
            let dt = (dt_ms / 1000.0).min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                self.app.tick(&input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
        }

        pub fn attempt_repair(&mut self) -> bool {
            self.app.apply(Command::AttemptRepair)
        }

        pub fn input_digit(&mut self, digit: char) -> bool {
            self.app.apply(Command::InputDigit(digit))
        }

        pub fn backspace(&mut self) -> bool {
            self.app.apply(Command::Backspace)
        }

        pub fn clear_answer(&mut self) -> bool {
            self.app.apply(Command::ClearAnswer)
        }

        pub fn submit_answer(&mut self) -> bool {
            self.app.apply(Command::SubmitAnswer)
        }

        pub fn advance_round(&mut self) -> bool {
            self.app.apply(Command::AdvanceRound)
        }

        pub fn unlock_character(&mut self, id: &str) -> Result<(), JsError> {
            Ok(self.app.unlock_character(id)?)
        }

        pub fn select_character(&mut self, id: &str) -> Result<(), JsError> {
            Ok(self.app.select_character(id)?)
        }

        pub fn configure(
            &mut self,
            target_count: u32,
            round_count: u32,
            mode: &str,
            display: &str,
        ) {
            let current = self.app.settings().clone();
            self.app.set_settings(Settings {
                target_count,
                round_count,
                arithmetic_mode: ArithmeticMode::from_str(mode).unwrap_or(current.arithmetic_mode),
                display_mode: DisplayMode::from_str(display).unwrap_or(current.display_mode),
                ..current
            });
        }

        pub fn total_stars(&self) -> u32 {
            self.app.profile().total_stars
        }

        pub fn sync_status(&self) -> String {
            self.app.sync_status().as_str().to_string()
        }

        /// Current session as JSON, or null between games
        pub fn session_json(&self) -> String {
            self.app
                .game()
                .and_then(|g| serde_json::to_string(g.session()).ok())
                .unwrap_or_else(|| "null".to_string())
        }

        /// Events since the last call, as a JSON array
        pub fn drain_events_json(&mut self) -> String {
            let events: Vec<GameEvent> = self.app.drain_events();
            serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }
        log::info!("AC Repair starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;

    use ac_repair::consts::*;
    use ac_repair::persistence::SessionLog;
    use ac_repair::platform::{FileStore, KeyValueStore, MemoryStore};
    use ac_repair::settings::{MAX_ROUNDS, MAX_TARGETS, MIN_ROUNDS, MIN_TARGETS};
    use ac_repair::sim::{Autopilot, GameEvent};
    use ac_repair::{App, ArithmeticMode, DisplayMode, Settings};

    /// Simulated seconds per rendered frame
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Give up on a game after this much simulated time
    const MAX_FRAMES: u32 = 30 * 60 * 60;

    #[derive(Debug, Parser)]
    #[command(name = "ac-repair")]
    #[command(about = "Play one game of AC Repair headless with the autopilot")]
    pub struct Options {
        /// Repair targets per round
        #[arg(long, default_value_t = 3,
              value_parser = clap::value_parser!(u32).range(MIN_TARGETS as i64..=MAX_TARGETS as i64))]
        pub targets: u32,
        /// Rounds per game
        #[arg(long, default_value_t = 5,
              value_parser = clap::value_parser!(u32).range(MIN_ROUNDS as i64..=MAX_ROUNDS as i64))]
        pub rounds: u32,
        /// addition, subtraction or both
        #[arg(long, default_value = "addition", value_parser = parse_mode)]
        pub mode: ArithmeticMode,
        /// standard or blank
        #[arg(long, default_value = "standard", value_parser = parse_display)]
        pub display: DisplayMode,
        /// Map and problem seed (random when omitted)
        #[arg(long)]
        pub seed: Option<u64>,
        /// Chance the autopilot answers correctly
        #[arg(long, default_value_t = 0.8, value_parser = parse_accuracy)]
        pub accuracy: f64,
        /// Keep the save in this directory so a stopped game can be continued
        #[arg(long)]
        pub save_dir: Option<PathBuf>,
    }

    impl Options {
        pub fn settings(&self) -> Settings {
            Settings {
                target_count: self.targets,
                round_count: self.rounds,
                arithmetic_mode: self.mode,
                display_mode: self.display,
                ..Settings::default()
            }
        }
    }

    fn parse_mode(s: &str) -> Result<ArithmeticMode, String> {
        ArithmeticMode::from_str(s).ok_or_else(|| format!("unknown mode `{s}`"))
    }

    fn parse_display(s: &str) -> Result<DisplayMode, String> {
        DisplayMode::from_str(s).ok_or_else(|| format!("unknown display `{s}`"))
    }

    fn parse_accuracy(s: &str) -> Result<f64, String> {
        let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(format!("accuracy must be between 0 and 1, got {value}"))
        }
    }

    pub fn run(options: Options) -> Result<()> {
        let seed = options.seed.unwrap_or_else(rand::random);
        match &options.save_dir {
            Some(dir) => {
                let store = FileStore::new(dir)
                    .with_context(|| format!("opening save directory {}", dir.display()))?;
                play(App::load(store), &options, seed);
            }
            None => play(App::load(MemoryStore::new()), &options, seed),
        }
        Ok(())
    }

    fn play<S: KeyValueStore, L: SessionLog>(mut app: App<S, L>, options: &Options, seed: u64) {
        app.set_settings(options.settings());
        if app.has_saved_game() && app.resume_game() {
            log::info!("Continuing saved game");
        } else {
            app.new_game(seed);
            log::info!("Started new game with seed: {}", seed);
        }

        let mut pilot = Autopilot::new(options.accuracy, seed);
        let mut accumulator = 0.0;
        let mut frames = 0;

        while frames < MAX_FRAMES {
            let Some(game) = app.game() else {
                break;
            };
            let action = pilot.next_action(game);
            for command in action.commands {
                app.apply(command);
            }

            accumulator += FRAME_DT;
            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                app.tick(&action.input, SIM_DT);
                accumulator -= SIM_DT;
                substeps += 1;
            }
            frames += 1;

            for event in app.drain_events() {
                report(&event);
            }
        }

        app.flush_sync();
        match app.last_result() {
            Some(summary) => println!(
                "Game over: {} stars, {}/{} answers correct, {} stars in total",
                summary.stars,
                summary.problems_correct,
                summary.problems_attempted,
                app.profile().total_stars
            ),
            None => {
                app.leave_game();
                println!("Stopped before the game finished; it can be continued later");
            }
        }
    }

    fn report(event: &GameEvent) {
        match event {
            GameEvent::RoundStarted { round } => log::info!("Round {} begins", round),
            GameEvent::AnswerRevealed { target_id, answer } => {
                log::info!("Target {}: the answer was {}", target_id, answer)
            }
            GameEvent::TargetFixed { target_id, starred } => {
                log::info!(
                    "Target {} fixed{}",
                    target_id,
                    if *starred { " (+1 star)" } else { "" }
                )
            }
            other => log::debug!("{:?}", other),
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::init();
    log::info!("AC Repair (native) starting...");
    demo::run(demo::Options::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
