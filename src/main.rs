//! Lane Rush entry point
//!
//! On the web: wires the controller to requestAnimationFrame, setInterval and
//! the keyboard, and exports a small API for the page to start runs and read
//! snapshots. On native: plays one headless run with the autopilot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wasm_bindgen::prelude::*;

    use lane_rush::highscores::HighScoreEntry;
    use lane_rush::sim::Command;
    use lane_rush::{Controller, EngineConfig, HighScores, Scheduler, TimerHandle};

    /// Timers backed by the browser window
    pub struct BrowserScheduler {
        window: web_sys::Window,
        frame_cb: Option<Closure<dyn FnMut(f64)>>,
        spawn_cb: Option<Closure<dyn FnMut()>>,
    }

    impl BrowserScheduler {
        fn new(window: web_sys::Window) -> Self {
            Self {
                window,
                frame_cb: None,
                spawn_cb: None,
            }
        }

        /// Create the frame and spawn callbacks. They hold only a weak
        /// reference, so a torn-down game is never revived by a late timer.
        fn bind(&mut self, game: Weak<RefCell<Game>>) {
            let frame_game = game.clone();
            self.frame_cb = Some(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
                if let Some(game) = frame_game.upgrade() {
                    game.borrow_mut().frame(time);
                }
            }));
            self.spawn_cb = Some(Closure::<dyn FnMut()>::new(move || {
                if let Some(game) = game.upgrade() {
                    game.borrow_mut().controller.on_spawn();
                }
            }));
        }
    }

    impl Scheduler for BrowserScheduler {
        fn request_frame(&mut self) -> TimerHandle {
            let id = self
                .frame_cb
                .as_ref()
                .and_then(|cb| {
                    self.window
                        .request_animation_frame(cb.as_ref().unchecked_ref())
                        .ok()
                })
                .unwrap_or(0);
            TimerHandle(id)
        }

        fn cancel_frame(&mut self, handle: TimerHandle) {
            let _ = self.window.cancel_animation_frame(handle.0);
        }

        fn start_interval(&mut self, period_ms: f64) -> TimerHandle {
            let id = self
                .spawn_cb
                .as_ref()
                .and_then(|cb| {
                    self.window
                        .set_interval_with_callback_and_timeout_and_arguments_0(
                            cb.as_ref().unchecked_ref(),
                            period_ms.round() as i32,
                        )
                        .ok()
                })
                .unwrap_or(0);
            TimerHandle(id)
        }

        fn stop_interval(&mut self, handle: TimerHandle) {
            self.window.clear_interval_with_handle(handle.0);
        }
    }

    pub struct Game {
        controller: Controller<BrowserScheduler>,
        high_scores: HighScores,
    }

    impl Game {
        fn start(&mut self) {
            self.controller.start();
            self.drain_events();
        }

        fn frame(&mut self, time: f64) {
            self.controller.on_frame(time);
            self.drain_events();
        }

        fn drain_events(&mut self) {
            for event in self.controller.drain_events() {
                let speed = self.controller.simulation().speed();
                let Some(entry) = HighScoreEntry::from_collision(&event, speed, js_sys::Date::now())
                else {
                    continue;
                };
                let score = entry.score;
                if let Some(rank) = self.high_scores.add_run(entry) {
                    log::info!("Score {} ranked #{}", score, rank);
                    self.high_scores.save();
                }
            }
        }
    }

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
    }

    fn with_game<R>(f: impl FnOnce(&mut Game) -> R) -> Option<R> {
        let game = GAME.with(|slot| slot.borrow().clone())?;
        let mut game = game.borrow_mut();
        Some(f(&mut game))
    }

    /// Begin (or restart) a run
    #[wasm_bindgen]
    pub fn start_game() {
        with_game(|g| g.start());
    }

    /// Stop the current run and return to the title state
    #[wasm_bindgen]
    pub fn reset_game() {
        with_game(|g| g.controller.reset());
    }

    /// Feed a `KeyboardEvent.key` name; true if it changed the game
    #[wasm_bindgen]
    pub fn press_key(key: &str) -> bool {
        Command::from_key(key)
            .and_then(|command| with_game(|g| g.controller.apply_input(command)))
            .unwrap_or(false)
    }

    /// Current frame state as JSON
    #[wasm_bindgen]
    pub fn snapshot_json() -> String {
        with_game(|g| g.controller.snapshot().to_json()).unwrap_or_default()
    }

    /// Leaderboard as JSON
    #[wasm_bindgen]
    pub fn high_scores_json() -> String {
        with_game(|g| serde_json::to_string(&g.high_scores).unwrap_or_default())
            .unwrap_or_default()
    }

    fn setup_keyboard(window: &web_sys::Window, game: Weak<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let Some(game) = game.upgrade() else {
                return;
            };
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                " " | "Enter" if !g.controller.simulation().is_running() => g.start(),
                key => {
                    if let Some(command) = Command::from_key(key) {
                        // Arrow keys would otherwise scroll the page
                        event.prevent_default();
                        g.controller.apply_input(command);
                    }
                }
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Lane Rush starting...");

        let window = web_sys::window().expect("no window");
        let seed = js_sys::Date::now() as u64;

        let controller = match Controller::new(
            EngineConfig::load(),
            seed,
            BrowserScheduler::new(window.clone()),
        ) {
            Ok(controller) => controller,
            Err(e) => {
                log::warn!("Config rejected ({}), falling back to defaults", e);
                match Controller::new(
                    EngineConfig::default(),
                    seed,
                    BrowserScheduler::new(window.clone()),
                ) {
                    Ok(controller) => controller,
                    Err(e) => {
                        log::error!("Default config rejected: {}", e);
                        return;
                    }
                }
            }
        };

        let game = Rc::new(RefCell::new(Game {
            controller,
            high_scores: HighScores::load(),
        }));
        game.borrow_mut()
            .controller
            .scheduler_mut()
            .bind(Rc::downgrade(&game));

        setup_keyboard(&window, Rc::downgrade(&game));
        GAME.with(|slot| *slot.borrow_mut() = Some(game));

        log::info!("Lane Rush ready (seed {}), press Enter to start", seed);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_host::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use lane_rush::EngineConfig;
    use lane_rush::consts::FRAME_MS;
    use lane_rush::headless::{Autopilot, HeadlessRunner};

    env_logger::init();
    log::info!("Lane Rush (headless) starting...");

    // Usage: lane-rush [seed] [config.json]
    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });

    let config = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => match EngineConfig::from_json(&json) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Invalid config {}: {}", path, e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                log::error!("Cannot read {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::load(),
    };

    let mut runner = match HeadlessRunner::new(config, seed, FRAME_MS) {
        Ok(runner) => runner.with_autopilot(Autopilot::default()),
        Err(e) => {
            log::error!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };

    // Two minutes of virtual time
    let summary = runner.run(120_000.0);
    if runner.controller().simulation().is_running() {
        runner.stop();
    }

    println!("seed:     {}", seed);
    println!("result:   {:?}", summary.lifecycle);
    println!("score:    {}", summary.score);
    println!("frames:   {}", summary.frames);
    println!("spawned:  {}", summary.spawned);
    println!("time:     {:.1}s", summary.elapsed_ms / 1000.0);
    if let Some(rank) = summary.rank {
        println!("rank:     #{}", rank);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
