//! Logo Catch entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement,
        KeyboardEvent, MouseEvent, TouchEvent,
    };

    use logo_catch::highscores::{Leaderboard, format_duration};
    use logo_catch::persistence::{KvStore, LocalStorageStore, MemoryStore, PersistenceError, PlayerRecord};
    use logo_catch::platform;
    use logo_catch::sim::{FrameInput, ItemCategory, SessionEvent, SessionPhase};
    use logo_catch::{Game, GameConfig, GameObserver};

    /// LocalStorage when the browser allows it, otherwise an in-memory store
    enum Store {
        Local(LocalStorageStore),
        Memory(MemoryStore),
    }

    impl KvStore for Store {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            match self {
                Store::Local(s) => s.get(key),
                Store::Memory(s) => s.get(key),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
            match self {
                Store::Local(s) => s.set(key, value),
                Store::Memory(s) => s.set(key, value),
            }
        }

        fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
            match self {
                Store::Local(s) => s.remove(key),
                Store::Memory(s) => s.remove(key),
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window().and_then(|w| w.document())
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(id: &str, visible: bool) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    /// Pushes session events into the DOM
    struct DomView;

    impl GameObserver for DomView {
        fn on_event(&mut self, event: &SessionEvent) {
            match event {
                SessionEvent::Started => {
                    set_visible("registration-panel", false);
                    set_visible("game-over-panel", false);
                    set_visible("game-panel", true);
                    set_text("score", "0");
                    set_text("carbons", "0");
                    set_text("level", "1");
                    set_text("pause-btn", "Pause");
                }
                SessionEvent::Paused => set_text("pause-btn", "Resume"),
                SessionEvent::Resumed => set_text("pause-btn", "Pause"),
                SessionEvent::Tick { remaining } => set_text("timer", &remaining.to_string()),
                SessionEvent::ScoreChanged { score } => set_text("score", &score.to_string()),
                SessionEvent::LevelChanged { level } => set_text("level", &level.to_string()),
                SessionEvent::HazardHit { count, max } => {
                    set_text("carbons", &format!("{count}/{max}"));
                }
                SessionEvent::Ended(summary) => {
                    set_visible("game-panel", false);
                    set_visible("game-over-panel", true);
                    set_text("result-reason", &summary.reason.to_string());
                    set_text("result-score", &summary.base_score.to_string());
                    set_text("result-bonus", &summary.time_bonus.to_string());
                    set_text("result-final", &summary.result.score.to_string());
                    set_text("result-carbons", &summary.result.hazard_count.to_string());
                    set_text("result-duration", &format_duration(summary.result.duration_ms));
                }
                _ => {}
            }
        }

        fn on_player_changed(&mut self, player: Option<&PlayerRecord>) {
            let name = player.map(|p| p.name.as_str()).unwrap_or("-");
            set_text("current-player", name);
            if let Some(btn) = document().and_then(|d| d.get_element_by_id("start-btn")) {
                if player.is_some() {
                    let _ = btn.remove_attribute("disabled");
                } else {
                    let _ = btn.set_attribute("disabled", "");
                }
            }
        }
    }

    /// Browser app state
    struct App {
        game: Game<Store, DomView>,
        input: FrameInput,
        ctx: CanvasRenderingContext2d,
    }

    impl App {
        fn update(&mut self) {
            let now = platform::now_ms();
            if let Err(e) = self.game.frame(now, &self.input) {
                log::error!("Frame failed: {e}");
            }
        }

        fn render(&self) {
            let config = self.game.config();
            let (w, h) = (config.viewport.width as f64, config.viewport.height as f64);
            self.ctx.set_fill_style_str("#0b1d3a");
            self.ctx.fill_rect(0.0, 0.0, w, h);

            let Some(session) = self.game.session() else {
                return;
            };

            self.ctx.set_font("12px sans-serif");
            for item in session.items() {
                self.ctx.set_fill_style_str(category_color(item.category));
                self.ctx
                    .fill_rect(item.pos.x as f64, item.pos.y as f64, item.size.x as f64, item.size.y as f64);
                self.ctx.set_fill_style_str("#ffffff");
                let _ = self
                    .ctx
                    .fill_text(&item.label, item.pos.x as f64 + 4.0, item.pos.y as f64 + item.size.y as f64 / 2.0);
            }

            let basket = session.basket();
            self.ctx.set_fill_style_str("#c08040");
            self.ctx.fill_rect(
                basket.pos.x as f64,
                basket.pos.y as f64,
                basket.size.x as f64,
                basket.size.y as f64,
            );

            if session.phase() == SessionPhase::Paused {
                self.ctx.set_fill_style_str("rgba(0, 0, 0, 0.5)");
                self.ctx.fill_rect(0.0, 0.0, w, h);
                self.ctx.set_fill_style_str("#ffffff");
                self.ctx.set_font("32px sans-serif");
                let _ = self.ctx.fill_text("PAUSED", w / 2.0 - 60.0, h / 2.0);
            }
        }

        fn is_running(&self) -> bool {
            self.game.session().is_some_and(|s| s.is_running())
        }
    }

    fn category_color(category: ItemCategory) -> &'static str {
        match category {
            ItemCategory::Standard => "#3b82f6",
            ItemCategory::Bonus => "#f59e0b",
            ItemCategory::Festive => "#16a34a",
            ItemCategory::Hazard => "#333333",
            ItemCategory::Thief => "#7c3aed",
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Logo Catch starting...");

        let document = document().expect("no document");
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let config = GameConfig::load();
        canvas.set_width(config.viewport.width as u32);
        canvas.set_height(config.viewport.height as u32);

        let store = match LocalStorageStore::open() {
            Ok(s) => Store::Local(s),
            Err(e) => {
                log::warn!("{e}; progress will not be saved");
                Store::Memory(MemoryStore::new())
            }
        };
        let game = match Game::new(config, store, DomView, platform::seed()) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Could not start: {e}");
                return;
            }
        };
        if let Some(player) = game.player() {
            set_text("registration-message", &format!("Welcome back, {}!", player.name));
        }

        let app = Rc::new(RefCell::new(App {
            game,
            input: FrameInput::default(),
            ctx,
        }));

        setup_input_handlers(&canvas, app.clone());
        setup_buttons(app.clone());
        setup_auto_pause(app.clone());

        request_animation_frame(app);
        log::info!("Logo Catch running!");
    }

    /// Pointer x in playfield units
    fn playfield_x(canvas: &HtmlCanvasElement, client_x: f64, viewport_width: f32) -> f32 {
        let rect = canvas.get_bounding_client_rect();
        if rect.width() <= 0.0 {
            return 0.0;
        }
        ((client_x - rect.left()) / rect.width()) as f32 * viewport_width
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");

        // Keyboard
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut a = app.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => a.input.left = true,
                    "ArrowRight" | "d" | "D" => a.input.right = true,
                    " " | "p" | "P" | "Escape" => {
                        event.prevent_default();
                        if a.game.session().is_some() {
                            if let Err(e) = a.game.toggle_pause(platform::now_ms()) {
                                log::debug!("Pause ignored: {e}");
                            }
                        }
                    }
                    _ => {}
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut a = app.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => a.input.left = false,
                    "ArrowRight" | "d" | "D" => a.input.right = false,
                    _ => {}
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                let width = a.game.config().viewport.width;
                a.input.pointer_x = Some(playfield_x(&canvas_clone, event.client_x() as f64, width));
            });
            let _ = canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().input.pointer_x = None;
            });
            let _ = canvas.add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        for name in ["touchstart", "touchmove"] {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut a = app.borrow_mut();
                    let width = a.game.config().viewport.width;
                    a.input.pointer_x = Some(playfield_x(&canvas_clone, touch.client_x() as f64, width));
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                app.borrow_mut().input.pointer_x = None;
            });
            let _ = canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(id: &str, app: Rc<RefCell<App>>, mut handler: impl FnMut(&mut App) + 'static) {
        let Some(btn) = document().and_then(|d| d.get_element_by_id(id)) else {
            log::warn!("Missing button #{id}");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            handler(&mut app.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        on_click("register-btn", app.clone(), |a| {
            let Some(doc) = document() else { return };
            let name = doc
                .get_element_by_id("player-name")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|el| el.value())
                .unwrap_or_default();
            let generation = doc
                .get_element_by_id("player-generation")
                .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
                .and_then(|el| el.value().parse::<u32>().ok())
                .unwrap_or(0);
            match a.game.register_player(&name, generation, platform::now_ms()) {
                Ok(_) => set_text("registration-message", "Registered! You can start the game now."),
                Err(e) => set_text("registration-message", &e.to_string()),
            }
        });

        for id in ["start-btn", "play-again-btn"] {
            on_click(id, app.clone(), |a| {
                a.input = FrameInput::default();
                if let Err(e) = a.game.start_session(platform::now_ms()) {
                    set_text("registration-message", &e.to_string());
                }
            });
        }

        on_click("pause-btn", app.clone(), |a| {
            if let Err(e) = a.game.toggle_pause(platform::now_ms()) {
                log::debug!("Pause ignored: {e}");
            }
        });

        on_click("end-btn", app.clone(), |a| {
            if let Err(e) = a.game.end_session(platform::now_ms()) {
                log::debug!("End ignored: {e}");
            }
        });

        on_click("rankings-btn", app.clone(), |a| match a.game.leaderboard() {
            Ok(board) => show_rankings(&board),
            Err(e) => log::error!("Could not load rankings: {e}"),
        });

        on_click("my-stats-btn", app.clone(), |a| match a.game.player_stats() {
            Ok(Some(stats)) => set_text(
                "stats-content",
                &format!(
                    "Games: {}  Best: {}  Average: {}  Carbon: {}",
                    stats.games, stats.best_score, stats.average_score, stats.total_hazards
                ),
            ),
            Ok(None) => set_text("stats-content", "Register first to see your statistics."),
            Err(e) => log::error!("Could not load stats: {e}"),
        });

        on_click("generation-stats-btn", app.clone(), |a| match a.game.generation_stats() {
            Ok(rows) => {
                let text = rows
                    .iter()
                    .filter(|r| r.players > 0)
                    .map(|r| {
                        format!(
                            "Gen {}: {} players, {} games, best {}, avg {}",
                            r.generation, r.players, r.games, r.best_score, r.average_score
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                set_text("stats-content", &text);
            }
            Err(e) => log::error!("Could not load stats: {e}"),
        });

        on_click("reset-btn", app, |a| {
            let confirmed = web_sys::window()
                .and_then(|w| {
                    w.confirm_with_message("This permanently deletes all players and results. Continue?")
                        .ok()
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            match a.game.reset_all_data() {
                Ok(()) => {
                    set_visible("game-panel", false);
                    set_visible("game-over-panel", false);
                    set_visible("registration-panel", true);
                    set_text("stats-content", "");
                }
                Err(e) => log::error!("Reset failed: {e}"),
            }
        });
    }

    fn show_rankings(board: &Leaderboard) {
        if board.is_empty() {
            set_text("stats-content", "No games played yet.");
            return;
        }
        let text = board
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {} (gen {}) - {}", i + 1, e.name, e.generation, e.score))
            .collect::<Vec<_>>()
            .join("\n");
        set_text("stats-content", &text);
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>) {
        {
            let mut a = app.borrow_mut();
            a.update();
            a.render();
        }
        request_animation_frame(app);
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    if a.is_running() && a.game.pause(platform::now_ms()).is_ok() {
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                a.input = FrameInput::default();
                if a.is_running() && a.game.pause(platform::now_ms()).is_ok() {
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    //! Native idle-mode demo: one round played by a simple autopilot

    use logo_catch::highscores::format_duration;
    use logo_catch::persistence::FileStore;
    use logo_catch::sim::{FrameInput, Session, SessionEvent, SessionPhase};
    use logo_catch::{Game, GameConfig, GameError, GameObserver, platform};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const DATA_DIR_ENV: &str = "LOGO_CATCH_DATA";

    struct LogView;

    impl GameObserver for LogView {
        fn on_event(&mut self, event: &SessionEvent) {
            match event {
                SessionEvent::Ended(summary) => log::info!(
                    "{} Score {} + {} bonus = {} (level {}, {} carbon, {})",
                    summary.reason,
                    summary.base_score,
                    summary.time_bonus,
                    summary.result.score,
                    summary.level,
                    summary.result.hazard_count,
                    format_duration(summary.result.duration_ms)
                ),
                SessionEvent::Tick { remaining } if remaining % 10 == 0 => {
                    log::info!("{remaining}s left");
                }
                other => log::debug!("{other:?}"),
            }
        }
    }

    /// Chase the lowest collectible, shy away from the lowest hazard
    fn autopilot(session: &Session) -> FrameInput {
        let basket = session.basket();
        let target = session
            .items()
            .iter()
            .filter(|i| i.category.is_collectible())
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|i| i.pos.x + i.size.x / 2.0);
        let threat = session
            .items()
            .iter()
            .filter(|i| !i.category.is_collectible() && i.pos.y > basket.pos.y - 150.0)
            .map(|i| i.pos.x + i.size.x / 2.0)
            .find(|x| (x - basket.center_x()).abs() < basket.size.x);

        match (threat, target) {
            (Some(x), _) => FrameInput {
                left: x >= basket.center_x(),
                right: x < basket.center_x(),
                pointer_x: None,
            },
            (None, target) => FrameInput {
                pointer_x: target,
                ..FrameInput::default()
            },
        }
    }

    pub fn run() -> Result<(), GameError> {
        let config = GameConfig::load();
        let dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| "logo-catch-data".to_string());
        let store = FileStore::open(dir)?;
        let mut game = Game::new(config, store, LogView, platform::seed())?;

        let mut now = platform::now_ms();
        if game.player().is_none() {
            game.register_player("Demo Player", 1, now)?;
        }

        game.start_session(now)?;
        while game.session().is_some_and(|s| s.phase() != SessionPhase::Ended) {
            now += FRAME_MS;
            let input = game.session().map(autopilot).unwrap_or_default();
            game.frame(now, &input)?;
        }

        let board = game.leaderboard()?;
        log::info!("Ranking ({} players):", board.len());
        for (i, entry) in board.entries.iter().enumerate() {
            log::info!("{:>2}. {} (gen {}) {}", i + 1, entry.name, entry.generation, entry.score);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Logo Catch (native) starting...");
    log::info!("Running a headless demo round - run with `trunk serve` for the web version");

    if let Err(e) = headless::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
