//! Endless Drive entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, KeyboardEvent, TouchEvent};

    use endless_drive::consts::*;
    use endless_drive::settings::SceneryKind;
    use endless_drive::sim::{Command, EntityKind, FrameResult, GameEvent, SimulationState};
    use endless_drive::{Driver, Presenter, Tuning, Variant};

    /// Maps frames onto absolutely positioned DOM elements inside `#road`
    struct DomPresenter {
        document: Document,
        road: HtmlElement,
        car: Option<HtmlElement>,
        /// One element per entity slot, created on first sight
        sprites: Vec<HtmlElement>,
        /// Pixels per simulation unit
        scale: f32,
        /// Screen y of the player's forward position
        horizon_offset: f32,
        last_score_shown: u64,
    }

    fn html(document: &Document, id: &str) -> Option<HtmlElement> {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = html(document, id) {
            let _ = el
                .style()
                .set_property("display", if visible { "block" } else { "none" });
        }
    }

    fn sprite_class(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Obstacle => "sprite obstacle",
            EntityKind::Collectible => "sprite coin",
            EntityKind::Scenery(SceneryKind::Tree) => "sprite tree",
            EntityKind::Scenery(SceneryKind::Cloud) => "sprite cloud",
            EntityKind::Scenery(SceneryKind::Post) => "sprite post",
        }
    }

    impl DomPresenter {
        fn new(document: Document, variant: Variant) -> Result<Self, JsValue> {
            let road = html(&document, "road").ok_or_else(|| JsValue::from_str("missing #road"))?;
            let car = html(&document, "car");
            let height = road.client_height() as f32;
            let scale = match variant {
                Variant::Scene => 40.0,
                Variant::Sprite => 1.0,
            };
            Ok(Self {
                document,
                road,
                car,
                sprites: Vec::new(),
                scale,
                horizon_offset: height * 0.8,
                last_score_shown: u64::MAX,
            })
        }

        fn sprite(&mut self, slot: usize, kind: EntityKind) -> Result<&HtmlElement, JsValue> {
            while self.sprites.len() <= slot {
                let el: HtmlElement = self.document.create_element("div")?.dyn_into()?;
                el.set_class_name(sprite_class(kind));
                self.road.append_child(&el)?;
                self.sprites.push(el);
            }
            Ok(&self.sprites[slot])
        }

        fn place(&mut self, frame: &FrameResult) -> Result<(), JsValue> {
            let centre = self.road.client_width() as f32 * 0.5;
            let player_forward = frame.player.forward;

            for entity in &frame.entities {
                let (scale, offset) = (self.scale, self.horizon_offset);
                let el = self.sprite(entity.slot, entity.kind)?;
                if !entity.active {
                    el.style().set_property("display", "none")?;
                    continue;
                }
                let x = centre + entity.position.x * scale;
                let y = offset + (entity.position.z - player_forward) * scale;
                el.style().set_property("display", "block")?;
                el.style().set_property(
                    "transform",
                    &format!(
                        "translate({x:.1}px, {y:.1}px) rotate({:.3}rad)",
                        entity.rotation
                    ),
                )?;
            }

            if let Some(car) = &self.car {
                let x = centre + frame.player.lateral * self.scale;
                car.style().set_property(
                    "transform",
                    &format!(
                        "translate({x:.1}px, {:.1}px) rotate({:.3}rad)",
                        self.horizon_offset, -frame.player.lean
                    ),
                )?;
            }
            Ok(())
        }

        fn update_hud(&mut self, frame: &FrameResult) {
            // Score changes every tick in some variants; only touch the DOM every 10 points
            if frame.score / 10 != self.last_score_shown / 10 || frame.score == 0 {
                set_text(&self.document, "score", &frame.score.to_string());
                self.last_score_shown = frame.score;
            }

            for event in &frame.events {
                match *event {
                    GameEvent::Started => set_visible(&self.document, "startScreen", false),
                    GameEvent::Restarted => {
                        set_visible(&self.document, "gameOver", false);
                        set_visible(&self.document, "startScreen", false);
                    }
                    GameEvent::GameOver { final_score } => {
                        set_text(&self.document, "finalScore", &final_score.to_string());
                        set_visible(&self.document, "gameOver", true);
                    }
                    GameEvent::SpeedChanged { .. } => {
                        set_text(&self.document, "speed", &frame.display_speed.to_string());
                    }
                    GameEvent::ScoreChanged { .. } => {}
                }
            }
        }
    }

    impl Presenter for DomPresenter {
        fn apply_frame(&mut self, frame: &FrameResult) {
            if let Err(e) = self.place(frame) {
                log::warn!("Render error: {:?}", e);
            }
            self.update_hud(frame);
        }
    }

    /// Game instance holding all state
    struct Game {
        driver: Driver,
        presenter: DomPresenter,
        last_time: f64,
    }

    impl Game {
        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;
            self.driver.frame(dt, &mut self.presenter);
        }

        /// Lane corridor follows the road element width (sprite variant only)
        fn resize(&mut self) {
            if self.driver.state().tuning().variant != Variant::Sprite {
                return;
            }
            let half = self.presenter.road.client_width() as f32 * 0.5;
            let car_half = self
                .presenter
                .car
                .as_ref()
                .map(|car| car.client_width() as f32 * 0.5)
                .unwrap_or(20.0);
            let reach = (half - car_half).max(0.0);
            self.presenter.horizon_offset = self.presenter.road.client_height() as f32 * 0.8;
            self.driver.command(Command::Resize {
                lane_min: -reach,
                lane_max: reach,
            });
        }
    }

    /// Optional JSON overrides from `<script id="tuning" type="application/json">`
    fn load_tuning(document: &Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
        else {
            log::info!("Using sprite tuning preset");
            return Tuning::sprite();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded {} tuning from page", tuning.variant.as_str());
                tuning
            }
            Err(e) => {
                log::warn!("Rejected tuning ({e}); using sprite preset");
                Tuning::sprite()
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Endless Drive starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let tuning = load_tuning(&document);
        let variant = tuning.variant;
        let seed = js_sys::Date::now() as u64;
        let presenter = DomPresenter::new(document.clone(), variant)?;
        let game = Rc::new(RefCell::new(Game {
            driver: Driver::new(SimulationState::new(tuning, seed)),
            presenter,
            last_time: 0.0,
        }));
        game.borrow_mut().resize();
        set_visible(&document, "startScreen", variant == Variant::Sprite);
        set_visible(&document, "gameOver", false);

        setup_input_handlers(&window, &document, game.clone())?;
        setup_buttons(&document, game.clone())?;

        request_animation_frame(game);
        log::info!("Endless Drive running (seed {})", seed);
        Ok(())
    }

    fn setup_input_handlers(
        window: &web_sys::Window,
        document: &Document,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        // Keyboard
        for (event_name, pressed) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().driver.key(&event.key(), pressed) {
                    event.prevent_default();
                }
            });
            window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch steering: hold on the left or right half of the road
        if let Some(road) = html(document, "road") {
            {
                let game = game.clone();
                let road_clone = road.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    if let Some(touch) = event.touches().get(0) {
                        let rect = road_clone.get_bounding_client_rect();
                        let x = touch.client_x() as f32 - rect.left() as f32;
                        let width = rect.width() as f32;
                        let mut g = game.borrow_mut();
                        if g.driver.state().is_running() {
                            g.driver.input.press_at(x, width);
                        }
                    }
                });
                road.add_event_listener_with_callback(
                    "touchstart",
                    closure.as_ref().unchecked_ref(),
                )?;
                closure.forget();
            }
            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                    game.borrow_mut().driver.input.release();
                });
                road.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref())?;
                closure.forget();
            }
        }

        // Resize recomputes the lane corridor
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().resize();
            });
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        for (id, command) in [("startBtn", Command::Start), ("restartBtn", Command::Restart)] {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.driver.input.release();
                g.driver.command(command);
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless session: a simple autopilot drives until it crashes or time runs out
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use endless_drive::consts::SIM_DT;
    use endless_drive::sim::SimulationState;
    use endless_drive::{Driver, LogPresenter};

    env_logger::init();
    log::info!("Endless Drive (native) starting...");

    // Optional tuning file as the first argument
    let tuning = tuning_from_arg(std::env::args_os().nth(1));

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut driver = Driver::new(SimulationState::new(tuning, seed));
    let mut presenter = LogPresenter::default();
    driver.command(endless_drive::sim::Command::Start);

    // Five simulated minutes at 60 Hz
    for _ in 0..(60 * 60 * 5) {
        autopilot(&mut driver);
        driver.frame(SIM_DT, &mut presenter);
        if presenter.final_score.is_some() {
            break;
        }
    }

    println!(
        "Final score: {} (speed {}, {} frames)",
        presenter.score, presenter.display_speed, presenter.frames
    );
}

/// Tuning from an optional JSON file path, falling back to the scene preset
#[cfg(not(target_arch = "wasm32"))]
fn tuning_from_arg(path: Option<std::ffi::OsString>) -> endless_drive::Tuning {
    use endless_drive::Tuning;

    let Some(path) = path else {
        return Tuning::scene();
    };
    match Tuning::load(std::path::Path::new(&path)) {
        Ok(tuning) => tuning,
        Err(e) => {
            log::warn!("Rejected tuning ({e}); using scene preset");
            Tuning::scene()
        }
    }
}

/// Steer away from the nearest obstacle closing in on the player's line
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(driver: &mut endless_drive::Driver) {
    use endless_drive::sim::EntityKind;

    let state = driver.state();
    let player = state.player();
    let (lane_min, lane_max) = state.lane_bounds();
    let corridor = (lane_max - lane_min) * 0.2;

    let threat = state
        .active(EntityKind::Obstacle)
        .filter(|e| e.forward < player.forward && (e.lateral - player.lateral).abs() < corridor)
        .max_by(|a, b| a.forward.total_cmp(&b.forward))
        .map(|e| e.lateral);
    // Head for whichever side of the obstacle has more room
    let go_left = threat.map(|lateral| lateral - lane_min > lane_max - lateral);

    driver.input.release();
    match go_left {
        Some(true) => driver.input.move_left = true,
        Some(false) => driver.input.move_right = true,
        None => {}
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use endless_drive::{Tuning, Variant};

    #[test]
    fn test_tuning_defaults_to_scene_without_argument() {
        assert_eq!(tuning_from_arg(None), Tuning::scene());
    }

    #[test]
    fn test_tuning_loaded_from_argument_path() {
        let path = std::env::temp_dir().join(format!("endless-drive-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"variant": "sprite", "max_speed": 9.0}"#).unwrap();
        let tuning = tuning_from_arg(Some(path.clone().into_os_string()));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(tuning.variant, Variant::Sprite);
        assert_eq!(tuning.max_speed, 9.0);
    }

    #[test]
    fn test_unreadable_tuning_falls_back_to_scene() {
        let missing = std::env::temp_dir().join("endless-drive-missing/tuning.json");
        assert_eq!(tuning_from_arg(Some(missing.into_os_string())), Tuning::scene());
    }
}
