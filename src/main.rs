//! Helix Drop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, KeyboardEvent, PointerEvent};

    use helix_drop::consts::*;
    use helix_drop::renderer::SdfRenderState;
    use helix_drop::sim::TickInput;
    use helix_drop::{Session, Tuning, platform};

    /// Game instance holding all state
    struct Game {
        session: Session,
        render_state: Option<SdfRenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Space held, so key repeat doesn't re-press
        key_down: bool,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(session: Session) -> Self {
            Self {
                session,
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                key_down: false,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                self.session.tick(&input);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.press = false;
                self.input.release = false;
                self.input.ui_captured = false;
            }
            self.session.frame(dt);

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.session, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn press(&mut self, over_ui: bool) {
            self.input.press = true;
            self.input.ui_captured = over_ui;
            self.session.resume_audio();
        }

        fn release(&mut self) {
            self.input.release = true;
        }

        /// Mirror the HUD model into the DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.session.hud();

            set_visible(&document, "home-screen", hud.home_screen_visible);
            set_visible(&document, "game-screen", hud.game_screen_visible);
            set_text(&document, "score-text", &hud.score_text);
            set_text(&document, "current-level", &hud.current_level_text);
            set_text(&document, "next-level", &hud.next_level_text);

            set_style(
                &document,
                "progress-fill",
                "width",
                &format!("{:.1}%", hud.progress_fill * 100.0),
            );
            set_style(&document, "progress-fill", "background-color", &hud.accent.to_css());
            set_style(&document, "progress-bar", "background-color", &hud.accent_soft.to_css());
            set_style(&document, "current-level", "background-color", &hud.accent.to_css());
            set_style(&document, "next-level", "background-color", &hud.accent.to_css());

            set_visible(&document, "meter", hud.meter_visible);
            set_style(
                &document,
                "meter-fill",
                "height",
                &format!("{:.1}%", hud.meter_fill * 100.0),
            );
            let meter_color = if hud.meter_hot {
                helix_drop::ui::METER_HOT
            } else {
                hud.accent
            };
            set_style(&document, "meter-fill", "background-color", &meter_color.to_css());
            set_visible(&document, "power-on", hud.power_on);
            set_visible(&document, "power-off", !hud.power_on);

            set_visible(&document, "game-over", hud.game_over_visible);
            set_text(&document, "game-over-text", &hud.game_over_text);
            set_visible(&document, "level-complete", hud.level_complete_visible);
            set_text(&document, "level-complete-text", &hud.level_complete_text);
            set_style(&document, "level-complete-text", "color", &hud.accent.to_css());

            set_visible(&document, "settings-panel", hud.settings_panel_open);
            if let Some(el) = document.get_element_by_id("sound-btn") {
                let class = if hud.sound_enabled { "" } else { "off" };
                let _ = el.set_attribute("class", class);
            }

            let show_fps = self.session.settings().show_fps;
            set_visible(&document, "fps", show_fps);
            if show_fps {
                set_text(&document, "fps", &format!("{} fps", self.fps));
            }
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = if visible {
                el.class_list().remove_1("hidden")
            } else {
                el.class_list().add_1("hidden")
            };
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_style(document: &Document, id: &str, property: &str, value: &str) {
        if let Some(el) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let _ = el.style().set_property(property, value);
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger unavailable: {}", e).into());
        }

        log::info!("Helix Drop starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()
            .map_err(|_| "not a canvas")?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = platform::seed_from_clock();
        let session = Session::new(platform::open_store(), Tuning::default(), seed);
        log::info!(
            "Session started at level {} with seed: {}",
            session.state().level,
            seed
        );
        let game = Rc::new(RefCell::new(Game::new(session)));

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&format!("Failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("Failed to get adapter: {}", e)))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, width, height)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        render_state.set_start_time(js_sys::Date::now());
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(game.clone())?;
        setup_buttons(&document, game.clone());
        setup_resize(&canvas, game.clone())?;

        request_animation_frame(game);

        log::info!("Helix Drop running!");
        Ok(())
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        // Pointer down anywhere; a press that lands on an overlay doesn't start the level
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let on_canvas = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlCanvasElement>().ok())
                    .is_some();
                game.borrow_mut().press(!on_canvas);
            });
            window.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().release();
            });
            window.add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref())?;
            window
                .add_event_listener_with_callback("pointercancel", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " => {
                        event.prevent_default();
                        if !g.key_down {
                            g.key_down = true;
                            g.press(false);
                        }
                    }
                    "a" | "A" => {
                        g.input.autopilot = !g.input.autopilot;
                        log::info!("Autopilot: {}", g.input.autopilot);
                    }
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.key() == " " {
                    let mut g = game.borrow_mut();
                    g.key_down = false;
                    g.release();
                }
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn on_click(document: &Document, id: &str, game: Rc<RefCell<Game>>, action: fn(&mut Game)) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                action(&mut game.borrow_mut());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "sound-btn", game.clone(), |g| {
            let enabled = g.session.toggle_sound();
            log::info!("Sound {}", if enabled { "on" } else { "off" });
        });
        on_click(document, "settings-btn", game.clone(), |g| {
            g.session.toggle_settings_panel();
        });
        on_click(document, "delete-prefs-btn", game, |g| {
            g.session.wipe_and_restart();
            g.accumulator = 0.0;
            g.input = TickInput {
                autopilot: g.input.autopilot,
                ..TickInput::default()
            };
        });
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else { return };
            let dpr = window.device_pixel_ratio();
            let width = (canvas.client_width() as f64 * dpr) as u32;
            let height = (canvas.client_height() as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(ref mut render_state) = game.borrow_mut().render_state {
                render_state.resize(width, height);
            }
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            // Hidden tabs get no frames; don't replay the gap as one long step
            let hidden = web_sys::window()
                .and_then(|w| w.document())
                .is_some_and(|d| d.visibility_state() == web_sys::VisibilityState::Hidden);
            if !hidden {
                g.update(dt, time);
                g.render(time);
                g.update_hud();
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Helix Drop failed to start: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use helix_drop::sim::{GameEvent, TickInput};
    use helix_drop::{Session, Tuning, platform};

    env_logger::init();
    log::info!("Helix Drop (native) starting...");
    log::info!("Native mode runs a headless autopilot session - run with `trunk serve` to play");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match platform::read_tuning(std::path::Path::new(&path)) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("{}; using default tuning", e);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    let seed = platform::seed_from_clock();
    let mut session = Session::new(platform::open_store(), tuning, seed);
    let input = TickInput {
        autopilot: true,
        ..TickInput::default()
    };

    const SCENES: u32 = 3;
    const MAX_TICKS: u32 = 120 * 600;
    let first_scene = session.scenes_loaded();
    let mut deaths = 0;
    let mut completions = 0;
    for _ in 0..MAX_TICKS {
        for event in session.tick(&input) {
            match event {
                GameEvent::Died => deaths += 1,
                GameEvent::LevelCompleted => completions += 1,
                _ => {}
            }
        }
        session.frame(helix_drop::consts::SIM_DT);
        if session.scenes_loaded() - first_scene >= SCENES {
            break;
        }
    }

    log::info!(
        "Autopilot finished at level {}: {} completed, {} died, score {}",
        session.state().level,
        completions,
        deaths,
        session.scores().current()
    );
    println!(
        "Level {} | completed {} | died {} | high score {}",
        session.state().level,
        completions,
        deaths,
        session.scores().high_score(session.store())
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
