use crate::config::{self, Config};
use crate::core::gamepad::{self, GamepadPoller, PadPoll};
use crate::core::input::{self, InputSource, KeyBinding};
use crate::core::router::InputRouter;
use crate::game::machine::{GameEvent, GameMachine, Phase};
use crate::game::mode::ModeTable;
use crate::game::scores::{FileStore, HighScores};
use crate::screens::trainer;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use log::{error, info, warn};
use std::{error::Error, path::Path, sync::Arc, time::Instant};

type Machine = GameMachine<HighScores<FileStore>>;

pub struct App {
    window: Option<Arc<Window>>,
    machine: Machine,
    router: InputRouter,
    gamepad: Option<GamepadPoller>,
    active_source: InputSource,
    config: Config,
    last_frame_time: Instant,
    last_title: String,
}

impl App {
    fn new(machine: Machine, config: Config) -> Self {
        let gamepad = gamepad::try_init(config.stick_deadzone);
        if gamepad.is_none() {
            warn!("Gamepad support unavailable, keyboard only.");
        }
        Self {
            window: None,
            machine,
            router: InputRouter::new(config.input_debounce),
            gamepad,
            active_source: InputSource::Keyboard,
            config,
            last_frame_time: Instant::now(),
            last_title: String::new(),
        }
    }

    #[inline(always)]
    fn gamepad_connected(&self) -> bool {
        self.gamepad.as_ref().is_some_and(GamepadPoller::is_connected)
    }

    fn report(&self, event: GameEvent) {
        if let Some(line) = trainer::describe(event, &self.machine.snapshot()) {
            info!("{}", line);
        }
    }

    fn set_source(&mut self, source: InputSource) {
        if self.active_source != source {
            info!("Input source: {:?}", source);
            self.active_source = source;
        }
    }

    /// Keys that call straight into the machine instead of going through the router.
    /// Returns true when the key was consumed.
    fn handle_hotkey(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) -> bool {
        let Some(binding) = input::binding_for_key(code) else { return false; };
        if self.machine.in_failure_timeout() {
            return matches!(binding, KeyBinding::Reset | KeyBinding::PickMode(_));
        }
        match binding {
            KeyBinding::Reset => {
                self.machine.reset_game(false);
                info!("Reset.");
                true
            }
            KeyBinding::PickMode(index) => {
                let event = self.machine.set_mode(index);
                self.report(event);
                true
            }
            KeyBinding::Back if self.machine.phase() == Phase::Menu => {
                info!("Exit requested from menu. Shutting down.");
                event_loop.exit();
                true
            }
            _ => false,
        }
    }

    fn poll_gamepad(&mut self, now: Instant) {
        let Some(pad) = self.gamepad.as_mut() else { return; };
        match pad.poll() {
            PadPoll::Idle => {}
            PadPoll::Sample(frame) => {
                self.set_source(InputSource::Gamepad);
                let event = self.router.route(frame, now, &mut self.machine);
                self.report(event);
            }
            PadPoll::Disconnected(frame) => {
                let event = self.router.route(frame, now, &mut self.machine);
                self.report(event);
                self.set_source(InputSource::Keyboard);
            }
        }
    }

    fn refresh_title(&mut self) {
        let Some(window) = self.window.as_ref() else { return; };
        let title = trainer::window_title(&self.machine.snapshot());
        if title != self.last_title {
            window.set_title(&title);
            self.last_title = title;
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let attributes = Window::default_attributes()
            .with_title(config::WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(self.config.window_width, self.config.window_height))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(attributes)?);
        self.window = Some(window);
        info!("Starting event loop...");
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else { return; };
        if window_id != window.id() { return; }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested. Shutting down.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let Some((code, pressed)) = input::key_transition(&key_event) else { return; };
                if pressed && self.handle_hotkey(code, event_loop) {
                    self.refresh_title();
                    return;
                }
                // A connected pad owns the directional input.
                if self.gamepad_connected() {
                    if !pressed {
                        self.router.lift_key(code);
                    }
                    return;
                }
                self.set_source(InputSource::Keyboard);
                let event = self.router.key(code, pressed, Instant::now(), &mut self.machine);
                self.report(event);
                self.refresh_title();
            }
            WindowEvent::Focused(false) => {
                let event = self.router.release_keys(Instant::now(), &mut self.machine);
                self.report(event);
            }
            WindowEvent::RedrawRequested => self.refresh_title(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta_time = now.duration_since(self.last_frame_time).min(config::MAX_DELTA_TIME);
        self.last_frame_time = now;

        self.poll_gamepad(now);
        let event = self.router.tick(delta_time, now, &mut self.machine);
        self.report(event);
        self.refresh_title();

        event_loop.set_control_flow(ControlFlow::WaitUntil(now + config::FRAME_INTERVAL));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.machine.shutdown();
        self.gamepad = None;
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let config = config::load(Path::new(config::CONFIG_PATH));
    let modes = ModeTable::load_or_builtin(config.modes_file.as_deref());
    let store = HighScores::load(FileStore::new(&config.save_dir));
    let machine = GameMachine::new(modes, store, config.machine());

    let event_loop = EventLoop::new()?;
    let mut app = App::new(machine, config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
