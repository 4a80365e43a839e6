use crate::core::direction::Direction;
use crate::core::input::KeyboardState;
use crate::game::machine::{GameEvent, GameMachine, InputFrame};
use crate::game::scores::ScoreStore;
use log::{debug, trace};
use std::time::{Duration, Instant};
use winit::keyboard::KeyCode;

/// Sits between the input sources and the machine. Only changes get through,
/// nothing gets through while the machine is serving a miss pause, and input
/// held across a reset stays swallowed until it changes.
#[derive(Debug, Clone)]
pub struct InputRouter {
    last: InputFrame,
    /// Most recent sample from any source, forwarded or not.
    latest: InputFrame,
    /// Direction that was held across a reset. Reads as neutral until released.
    stale: Option<Direction>,
    pending: Option<InputFrame>,
    last_forward_at: Option<Instant>,
    debounce: Duration,
    keyboard: KeyboardState,
    epoch: u64,
    forwarded: u64,
}

impl InputRouter {
    pub fn new(debounce: Duration) -> Self {
        Self {
            last: InputFrame::default(),
            latest: InputFrame::default(),
            stale: None,
            pending: None,
            last_forward_at: None,
            debounce,
            keyboard: KeyboardState::default(),
            epoch: 0,
            forwarded: 0,
        }
    }

    /// Total frames handed to the machine so far.
    #[inline(always)]
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    #[inline(always)]
    pub fn last_forwarded(&self) -> InputFrame {
        self.last
    }

    #[inline(always)]
    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// Forgets pending input and takes whatever is held right now as the
    /// baseline, so a direction held through a reset is not applied again.
    pub fn reset_input_state(&mut self) {
        self.pending = None;
        self.last_forward_at = None;
        let held = self.latest.direction;
        self.stale = (held != Direction::Neutral).then_some(held);
        self.last = InputFrame { direction: Direction::Neutral, ..self.latest };
        if let Some(dir) = self.stale {
            debug!("Holding {} across reset, ignored until released.", dir);
        }
    }

    /// Feeds one sampled frame from any source.
    pub fn route<S: ScoreStore>(&mut self, frame: InputFrame, now: Instant, machine: &mut GameMachine<S>) -> GameEvent {
        self.sync(machine);
        self.latest = frame;
        if machine.in_failure_timeout() {
            self.pending = None;
            return GameEvent::None;
        }

        let frame = self.unstale(frame);
        if frame == self.last {
            self.pending = None;
            return GameEvent::None;
        }

        let buttons_changed = frame.select_pressed != self.last.select_pressed
            || frame.back_pressed != self.last.back_pressed;
        if !buttons_changed && self.within_debounce(now) {
            trace!("Debouncing {:?}", frame.direction);
            self.pending = Some(frame);
            return GameEvent::None;
        }
        self.forward(frame, now, machine)
    }

    /// Feeds a key press or release through the held-key accumulator.
    pub fn key<S: ScoreStore>(&mut self, code: KeyCode, pressed: bool, now: Instant, machine: &mut GameMachine<S>) -> GameEvent {
        if !self.keyboard.apply(code, pressed) {
            return GameEvent::None;
        }
        let frame = self.keyboard.frame();
        self.route(frame, now, machine)
    }

    /// Records a release without routing anything, for keys let go while
    /// another source owns the input.
    pub fn lift_key(&mut self, code: KeyCode) {
        self.keyboard.apply(code, false);
    }

    /// Drops every held key, e.g. when the window loses focus and releases
    /// will never arrive.
    pub fn release_keys<S: ScoreStore>(&mut self, now: Instant, machine: &mut GameMachine<S>) -> GameEvent {
        if self.keyboard.is_idle() {
            return GameEvent::None;
        }
        self.keyboard.clear();
        self.route(InputFrame::default(), now, machine)
    }

    /// Per-frame tick: drives the machine's timers, then flushes a debounced frame.
    pub fn tick<S: ScoreStore>(&mut self, dt: Duration, now: Instant, machine: &mut GameMachine<S>) -> GameEvent {
        let event = machine.tick(dt);
        self.sync(machine);
        if event != GameEvent::None {
            return event;
        }

        if machine.in_failure_timeout() || self.within_debounce(now) {
            return GameEvent::None;
        }
        match self.pending.take() {
            Some(frame) if frame != self.last => self.forward(frame, now, machine),
            _ => GameEvent::None,
        }
    }

    fn forward<S: ScoreStore>(&mut self, frame: InputFrame, now: Instant, machine: &mut GameMachine<S>) -> GameEvent {
        self.pending = None;
        self.last = frame;
        self.last_forward_at = Some(now);
        self.forwarded += 1;

        let event = machine.update(frame);
        self.sync(machine);
        event
    }

    /// Masks the stale direction to neutral until the player moves off it.
    fn unstale(&mut self, frame: InputFrame) -> InputFrame {
        match self.stale {
            Some(dir) if frame.direction == dir => InputFrame { direction: Direction::Neutral, ..frame },
            Some(_) => {
                self.stale = None;
                frame
            }
            None => frame,
        }
    }

    fn within_debounce(&self, now: Instant) -> bool {
        match self.last_forward_at {
            Some(at) => now.saturating_duration_since(at) < self.debounce,
            None => false,
        }
    }

    fn sync<S: ScoreStore>(&mut self, machine: &GameMachine<S>) {
        if machine.input_epoch() != self.epoch {
            self.epoch = machine.input_epoch();
            self.reset_input_state();
        }
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
