use crate::core::direction::Direction;
use crate::core::timer::IntervalTimer;
use crate::game::mode::{Mode, ModeTable};
use crate::game::scores::ScoreStore;
use crate::game::scoring::{self, Scoring};
use log::{debug, info};
use std::time::Duration;

pub const FAILURE_TIMEOUT: Duration = Duration::from_millis(2000);
pub const FAILURE_TICK: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputFrame {
    pub direction: Direction,
    pub select_pressed: bool,
    pub back_pressed: bool,
}

impl InputFrame {
    pub const fn dir(direction: Direction) -> Self {
        Self { direction, select_pressed: false, back_pressed: false }
    }

    pub const fn select() -> Self {
        Self { direction: Direction::Neutral, select_pressed: true, back_pressed: false }
    }

    pub const fn back() -> Self {
        Self { direction: Direction::Neutral, select_pressed: false, back_pressed: true }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Accuracy {
    #[default]
    None,
    Success,
    Fail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Playing,
    FailureTimeout,
}

impl Phase {
    pub const fn status(self) -> &'static str {
        match self {
            Phase::Menu => "menu",
            Phase::Playing => "playing",
            Phase::FailureTimeout => "miss_pause",
        }
    }
}

/// What a call into the machine changed, for logging and presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    None,
    ModeChanged { index: usize },
    RunStarted { index: usize },
    RunStopped { new_high_score: bool },
    Hit { points: u64, completed: bool },
    Miss { expected: Direction, got: Direction, paused: bool },
    PauseExpired,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub selected_mode: usize,
    pub running: bool,
    pub player_pos: usize,
    pub score: u64,
    pub high_score: u64,
    pub last_input_accuracy: Accuracy,
    pub last_input: Direction,
    pub combo: u32,
    pub max_combo: u32,
    pub total_inputs: u32,
    pub perfect_inputs: u32,
    pub missed_inputs: u32,
    pub in_failure_timeout: bool,
    pub failure_timeout_remaining: Duration,
    pub prev_direction: Direction,
    pub run_elapsed: Duration,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            selected_mode: 0,
            running: false,
            player_pos: 0,
            score: 0,
            high_score: 0,
            last_input_accuracy: Accuracy::None,
            last_input: Direction::Neutral,
            combo: 0,
            max_combo: 0,
            total_inputs: 0,
            perfect_inputs: 0,
            missed_inputs: 0,
            in_failure_timeout: false,
            failure_timeout_remaining: Duration::ZERO,
            prev_direction: Direction::Neutral,
            run_elapsed: Duration::ZERO,
        }
    }
}

/// Read-only view handed to the presentation layer each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<'a> {
    pub selected_mode: usize,
    pub mode: &'a Mode,
    pub running: bool,
    pub player_pos: usize,
    pub score: u64,
    pub high_score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub accuracy: f64,
    pub last_input_accuracy: Accuracy,
    pub in_failure_timeout: bool,
    pub failure_timeout_remaining: Duration,
    pub pattern: &'a [Direction],
    pub expected: Option<Direction>,
    pub phase: Phase,
    pub run_elapsed: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MachineConfig {
    pub scoring: Scoring,
    pub failure_timeout: Duration,
    pub failure_tick: Duration,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            scoring: Scoring::default(),
            failure_timeout: FAILURE_TIMEOUT,
            failure_tick: FAILURE_TICK,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Buttons {
    select: bool,
    back: bool,
}

pub struct GameMachine<S: ScoreStore> {
    modes: ModeTable,
    config: MachineConfig,
    store: S,
    state: GameState,
    pause_timer: IntervalTimer,
    prev_buttons: Buttons,
    input_epoch: u64,
}

impl<S: ScoreStore> GameMachine<S> {
    pub fn new(modes: ModeTable, store: S, config: MachineConfig) -> Self {
        let mut state = GameState::default();
        if let Some(mode) = modes.get(0) {
            state.high_score = store.get(mode.id);
        }
        Self {
            modes,
            pause_timer: IntervalTimer::new(config.failure_tick),
            config,
            store,
            state,
            prev_buttons: Buttons::default(),
            input_epoch: 0,
        }
    }

    // --- Accessors ---

    #[inline(always)]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[inline(always)]
    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    #[inline(always)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bumped every time the run is reset; input routers clear their memory when it moves.
    #[inline(always)]
    pub fn input_epoch(&self) -> u64 {
        self.input_epoch
    }

    #[inline(always)]
    pub fn in_failure_timeout(&self) -> bool {
        self.state.in_failure_timeout
    }

    #[inline(always)]
    pub fn pause_timer_active(&self) -> bool {
        self.pause_timer.is_active()
    }

    pub fn current_mode(&self) -> &Mode {
        &self.modes[self.state.selected_mode]
    }

    pub fn phase(&self) -> Phase {
        if self.state.in_failure_timeout {
            Phase::FailureTimeout
        } else if self.state.running {
            Phase::Playing
        } else {
            Phase::Menu
        }
    }

    /// `menu`, `playing` or `miss_pause`.
    pub fn status(&self) -> &'static str {
        self.phase().status()
    }

    pub fn accuracy(&self) -> f64 {
        scoring::accuracy(self.state.perfect_inputs, self.state.total_inputs)
    }

    pub fn expected_input(&self) -> Option<Direction> {
        if !self.state.running {
            return None;
        }
        self.current_mode().pattern.get(self.state.player_pos).copied()
    }

    /// Percent of the current pattern already entered.
    pub fn progress(&self) -> f64 {
        if !self.state.running {
            return 0.0;
        }
        self.state.player_pos as f64 / self.current_mode().pattern.len() as f64 * 100.0
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let mode = self.current_mode();
        Snapshot {
            selected_mode: self.state.selected_mode,
            mode,
            running: self.state.running,
            player_pos: self.state.player_pos,
            score: self.state.score,
            high_score: self.state.high_score,
            combo: self.state.combo,
            max_combo: self.state.max_combo,
            accuracy: self.accuracy(),
            last_input_accuracy: self.state.last_input_accuracy,
            in_failure_timeout: self.state.in_failure_timeout,
            failure_timeout_remaining: self.state.failure_timeout_remaining,
            pattern: &mode.pattern,
            expected: self.expected_input(),
            phase: self.phase(),
            run_elapsed: self.state.run_elapsed,
        }
    }

    // --- Commands ---

    /// Out-of-range indices are ignored. Switching mid-run saves the outgoing
    /// mode's best and starts the new mode from a clean score.
    pub fn set_mode(&mut self, index: usize) -> GameEvent {
        let Some(mode_id) = self.modes.get(index).map(|m| m.id) else {
            debug!("Ignoring mode index {} (have {}).", index, self.modes.len());
            return GameEvent::None;
        };
        if self.state.running {
            self.persist_high_score();
            self.pause_timer.cancel();
            self.clear_run(true);
        }
        self.state.selected_mode = index;
        self.state.high_score = self.store.get(mode_id);
        GameEvent::ModeChanged { index }
    }

    pub fn start_game(&mut self) -> GameEvent {
        let mode_id = self.current_mode().id;
        let high_score = self.store.get(mode_id);
        info!("Starting mode {} ({}), stored high score {}.", self.state.selected_mode, self.current_mode().name, high_score);

        self.pause_timer.cancel();
        self.clear_run(false);
        self.state.high_score = high_score;
        self.state.running = true;
        GameEvent::RunStarted { index: self.state.selected_mode }
    }

    pub fn stop_game(&mut self) -> GameEvent {
        self.pause_timer.cancel();
        self.state.in_failure_timeout = false;
        self.state.failure_timeout_remaining = Duration::ZERO;

        let new_high_score = self.persist_high_score();
        self.state.running = false;
        self.state.prev_direction = Direction::Neutral;
        info!("Run stopped with score {} (best {}).", self.state.score, self.state.high_score);
        GameEvent::RunStopped { new_high_score }
    }

    /// Back to the menu without persisting; `preserve_stats` keeps the input counters.
    pub fn reset_game(&mut self, preserve_stats: bool) -> GameEvent {
        self.pause_timer.cancel();
        self.clear_run(preserve_stats);
        self.state.running = false;
        GameEvent::None
    }

    /// Persists the run before the machine goes away.
    pub fn shutdown(&mut self) {
        if self.state.running {
            self.stop_game();
        }
        self.pause_timer.cancel();
    }

    pub fn update(&mut self, input: InputFrame) -> GameEvent {
        let select_edge = input.select_pressed && !self.prev_buttons.select;
        let back_edge = input.back_pressed && !self.prev_buttons.back;
        self.prev_buttons = Buttons { select: input.select_pressed, back: input.back_pressed };

        match self.phase() {
            Phase::Menu => self.update_menu(input.direction, select_edge),
            Phase::Playing => self.update_game(input.direction, back_edge),
            Phase::FailureTimeout => GameEvent::None,
        }
    }

    /// Advances run time and the miss-pause countdown.
    pub fn tick(&mut self, dt: Duration) -> GameEvent {
        if self.state.running {
            self.state.run_elapsed += dt;
        }

        let fired = self.pause_timer.advance(dt);
        for _ in 0..fired {
            let step = self.pause_timer.interval();
            self.state.failure_timeout_remaining = self.state.failure_timeout_remaining.saturating_sub(step);
            if self.state.failure_timeout_remaining.is_zero() {
                self.expire_failure_timeout();
                return GameEvent::PauseExpired;
            }
        }
        // The last step may be shorter than a tick.
        if self.state.in_failure_timeout && self.pause_timer.since_fire() >= self.state.failure_timeout_remaining {
            self.expire_failure_timeout();
            return GameEvent::PauseExpired;
        }
        GameEvent::None
    }

    // --- Transitions ---

    fn update_menu(&mut self, direction: Direction, select: bool) -> GameEvent {
        if select {
            return self.start_game();
        }
        if direction == self.state.prev_direction {
            return GameEvent::None;
        }
        self.state.prev_direction = direction;

        let count = self.modes.len();
        let index = match direction {
            Direction::Forward => (self.state.selected_mode + 1) % count,
            Direction::Back => (self.state.selected_mode + count - 1) % count,
            _ => return GameEvent::None,
        };
        self.set_mode(index)
    }

    fn update_game(&mut self, direction: Direction, back: bool) -> GameEvent {
        if back {
            return self.stop_game();
        }
        if direction == self.state.prev_direction {
            return GameEvent::None;
        }
        self.state.prev_direction = direction;
        self.state.last_input = direction;

        let pattern_len = self.current_mode().pattern.len();
        let expected = self.current_mode().pattern[self.state.player_pos];
        self.state.total_inputs += 1;

        if direction == expected {
            self.register_hit(pattern_len)
        } else {
            self.register_miss(expected, direction)
        }
    }

    fn register_hit(&mut self, pattern_len: usize) -> GameEvent {
        let scoring = self.config.scoring;
        let mut points = scoring.award(self.state.combo);

        self.state.perfect_inputs += 1;
        self.state.combo += 1;
        self.state.max_combo = self.state.max_combo.max(self.state.combo);

        let completed = self.state.player_pos + 1 == pattern_len;
        if completed {
            self.state.player_pos = 0;
            points += scoring.perfect_pattern;
        } else {
            self.state.player_pos += 1;
        }

        self.state.score += points;
        self.state.high_score = self.state.high_score.max(self.state.score);
        self.state.last_input_accuracy = Accuracy::Success;
        GameEvent::Hit { points, completed }
    }

    fn register_miss(&mut self, expected: Direction, got: Direction) -> GameEvent {
        self.state.missed_inputs += 1;
        self.state.combo = 0;
        self.state.last_input_accuracy = Accuracy::Fail;

        // A miss on the first step is a restart point, not a punishable failure.
        let paused = self.state.player_pos != 0 || self.config.scoring.strict_first_input;
        debug!("Wrong input at position {}: got {}, expected {}.", self.state.player_pos, got, expected);
        if paused {
            self.enter_failure_timeout();
        }
        GameEvent::Miss { expected, got, paused }
    }

    fn enter_failure_timeout(&mut self) {
        self.state.in_failure_timeout = true;
        self.state.failure_timeout_remaining = self.config.failure_timeout;
        self.pause_timer.schedule();
        if self.config.failure_timeout.is_zero() {
            self.expire_failure_timeout();
        }
    }

    fn expire_failure_timeout(&mut self) {
        self.pause_timer.cancel();
        self.state.in_failure_timeout = false;
        self.state.failure_timeout_remaining = Duration::ZERO;
        self.state.player_pos = 0;
        self.state.score = 0;
        self.state.combo = 0;
        self.state.last_input_accuracy = Accuracy::None;
        self.state.prev_direction = Direction::Neutral;
        self.state.last_input = Direction::Neutral;
        self.input_epoch += 1;
        debug!("Miss pause over, pattern restarted.");
    }

    fn clear_run(&mut self, preserve_stats: bool) {
        let s = &mut self.state;
        s.player_pos = 0;
        s.score = 0;
        s.combo = 0;
        s.last_input_accuracy = Accuracy::None;
        s.last_input = Direction::Neutral;
        s.prev_direction = Direction::Neutral;
        s.in_failure_timeout = false;
        s.failure_timeout_remaining = Duration::ZERO;
        s.run_elapsed = Duration::ZERO;
        if !preserve_stats {
            s.max_combo = 0;
            s.total_inputs = 0;
            s.perfect_inputs = 0;
            s.missed_inputs = 0;
        }
        self.input_epoch += 1;
    }

    fn persist_high_score(&mut self) -> bool {
        let mode_id = self.current_mode().id;
        let best = self.state.high_score.max(self.state.score);
        if best > self.store.get(mode_id) {
            info!("New high score {} for mode {}.", best, mode_id);
            self.store.set(mode_id, best);
            return true;
        }
        false
    }
}

impl<S: ScoreStore> Drop for GameMachine<S> {
    fn drop(&mut self) {
        self.pause_timer.cancel();
    }
}
