use std::time::Duration;

use kbdtrainer::core::direction::Direction::{self, *};
use kbdtrainer::game::machine::{
    Accuracy, FAILURE_TICK, FAILURE_TIMEOUT, GameEvent, GameMachine, InputFrame, MachineConfig, Phase,
};
use kbdtrainer::game::mode::ModeTable;
use kbdtrainer::game::scores::{HighScores, MemoryStore, ScoreStore};
use kbdtrainer::game::scoring::Scoring;

type Machine = GameMachine<HighScores<MemoryStore>>;

fn machine_with(config: MachineConfig) -> Machine {
    GameMachine::new(ModeTable::builtin(), HighScores::load(MemoryStore::new()), config)
}

fn machine() -> Machine {
    machine_with(MachineConfig::default())
}

fn feed(m: &mut Machine, dirs: &[Direction]) -> Vec<GameEvent> {
    dirs.iter().map(|&d| m.update(InputFrame::dir(d))).collect()
}

fn run_clock(m: &mut Machine, total: Duration, step: Duration) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        events.push(m.tick(step));
        elapsed += step;
    }
    events
}

#[test]
fn starts_in_menu_with_defaults() {
    let m = machine();
    let s = m.state();
    assert_eq!(m.phase(), Phase::Menu);
    assert_eq!(s.selected_mode, 0);
    assert!(!s.running);
    assert_eq!((s.player_pos, s.score, s.combo), (0, 0, 0));
    assert_eq!(m.accuracy(), 100.0);
}

#[test]
fn set_mode_accepts_only_valid_indices() {
    let mut m = machine();
    for index in 0..m.modes().len() {
        assert_eq!(m.set_mode(index), GameEvent::ModeChanged { index });
        assert_eq!(m.state().selected_mode, index);
    }

    m.set_mode(1);
    let before = m.state().clone();
    assert_eq!(m.set_mode(4), GameEvent::None);
    assert_eq!(m.set_mode(usize::MAX), GameEvent::None);
    assert_eq!(m.state(), &before);
}

#[test]
fn menu_navigation_wraps_in_both_directions() {
    let mut m = machine();
    m.update(InputFrame::dir(Back));
    assert_eq!(m.state().selected_mode, 3);

    m.update(InputFrame::dir(Neutral));
    m.update(InputFrame::dir(Forward));
    assert_eq!(m.state().selected_mode, 0);
    m.update(InputFrame::dir(Neutral));
    m.update(InputFrame::dir(Forward));
    assert_eq!(m.state().selected_mode, 1);
}

#[test]
fn held_direction_moves_the_menu_once() {
    let mut m = machine();
    m.update(InputFrame::dir(Forward));
    m.update(InputFrame::dir(Forward));
    m.update(InputFrame::dir(Forward));
    assert_eq!(m.state().selected_mode, 1);
}

#[test]
fn select_starts_a_run_with_the_stored_high_score() {
    let mut store = HighScores::load(MemoryStore::new());
    store.set(2, 480);
    let mut m = GameMachine::new(ModeTable::builtin(), store, MachineConfig::default());

    m.set_mode(2);
    let event = m.update(InputFrame::select());
    assert_eq!(event, GameEvent::RunStarted { index: 2 });

    let s = m.state();
    assert!(s.running);
    assert_eq!(m.phase(), Phase::Playing);
    assert_eq!((s.player_pos, s.score, s.combo), (0, 0, 0));
    assert_eq!(s.high_score, 480);
    assert_eq!(s.last_input_accuracy, Accuracy::None);
}

#[test]
fn full_pattern_scores_with_combo_scaling_and_bonus() {
    let mut m = machine();
    m.start_game();

    let events = feed(&mut m, &[Back, Neutral, Back, DownBack]);
    assert_eq!(events.last(), Some(&GameEvent::Hit { points: 165, completed: true }));

    let s = m.state();
    assert_eq!(s.player_pos, 0);
    assert_eq!(s.score, 50 + 55 + 60 + 65 + 100);
    assert_eq!(s.combo, 4);
    assert_eq!(s.max_combo, 4);
    assert_eq!(s.last_input_accuracy, Accuracy::Success);
    assert_eq!(s.high_score, 330);
    assert_eq!(m.accuracy(), 100.0);
}

#[test]
fn full_pattern_scores_flat_without_combo_step() {
    let mut m = machine_with(MachineConfig { scoring: Scoring::flat(), ..MachineConfig::default() });
    m.start_game();
    feed(&mut m, &[Back, Neutral, Back, DownBack]);

    let s = m.state();
    assert_eq!(s.score, 50 + 50 + 50 + 50 + 100);
    assert_eq!(s.player_pos, 0);
    assert_eq!(s.combo, 4);
}

#[test]
fn combo_carries_into_the_next_cycle() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Neutral, Back, DownBack]);
    // The pattern restarts on BACK; combo 4 scales it to 70.
    let events = feed(&mut m, &[Back]);
    assert_eq!(events[0], GameEvent::Hit { points: 70, completed: false });
    assert_eq!(m.state().player_pos, 1);
}

#[test]
fn unchanged_direction_is_not_processed_twice() {
    let mut m = machine();
    m.start_game();
    m.update(InputFrame::dir(Back));
    let event = m.update(InputFrame::dir(Back));

    assert_eq!(event, GameEvent::None);
    assert_eq!(m.state().total_inputs, 1);
    assert_eq!(m.state().player_pos, 1);
}

#[test]
fn miss_mid_pattern_pauses_then_restarts_the_pattern() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Neutral]);
    let event = m.update(InputFrame::dir(Up));

    assert_eq!(event, GameEvent::Miss { expected: Back, got: Up, paused: true });
    let s = m.state();
    assert_eq!(s.last_input_accuracy, Accuracy::Fail);
    assert_eq!(s.combo, 0);
    assert!(s.in_failure_timeout);
    assert_eq!(s.failure_timeout_remaining, FAILURE_TIMEOUT);
    assert_eq!(m.phase(), Phase::FailureTimeout);
    assert_eq!(m.status(), "miss_pause");

    // Input is ignored while paused.
    let ignored = feed(&mut m, &[Back, Neutral, Down]);
    assert!(ignored.iter().all(|e| *e == GameEvent::None));
    assert_eq!(m.state().total_inputs, 3);

    let events = run_clock(&mut m, FAILURE_TIMEOUT - FAILURE_TICK, FAILURE_TICK);
    assert!(events.iter().all(|e| *e == GameEvent::None));
    assert!(m.in_failure_timeout());
    assert_eq!(m.state().failure_timeout_remaining, FAILURE_TICK);

    assert_eq!(m.tick(FAILURE_TICK), GameEvent::PauseExpired);
    let s = m.state();
    assert!(!s.in_failure_timeout);
    assert!(s.running);
    assert_eq!((s.player_pos, s.score, s.combo), (0, 0, 0));
    assert_eq!(s.last_input_accuracy, Accuracy::None);
    assert_eq!(s.prev_direction, Neutral);
    assert_eq!(m.phase(), Phase::Playing);
    assert!(!m.pause_timer_active());
}

#[test]
fn countdown_handles_uneven_frame_steps() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Up]);
    assert!(m.in_failure_timeout());

    // 117 frames of 17 ms = 1989 ms, short of the deadline.
    let events = run_clock(&mut m, Duration::from_millis(1989), Duration::from_millis(17));
    assert!(events.iter().all(|e| *e == GameEvent::None));
    assert!(m.in_failure_timeout());
    assert_eq!(m.tick(Duration::from_millis(17)), GameEvent::PauseExpired);
}

#[test]
fn miss_on_first_step_does_not_pause() {
    let mut m = machine();
    m.start_game();
    let event = m.update(InputFrame::dir(Forward));

    assert_eq!(event, GameEvent::Miss { expected: Back, got: Forward, paused: false });
    let s = m.state();
    assert!(!s.in_failure_timeout);
    assert_eq!(s.last_input_accuracy, Accuracy::Fail);
    assert_eq!(s.missed_inputs, 1);
    assert!(!m.pause_timer_active());

    // Play continues from the start.
    m.update(InputFrame::dir(Back));
    assert_eq!(m.state().player_pos, 1);
    assert_eq!(m.state().last_input_accuracy, Accuracy::Success);
}

#[test]
fn strict_rule_pauses_on_first_step_miss() {
    let scoring = Scoring { strict_first_input: true, ..Scoring::default() };
    let mut m = machine_with(MachineConfig { scoring, ..MachineConfig::default() });
    m.start_game();
    m.update(InputFrame::dir(Forward));
    assert!(m.in_failure_timeout());
}

#[test]
fn back_stops_the_run_and_persists_a_new_high_score() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Neutral, Back, DownBack]);

    let event = m.update(InputFrame::back());
    assert_eq!(event, GameEvent::RunStopped { new_high_score: true });
    assert!(!m.state().running);
    assert_eq!(m.phase(), Phase::Menu);
    assert_eq!(m.store().get(0), 330);
}

#[test]
fn lower_score_does_not_overwrite_the_stored_best() {
    let mut store = HighScores::load(MemoryStore::new());
    store.set(0, 1000);
    let mut m = GameMachine::new(ModeTable::builtin(), store, MachineConfig::default());
    m.start_game();
    feed(&mut m, &[Back, Neutral]);

    assert_eq!(m.update(InputFrame::back()), GameEvent::RunStopped { new_high_score: false });
    assert_eq!(m.store().get(0), 1000);
}

#[test]
fn run_best_survives_a_miss_reset() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Neutral, Back, DownBack, Back, Up]);
    run_clock(&mut m, FAILURE_TIMEOUT, FAILURE_TICK);
    assert_eq!(m.state().score, 0);

    m.stop_game();
    assert_eq!(m.store().get(0), 330 + 70);
}

#[test]
fn stopping_during_a_pause_cancels_the_timer() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Up]);
    assert!(m.pause_timer_active());

    m.stop_game();
    assert!(!m.pause_timer_active());
    assert!(!m.in_failure_timeout());
    assert_eq!(m.phase(), Phase::Menu);

    // Nothing left to expire.
    let events = run_clock(&mut m, FAILURE_TIMEOUT * 2, FAILURE_TICK);
    assert!(events.iter().all(|e| *e == GameEvent::None));
}

#[test]
fn starting_again_clears_a_pending_pause() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Up]);
    m.start_game();

    assert!(!m.pause_timer_active());
    assert!(!m.in_failure_timeout());
    assert_eq!(m.state().total_inputs, 0);
}

#[test]
fn back_is_ignored_during_the_pause() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Up]);
    assert_eq!(m.update(InputFrame::back()), GameEvent::None);
    assert!(m.state().running);
}

#[test]
fn held_select_does_not_restart_after_returning_to_menu() {
    let mut m = machine();
    m.update(InputFrame::select());
    // Select is still down when back is hit.
    let both = InputFrame { direction: Neutral, select_pressed: true, back_pressed: true };
    assert_eq!(m.update(both), GameEvent::RunStopped { new_high_score: false });
    let held = InputFrame { direction: Forward, select_pressed: true, back_pressed: false };
    assert_eq!(m.update(held), GameEvent::ModeChanged { index: 1 });
    assert_eq!(m.phase(), Phase::Menu);
}

#[test]
fn accuracy_counts_hits_over_all_inputs() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Up, Back, Neutral, Back]);
    let s = m.state();
    assert_eq!((s.total_inputs, s.perfect_inputs, s.missed_inputs), (4, 3, 1));
    assert_eq!(m.accuracy(), 75.0);
}

#[test]
fn reset_returns_to_menu_and_bumps_the_input_epoch() {
    let mut m = machine();
    let epoch = m.input_epoch();
    m.start_game();
    feed(&mut m, &[Back, Neutral]);
    m.reset_game(true);

    assert!(!m.state().running);
    assert_eq!(m.state().player_pos, 0);
    assert_eq!(m.state().total_inputs, 2);
    assert!(m.input_epoch() > epoch);

    m.reset_game(false);
    assert_eq!(m.state().total_inputs, 0);
}

#[test]
fn switching_mode_mid_run_restarts_the_pattern() {
    let mut m = machine();
    m.set_mode(2);
    m.start_game();
    feed(&mut m, &[Forward, Neutral, Down, DownForward, Forward]);
    assert_eq!(m.state().player_pos, 5);

    m.set_mode(0);
    assert_eq!(m.state().player_pos, 0);
    assert_eq!(m.expected_input(), Some(Back));
}

#[test]
fn snapshot_exposes_the_presentation_fields() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Neutral]);
    m.tick(Duration::from_millis(1500));

    let snap = m.snapshot();
    assert_eq!(snap.pattern, &[Back, Neutral, Back, DownBack]);
    assert_eq!(snap.expected, Some(Back));
    assert_eq!(snap.player_pos, 2);
    assert_eq!(snap.phase, Phase::Playing);
    assert_eq!(snap.run_elapsed, Duration::from_millis(1500));
    assert_eq!(m.progress(), 50.0);
}

#[test]
fn shutdown_persists_an_active_run() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back]);
    m.shutdown();
    assert_eq!(m.store().get(0), 50);
    assert!(!m.state().running);
}

#[test]
fn switching_mode_mid_run_keeps_each_best_under_its_own_mode() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Neutral, Back, DownBack]);
    assert_eq!(m.state().score, 330);

    assert_eq!(m.set_mode(1), GameEvent::ModeChanged { index: 1 });
    assert_eq!(m.store().get(0), 330);
    let s = m.state();
    assert!(s.running);
    assert_eq!((s.score, s.combo, s.player_pos, s.high_score), (0, 0, 0, 0));

    assert_eq!(m.stop_game(), GameEvent::RunStopped { new_high_score: false });
    assert_eq!(m.store().get(0), 330);
    assert_eq!(m.store().get(1), 0);
}

#[test]
fn switching_mode_during_the_pause_ends_it() {
    let mut m = machine();
    m.start_game();
    feed(&mut m, &[Back, Up]);
    assert!(m.in_failure_timeout());

    m.set_mode(2);
    assert!(!m.in_failure_timeout());
    assert!(!m.pause_timer_active());
    assert_eq!(m.phase(), Phase::Playing);
    assert_eq!(m.expected_input(), Some(Forward));
}

#[test]
fn countdown_ends_on_time_when_not_a_whole_number_of_ticks() {
    let config = MachineConfig { failure_timeout: Duration::from_millis(250), ..MachineConfig::default() };
    let mut m = machine_with(config);
    m.start_game();
    feed(&mut m, &[Back, Up]);

    assert_eq!(m.tick(Duration::from_millis(100)), GameEvent::None);
    assert_eq!(m.tick(Duration::from_millis(100)), GameEvent::None);
    assert_eq!(m.state().failure_timeout_remaining, Duration::from_millis(50));
    assert_eq!(m.tick(Duration::from_millis(40)), GameEvent::None);
    assert_eq!(m.tick(Duration::from_millis(10)), GameEvent::PauseExpired);
    assert!(!m.in_failure_timeout());
}
