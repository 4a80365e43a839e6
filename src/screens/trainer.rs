// src/screens/trainer.rs
use crate::game::machine::{Accuracy, GameEvent, Phase, Snapshot};
use crate::game::mode::Difficulty;
use std::fmt::Write;

const APP_NAME: &str = "KBD Trainer";

fn difficulty_label(d: Difficulty) -> &'static str {
    match d {
        Difficulty::Beginner => "Beginner",
        Difficulty::Intermediate => "Intermediate",
        Difficulty::Advanced => "Advanced",
    }
}

/// Pattern with the current step bracketed, e.g. `◄ [○] ◄ ◣`.
pub fn pattern_line(snap: &Snapshot) -> String {
    let mut out = String::with_capacity(snap.pattern.len() * 6);
    for (i, dir) in snap.pattern.iter().enumerate() {
        if i > 0 { out.push(' '); }
        if snap.running && i == snap.player_pos {
            let _ = write!(out, "[{}]", dir.symbol());
        } else {
            out.push_str(dir.symbol());
        }
    }
    out
}

pub fn status_line(snap: &Snapshot) -> String {
    match snap.phase {
        Phase::Menu => format!(
            "{} ({}) | best {} | ◄ ► to choose, Enter / A to start",
            snap.mode.name,
            difficulty_label(snap.mode.difficulty),
            snap.high_score,
        ),
        Phase::Playing => {
            let marker = match snap.last_input_accuracy {
                Accuracy::None => "",
                Accuracy::Success => " ✔",
                Accuracy::Fail => " ✘",
            };
            format!(
                "score {} | best {} | combo {} | acc {:.0}% | {}s{}",
                snap.score,
                snap.high_score,
                snap.combo,
                snap.accuracy,
                snap.run_elapsed.as_secs(),
                marker,
            )
        }
        Phase::FailureTimeout => format!(
            "FAILURE | resetting in {:.1}s",
            snap.failure_timeout_remaining.as_secs_f32(),
        ),
    }
}

pub fn window_title(snap: &Snapshot) -> String {
    format!("{} - {} | {} | {}", APP_NAME, snap.mode.name, pattern_line(snap), status_line(snap))
}

/// One log line per state change worth reporting.
pub fn describe(event: GameEvent, snap: &Snapshot) -> Option<String> {
    let line = match event {
        GameEvent::None => return None,
        GameEvent::ModeChanged { .. } => format!("Selected {} - {}", snap.mode.name, snap.mode.description),
        GameEvent::RunStarted { .. } => format!("Go! {}", pattern_line(snap)),
        GameEvent::RunStopped { new_high_score: true } => format!("Back to menu. New best: {}", snap.high_score),
        GameEvent::RunStopped { new_high_score: false } => "Back to menu.".to_string(),
        GameEvent::Hit { points, completed: true } => format!("Pattern complete! +{} (score {})", points, snap.score),
        GameEvent::Hit { .. } => return None,
        GameEvent::Miss { expected, got, paused } => {
            let tail = if paused { ", pausing" } else { "" };
            format!("Miss: expected {}, got {}{}", expected, got, tail)
        }
        GameEvent::PauseExpired => "Pattern restarted.".to_string(),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::machine::{GameMachine, InputFrame, MachineConfig};
    use crate::game::mode::ModeTable;
    use crate::game::scores::{HighScores, MemoryStore};
    use crate::core::direction::Direction;

    fn machine() -> GameMachine<HighScores<MemoryStore>> {
        GameMachine::new(ModeTable::builtin(), HighScores::load(MemoryStore::new()), MachineConfig::default())
    }

    #[test]
    fn menu_shows_the_plain_pattern() {
        let m = machine();
        let snap = m.snapshot();
        assert_eq!(pattern_line(&snap), "◄ ○ ◄ ◣");
        assert!(status_line(&snap).starts_with("P1 KBD (Beginner)"));
    }

    #[test]
    fn playing_brackets_the_expected_step() {
        let mut m = machine();
        m.start_game();
        m.update(InputFrame::dir(Direction::Back));
        assert_eq!(pattern_line(&m.snapshot()), "◄ [○] ◄ ◣");
    }

    #[test]
    fn failure_shows_the_countdown() {
        let mut m = machine();
        m.start_game();
        m.update(InputFrame::dir(Direction::Back));
        let event = m.update(InputFrame::dir(Direction::Up));
        let snap = m.snapshot();
        assert_eq!(status_line(&snap), "FAILURE | resetting in 2.0s");
        assert_eq!(describe(event, &snap).unwrap(), "Miss: expected NEUTRAL, got UP, pausing");
    }
}
