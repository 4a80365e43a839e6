use serde::{Deserialize, Serialize};

pub const DEFAULT_DEADZONE: f32 = 0.3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    Neutral,
    Up,
    Down,
    Forward,
    Back,
    UpForward,
    UpBack,
    DownForward,
    DownBack,
}

impl Direction {
    /// Stick sectors in order of increasing angle, starting at FORWARD (0°)
    /// and turning towards DOWN (+y).
    const SECTORS: [Direction; 8] = [
        Direction::Forward,
        Direction::DownForward,
        Direction::Down,
        Direction::DownBack,
        Direction::Back,
        Direction::UpBack,
        Direction::Up,
        Direction::UpForward,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            Direction::Neutral => "○",
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Forward => "►",
            Direction::Back => "◄",
            Direction::UpForward => "◥",
            Direction::UpBack => "◤",
            Direction::DownForward => "◢",
            Direction::DownBack => "◣",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Neutral => "NEUTRAL",
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Forward => "FORWARD",
            Direction::Back => "BACK",
            Direction::UpForward => "UP_FORWARD",
            Direction::UpBack => "UP_BACK",
            Direction::DownForward => "DOWN_FORWARD",
            Direction::DownBack => "DOWN_BACK",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Held state of a digital source: D-pad buttons or the keyboard key set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitalPad {
    pub up: bool,
    pub down: bool,
    pub back: bool,
    pub forward: bool,
}

impl DigitalPad {
    #[inline(always)]
    pub const fn is_idle(&self) -> bool {
        !(self.up || self.down || self.back || self.forward)
    }

    #[inline(always)]
    pub fn merge(self, other: DigitalPad) -> DigitalPad {
        DigitalPad {
            up: self.up || other.up,
            down: self.down || other.down,
            back: self.back || other.back,
            forward: self.forward || other.forward,
        }
    }
}

/// Two-axis analog reading in screen convention: +x is FORWARD, +y is DOWN.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Axes {
    pub x: f32,
    pub y: f32,
}

/// Everything a gamepad or keyboard can report about position in one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawInput {
    pub digital: DigitalPad,
    /// Controllers that expose the D-pad as a hat axis instead of buttons.
    pub dpad_axes: Axes,
    pub stick: Axes,
}

pub fn from_digital(pad: DigitalPad) -> Direction {
    // Opposite presses cancel their axis.
    let vertical = match (pad.up, pad.down) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    };
    let horizontal = match (pad.back, pad.forward) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    };

    match (vertical, horizontal) {
        (-1, -1) => Direction::UpBack,
        (-1, 1) => Direction::UpForward,
        (-1, _) => Direction::Up,
        (1, -1) => Direction::DownBack,
        (1, 1) => Direction::DownForward,
        (1, _) => Direction::Down,
        (_, -1) => Direction::Back,
        (_, 1) => Direction::Forward,
        _ => Direction::Neutral,
    }
}

#[inline(always)]
fn axes_to_pad(axes: Axes, deadzone: f32) -> DigitalPad {
    DigitalPad {
        up: axes.y < -deadzone,
        down: axes.y > deadzone,
        back: axes.x < -deadzone,
        forward: axes.x > deadzone,
    }
}

pub fn from_stick(stick: Axes, deadzone: f32) -> Direction {
    if stick.x.abs() <= deadzone && stick.y.abs() <= deadzone {
        return Direction::Neutral;
    }

    let degrees = stick.y.atan2(stick.x).to_degrees().rem_euclid(360.0);
    let sector = ((degrees + 22.5) / 45.0).floor() as usize % Direction::SECTORS.len();
    Direction::SECTORS[sector]
}

/// Collapses a raw sample into one direction. Digital sources win over the
/// stick whenever they report anything at all.
pub fn normalize(raw: &RawInput, deadzone: f32) -> Direction {
    let digital = raw.digital.merge(axes_to_pad(raw.dpad_axes, deadzone));
    if !digital.is_idle() {
        return from_digital(digital);
    }
    from_stick(raw.stick, deadzone)
}
