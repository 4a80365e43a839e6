use crate::core::direction::{self, DigitalPad, Direction};
use crate::game::machine::InputFrame;
use std::collections::HashSet;

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Gamepad,
}

/// What a single key means to the trainer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyBinding {
    /// Contributes to the held direction while down.
    Dir(DigitalPad),
    /// Numpad 5: explicit neutral, contributes nothing.
    Neutral,
    Select,
    Back,
    Reset,
    PickMode(usize),
}

const fn pad(up: bool, down: bool, back: bool, forward: bool) -> DigitalPad {
    DigitalPad { up, down, back, forward }
}

const UP: DigitalPad = pad(true, false, false, false);
const DOWN: DigitalPad = pad(false, true, false, false);
const BACK: DigitalPad = pad(false, false, true, false);
const FORWARD: DigitalPad = pad(false, false, false, true);

#[inline(always)]
pub fn binding_for_key(code: KeyCode) -> Option<KeyBinding> {
    let binding = match code {
        KeyCode::ArrowUp | KeyCode::KeyW | KeyCode::Numpad8 => KeyBinding::Dir(UP),
        KeyCode::ArrowDown | KeyCode::KeyS | KeyCode::Numpad2 => KeyBinding::Dir(DOWN),
        KeyCode::ArrowLeft | KeyCode::KeyA | KeyCode::Numpad4 => KeyBinding::Dir(BACK),
        KeyCode::ArrowRight | KeyCode::KeyD | KeyCode::Numpad6 => KeyBinding::Dir(FORWARD),
        KeyCode::Numpad7 => KeyBinding::Dir(UP.merge(BACK)),
        KeyCode::Numpad9 => KeyBinding::Dir(UP.merge(FORWARD)),
        KeyCode::Numpad1 => KeyBinding::Dir(DOWN.merge(BACK)),
        KeyCode::Numpad3 => KeyBinding::Dir(DOWN.merge(FORWARD)),
        KeyCode::Numpad5 => KeyBinding::Neutral,
        KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => KeyBinding::Select,
        KeyCode::Escape | KeyCode::Backspace => KeyBinding::Back,
        KeyCode::KeyR => KeyBinding::Reset,
        KeyCode::Digit1 => KeyBinding::PickMode(0),
        KeyCode::Digit2 => KeyBinding::PickMode(1),
        KeyCode::Digit3 => KeyBinding::PickMode(2),
        KeyCode::Digit4 => KeyBinding::PickMode(3),
        _ => return None,
    };
    Some(binding)
}

/// Keys currently held that feed the input frame.
#[derive(Default, Debug, Clone)]
pub struct KeyboardState {
    held: HashSet<KeyCode>,
}

impl KeyboardState {
    /// Records a press or release. Returns whether the held set changed.
    pub fn apply(&mut self, code: KeyCode, pressed: bool) -> bool {
        match binding_for_key(code) {
            Some(KeyBinding::Dir(_) | KeyBinding::Neutral | KeyBinding::Select | KeyBinding::Back) => {}
            _ => return false,
        }
        if pressed { self.held.insert(code) } else { self.held.remove(&code) }
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.held.is_empty()
    }

    pub fn digital(&self) -> DigitalPad {
        self.held
            .iter()
            .filter_map(|&code| match binding_for_key(code) {
                Some(KeyBinding::Dir(p)) => Some(p),
                _ => None,
            })
            .fold(DigitalPad::default(), DigitalPad::merge)
    }

    fn holds(&self, want: KeyBinding) -> bool {
        self.held.iter().any(|&code| binding_for_key(code) == Some(want))
    }

    pub fn direction(&self) -> Direction {
        direction::from_digital(self.digital())
    }

    pub fn frame(&self) -> InputFrame {
        InputFrame {
            direction: self.direction(),
            select_pressed: self.holds(KeyBinding::Select),
            back_pressed: self.holds(KeyBinding::Back),
        }
    }
}

/// Extracts `(code, pressed)` from a winit key event, skipping OS key repeat.
pub fn key_transition(event: &KeyEvent) -> Option<(KeyCode, bool)> {
    if event.repeat {
        return None;
    }
    let PhysicalKey::Code(code) = event.physical_key else { return None; };
    Some((code, event.state == ElementState::Pressed))
}
