use crate::core::direction::{self, Axes, DigitalPad, RawInput};
use crate::game::machine::InputFrame;
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use log::info;

/// Raw per-pad state rebuilt from gilrs events.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct GamepadState {
    pub dpad: DigitalPad,
    pub dpad_axes: Axes,
    pub stick: Axes,
    pub south: bool,
    pub east: bool,
    pub start: bool,
    pub select: bool,
}

impl GamepadState {
    pub fn raw(&self) -> RawInput {
        RawInput { digital: self.dpad, dpad_axes: self.dpad_axes, stick: self.stick }
    }

    pub fn frame(&self, deadzone: f32) -> InputFrame {
        InputFrame {
            direction: direction::normalize(&self.raw(), deadzone),
            // A / Start confirm, B / View go back.
            select_pressed: self.south || self.start,
            back_pressed: self.east || self.select,
        }
    }

    /// Applies one gilrs event. Returns false for events that carry no state.
    pub fn apply(&mut self, event: &EventType) -> bool {
        match event {
            EventType::ButtonPressed(btn, _) => self.set_button(*btn, true),
            EventType::ButtonReleased(btn, _) => self.set_button(*btn, false),
            EventType::AxisChanged(axis, value, _) => self.set_axis(*axis, *value),
            _ => false,
        }
    }

    pub fn set_axis(&mut self, axis: Axis, value: f32) -> bool {
        match axis {
            Axis::LeftStickX => self.stick.x = value,
            // gilrs reports +Y as up; the normalizer expects +Y down.
            Axis::LeftStickY => self.stick.y = -value,
            Axis::DPadX => self.dpad_axes.x = value,
            Axis::DPadY => self.dpad_axes.y = -value,
            _ => return false,
        }
        true
    }

    pub fn set_button(&mut self, btn: Button, pressed: bool) -> bool {
        let slot = match btn {
            Button::DPadUp => &mut self.dpad.up,
            Button::DPadDown => &mut self.dpad.down,
            Button::DPadLeft => &mut self.dpad.back,
            Button::DPadRight => &mut self.dpad.forward,
            Button::South => &mut self.south,
            Button::East => &mut self.east,
            Button::Start => &mut self.start,
            Button::Select => &mut self.select,
            _ => return false,
        };
        *slot = pressed;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PadPoll {
    /// No pad is active; the caller should fall back to the keyboard.
    Idle,
    Sample(InputFrame),
    /// The active pad just went away. Emitted once, carrying a neutral frame.
    Disconnected(InputFrame),
}

/// Owns the gilrs context and follows a single active pad.
pub struct GamepadPoller {
    gilrs: Gilrs,
    active_id: Option<GamepadId>,
    state: GamepadState,
    deadzone: f32,
}

impl GamepadPoller {
    pub fn new(gilrs: Gilrs, deadzone: f32) -> Self {
        // Pads plugged in before startup don't always announce themselves.
        let active_id = gilrs.gamepads().next().map(|(id, pad)| {
            info!("Gamepad found: {}", pad.name());
            id
        });
        Self { gilrs, active_id, state: GamepadState::default(), deadzone }
    }

    #[inline(always)]
    pub fn is_connected(&self) -> bool {
        self.active_id.is_some()
    }

    /// Drains pending gilrs events and reports this frame's input.
    pub fn poll(&mut self) -> PadPoll {
        let mut disconnected = false;

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if self.active_id.is_none() {
                if let EventType::Disconnected = event { continue; }
                info!("Gamepad connected: {}", self.gilrs.gamepad(id).name());
                self.active_id = Some(id);
                self.state = GamepadState::default();
            }
            if Some(id) != self.active_id {
                continue;
            }

            match event {
                EventType::Connected => {}
                EventType::Disconnected => {
                    info!("Gamepad disconnected.");
                    self.active_id = None;
                    self.state = GamepadState::default();
                    disconnected = true;
                }
                other => {
                    self.state.apply(&other);
                }
            }
        }

        if disconnected && self.active_id.is_none() {
            return PadPoll::Disconnected(InputFrame::default());
        }
        match self.active_id {
            Some(_) => PadPoll::Sample(self.state.frame(self.deadzone)),
            None => PadPoll::Idle,
        }
    }
}

#[inline(always)]
pub fn try_init(deadzone: f32) -> Option<GamepadPoller> {
    Gilrs::new().ok().map(|gilrs| GamepadPoller::new(gilrs, deadzone))
}
