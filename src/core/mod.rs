pub mod direction;
pub mod gamepad;
pub mod input;
pub mod router;
pub mod timer;
