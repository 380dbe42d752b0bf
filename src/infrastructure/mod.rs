pub mod bluetooth;
pub mod joystick;
pub mod logging;
