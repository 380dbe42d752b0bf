use crate::domain::commands::WritePlan;

/// Movement direction selected on the panel or via the joystick hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Right,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Right,
        Direction::Left,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Backward => 1,
            Direction::Right => 2,
            Direction::Left => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Backward => "Backward",
            Direction::Right => "Right",
            Direction::Left => "Left",
        }
    }
}

/// Action decoded from joystick input. The joystick worker never touches the
/// device itself; actions are dispatched on the UI thread through the same
/// handlers the panel buttons use, so state like the cage toggle stays in one
/// place regardless of which input fired it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickAction {
    /// Drill follows the button level.
    Drill(bool),
    ToggleLed,
    ToggleCage,
    Send(Direction),
    Reset,
}

/// Commands handled by the Bluetooth worker thread.
#[derive(Debug, Clone)]
pub enum BluetoothCommand {
    Connect(u64),
    Disconnect,
    StartScan,
    StopScan,
    Execute(WritePlan),
    /// Drain point for shutdown: the worker acknowledges once every command
    /// queued before this one has finished, then exits its loop.
    Shutdown(std::sync::mpsc::Sender<()>),
}

/// Events flowing from the workers back to the UI thread.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ConnectionStatus(ConnectionStatus),
    DeviceFound(ScannedDevice),
    LogMessage(StatusMessage),
    Joystick(JoystickAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone)]
pub struct ScannedDevice {
    pub name: String,
    pub address: u64,
    pub signal_strength: i16,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
