//! Joystick input worker.
//!
//! A background thread polls the first detected gamepad on a fixed interval
//! and turns edge transitions into [`JoystickAction`]s. The worker never
//! touches the Bluetooth device: actions are sent to the UI thread and
//! dispatched through the same handlers the panel buttons use, so toggles
//! like the cage stay consistent regardless of input source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use gilrs::{Button, Gilrs};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::models::{
    AppEvent, Direction, JoystickAction, MessageSeverity, StatusMessage,
};

/// Minimum interval between repeated reset pulses while the reset button is
/// held down.
const RESET_HOLD_INTERVAL_MS: u64 = 500;

/// One sample of the inputs the panel cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub drill: bool,
    pub led: bool,
    pub cage: bool,
    pub reset: bool,
    /// Hat / d-pad state as (x, y), each in -1..=1.
    pub hat: (i8, i8),
}

/// Edge detector over successive snapshots, with a per-input debounce
/// window so contact flicker does not double-fire commands.
pub struct InputTracker {
    prev: InputSnapshot,
    debounce: Duration,
    drill_debounce: Option<Instant>,
    led_debounce: Option<Instant>,
    cage_debounce: Option<Instant>,
    reset_fired: Option<Instant>,
}

impl InputTracker {
    pub fn new(debounce: Duration) -> Self {
        Self {
            prev: InputSnapshot::default(),
            debounce,
            drill_debounce: None,
            led_debounce: None,
            cage_debounce: None,
            reset_fired: None,
        }
    }

    fn debounced(&self, last: Option<Instant>, now: Instant) -> bool {
        last.map_or(true, |t| now.duration_since(t) > self.debounce)
    }

    /// Compare a new snapshot against the previous one and produce the
    /// actions to fire. Level-held inputs do not repeat, except the reset
    /// button which re-fires on a fixed interval while held.
    pub fn update(&mut self, now: Instant, snapshot: InputSnapshot) -> Vec<JoystickAction> {
        let mut actions = Vec::new();

        // Drill follows the button level
        if snapshot.drill != self.prev.drill && self.debounced(self.drill_debounce, now) {
            self.drill_debounce = Some(now);
            actions.push(JoystickAction::Drill(snapshot.drill));
        }

        // LED toggles on any edge
        if snapshot.led != self.prev.led && self.debounced(self.led_debounce, now) {
            self.led_debounce = Some(now);
            actions.push(JoystickAction::ToggleLed);
        }

        // Cage toggles on press only
        if snapshot.cage != self.prev.cage && self.debounced(self.cage_debounce, now) {
            self.cage_debounce = Some(now);
            if snapshot.cage {
                actions.push(JoystickAction::ToggleCage);
            }
        }

        // Hat: direction on change, reset when it returns to center
        if snapshot.hat != self.prev.hat {
            match snapshot.hat {
                (0, 1) => actions.push(JoystickAction::Send(Direction::Forward)),
                (0, -1) => actions.push(JoystickAction::Send(Direction::Backward)),
                (-1, 0) => actions.push(JoystickAction::Send(Direction::Left)),
                (1, 0) => actions.push(JoystickAction::Send(Direction::Right)),
                _ => actions.push(JoystickAction::Reset),
            }
        }

        // Reset while held, rate-limited
        if snapshot.reset {
            let can_fire = self
                .reset_fired
                .map_or(true, |t| {
                    now.duration_since(t) >= Duration::from_millis(RESET_HOLD_INTERVAL_MS)
                });
            if can_fire {
                self.reset_fired = Some(now);
                actions.push(JoystickAction::Reset);
            }
        }

        self.prev = snapshot;
        actions
    }
}

/// Owns the polling thread and its run flag.
pub struct JoystickWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl JoystickWorker {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start polling. Actions and status messages are delivered through the
    /// app event channel.
    pub fn start(
        &mut self,
        events: mpsc::UnboundedSender<AppEvent>,
        poll_interval: Duration,
        debounce: Duration,
    ) {
        if self.is_running() {
            return;
        }
        self.running.store(true, Ordering::Relaxed);

        let running = self.running.clone();
        self.handle = Some(std::thread::spawn(move || {
            poll_loop(running, events, poll_interval, debounce);
        }));
    }

    /// Flip the run flag and join the thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for JoystickWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    running: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<AppEvent>,
    poll_interval: Duration,
    debounce: Duration,
) {
    let mut gilrs = match Gilrs::new() {
        Ok(g) => g,
        Err(e) => {
            warn!("Failed to initialize gamepad backend: {}", e);
            let _ = events.send(AppEvent::LogMessage(StatusMessage {
                message: format!("Joystick unavailable: {}", e),
                severity: MessageSeverity::Error,
            }));
            running.store(false, Ordering::Relaxed);
            return;
        }
    };

    let Some((pad_id, name)) = gilrs
        .gamepads()
        .next()
        .map(|(id, pad)| (id, pad.name().to_string()))
    else {
        warn!("No joystick detected");
        let _ = events.send(AppEvent::LogMessage(StatusMessage {
            message: "No joystick detected".to_string(),
            severity: MessageSeverity::Warning,
        }));
        running.store(false, Ordering::Relaxed);
        return;
    };

    info!("Using joystick: {}", name);
    let _ = events.send(AppEvent::LogMessage(StatusMessage {
        message: format!("Joystick active: {}", name),
        severity: MessageSeverity::Success,
    }));

    let mut tracker = InputTracker::new(debounce);

    while running.load(Ordering::Relaxed) {
        // Drain the event queue so gamepad state is current
        while gilrs.next_event().is_some() {}

        let snapshot = {
            let pad = gilrs.gamepad(pad_id);
            if !pad.is_connected() {
                warn!("Joystick disconnected");
                let _ = events.send(AppEvent::LogMessage(StatusMessage {
                    message: "Joystick disconnected".to_string(),
                    severity: MessageSeverity::Warning,
                }));
                break;
            }

            let hat_x = pad.is_pressed(Button::DPadRight) as i8 - pad.is_pressed(Button::DPadLeft) as i8;
            let hat_y = pad.is_pressed(Button::DPadUp) as i8 - pad.is_pressed(Button::DPadDown) as i8;

            InputSnapshot {
                drill: pad.is_pressed(Button::South),
                led: pad.is_pressed(Button::East),
                cage: pad.is_pressed(Button::West),
                reset: pad.is_pressed(Button::North),
                hat: (hat_x, hat_y),
            }
        };

        for action in tracker.update(Instant::now(), snapshot) {
            let _ = events.send(AppEvent::Joystick(action));
        }

        std::thread::sleep(poll_interval);
    }

    running.store(false, Ordering::Relaxed);
    info!("Joystick polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> InputTracker {
        InputTracker::new(Duration::from_millis(50))
    }

    fn at(ms: u64, base: Instant) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn drill_fires_on_both_edges_and_follows_level() {
        let base = Instant::now();
        let mut t = tracker();

        let pressed = InputSnapshot {
            drill: true,
            ..Default::default()
        };
        assert_eq!(
            t.update(at(0, base), pressed),
            vec![JoystickAction::Drill(true)]
        );

        // Held level does not repeat
        assert!(t.update(at(100, base), pressed).is_empty());

        assert_eq!(
            t.update(at(200, base), InputSnapshot::default()),
            vec![JoystickAction::Drill(false)]
        );
    }

    #[test]
    fn debounce_suppresses_contact_flicker() {
        let base = Instant::now();
        let mut t = tracker();

        let pressed = InputSnapshot {
            led: true,
            ..Default::default()
        };
        assert_eq!(t.update(at(0, base), pressed), vec![JoystickAction::ToggleLed]);
        // Release 10ms later, inside the debounce window: suppressed
        assert!(t.update(at(10, base), InputSnapshot::default()).is_empty());
    }

    #[test]
    fn cage_fires_on_press_only() {
        let base = Instant::now();
        let mut t = tracker();

        let pressed = InputSnapshot {
            cage: true,
            ..Default::default()
        };
        assert_eq!(
            t.update(at(0, base), pressed),
            vec![JoystickAction::ToggleCage]
        );
        assert!(t.update(at(100, base), InputSnapshot::default()).is_empty());
    }

    #[test]
    fn hat_sends_direction_on_change_and_reset_on_center() {
        let base = Instant::now();
        let mut t = tracker();

        let up = InputSnapshot {
            hat: (0, 1),
            ..Default::default()
        };
        assert_eq!(
            t.update(at(0, base), up),
            vec![JoystickAction::Send(Direction::Forward)]
        );

        // Unchanged hat does not re-send
        assert!(t.update(at(100, base), up).is_empty());

        let left = InputSnapshot {
            hat: (-1, 0),
            ..Default::default()
        };
        assert_eq!(
            t.update(at(200, base), left),
            vec![JoystickAction::Send(Direction::Left)]
        );

        // Return to center pulses reset
        assert_eq!(
            t.update(at(300, base), InputSnapshot::default()),
            vec![JoystickAction::Reset]
        );
    }

    #[test]
    fn held_reset_refires_on_interval_only() {
        let base = Instant::now();
        let mut t = tracker();

        let held = InputSnapshot {
            reset: true,
            ..Default::default()
        };
        assert_eq!(t.update(at(0, base), held), vec![JoystickAction::Reset]);
        assert!(t.update(at(100, base), held).is_empty());
        assert_eq!(t.update(at(600, base), held), vec![JoystickAction::Reset]);
    }
}
