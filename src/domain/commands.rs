//! Grinder command planning.
//!
//! Every operator action is turned into a [`WritePlan`], a short list of
//! single-byte characteristic writes (and pauses) that the Bluetooth worker
//! executes in order. Last write wins; the worker handles one plan at a time.

use std::time::Duration;

use thiserror::Error;

/// The eight writable registers exposed by the grinder firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrinderCharacteristic {
    Speed,
    Step,
    Cage,
    Drill,
    Led,
    SlideLeft,
    SlideRight,
    Reset,
}

impl GrinderCharacteristic {
    pub const ALL: [GrinderCharacteristic; 8] = [
        GrinderCharacteristic::Speed,
        GrinderCharacteristic::Step,
        GrinderCharacteristic::Cage,
        GrinderCharacteristic::Drill,
        GrinderCharacteristic::Led,
        GrinderCharacteristic::SlideLeft,
        GrinderCharacteristic::SlideRight,
        GrinderCharacteristic::Reset,
    ];

    /// The firmware's 16-bit characteristic alias for this register.
    pub fn alias(self) -> u16 {
        match self {
            GrinderCharacteristic::Speed => 0x1111,
            GrinderCharacteristic::Step => 0x1112,
            GrinderCharacteristic::Cage => 0x1113,
            GrinderCharacteristic::Drill => 0x1114,
            GrinderCharacteristic::Led => 0x1115,
            GrinderCharacteristic::SlideLeft => 0x1116,
            GrinderCharacteristic::SlideRight => 0x1117,
            GrinderCharacteristic::Reset => 0x1118,
        }
    }

    /// Default characteristic UUID: the 16-bit alias expanded onto the
    /// Bluetooth SIG base UUID (0000xxxx-0000-1000-8000-00805f9b34fb).
    pub fn default_uuid(self) -> String {
        format!("0000{:04x}-0000-1000-8000-00805f9b34fb", self.alias())
    }
}

/// One step of a write plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Write {
        target: GrinderCharacteristic,
        value: u8,
    },
    Pause(Duration),
}

pub type WritePlan = Vec<WriteOp>;

/// Width of the reset pulse (high, pause, low).
pub const RESET_PULSE_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("{field} value `{value}` does not fit in a single byte")]
    NotAByte { field: &'static str, value: String },
}

/// Per-direction parameter fields as they sit in the panel's text boxes.
/// Validated only here, at the point of use.
#[derive(Debug, Clone, Default)]
pub struct DirectionFields {
    pub speed: String,
    pub step: String,
    pub r_travel: String,
    pub l_travel: String,
}

fn parse_byte(field: &'static str, raw: &str) -> Result<u8, ParamError> {
    raw.trim().parse().map_err(|_| ParamError::NotAByte {
        field,
        value: raw.trim().to_string(),
    })
}

/// Directional send: exactly four writes in fixed order Step, Slide-L,
/// Slide-R, Speed. If any field fails to parse, nothing is written.
pub fn direction_plan(fields: &DirectionFields) -> Result<WritePlan, ParamError> {
    let step = parse_byte("Step", &fields.step)?;
    let slide_l = parse_byte("L-Travel", &fields.l_travel)?;
    let slide_r = parse_byte("R-Travel", &fields.r_travel)?;
    let speed = parse_byte("Speed", &fields.speed)?;

    Ok(vec![
        WriteOp::Write {
            target: GrinderCharacteristic::Step,
            value: step,
        },
        WriteOp::Write {
            target: GrinderCharacteristic::SlideLeft,
            value: slide_l,
        },
        WriteOp::Write {
            target: GrinderCharacteristic::SlideRight,
            value: slide_r,
        },
        WriteOp::Write {
            target: GrinderCharacteristic::Speed,
            value: speed,
        },
    ])
}

pub fn led_plan(on: bool) -> WritePlan {
    vec![WriteOp::Write {
        target: GrinderCharacteristic::Led,
        value: on as u8,
    }]
}

pub fn drill_plan(on: bool) -> WritePlan {
    vec![WriteOp::Write {
        target: GrinderCharacteristic::Drill,
        value: on as u8,
    }]
}

/// Cage move to one configured bound. The raw text comes from the Min/Max
/// boxes on the panel.
pub fn cage_plan(raw: &str) -> Result<WritePlan, ParamError> {
    let value = parse_byte("Cage", raw)?;
    Ok(vec![WriteOp::Write {
        target: GrinderCharacteristic::Cage,
        value,
    }])
}

/// Manual reset pulse: high, 100ms pause, low. Not a guaranteed-delivery
/// protocol, just a pulse the firmware watches for.
pub fn reset_plan() -> WritePlan {
    vec![
        WriteOp::Write {
            target: GrinderCharacteristic::Reset,
            value: 1,
        },
        WriteOp::Pause(Duration::from_millis(RESET_PULSE_MS)),
        WriteOp::Write {
            target: GrinderCharacteristic::Reset,
            value: 0,
        },
    ]
}

/// Which cage bound a toggle selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CageBound {
    Top,
    Bottom,
}

/// Cage guard position as the panel believes it to be. Alternates
/// unconditionally on every toggle; there is no position readback from the
/// firmware, so a silently lost write desynchronizes this from the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CageState {
    Open,
    Closed,
}

impl CageState {
    /// Flip the state and return the bound to drive toward. An open cage
    /// closes toward the bottom value first.
    pub fn toggle(&mut self) -> CageBound {
        match self {
            CageState::Open => {
                *self = CageState::Closed;
                CageBound::Bottom
            }
            CageState::Closed => {
                *self = CageState::Open;
                CageBound::Top
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(speed: &str, step: &str, r: &str, l: &str) -> DirectionFields {
        DirectionFields {
            speed: speed.into(),
            step: step.into(),
            r_travel: r.into(),
            l_travel: l.into(),
        }
    }

    #[test]
    fn directional_send_writes_four_values_in_fixed_order() {
        let plan = direction_plan(&fields("25", "30", "60", "40")).unwrap();
        assert_eq!(
            plan,
            vec![
                WriteOp::Write {
                    target: GrinderCharacteristic::Step,
                    value: 30
                },
                WriteOp::Write {
                    target: GrinderCharacteristic::SlideLeft,
                    value: 40
                },
                WriteOp::Write {
                    target: GrinderCharacteristic::SlideRight,
                    value: 60
                },
                WriteOp::Write {
                    target: GrinderCharacteristic::Speed,
                    value: 25
                },
            ]
        );
    }

    #[test]
    fn directional_send_with_bad_field_writes_nothing() {
        assert!(direction_plan(&fields("25", "abc", "60", "40")).is_err());
        // 256 does not fit in a raw byte
        assert!(direction_plan(&fields("256", "30", "60", "40")).is_err());
    }

    #[test]
    fn directional_send_tolerates_surrounding_whitespace() {
        let plan = direction_plan(&fields(" 25", "30 ", " 60 ", "40")).unwrap();
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn toggle_plans_write_single_boolean_byte() {
        assert_eq!(
            led_plan(true),
            vec![WriteOp::Write {
                target: GrinderCharacteristic::Led,
                value: 1
            }]
        );
        assert_eq!(
            drill_plan(false),
            vec![WriteOp::Write {
                target: GrinderCharacteristic::Drill,
                value: 0
            }]
        );
    }

    #[test]
    fn reset_is_high_pause_low() {
        let plan = reset_plan();
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan[0],
            WriteOp::Write {
                target: GrinderCharacteristic::Reset,
                value: 1
            }
        );
        match plan[1] {
            WriteOp::Pause(d) => assert!(d > Duration::ZERO),
            _ => panic!("expected a pause between the reset edges"),
        }
        assert_eq!(
            plan[2],
            WriteOp::Write {
                target: GrinderCharacteristic::Reset,
                value: 0
            }
        );
    }

    #[test]
    fn cage_alternates_strictly_between_bounds() {
        let mut state = CageState::Open;
        assert_eq!(state.toggle(), CageBound::Bottom);
        assert_eq!(state.toggle(), CageBound::Top);
        assert_eq!(state.toggle(), CageBound::Bottom);
        assert_eq!(state.toggle(), CageBound::Top);
    }

    #[test]
    fn register_aliases_are_distinct_and_expand_onto_sig_base() {
        for (i, a) in GrinderCharacteristic::ALL.iter().enumerate() {
            for b in GrinderCharacteristic::ALL.iter().skip(i + 1) {
                assert_ne!(a.alias(), b.alias());
            }
        }
        assert_eq!(
            GrinderCharacteristic::Speed.default_uuid(),
            "00001111-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            GrinderCharacteristic::Reset.default_uuid(),
            "00001118-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn cage_plan_rejects_non_numeric_bound() {
        assert!(cage_plan("wide open").is_err());
        assert!(cage_plan("150").is_ok());
    }
}
