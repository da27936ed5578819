//! The action model: immutable, device-agnostic motion instructions.
//!
//! Actions represent high-level abstract operations such as movements,
//! rotations, setting changes or I/O writes, in both absolute and relative
//! terms. They are independent from any device's properties; their rendering
//! into actual controller instructions depends on the dialect and on the
//! cursor state derived from the sequence (see [`crate::cursor`] and
//! [`crate::compiler`]).
//!
//! Every factory assigns the next id from an explicit [`ActionIds`] allocator
//! and validates nothing: whether a pin exists or a value is in range is a
//! per-dialect question, judged at code-generation time.

use crate::geometry::{Joints, Tool, fmt_num, fmt_vec, quat_from_axis_angle_deg, round_to};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// A process-unique action identifier.
pub type ActionId = u32;

/// Allocates monotonically increasing action ids, starting at 1.
///
/// Owned by whichever component constructs actions and passed by reference to
/// the factories; ids are never reused. The counter is atomic so a single
/// allocator can be shared across threads.
#[derive(Debug)]
pub struct ActionIds(AtomicU32);

impl ActionIds {
    pub fn new() -> Self {
        Self(AtomicU32::new(1))
    }

    pub fn next(&self) -> ActionId {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for ActionIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpolation mode for motion: joint-space or Cartesian-space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionKind {
    Linear,
    Joint,
}

impl fmt::Display for MotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionKind::Linear => write!(f, "Linear"),
            MotionKind::Joint => write!(f, "Joint"),
        }
    }
}

/// The frame relative to which subsequent pose values are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFrame {
    World,
    Local,
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceFrame::World => write!(f, "World"),
            ReferenceFrame::Local => write!(f, "Local"),
        }
    }
}

/// Heated part of an additive-manufacturing device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Part {
    Bed,
    Extruder,
    Chamber,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Bed => write!(f, "Bed"),
            Part::Extruder => write!(f, "Extruder"),
            Part::Chamber => write!(f, "Chamber"),
        }
    }
}

/// An immutable instruction: an id plus a variant payload.
///
/// Once constructed an action is never mutated, so sharing needs no
/// synchronization. The [`fmt::Display`] impl is the action's human-readable
/// description: total over every variant and deterministic for a given
/// payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    id: ActionId,
    kind: ActionKind,
}

/// The closed set of instruction variants.
///
/// Scalar variants carry a `relative` flag distinguishing delta-from-current
/// from replace-absolute semantics; the sign of a relative value only affects
/// the generated description text, never the arithmetic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    Translation {
        translation: DVec3,
        relative: bool,
    },
    Rotation {
        rotation: DQuat,
        relative: bool,
    },
    Transformation {
        translation: DVec3,
        rotation: DQuat,
        relative: bool,
        translation_first: bool,
    },
    Axes {
        joints: Joints,
        relative: bool,
    },
    Speed {
        value: f64,
        relative: bool,
    },
    Acceleration {
        value: f64,
        relative: bool,
    },
    RotationSpeed {
        value: f64,
        relative: bool,
    },
    JointSpeed {
        value: f64,
        relative: bool,
    },
    JointAcceleration {
        value: f64,
        relative: bool,
    },
    Precision {
        value: f64,
        relative: bool,
    },
    Motion {
        kind: MotionKind,
    },
    Coordinates {
        frame: ReferenceFrame,
    },
    PushSettings,
    PopSettings,
    Wait {
        millis: u64,
    },
    Message {
        text: String,
    },
    Comment {
        text: String,
    },
    Attach {
        tool: Tool,
    },
    Detach,
    WriteDigital {
        pin: usize,
        on: bool,
    },
    WriteAnalog {
        pin: usize,
        value: f64,
    },
    Temperature {
        value: f64,
        part: Part,
        wait: bool,
        relative: bool,
    },
    Extrusion {
        on: bool,
    },
    ExtrusionRate {
        rate: f64,
        relative: bool,
    },
    Initialize {
        on: bool,
    },
}

impl Action {
    fn stamp(ids: &ActionIds, kind: ActionKind) -> Self {
        Self {
            id: ids.next(),
            kind,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    // Pose

    /// Moves along a vector relative to the current position, in mm.
    pub fn move_by(ids: &ActionIds, translation: DVec3) -> Self {
        Self::stamp(
            ids,
            ActionKind::Translation {
                translation,
                relative: true,
            },
        )
    }

    /// Moves to an absolute position, in mm.
    pub fn move_to(ids: &ActionIds, position: DVec3) -> Self {
        Self::stamp(
            ids,
            ActionKind::Translation {
                translation: position,
                relative: false,
            },
        )
    }

    /// Rotates around `axis` by `degrees`, relative to the current
    /// orientation.
    pub fn rotate_by(ids: &ActionIds, axis: DVec3, degrees: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Rotation {
                rotation: quat_from_axis_angle_deg(axis, degrees),
                relative: true,
            },
        )
    }

    /// Rotates to the absolute orientation described by `axis` and `degrees`.
    pub fn rotate_to(ids: &ActionIds, axis: DVec3, degrees: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Rotation {
                rotation: quat_from_axis_angle_deg(axis, degrees),
                relative: false,
            },
        )
    }

    /// Applies a relative translation and rotation in the given order.
    ///
    /// Translate-then-rotate and rotate-then-translate are not equivalent in
    /// the `Local` reference frame; the flag records exactly what was asked.
    pub fn transform_by(
        ids: &ActionIds,
        translation: DVec3,
        axis: DVec3,
        degrees: f64,
        translation_first: bool,
    ) -> Self {
        Self::stamp(
            ids,
            ActionKind::Transformation {
                translation,
                rotation: quat_from_axis_angle_deg(axis, degrees),
                relative: true,
                translation_first,
            },
        )
    }

    /// Moves to an absolute position and orientation.
    pub fn transform_to(ids: &ActionIds, position: DVec3, axis: DVec3, degrees: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Transformation {
                translation: position,
                rotation: quat_from_axis_angle_deg(axis, degrees),
                relative: false,
                translation_first: true,
            },
        )
    }

    /// Increments each joint angle by the given deltas, in degrees.
    pub fn axes_by(ids: &ActionIds, joints: Joints) -> Self {
        Self::stamp(
            ids,
            ActionKind::Axes {
                joints,
                relative: true,
            },
        )
    }

    /// Sets the joint angles to absolute values, in degrees.
    pub fn axes_to(ids: &ActionIds, joints: Joints) -> Self {
        Self::stamp(
            ids,
            ActionKind::Axes {
                joints,
                relative: false,
            },
        )
    }

    // Scalar settings

    /// Changes TCP speed by a delta, in mm/s.
    pub fn speed_by(ids: &ActionIds, delta: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Speed {
                value: delta,
                relative: true,
            },
        )
    }

    /// Sets TCP speed, in mm/s.
    pub fn speed_to(ids: &ActionIds, speed: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Speed {
                value: speed,
                relative: false,
            },
        )
    }

    /// Changes TCP acceleration by a delta, in mm/s².
    pub fn acceleration_by(ids: &ActionIds, delta: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Acceleration {
                value: delta,
                relative: true,
            },
        )
    }

    /// Sets TCP acceleration, in mm/s².
    pub fn acceleration_to(ids: &ActionIds, acceleration: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Acceleration {
                value: acceleration,
                relative: false,
            },
        )
    }

    /// Changes TCP rotation speed by a delta, in deg/s.
    pub fn rotation_speed_by(ids: &ActionIds, delta: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::RotationSpeed {
                value: delta,
                relative: true,
            },
        )
    }

    /// Sets TCP rotation speed, in deg/s.
    pub fn rotation_speed_to(ids: &ActionIds, speed: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::RotationSpeed {
                value: speed,
                relative: false,
            },
        )
    }

    /// Changes joint speed by a delta, in deg/s.
    pub fn joint_speed_by(ids: &ActionIds, delta: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::JointSpeed {
                value: delta,
                relative: true,
            },
        )
    }

    /// Sets joint speed, in deg/s.
    pub fn joint_speed_to(ids: &ActionIds, speed: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::JointSpeed {
                value: speed,
                relative: false,
            },
        )
    }

    /// Changes joint acceleration by a delta, in deg/s².
    pub fn joint_acceleration_by(ids: &ActionIds, delta: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::JointAcceleration {
                value: delta,
                relative: true,
            },
        )
    }

    /// Sets joint acceleration, in deg/s².
    pub fn joint_acceleration_to(ids: &ActionIds, acceleration: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::JointAcceleration {
                value: acceleration,
                relative: false,
            },
        )
    }

    /// Changes the precision (blend) radius by a delta, in mm.
    pub fn precision_by(ids: &ActionIds, delta: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Precision {
                value: delta,
                relative: true,
            },
        )
    }

    /// Sets the precision (blend) radius, in mm.
    pub fn precision_to(ids: &ActionIds, precision: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::Precision {
                value: precision,
                relative: false,
            },
        )
    }

    // Modes

    pub fn motion(ids: &ActionIds, kind: MotionKind) -> Self {
        Self::stamp(ids, ActionKind::Motion { kind })
    }

    pub fn coordinates(ids: &ActionIds, frame: ReferenceFrame) -> Self {
        Self::stamp(ids, ActionKind::Coordinates { frame })
    }

    /// Saves the current settings onto the cursor's settings stack.
    pub fn push_settings(ids: &ActionIds) -> Self {
        Self::stamp(ids, ActionKind::PushSettings)
    }

    /// Restores the most recently pushed settings.
    pub fn pop_settings(ids: &ActionIds) -> Self {
        Self::stamp(ids, ActionKind::PopSettings)
    }

    // Flow

    /// Keeps the device idle for the given time, in ms.
    pub fn wait(ids: &ActionIds, millis: u64) -> Self {
        Self::stamp(ids, ActionKind::Wait { millis })
    }

    /// Displays a message on the device.
    pub fn message(ids: &ActionIds, text: impl Into<String>) -> Self {
        Self::stamp(ids, ActionKind::Message { text: text.into() })
    }

    /// Adds a line comment to the compiled code.
    pub fn comment(ids: &ActionIds, text: impl Into<String>) -> Self {
        Self::stamp(ids, ActionKind::Comment { text: text.into() })
    }

    // Tool and I/O

    /// Attaches a tool to the flange, replacing any current one.
    pub fn attach(ids: &ActionIds, tool: Tool) -> Self {
        Self::stamp(ids, ActionKind::Attach { tool })
    }

    /// Detaches any tool currently attached.
    pub fn detach(ids: &ActionIds) -> Self {
        Self::stamp(ids, ActionKind::Detach)
    }

    /// Turns a digital output pin on or off.
    pub fn write_digital(ids: &ActionIds, pin: usize, on: bool) -> Self {
        Self::stamp(ids, ActionKind::WriteDigital { pin, on })
    }

    /// Writes a normalized value to an analog output pin.
    pub fn write_analog(ids: &ActionIds, pin: usize, value: f64) -> Self {
        Self::stamp(ids, ActionKind::WriteAnalog { pin, value })
    }

    // Additive manufacturing

    /// Changes a part's target temperature by a delta, in °C.
    pub fn temperature_by(ids: &ActionIds, delta: f64, part: Part, wait: bool) -> Self {
        Self::stamp(
            ids,
            ActionKind::Temperature {
                value: delta,
                part,
                wait,
                relative: true,
            },
        )
    }

    /// Sets a part's target temperature, in °C.
    pub fn temperature_to(ids: &ActionIds, temperature: f64, part: Part, wait: bool) -> Self {
        Self::stamp(
            ids,
            ActionKind::Temperature {
                value: temperature,
                part,
                wait,
                relative: false,
            },
        )
    }

    /// Turns extrusion on or off.
    pub fn extrude(ids: &ActionIds, on: bool) -> Self {
        Self::stamp(ids, ActionKind::Extrusion { on })
    }

    /// Changes the extrusion feed rate by a delta, in mm of filament per mm
    /// of travel.
    pub fn feed_rate_by(ids: &ActionIds, delta: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::ExtrusionRate {
                rate: delta,
                relative: true,
            },
        )
    }

    /// Sets the extrusion feed rate.
    pub fn feed_rate_to(ids: &ActionIds, rate: f64) -> Self {
        Self::stamp(
            ids,
            ActionKind::ExtrusionRate {
                rate,
                relative: false,
            },
        )
    }

    /// Marks device initialization or termination.
    pub fn initialize(ids: &ActionIds, on: bool) -> Self {
        Self::stamp(ids, ActionKind::Initialize { on })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

fn change(value: f64) -> &'static str {
    if value < 0.0 { "Decrease" } else { "Increase" }
}

fn axis_angle_deg(rotation: &DQuat) -> (DVec3, f64) {
    let (axis, angle) = rotation.to_axis_angle();
    (axis, angle.to_degrees())
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Translation {
                translation,
                relative,
            } => {
                if *relative {
                    write!(f, "Move {} mm", fmt_vec(*translation, 3))
                } else {
                    write!(f, "Move to {} mm", fmt_vec(*translation, 3))
                }
            }
            ActionKind::Rotation { rotation, relative } => {
                let (axis, degrees) = axis_angle_deg(rotation);
                if *relative {
                    write!(
                        f,
                        "Rotate {} deg around {}",
                        fmt_num(round_to(degrees, 3)),
                        fmt_vec(axis, 3)
                    )
                } else {
                    write!(
                        f,
                        "Rotate to {} deg around {}",
                        fmt_num(round_to(degrees, 3)),
                        fmt_vec(axis, 3)
                    )
                }
            }
            ActionKind::Transformation {
                translation,
                rotation,
                relative,
                translation_first,
            } => {
                let (axis, degrees) = axis_angle_deg(rotation);
                let degrees = fmt_num(round_to(degrees, 3));
                let axis = fmt_vec(axis, 3);
                let trans = fmt_vec(*translation, 3);
                if !*relative {
                    write!(
                        f,
                        "Transform: move to {trans} mm and rotate to {degrees} deg around {axis}"
                    )
                } else if *translation_first {
                    write!(
                        f,
                        "Transform: move {trans} mm and rotate {degrees} deg around {axis}"
                    )
                } else {
                    write!(
                        f,
                        "Transform: rotate {degrees} deg around {axis} and move {trans} mm"
                    )
                }
            }
            ActionKind::Axes { joints, relative } => {
                if *relative {
                    write!(f, "Increase joint rotations by {joints} deg")
                } else {
                    write!(f, "Set joint rotations to {joints} deg")
                }
            }
            ActionKind::Speed { value, relative } => {
                if *relative {
                    write!(f, "{} TCP speed by {} mm/s", change(*value), fmt_num(*value))
                } else {
                    write!(f, "Set TCP speed to {} mm/s", fmt_num(*value))
                }
            }
            ActionKind::Acceleration { value, relative } => {
                if *relative {
                    write!(
                        f,
                        "{} TCP acceleration by {} mm/s^2",
                        change(*value),
                        fmt_num(*value)
                    )
                } else {
                    write!(f, "Set TCP acceleration to {} mm/s^2", fmt_num(*value))
                }
            }
            ActionKind::RotationSpeed { value, relative } => {
                if *relative {
                    write!(
                        f,
                        "{} TCP rotation speed by {} deg/s",
                        change(*value),
                        fmt_num(*value)
                    )
                } else {
                    write!(f, "Set TCP rotation speed to {} deg/s", fmt_num(*value))
                }
            }
            ActionKind::JointSpeed { value, relative } => {
                if *relative {
                    write!(f, "{} joint speed by {} deg/s", change(*value), fmt_num(*value))
                } else {
                    write!(f, "Set joint speed to {} deg/s", fmt_num(*value))
                }
            }
            ActionKind::JointAcceleration { value, relative } => {
                if *relative {
                    write!(
                        f,
                        "{} joint acceleration by {} deg/s^2",
                        change(*value),
                        fmt_num(*value)
                    )
                } else {
                    write!(f, "Set joint acceleration to {} deg/s^2", fmt_num(*value))
                }
            }
            ActionKind::Precision { value, relative } => {
                if *relative {
                    write!(
                        f,
                        "{} precision radius by {} mm",
                        change(*value),
                        fmt_num(*value)
                    )
                } else {
                    write!(f, "Set precision radius to {} mm", fmt_num(*value))
                }
            }
            ActionKind::Motion { kind } => write!(f, "Set motion type to '{kind}'"),
            ActionKind::Coordinates { frame } => {
                write!(f, "Set reference coordinate system to '{frame}'")
            }
            ActionKind::PushSettings => write!(f, "Push settings to buffer"),
            ActionKind::PopSettings => write!(f, "Pop settings"),
            ActionKind::Wait { millis } => write!(f, "Wait {millis} ms"),
            ActionKind::Message { text } => write!(f, "Display message \"{text}\""),
            ActionKind::Comment { text } => write!(f, "Comment: \"{text}\""),
            ActionKind::Attach { tool } => write!(f, "Attach tool \"{}\"", tool.name),
            ActionKind::Detach => write!(f, "Detach all tools"),
            ActionKind::WriteDigital { pin, on } => {
                write!(f, "Turn digital IO {pin} {}", if *on { "ON" } else { "OFF" })
            }
            ActionKind::WriteAnalog { pin, value } => {
                write!(f, "Set analog IO {pin} to {}", fmt_num(*value))
            }
            ActionKind::Temperature {
                value,
                part,
                wait,
                relative,
            } => {
                let suffix = if *wait { " and wait" } else { "" };
                if *relative {
                    write!(
                        f,
                        "{} {part} temperature by {} C{suffix}",
                        change(*value),
                        fmt_num(*value)
                    )
                } else {
                    write!(f, "Set {part} temperature to {} C{suffix}", fmt_num(*value))
                }
            }
            ActionKind::Extrusion { on } => {
                write!(f, "Turn extrusion {}", if *on { "on" } else { "off" })
            }
            ActionKind::ExtrusionRate { rate, relative } => {
                if *relative {
                    write!(f, "{} feed rate by {} mm/s", change(*rate), fmt_num(*rate))
                } else {
                    write!(f, "Set feed rate to {} mm/s", fmt_num(*rate))
                }
            }
            ActionKind::Initialize { on } => {
                write!(f, "{} this device", if *on { "Initialize" } else { "Terminate" })
            }
        }
    }
}
