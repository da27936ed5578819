//! URScript backend for Universal Robots 6-axis arms.
//!
//! Token vocabulary: `movej` / `movel` for joint- and Cartesian-space motion,
//! `set_standard_digital_out` / `set_standard_analog_out` for I/O writes,
//! `sleep` for pauses, `popup` for messages, `set_tcp` for tool frames, and
//! `#` as the comment leader. A program is a `def name():` … `end` block
//! followed by a line invoking it.
//!
//! Pose targets render as `p[x,y,z,rx,ry,rz]` with positions in meters and
//! the orientation as an axis-angle rotation vector in radians; joint targets
//! render as `[j1,…,j6]` in radians. Accelerations and velocities mean
//! different things to `movej` (rad/s², rad/s) and `movel` (m/s², m/s), so
//! the parameters are converted per the cursor's motion kind; the blend
//! radius `r` is always meters. Cursor settings still at zero are considered
//! unset and replaced by the dialect defaults below, which come from the
//! URScript manual.

use crate::action::{Action, ActionKind, MotionKind};
use crate::compiler::{CompilerBackend, Dialect, Target};
use crate::cursor::DeviceState;
use crate::error::CompileError;
use crate::geometry::{EPSILON, fmt_num, rotation_vector, round_to};
use glam::{DQuat, DVec3};
use std::f64::consts::PI;

/// Compiler for Universal Robots arms, emitting URScript.
#[derive(Clone, Debug)]
pub struct UrScript {
    dialect: Dialect,
}

impl UrScript {
    pub fn new() -> Self {
        Self {
            dialect: Dialect {
                name: "URScript",
                comment_leader: '#',
                default_speed: 0.25,
                default_acceleration: 1.2,
                default_joint_speed: 1.05,
                default_joint_acceleration: 1.4,
                digital_pins: 8,
                analog_pins: 2,
                analog_min: 0.0,
                analog_max: 1.0,
                length_decimals: 6,
                angle_decimals: 6,
                voltage_decimals: 3,
                length_factor: 0.001,
                angle_factor: PI / 180.0,
            },
        }
    }

    /// Renders a pose as `p[x,y,z,rx,ry,rz]` from mm and a quaternion.
    fn pose(&self, position: DVec3, orientation: DQuat) -> String {
        let d = &self.dialect;
        let rv = rotation_vector(orientation);
        format!(
            "p[{},{},{},{},{},{}]",
            fmt_num(d.length(position.x)),
            fmt_num(d.length(position.y)),
            fmt_num(d.length(position.z)),
            fmt_num(round_to(rv.x, d.angle_decimals)),
            fmt_num(round_to(rv.y, d.angle_decimals)),
            fmt_num(round_to(rv.z, d.angle_decimals)),
        )
    }

    /// UR pose target for the cursor's current position and orientation.
    fn pose_target(&self, state: &DeviceState) -> String {
        self.pose(state.position, state.orientation)
    }

    /// UR joint target, `[j1,…,j6]` in radians, for the cursor's joints.
    fn joint_target(&self, state: &DeviceState) -> String {
        let parts: Vec<String> = state
            .joints
            .0
            .iter()
            .map(|deg| fmt_num(self.dialect.angle(*deg)))
            .collect();
        format!("[{}]", parts.join(","))
    }

    /// UR pose value for the attached tool's TCP. Fatal when no tool is
    /// attached: the whole compile aborts.
    fn tool_target(&self, action: &Action, state: &DeviceState) -> Result<String, CompileError> {
        let tool = state
            .tool
            .as_ref()
            .ok_or(CompileError::NoToolAttached { id: action.id() })?;
        Ok(self.pose(tool.tcp_position, tool.tcp_orientation))
    }

    /// `movej` with joint-space parameters (rad/s², rad/s).
    fn joint_move(&self, dest: &str, state: &DeviceState) -> String {
        let d = &self.dialect;
        let s = &state.settings;
        let a = if s.joint_acceleration > EPSILON {
            d.angle(s.joint_acceleration)
        } else {
            d.default_joint_acceleration
        };
        let v = if s.joint_speed > EPSILON {
            d.angle(s.joint_speed)
        } else {
            d.default_joint_speed
        };
        format!(
            "  movej({dest}, a={}, v={}, r={})",
            fmt_num(a),
            fmt_num(v),
            fmt_num(d.length(s.precision))
        )
    }

    /// `movel` with Cartesian parameters (m/s², m/s).
    fn linear_move(&self, dest: &str, state: &DeviceState) -> String {
        let d = &self.dialect;
        let s = &state.settings;
        let a = if s.acceleration > EPSILON {
            d.length(s.acceleration)
        } else {
            d.default_acceleration
        };
        let v = if s.speed > EPSILON {
            d.length(s.speed)
        } else {
            d.default_speed
        };
        format!(
            "  movel({dest}, a={}, v={}, r={})",
            fmt_num(a),
            fmt_num(v),
            fmt_num(d.length(s.precision))
        )
    }
}

impl Default for UrScript {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerBackend for UrScript {
    fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn declaration(&self, action: &Action, state: &DeviceState, index: usize) -> Option<String> {
        match action.kind() {
            ActionKind::Translation { .. }
            | ActionKind::Rotation { .. }
            | ActionKind::Transformation { .. } => {
                Some(format!("  target{index}={}", self.pose_target(state)))
            }
            ActionKind::Axes { .. } => Some(format!("  target{index}={}", self.joint_target(state))),
            ActionKind::Speed { .. }
            | ActionKind::Acceleration { .. }
            | ActionKind::RotationSpeed { .. }
            | ActionKind::JointSpeed { .. }
            | ActionKind::JointAcceleration { .. }
            | ActionKind::Precision { .. }
            | ActionKind::Motion { .. }
            | ActionKind::Coordinates { .. }
            | ActionKind::PushSettings
            | ActionKind::PopSettings
            | ActionKind::Wait { .. }
            | ActionKind::Message { .. }
            | ActionKind::Comment { .. }
            | ActionKind::Attach { .. }
            | ActionKind::Detach
            | ActionKind::WriteDigital { .. }
            | ActionKind::WriteAnalog { .. }
            | ActionKind::Temperature { .. }
            | ActionKind::Extrusion { .. }
            | ActionKind::ExtrusionRate { .. }
            | ActionKind::Initialize { .. } => None,
        }
    }

    fn instruction(
        &self,
        action: &Action,
        state: &DeviceState,
        target: Target,
    ) -> Result<Option<String>, CompileError> {
        let c = self.dialect.comment_leader;
        let line = match action.kind() {
            ActionKind::Translation { .. }
            | ActionKind::Rotation { .. }
            | ActionKind::Transformation { .. } => {
                let dest = match target {
                    Target::Inline => self.pose_target(state),
                    Target::Variable(i) => format!("target{i}"),
                };
                match state.settings.motion {
                    MotionKind::Joint => Some(self.joint_move(&dest, state)),
                    MotionKind::Linear => Some(self.linear_move(&dest, state)),
                }
            }
            ActionKind::Axes { .. } => {
                let dest = match target {
                    Target::Inline => self.joint_target(state),
                    Target::Variable(i) => format!("target{i}"),
                };
                Some(self.joint_move(&dest, state))
            }
            ActionKind::RotationSpeed { .. } => Some(format!(
                "  {c} WARNING on action {} \"{action}\": TCP rotation speed has no effect on UR robots, set joint speed or joint acceleration instead",
                action.id()
            )),
            ActionKind::Message { text } => Some(format!(
                "  popup(\"{text}\", title=\"Message\", warning=False, error=False)"
            )),
            ActionKind::Wait { millis } => {
                Some(format!("  sleep({})", fmt_num(*millis as f64 * 0.001)))
            }
            ActionKind::Comment { text } => Some(format!("  {c} {text}")),
            ActionKind::Attach { .. } => {
                Some(format!("  set_tcp({})", self.tool_target(action, state)?))
            }
            ActionKind::Detach => Some("  set_tcp(p[0,0,0,0,0,0])".to_string()),
            ActionKind::WriteDigital { pin, on } => {
                if *pin >= self.dialect.digital_pins {
                    Some(format!(
                        "  {c} ERROR on action {} \"{action}\": digital pin not available on this controller",
                        action.id()
                    ))
                } else {
                    Some(format!(
                        "  set_standard_digital_out({pin}, {})",
                        if *on { "True" } else { "False" }
                    ))
                }
            }
            ActionKind::WriteAnalog { pin, value } => {
                if *pin >= self.dialect.analog_pins {
                    Some(format!(
                        "  {c} ERROR on action {} \"{action}\": analog pin not available on this controller",
                        action.id()
                    ))
                } else if *value < self.dialect.analog_min || *value > self.dialect.analog_max {
                    Some(format!(
                        "  {c} ERROR on action {} \"{action}\": value out of range [{},{}]",
                        action.id(),
                        fmt_num(self.dialect.analog_min),
                        fmt_num(self.dialect.analog_max)
                    ))
                } else {
                    Some(format!(
                        "  set_standard_analog_out({pin}, {})",
                        fmt_num(self.dialect.voltage(*value))
                    ))
                }
            }
            ActionKind::Temperature { .. } => Some(format!(
                "  {c} WARNING on action {} \"{action}\": temperature control is not available on this controller",
                action.id()
            )),
            ActionKind::Extrusion { .. } | ActionKind::ExtrusionRate { .. } => Some(format!(
                "  {c} WARNING on action {} \"{action}\": extrusion control is not available on this controller",
                action.id()
            )),
            ActionKind::Speed { .. }
            | ActionKind::Acceleration { .. }
            | ActionKind::JointSpeed { .. }
            | ActionKind::JointAcceleration { .. }
            | ActionKind::Precision { .. }
            | ActionKind::Motion { .. }
            | ActionKind::Coordinates { .. }
            | ActionKind::PushSettings
            | ActionKind::PopSettings
            | ActionKind::Initialize { .. } => None,
        };
        Ok(line)
    }

    fn program_open(&self, name: &str) -> String {
        format!("def {name}():")
    }

    fn program_close(&self) -> String {
        "end".to_string()
    }

    fn program_invocation(&self, name: &str) -> String {
        format!("{name}()")
    }
}
