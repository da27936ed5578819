//! The cursor: a deterministic interpreter that folds actions into an
//! absolute device-state snapshot.
//!
//! The entry point is [`Cursor`]. Feed it actions with [`Cursor::issue`] and
//! advance it one action at a time with [`Cursor::apply_next`]; after each
//! application the cursor exactly reflects the cumulative effect of every
//! action applied so far, in order — a pure left-fold over the sequence.
//!
//! # Relative pose semantics
//!
//! Relative translations and rotations are interpreted in the current
//! reference frame: in `World` a translation adds the raw vector and a
//! rotation pre-multiplies the orientation; in `Local` the vector is first
//! mapped through the current orientation and the rotation post-multiplies.
//! Joint deltas are frame-independent. A combined transformation applies its
//! two halves strictly in the requested order; in the `Local` frame
//! rotate-then-translate moves along the rotated frame, so the two orders are
//! not equivalent.
//!
//! # I/O bookkeeping
//!
//! Digital and analog writes land in fixed-size output arrays with no bounds
//! judgment here: an index beyond the array leaves it untouched, and the
//! violation is only reported at code-generation time against the target
//! dialect's declared pin counts. The same sequence can be legal for one
//! dialect and illegal for another, so validity cannot be decided inside the
//! cursor.

use crate::action::{Action, ActionKind, MotionKind, Part, ReferenceFrame};
use crate::error::StateError;
use crate::geometry::{Joints, Tool};
use crate::queue::ActionQueue;
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Digital output slots tracked per device. Deliberately larger than any one
/// dialect's pin count; dialects validate against their own declared counts.
pub const DIGITAL_OUTPUTS: usize = 14;

/// Analog output slots tracked per device.
pub const ANALOG_OUTPUTS: usize = 4;

/// Scalar settings captured by PushSettings/PopSettings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// TCP speed, mm/s. Zero means unset; dialects substitute their default.
    pub speed: f64,
    /// TCP acceleration, mm/s².
    pub acceleration: f64,
    /// TCP rotation speed, deg/s.
    pub rotation_speed: f64,
    /// Joint speed, deg/s.
    pub joint_speed: f64,
    /// Joint acceleration, deg/s².
    pub joint_acceleration: f64,
    /// Blend radius, mm.
    pub precision: f64,
    pub motion: MotionKind,
    pub frame: ReferenceFrame,
    /// mm of filament per mm of lineal travel.
    pub extrusion_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: 0.0,
            acceleration: 0.0,
            rotation_speed: 0.0,
            joint_speed: 0.0,
            joint_acceleration: 0.0,
            precision: 0.0,
            motion: MotionKind::Linear,
            frame: ReferenceFrame::World,
            extrusion_rate: 0.0,
        }
    }
}

/// Per-part target temperatures, in °C.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    pub bed: f64,
    pub extruder: f64,
    pub chamber: f64,
}

impl Temperatures {
    pub fn get(&self, part: Part) -> f64 {
        match part {
            Part::Bed => self.bed,
            Part::Extruder => self.extruder,
            Part::Chamber => self.chamber,
        }
    }

    fn get_mut(&mut self, part: Part) -> &mut f64 {
        match part {
            Part::Bed => &mut self.bed,
            Part::Extruder => &mut self.extruder,
            Part::Chamber => &mut self.chamber,
        }
    }
}

/// Simulated absolute state of the device, as if it had executed every
/// applied action in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    /// TCP position, mm.
    pub position: DVec3,
    pub orientation: DQuat,
    /// Joint angles, degrees.
    pub joints: Joints,
    pub settings: Settings,
    pub tool: Option<Tool>,
    /// Translation-order convention, inherited from the attached tool.
    pub translation_first: bool,
    pub digital_outputs: [bool; DIGITAL_OUTPUTS],
    pub analog_outputs: [f64; ANALOG_OUTPUTS],
    pub temperatures: Temperatures,
    pub extrusion_on: bool,
    settings_stack: Vec<Settings>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            joints: Joints::default(),
            settings: Settings::default(),
            tool: None,
            translation_first: true,
            digital_outputs: [false; DIGITAL_OUTPUTS],
            analog_outputs: [0.0; ANALOG_OUTPUTS],
            temperatures: Temperatures::default(),
            extrusion_on: false,
            settings_stack: Vec::new(),
        }
    }
}

fn apply_scalar(field: &mut f64, value: f64, relative: bool) {
    if relative {
        *field += value;
    } else {
        *field = value;
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth of the settings stack.
    pub fn stack_depth(&self) -> usize {
        self.settings_stack.len()
    }

    fn translate(&mut self, v: DVec3, relative: bool) {
        if relative {
            match self.settings.frame {
                ReferenceFrame::World => self.position += v,
                ReferenceFrame::Local => self.position += self.orientation * v,
            }
        } else {
            self.position = v;
        }
    }

    fn rotate(&mut self, r: DQuat, relative: bool) {
        if relative {
            match self.settings.frame {
                ReferenceFrame::World => self.orientation = r * self.orientation,
                ReferenceFrame::Local => self.orientation = self.orientation * r,
            }
        } else {
            self.orientation = r;
        }
    }

    /// Applies one action's transition to the state.
    pub fn apply(&mut self, action: &Action) -> Result<(), StateError> {
        trace!(id = action.id(), action = %action, "apply");
        match action.kind() {
            ActionKind::Translation {
                translation,
                relative,
            } => self.translate(*translation, *relative),
            ActionKind::Rotation { rotation, relative } => self.rotate(*rotation, *relative),
            ActionKind::Transformation {
                translation,
                rotation,
                relative,
                translation_first,
            } => {
                if *translation_first {
                    self.translate(*translation, *relative);
                    self.rotate(*rotation, *relative);
                } else {
                    self.rotate(*rotation, *relative);
                    self.translate(*translation, *relative);
                }
            }
            ActionKind::Axes { joints, relative } => {
                if *relative {
                    self.joints += *joints;
                } else {
                    self.joints = *joints;
                }
            }
            ActionKind::Speed { value, relative } => {
                apply_scalar(&mut self.settings.speed, *value, *relative)
            }
            ActionKind::Acceleration { value, relative } => {
                apply_scalar(&mut self.settings.acceleration, *value, *relative)
            }
            ActionKind::RotationSpeed { value, relative } => {
                apply_scalar(&mut self.settings.rotation_speed, *value, *relative)
            }
            ActionKind::JointSpeed { value, relative } => {
                apply_scalar(&mut self.settings.joint_speed, *value, *relative)
            }
            ActionKind::JointAcceleration { value, relative } => {
                apply_scalar(&mut self.settings.joint_acceleration, *value, *relative)
            }
            ActionKind::Precision { value, relative } => {
                apply_scalar(&mut self.settings.precision, *value, *relative)
            }
            ActionKind::Motion { kind } => self.settings.motion = *kind,
            ActionKind::Coordinates { frame } => self.settings.frame = *frame,
            ActionKind::PushSettings => self.settings_stack.push(self.settings),
            ActionKind::PopSettings => {
                let restored = self
                    .settings_stack
                    .pop()
                    .ok_or(StateError::EmptySettingsStack { id: action.id() })?;
                self.settings = restored;
            }
            ActionKind::Attach { tool } => {
                self.translation_first = tool.translation_first;
                self.tool = Some(tool.clone());
            }
            ActionKind::Detach => self.tool = None,
            ActionKind::WriteDigital { pin, on } => {
                if *pin < DIGITAL_OUTPUTS {
                    self.digital_outputs[*pin] = *on;
                }
            }
            ActionKind::WriteAnalog { pin, value } => {
                if *pin < ANALOG_OUTPUTS {
                    self.analog_outputs[*pin] = *value;
                }
            }
            ActionKind::Temperature {
                value,
                part,
                wait: _,
                relative,
            } => apply_scalar(self.temperatures.get_mut(*part), *value, *relative),
            ActionKind::Extrusion { on } => self.extrusion_on = *on,
            ActionKind::ExtrusionRate { rate, relative } => {
                apply_scalar(&mut self.settings.extrusion_rate, *rate, *relative)
            }
            // No state effect; these pass through to generation unchanged.
            ActionKind::Wait { .. }
            | ActionKind::Message { .. }
            | ActionKind::Comment { .. }
            | ActionKind::Initialize { .. } => {}
        }
        Ok(())
    }
}

/// A device state plus its own queue of pending actions.
///
/// Created default at the start of a compile pass, or kept alive across a
/// whole session in streaming use. Mutated only by [`Cursor::apply_next`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cursor {
    queue: ActionQueue,
    state: DeviceState,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action to this cursor's pending queue.
    pub fn issue(&mut self, action: Action) {
        self.queue.enqueue(action);
    }

    /// Number of issued actions not yet applied.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The state after the most recently applied action.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Pulls exactly one pending action, applies it, and returns the
    /// now-current snapshot.
    ///
    /// Calling this with nothing pending is a programming error and fails
    /// with [`StateError::EmptyQueue`].
    pub fn apply_next(&mut self) -> Result<&DeviceState, StateError> {
        let action = self.queue.take_next().ok_or(StateError::EmptyQueue)?;
        self.state.apply(&action)?;
        Ok(&self.state)
    }
}
