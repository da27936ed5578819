//! Geometric value types consumed by the action model and the cursor.
//!
//! Vector and quaternion arithmetic comes from [`glam`]; this module only adds
//! the thin domain types the compiler needs: joint-angle vectors, tool
//! records, and the axis-angle conversions used when rendering targets.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Tolerance below which a scalar is treated as zero/unset.
pub const EPSILON: f64 = 1e-6;

/// Rounds `value` to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Renders a number in its shortest decimal form, normalizing negative zero.
pub(crate) fn fmt_num(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

/// Renders a vector as `[x,y,z]`, rounded to `decimals` places.
pub(crate) fn fmt_vec(v: DVec3, decimals: u32) -> String {
    format!(
        "[{},{},{}]",
        fmt_num(round_to(v.x, decimals)),
        fmt_num(round_to(v.y, decimals)),
        fmt_num(round_to(v.z, decimals))
    )
}

/// Builds a quaternion from an axis and an angle in degrees.
///
/// The axis is normalized here; a zero axis yields the identity rotation.
pub fn quat_from_axis_angle_deg(axis: DVec3, degrees: f64) -> DQuat {
    if axis.length_squared() < EPSILON {
        return DQuat::IDENTITY;
    }
    DQuat::from_axis_angle(axis.normalize(), degrees.to_radians())
}

/// Converts a quaternion into a rotation vector (axis scaled by the angle in
/// radians), the orientation encoding used by UR pose targets.
pub fn rotation_vector(q: DQuat) -> DVec3 {
    let (axis, angle) = q.to_axis_angle();
    axis * angle
}

/// Angular values for the six axes of an arm, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Joints(pub [f64; 6]);

impl Joints {
    pub fn new(j1: f64, j2: f64, j3: f64, j4: f64, j5: f64, j6: f64) -> Self {
        Self([j1, j2, j3, j4, j5, j6])
    }

    /// Returns a copy with every angle multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.map(|j| j * factor))
    }
}

impl Add for Joints {
    type Output = Joints;

    fn add(self, rhs: Joints) -> Joints {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o += r;
        }
        Joints(out)
    }
}

impl AddAssign for Joints {
    fn add_assign(&mut self, rhs: Joints) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Joints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|j| fmt_num(round_to(*j, 3))).collect();
        write!(f, "[{}]", parts.join(","))
    }
}

/// A tool attached to the device flange.
///
/// The TCP offset displaces the controlled point from the flange; the
/// translation-order flag records the tool's convention for combined
/// transformations and is copied onto the cursor when the tool is attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,

    /// TCP offset from the flange, in mm.
    pub tcp_position: DVec3,

    /// TCP orientation relative to the flange.
    pub tcp_orientation: DQuat,

    /// Whether this tool's convention is translate-then-rotate.
    pub translation_first: bool,
}

impl Tool {
    /// Creates a tool with the translate-then-rotate convention.
    pub fn new(name: impl Into<String>, tcp_position: DVec3, tcp_orientation: DQuat) -> Self {
        Self {
            name: name.into(),
            tcp_position,
            tcp_orientation,
            translation_first: true,
        }
    }
}
