//! Export-time orientation fix-up
//!
//! Source tools disagree on handedness and up axis, so export can flip and
//! rotate the model. The pose is `scale(flips) * Rz * Ry * Rx`.

use glam::{Mat3, Vec3};

use crate::canonical::{canonical_key, parse_key};

/// Axis flips and rotations (in degrees) applied on export
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExportTransform {
    pub flip: [bool; 3],
    pub rotation_degrees: [f32; 3],
}

impl ExportTransform {
    pub fn is_identity(&self) -> bool {
        !self.flip.iter().any(|&f| f) && self.rotation_degrees.iter().all(|&r| r == 0.0)
    }

    /// The pose to apply, or `None` when export should copy pooled text as-is
    pub fn pose(&self) -> Option<Pose> {
        if self.is_identity() {
            return None;
        }

        let scale = Vec3::from_array(self.flip.map(|f| if f { -1.0 } else { 1.0 }));
        let [rx, ry, rz] = self.rotation_degrees.map(f32::to_radians);

        Some(Pose {
            linear: Mat3::from_diagonal(scale)
                * Mat3::from_rotation_z(rz)
                * Mat3::from_rotation_y(ry)
                * Mat3::from_rotation_x(rx),
        })
    }
}

/// Linear transform applied to pooled positions and normals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    linear: Mat3,
}

impl Pose {
    /// True when the pose turns the model inside out (odd number of flips)
    pub fn mirrors(&self) -> bool {
        self.linear.determinant() < 0.0
    }

    pub fn position(&self, key: &str) -> String {
        self.apply(key)
    }

    /// Rotations and flips are orthonormal, so normals transform like
    /// positions and keep their length
    pub fn normal(&self, key: &str) -> String {
        self.apply(key)
    }

    fn apply(&self, key: &str) -> String {
        match parse_key::<3>(key) {
            Some(v) => canonical_key(&(self.linear * Vec3::from_array(v)).to_array()),
            None => key.to_string(),
        }
    }
}
