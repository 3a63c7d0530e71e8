//! Per-instance transform data.

use crate::math::{Mat4, Vec3};

/// Position, Euler rotation (degrees), and per-axis scale for one placed
/// instance. This is what the UI edits and what persistence stores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Resolves the world matrix as `T * S * Rx * Ry * Rz`.
    ///
    /// The X -> Y -> Z rotation order is fixed; the renderer and the
    /// persisted scene format both assume it.
    pub fn matrix(&self) -> Mat4 {
        Mat4::IDENTITY
            .translate(self.position.x, self.position.y, self.position.z)
            .scale(self.scale.x, self.scale.y, self.scale.z)
            .rotate(self.rotation.x.to_radians(), 1.0, 0.0, 0.0)
            .rotate(self.rotation.y.to_radians(), 0.0, 1.0, 0.0)
            .rotate(self.rotation.z.to_radians(), 0.0, 0.0, 1.0)
    }
}
