//! Fly camera driven by mouse offsets.
//!
//! Keeps a yaw/pitch Euler orientation and rebuilds its basis vectors
//! whenever the angles change. View and projection matrices come from
//! the in-crate math module; the windowing layer only feeds offsets in.

use crate::math::{Mat4, Vec3};

const DEFAULT_YAW: f32 = -90.0;
const DEFAULT_PITCH: f32 = 0.0;
const DEFAULT_SPEED: f32 = 2.5;
const DEFAULT_SENSITIVITY: f32 = 0.1;
const DEFAULT_ZOOM: f32 = 45.0;

/// Scroll-to-dolly scale factor.
const FORWARD_STEP: f32 = 0.2;

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub world_up: Vec3,
    /// Degrees; -90 looks down -z.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::UNIT_Y,
            right: Vec3::UNIT_X,
            world_up: Vec3::UNIT_Y,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_ZOOM,
        };
        camera.update_vectors();
        camera
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.zoom, aspect, 0.1, 100.0)
    }

    /// Screen-space pan: slides along the camera's right/up axes,
    /// scaled by speed and frame delta.
    pub fn pan(&mut self, x: f32, y: f32, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        if x != 0.0 {
            self.position += self.right * (velocity * x);
        }
        if y != 0.0 {
            self.position -= self.up * (velocity * y);
        }
    }

    /// Accumulates mouse offsets into yaw/pitch and rebuilds the basis.
    pub fn rotate(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;
        self.update_vectors();
    }

    /// Scroll-wheel dolly along the view direction.
    pub fn move_forward(&mut self, y_offset: f32) {
        self.position += self.front * (y_offset * FORWARD_STEP);
    }

    fn update_vectors(&mut self) {
        self.front = Vec3::new(
            self.yaw.to_radians().cos() * self.pitch.to_radians().cos(),
            self.pitch.to_radians().sin(),
            self.yaw.to_radians().sin() * self.pitch.to_radians().cos(),
        );
        self.front.normalize();
        // The right/up pair shrinks toward zero as pitch approaches
        // vertical, so both get renormalized.
        self.right = self.front.cross(self.world_up);
        self.right.normalize();
        self.up = self.right.cross(self.front);
        self.up.normalize();
    }
}
