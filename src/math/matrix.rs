//! Column-major 4x4 matrices and the standard viewer transform
//! constructors (translate/scale/rotate, perspective, look-at).

use std::ops::Mul;

use super::vector::{Vec3, Vec4};

/// A 4x4 matrix of `f32` in column-major order: cell `(row, col)` lives at
/// index `col * 4 + row`, so `m[12..15]` is the translation column.
///
/// The transform helpers ([`Mat4::translate`], [`Mat4::scale`],
/// [`Mat4::rotate`]) post-multiply: `m.translate(..)` returns
/// `m * T`, meaning the new transform applies first, in `m`'s local frame.
/// Composition reads right to left, matching `(A * B) * v == A * (B * v)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Mat4 { m }
    };

    pub const ZERO: Mat4 = Mat4 { m: [0.0; 16] };

    pub const fn identity() -> Mat4 {
        Self::IDENTITY
    }

    pub const fn from_cols_array(m: [f32; 16]) -> Mat4 {
        Mat4 { m }
    }

    /// Applies the matrix to a homogeneous column vector.
    pub fn transform(&self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4 {
            x: m[0] * v.x + m[4] * v.y + m[8] * v.z + m[12] * v.w,
            y: m[1] * v.x + m[5] * v.y + m[9] * v.z + m[13] * v.w,
            z: m[2] * v.x + m[6] * v.y + m[10] * v.z + m[14] * v.w,
            w: m[3] * v.x + m[7] * v.y + m[11] * v.z + m[15] * v.w,
        }
    }

    /// Returns `self * T(x, y, z)`.
    pub fn translate(&self, x: f32, y: f32, z: f32) -> Mat4 {
        let mut t = Mat4::IDENTITY;
        t.m[12] = x;
        t.m[13] = y;
        t.m[14] = z;
        *self * t
    }

    /// Returns `self * S(sx, sy, sz)`.
    pub fn scale(&self, sx: f32, sy: f32, sz: f32) -> Mat4 {
        let mut s = Mat4::IDENTITY;
        s.m[0] = sx;
        s.m[5] = sy;
        s.m[10] = sz;
        *self * s
    }

    /// Returns `self * R(angle, axis)` for a rotation of `angle_rad`
    /// radians about the axis `(x, y, z)`.
    ///
    /// The axis is normalized first. A zero-length axis skips
    /// normalization and yields a degenerate rotation matrix; callers
    /// must not pass one.
    pub fn rotate(&self, angle_rad: f32, x: f32, y: f32, z: f32) -> Mat4 {
        let (mut x, mut y, mut z) = (x, y, z);
        let len = Vec3::new(x, y, z).length();
        if len > 0.0 {
            x /= len;
            y /= len;
            z /= len;
        }

        let c = angle_rad.cos();
        let s = angle_rad.sin();
        let one_c = 1.0 - c;

        let mut r = Mat4::ZERO;

        r.m[0] = x * x * one_c + c;
        r.m[1] = y * x * one_c + z * s;
        r.m[2] = z * x * one_c - y * s;

        r.m[4] = x * y * one_c - z * s;
        r.m[5] = y * y * one_c + c;
        r.m[6] = z * y * one_c + x * s;

        r.m[8] = x * z * one_c + y * s;
        r.m[9] = y * z * one_c - x * s;
        r.m[10] = z * z * one_c + c;

        r.m[15] = 1.0;

        *self * r
    }

    /// Symmetric right-handed perspective projection, fov in degrees.
    ///
    /// Degenerate parameters (`aspect == 0`, `near == far`) produce
    /// infinities or NaN rather than an error; the caller guarantees
    /// `near < far` and a non-zero aspect.
    pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let fov_rad = fov_deg.to_radians();
        let f = 1.0 / (fov_rad / 2.0).tan();

        let mut mat = Mat4::ZERO;
        mat.m[0] = f / aspect;
        mat.m[5] = f;
        mat.m[10] = (far + near) / (near - far);
        mat.m[11] = -1.0;
        mat.m[14] = (2.0 * far * near) / (near - far);
        mat
    }

    /// Right-handed view matrix looking from `eye` toward `center`, with
    /// the canonical glm layout: the camera forward axis maps to -z.
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
        let f = (center - eye).normalized();
        let s = f.cross(up).normalized();
        // Already unit length: s and f are orthonormal.
        let u = s.cross(f);

        let mut result = Mat4::ZERO;

        result.m[0] = s.x;
        result.m[1] = u.x;
        result.m[2] = -f.x;

        result.m[4] = s.y;
        result.m[5] = u.y;
        result.m[6] = -f.y;

        result.m[8] = s.z;
        result.m[9] = u.z;
        result.m[10] = -f.z;

        result.m[12] = -s.dot(eye);
        result.m[13] = -u.dot(eye);
        result.m[14] = f.dot(eye);
        result.m[15] = 1.0;

        result
    }

    /// Returns a copy with row `row` (0-3) replaced by `vec`, spread
    /// across the four columns. An out-of-range row returns the matrix
    /// unchanged.
    pub fn set_row(&self, row: usize, vec: Vec4) -> Mat4 {
        if row > 3 {
            return *self;
        }
        let mut result = *self;
        result.m[row] = vec.x;
        result.m[row + 4] = vec.y;
        result.m[row + 8] = vec.z;
        result.m[row + 12] = vec.w;
        result
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut result = Mat4::ZERO;
        for col in 0..4 {
            for row in 0..4 {
                result.m[col * 4 + row] = self.m[row] * rhs.m[col * 4]
                    + self.m[4 + row] * rhs.m[col * 4 + 1]
                    + self.m[8 + row] * rhs.m[col * 4 + 2]
                    + self.m[12 + row] * rhs.m[col * 4 + 3];
            }
        }
        result
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, rhs: Vec4) -> Vec4 {
        self.transform(rhs)
    }
}
