//! Allocation-free 3-D math primitives.
//!
//! Everything a viewer needs to place and look at objects: small `Copy`
//! vector types and a column-major 4x4 matrix with the usual transform
//! constructors. No operation here returns an error; degenerate input
//! (zero-length axes, `near == far`) produces degenerate numbers and the
//! caller is expected to validate up front.

pub mod matrix;
pub mod vector;

pub use matrix::Mat4;
pub use vector::{Vec3, Vec4};
