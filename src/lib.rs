// src/lib.rs
//! Cairn
//!
//! Scene and math core for an interactive 3D viewer/editor: column-major
//! 4x4 transform math, a content-hash-indexed scene tree with an
//! independent display hierarchy, a fly camera, and plain-text
//! persistence for settings and scene layout. Windowing, UI, and GPU
//! rendering live in the application on top and consume what this crate
//! produces.

pub mod app;
pub mod asset;
pub mod camera;
pub mod config;
pub mod math;
pub mod persist;
pub mod scene;

// Re-export main types for convenience
pub use app::Viewer;
pub use camera::Camera;
pub use config::ViewerConfig;
pub use math::{Mat4, Vec3, Vec4};
pub use scene::{Model, Scene, SceneTree, Transform};

/// Initializes env_logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Creates a viewer with settings from the default location.
pub fn default() -> Viewer {
    Viewer::new()
}
