//! Viewer application state.
//!
//! Owns the pieces the windowing/UI layer drives: settings, the scene
//! with its tree, and the camera. The event loop, immediate-mode UI,
//! and renderer live outside this crate and only consume what is here
//! (matrices, node indices, transform references).

use anyhow::{Context, Result};
use log::warn;

use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::math::{Mat4, Vec3};
use crate::persist;
use crate::scene::{Model, NodeIndex, Scene, Transform};

pub const SETTINGS_PATH: &str = "localData/saveData.sv";
pub const SCENE_PATH: &str = "localData/scene.sn";

/// Editor defaults for a freshly spawned instance: models come in
/// z-up and oversized, so stand them up and shrink them.
const SPAWN_ROTATION: Vec3 = Vec3::new(-90.0, 0.0, 0.0);
const SPAWN_SCALE: Vec3 = Vec3::new(0.2, 0.2, 0.2);

pub struct Viewer {
    pub config: ViewerConfig,
    pub scene: Scene,
    pub camera: Camera,
    /// Root of the display hierarchy; new spawns attach under it.
    display_root: Option<NodeIndex>,
    settings_path: String,
    scene_path: String,
}

impl Viewer {
    /// Creates a viewer with settings loaded from the default location
    /// (corrupt or missing settings fall back to defaults).
    pub fn new() -> Self {
        Self::with_paths(SETTINGS_PATH, SCENE_PATH)
    }

    pub fn with_paths(settings_path: impl Into<String>, scene_path: impl Into<String>) -> Self {
        let settings_path = settings_path.into();
        let config = ViewerConfig::load(&settings_path).unwrap_or_else(|err| {
            warn!("could not load settings: {}, using defaults", err);
            ViewerConfig::default()
        });

        Self {
            config,
            scene: Scene::new(),
            camera: Camera::new(Vec3::new(0.0, 0.0, 3.0)),
            display_root: None,
            settings_path,
            scene_path: scene_path.into(),
        }
    }

    pub fn display_root(&self) -> Option<NodeIndex> {
        self.display_root
    }

    /// Adds a prepared model; its first instance becomes the display
    /// root if none exists yet, otherwise it hangs off the root.
    pub fn add_model(&mut self, model: Model) -> (usize, NodeIndex) {
        let (model_id, node) = self.scene.add_model(model);
        self.hook_into_display(node);
        (model_id, node)
    }

    /// Spawns an instance two units in front of the camera, with the
    /// editor's default rotation and scale, and hooks it into the
    /// display hierarchy.
    pub fn spawn_at_camera(&mut self, path: &str, name: &str) -> Result<NodeIndex> {
        let transform = Transform::new(
            self.camera.position + self.camera.front * 2.0,
            SPAWN_ROTATION,
            SPAWN_SCALE,
        );
        let node = self
            .scene
            .spawn(path, name, transform)
            .with_context(|| format!("spawning {}", path))?;
        self.hook_into_display(node);
        Ok(node)
    }

    fn hook_into_display(&mut self, node: NodeIndex) {
        match self.display_root {
            None => self.display_root = Some(node),
            Some(root) if root != node => self.scene.tree.attach(root, node),
            Some(_) => {}
        }
    }

    /// View and projection matrices for the renderer.
    pub fn matrices(&self, aspect: f32) -> (Mat4, Mat4) {
        (
            self.camera.view_matrix(),
            self.camera.projection_matrix(aspect),
        )
    }

    pub fn save_settings(&self) -> Result<()> {
        self.config
            .save(&self.settings_path)
            .with_context(|| format!("saving settings to {}", self.settings_path))
    }

    pub fn reset_settings(&mut self) {
        self.config.reset();
    }

    pub fn save_scene(&self) -> Result<()> {
        persist::save_scene(&self.scene, &self.scene_path)
            .with_context(|| format!("saving scene to {}", self.scene_path))
    }

    /// Replaces the current scene with the one on disk. Models whose
    /// source files are gone are skipped; whatever loads is re-hung
    /// under a fresh display root.
    pub fn load_scene(&mut self) -> Result<()> {
        let layout = persist::load_layout(&self.scene_path)
            .with_context(|| format!("loading scene from {}", self.scene_path))?;
        self.scene = persist::restore_scene(&layout);

        self.display_root = self.scene.tree.root();
        if let Some(root) = self.display_root {
            let orphans: Vec<NodeIndex> = self
                .scene
                .tree
                .in_order()
                .into_iter()
                .filter(|&n| {
                    n != root && self.scene.tree.node(n).is_some_and(|x| x.parent.is_none())
                })
                .collect();
            for node in orphans {
                self.scene.tree.attach(root, node);
            }
        }
        Ok(())
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;

    fn temp_file(tag: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cairn_app_{}_{}.{}", tag, std::process::id(), ext))
    }

    fn temp_obj(tag: &str) -> PathBuf {
        let path = temp_file(tag, "obj");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").unwrap();
        path
    }

    fn test_viewer(tag: &str) -> Viewer {
        Viewer::with_paths(
            temp_file(&format!("{}_settings", tag), "sv")
                .to_str()
                .unwrap(),
            temp_file(&format!("{}_scene", tag), "sn")
                .to_str()
                .unwrap(),
        )
    }

    #[test]
    fn test_spawn_at_camera_places_in_front() {
        let obj = temp_obj("spawn");
        let mut viewer = test_viewer("spawn");
        let node = viewer.spawn_at_camera(obj.to_str().unwrap(), "tri").unwrap();

        let t = {
            let n = viewer.scene.tree.node(node).unwrap();
            *viewer.scene.models[n.model].transform(n.instance)
        };
        // Camera starts at (0,0,3) looking down -z.
        assert!((t.position.z - 1.0).abs() < 1e-5);
        assert_eq!(t.rotation, SPAWN_ROTATION);
        assert_eq!(t.scale, SPAWN_SCALE);
        assert_eq!(viewer.display_root(), Some(node));

        std::fs::remove_file(obj).ok();
    }

    #[test]
    fn test_second_spawn_attaches_under_root() {
        let obj = temp_obj("attach");
        let mut viewer = test_viewer("attach");
        let path = obj.to_str().unwrap().to_owned();
        let first = viewer.spawn_at_camera(&path, "a").unwrap();
        let second = viewer.spawn_at_camera(&path, "b").unwrap();

        assert_eq!(viewer.display_root(), Some(first));
        assert_eq!(viewer.scene.tree.node(second).unwrap().parent, Some(first));

        std::fs::remove_file(obj).ok();
    }

    #[test]
    fn test_spawn_missing_model_is_error() {
        let mut viewer = test_viewer("missing");
        assert!(viewer.spawn_at_camera("no/file.obj", "x").is_err());
        assert_eq!(viewer.display_root(), None);
    }

    #[test]
    fn test_scene_save_and_reload() {
        let obj = temp_obj("reload");
        let mut viewer = test_viewer("reload");
        let path = obj.to_str().unwrap().to_owned();
        viewer.spawn_at_camera(&path, "a").unwrap();
        viewer.spawn_at_camera(&path, "b").unwrap();
        viewer.save_scene().unwrap();

        let mut restored = test_viewer("reload");
        restored.load_scene().unwrap();
        assert_eq!(restored.scene.models.len(), 1);
        assert_eq!(restored.scene.tree.len(), 2);
        // Hashes survive the round trip.
        assert_eq!(
            restored.scene.models[0].hash(0),
            viewer.scene.models[0].hash(0)
        );
        assert_eq!(
            restored.scene.models[0].hash(1),
            viewer.scene.models[0].hash(1)
        );
        // Everything hangs off one display root again.
        let root = restored.display_root().unwrap();
        assert_eq!(restored.scene.tree.node(root).unwrap().parent, None);

        std::fs::remove_file(obj).ok();
    }

    #[test]
    fn test_settings_persist() {
        let mut viewer = test_viewer("settings");
        viewer.config.rotate_sensitivity = 3.0;
        viewer.save_settings().unwrap();

        let again = Viewer::with_paths(viewer.settings_path.clone(), viewer.scene_path.clone());
        assert_eq!(again.config.rotate_sensitivity, 3.0);

        viewer.reset_settings();
        assert_eq!(viewer.config.rotate_sensitivity, 1.0);
    }
}
