//! Retained scene state: loaded models, their instance registries, and
//! the hash-indexed scene tree over all of them.

pub mod model;
pub mod transform;
pub mod tree;

pub use model::{instance_hash, Model};
pub use transform::Transform;
pub use tree::{NodeIndex, SceneNode, SceneTree};

use log::info;

use crate::asset::{self, AssetError};
use crate::math::Mat4;

/// Everything placed in the world.
///
/// Models are indexed by position in `models`; tree nodes refer back to
/// them by that index, so models are never removed from the list (their
/// instances can be removed from the tree).
#[derive(Debug, Default)]
pub struct Scene {
    pub models: Vec<Model>,
    pub tree: SceneTree,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already-built model, inserting each of its instances into
    /// the tree. Returns the model id and the node of instance 0.
    pub fn add_model(&mut self, model: Model) -> (usize, NodeIndex) {
        let model_id = self.models.len();
        self.models.push(model);
        let mut first = 0;
        for i in 0..self.models[model_id].instance_count() {
            let node = self.tree.insert(model_id, &self.models[model_id], i);
            if i == 0 {
                first = node;
            }
        }
        (model_id, first)
    }

    /// Spawns an instance of the model at `path`, loading the meshes only
    /// if no model with that source path is resident yet.
    pub fn spawn(
        &mut self,
        path: &str,
        name: &str,
        transform: Transform,
    ) -> Result<NodeIndex, AssetError> {
        if let Some(model_id) = self.models.iter().position(|m| m.source_path == path) {
            info!("model already loaded: {}", path);
            let instance = self.models[model_id].add_instance(transform, name);
            return Ok(self.tree.insert(model_id, &self.models[model_id], instance));
        }

        info!("loading model from: {}", path);
        let meshes = asset::load_obj(path)?;
        let mut model = Model::new(path, name, meshes);
        // Instance 0's identity hash was fingerprinted at the default
        // position during construction; moving it afterwards keeps the
        // identity, same as editing in the UI.
        *model.transform_mut(0) = transform;
        let (_, node) = self.add_model(model);
        Ok(node)
    }

    /// Resolved world matrix for the instance a node represents.
    pub fn world_matrix(&self, node: NodeIndex) -> Option<Mat4> {
        let node = self.tree.node(node)?;
        let model = self.models.get(node.model)?;
        Some(model.transform(node.instance).matrix())
    }

    /// Current display name of the instance a node represents.
    pub fn node_name(&self, node: NodeIndex) -> Option<&str> {
        let node = self.tree.node(node)?;
        Some(self.models.get(node.model)?.name(node.instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec3, Vec4};
    use approx::assert_relative_eq;
    use std::io::Write;
    use std::path::PathBuf;

    /// A one-triangle OBJ written to the system temp dir.
    fn temp_obj(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cairn_{}_{}.obj", tag, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "v 0.0 0.0 0.0").unwrap();
        writeln!(file, "v 1.0 0.0 0.0").unwrap();
        writeln!(file, "v 0.0 1.0 0.0").unwrap();
        writeln!(file, "f 1 2 3").unwrap();
        path
    }

    #[test]
    fn test_spawn_loads_then_dedups_by_path() {
        let obj = temp_obj("dedup");
        let path = obj.to_str().unwrap().to_owned();

        let mut scene = Scene::new();
        let first = scene.spawn(&path, "tri", Transform::default()).unwrap();
        let second = scene
            .spawn(
                &path,
                "tri 2",
                Transform {
                    position: Vec3::new(1.0, 0.0, 0.0),
                    ..Transform::default()
                },
            )
            .unwrap();

        assert_eq!(scene.models.len(), 1);
        assert_eq!(scene.models[0].instance_count(), 2);
        assert_eq!(scene.tree.len(), 2);
        assert_ne!(first, second);

        std::fs::remove_file(obj).ok();
    }

    #[test]
    fn test_spawn_missing_file_propagates_error() {
        let mut scene = Scene::new();
        assert!(scene
            .spawn("no/such/file.obj", "x", Transform::default())
            .is_err());
        assert!(scene.models.is_empty());
        assert_eq!(scene.tree.len(), 0);
    }

    #[test]
    fn test_world_matrix_resolves_instance_transform() {
        let mut scene = Scene::new();
        let mut model = Model::new("mem.obj", "thing", Vec::new());
        *model.transform_mut(0) = Transform {
            position: Vec3::new(2.0, 3.0, 4.0),
            ..Transform::default()
        };
        let (_, node) = scene.add_model(model);

        let m = scene.world_matrix(node).unwrap();
        let p = m.transform(Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 4.0, epsilon = 1e-6);

        assert_eq!(scene.node_name(node), Some("thing"));
        assert_eq!(scene.world_matrix(999), None);
    }

    #[test]
    fn test_add_model_inserts_all_instances() {
        let mut model = Model::new("multi.obj", "a", Vec::new());
        model.add_instance(Transform::default(), "b");
        model.add_instance(Transform::default(), "c");

        let mut scene = Scene::new();
        scene.add_model(model);
        assert_eq!(scene.tree.len(), 3);
    }
}
