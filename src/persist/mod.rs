//! Plain-text scene layout persistence.
//!
//! One record per model: its source path, its instance count, then per
//! instance the identity hash followed by position, rotation, and scale
//! as whitespace-separated floats, one group per line. The hash is
//! stored rather than recomputed on load because instances move after
//! they are fingerprinted.

use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use crate::asset;
use crate::math::Vec3;
use crate::scene::{Model, Scene, Transform};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scene file: {0}")]
    Parse(String),
}

/// One saved instance of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    pub hash: u64,
    pub transform: Transform,
}

/// One saved model with every placed instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub source_path: String,
    pub instances: Vec<InstanceRecord>,
}

pub type SceneLayout = Vec<ModelRecord>;

/// Serializes the scene's models and instances to the layout format.
pub fn write_layout(scene: &Scene) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for model in &scene.models {
        let _ = writeln!(out, "{}", model.source_path);
        let _ = writeln!(out, "{}", model.instance_count());
        for i in 0..model.instance_count() {
            let t = model.transform(i);
            let _ = writeln!(out, "{}", model.hash(i));
            let _ = writeln!(out, "{} {} {}", t.position.x, t.position.y, t.position.z);
            let _ = writeln!(out, "{} {} {}", t.rotation.x, t.rotation.y, t.rotation.z);
            let _ = writeln!(out, "{} {} {}", t.scale.x, t.scale.y, t.scale.z);
        }
    }
    out
}

pub fn save_scene(scene: &Scene, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, write_layout(scene))?;
    info!("scene saved to {}", path.display());
    Ok(())
}

pub fn load_layout(path: impl AsRef<Path>) -> Result<SceneLayout, PersistError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_layout(&text)
}

pub fn parse_layout(text: &str) -> Result<SceneLayout, PersistError> {
    let mut lines = text.lines().peekable();
    let mut layout = SceneLayout::new();

    while let Some(path_line) = lines.next() {
        let source_path = path_line.trim();
        if source_path.is_empty() {
            continue;
        }

        let count: usize = next_line(&mut lines, "instance count")?
            .trim()
            .parse()
            .map_err(|_| PersistError::Parse("bad instance count".into()))?;

        let mut instances = Vec::with_capacity(count);
        for _ in 0..count {
            let hash: u64 = next_line(&mut lines, "instance hash")?
                .trim()
                .parse()
                .map_err(|_| PersistError::Parse("bad instance hash".into()))?;
            let position = parse_vec3(next_line(&mut lines, "position")?)?;
            let rotation = parse_vec3(next_line(&mut lines, "rotation")?)?;
            let scale = parse_vec3(next_line(&mut lines, "scale")?)?;
            instances.push(InstanceRecord {
                hash,
                transform: Transform::new(position, rotation, scale),
            });
        }

        layout.push(ModelRecord {
            source_path: source_path.to_string(),
            instances,
        });
    }

    Ok(layout)
}

/// Rebuilds a scene from a saved layout, reloading each model's meshes
/// from its source path. Models whose source cannot be loaded are logged
/// and skipped; everything else comes back with its saved transforms and
/// identity hashes intact.
pub fn restore_scene(layout: &SceneLayout) -> Scene {
    let mut scene = Scene::new();
    for record in layout {
        let meshes = match asset::load_obj(&record.source_path) {
            Ok(meshes) => meshes,
            Err(err) => {
                warn!("skipping saved model: {}", err);
                continue;
            }
        };

        let stem = Path::new(&record.source_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.source_path.clone());

        let mut model = Model::default();
        model.source_path = record.source_path.clone();
        model.meshes = meshes;
        for (i, instance) in record.instances.iter().enumerate() {
            // Display names are not part of the layout format; rebuild
            // them from the file stem.
            let name = if i == 0 { stem.clone() } else { format!("{} {}", stem, i) };
            model.add_instance_with_hash(instance.transform, name, instance.hash);
        }
        scene.add_model(model);
    }
    scene
}

fn next_line<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<&'a str, PersistError> {
    lines
        .next()
        .ok_or_else(|| PersistError::Parse(format!("missing {}", what)))
}

fn parse_vec3(line: &str) -> Result<Vec3, PersistError> {
    let mut parts = line.split_whitespace();
    let mut component = || -> Result<f32, PersistError> {
        parts
            .next()
            .ok_or_else(|| PersistError::Parse(format!("short vector line: {:?}", line)))?
            .parse()
            .map_err(|_| PersistError::Parse(format!("bad float in: {:?}", line)))
    };
    Ok(Vec3::new(component()?, component()?, component()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        let mut model = Model::new("resources/models/cube.obj", "cube", Vec::new());
        model.add_instance(
            Transform::new(
                Vec3::new(1.0, 2.0, 3.0),
                Vec3::new(-90.0, 0.0, 0.0),
                Vec3::new(0.2, 0.2, 0.2),
            ),
            "cube 1",
        );
        scene.add_model(model);

        let lamp = Model::new("resources/models/lamp.obj", "lamp", Vec::new());
        scene.add_model(lamp);
        scene
    }

    #[test]
    fn test_layout_round_trip() {
        let scene = sample_scene();
        let text = write_layout(&scene);
        let layout = parse_layout(&text).unwrap();

        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0].source_path, "resources/models/cube.obj");
        assert_eq!(layout[0].instances.len(), 2);
        assert_eq!(layout[1].instances.len(), 1);

        for (record, model_id) in layout.iter().zip(0..) {
            let model: &Model = &scene.models[model_id];
            for (i, instance) in record.instances.iter().enumerate() {
                assert_eq!(instance.hash, model.hash(i));
                assert_eq!(&instance.transform, model.transform(i));
            }
        }
    }

    #[test]
    fn test_parse_rejects_truncated_file() {
        let text = "models/cube.obj\n2\n12345\n1 2 3\n";
        assert!(matches!(
            parse_layout(text),
            Err(PersistError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_empty_is_empty_layout() {
        assert!(parse_layout("").unwrap().is_empty());
        assert!(parse_layout("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_restore_skips_missing_models_keeps_hashes() {
        // One resolvable model (a real temp OBJ) and one that is gone.
        let obj_path = std::env::temp_dir().join(format!("cairn_restore_{}.obj", std::process::id()));
        let mut file = std::fs::File::create(&obj_path).unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").unwrap();
        drop(file);

        let layout = vec![
            ModelRecord {
                source_path: obj_path.to_str().unwrap().to_owned(),
                instances: vec![
                    InstanceRecord {
                        hash: 777,
                        transform: Transform::default(),
                    },
                    InstanceRecord {
                        hash: 778,
                        transform: Transform::new(
                            Vec3::new(4.0, 5.0, 6.0),
                            Vec3::ZERO,
                            Vec3::ONE,
                        ),
                    },
                ],
            },
            ModelRecord {
                source_path: String::from("gone/away.obj"),
                instances: vec![InstanceRecord {
                    hash: 1,
                    transform: Transform::default(),
                }],
            },
        ];

        let scene = restore_scene(&layout);
        assert_eq!(scene.models.len(), 1);
        assert_eq!(scene.models[0].instance_count(), 2);
        assert_eq!(scene.models[0].hash(0), 777);
        assert_eq!(scene.models[0].hash(1), 778);
        assert_eq!(scene.tree.len(), 2);
        assert_eq!(scene.models[0].transform(1).position, Vec3::new(4.0, 5.0, 6.0));

        std::fs::remove_file(obj_path).ok();
    }

    #[test]
    fn test_save_scene_writes_file() {
        let scene = sample_scene();
        let path = std::env::temp_dir().join(format!("cairn_scene_{}.sn", std::process::id()));
        save_scene(&scene, &path).unwrap();
        let reloaded = load_layout(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        std::fs::remove_file(path).ok();
    }
}
