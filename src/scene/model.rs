//! Models and their per-instance registry.
//!
//! A [`Model`] owns the mesh data loaded from disk once, plus an
//! append-only registry of placed instances: parallel vectors of display
//! names, [`Transform`]s, and content-identity hashes. The hash is the
//! scene tree's sort key.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::asset::MeshData;
use crate::math::Vec3;
use crate::scene::transform::Transform;

/// Seed constant for the hash combiner (the golden-ratio constant used
/// by the classic boost-style `hash_combine`).
const HASH_COMBINE_SEED: u64 = 0x9e37_79b9;

/// Content-identity fingerprint for one instance.
///
/// Deterministic across runs (it is written to the scene file), and it
/// changes whenever the display name, the initial position, or the
/// instance's index within its model changes. It is a lookup/sort key,
/// not a unique id; collisions are possible and not detected.
pub fn instance_hash(name: &str, position: Vec3, index: usize) -> u64 {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    let mut seed = hasher.finish();

    hash_combine(&mut seed, u64::from(position.x.to_bits()));
    hash_combine(&mut seed, u64::from(position.y.to_bits()));
    hash_combine(&mut seed, u64::from(position.z.to_bits()));
    hash_combine(&mut seed, index as u64);
    seed
}

fn hash_combine(seed: &mut u64, value: u64) {
    *seed ^= value
        .wrapping_add(HASH_COMBINE_SEED)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

/// A loaded model and every placed copy of it.
///
/// The instance registry is append-only: indices handed out by
/// [`Model::add_instance`] stay valid for the model's lifetime, and the
/// first instance's hash never changes once the model exists (the scene
/// tree relies on that for its comparison keys).
#[derive(Debug, Default)]
pub struct Model {
    /// Path the meshes were loaded from; also the dedup key when
    /// spawning into a scene.
    pub source_path: String,
    pub meshes: Vec<MeshData>,
    names: Vec<String>,
    transforms: Vec<Transform>,
    hashes: Vec<u64>,
}

impl Model {
    /// Creates a model seeded with instance 0 at the default transform.
    pub fn new(source_path: impl Into<String>, display_name: impl Into<String>, meshes: Vec<MeshData>) -> Self {
        let mut model = Self {
            source_path: source_path.into(),
            meshes,
            names: Vec::new(),
            transforms: Vec::new(),
            hashes: Vec::new(),
        };
        model.add_instance(Transform::default(), display_name);
        model
    }

    /// Appends an instance and returns its index.
    pub fn add_instance(&mut self, transform: Transform, name: impl Into<String>) -> usize {
        let name = name.into();
        let hash = instance_hash(&name, transform.position, self.names.len());
        self.add_instance_with_hash(transform, name, hash)
    }

    /// Appends an instance carrying a predetermined identity hash.
    ///
    /// Scene restore goes through here: the hash was fingerprinted from
    /// the instance's *initial* position, which the saved transform may
    /// no longer match, so recomputing would change every identity.
    pub fn add_instance_with_hash(
        &mut self,
        transform: Transform,
        name: impl Into<String>,
        hash: u64,
    ) -> usize {
        let index = self.names.len();
        self.hashes.push(hash);
        self.names.push(name.into());
        self.transforms.push(transform);
        index
    }

    pub fn instance_count(&self) -> usize {
        self.names.len()
    }

    pub fn hash(&self, index: usize) -> u64 {
        self.hashes[index]
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// The UI edits names in place; the identity hash deliberately keeps
    /// the name the instance was created with.
    pub fn set_name(&mut self, index: usize, name: impl Into<String>) {
        self.names[index] = name.into();
    }

    pub fn transform(&self, index: usize) -> &Transform {
        &self.transforms[index]
    }

    pub fn transform_mut(&mut self, index: usize) -> &mut Transform {
        &mut self.transforms[index]
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }
}
