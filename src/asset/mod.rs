//! Mesh import.
//!
//! The scene core does not parse any file format itself; this module is
//! the boundary to the OBJ importer ([`tobj`]). It hands back plain
//! [`MeshData`] buffers, reconstructing smooth per-vertex normals when
//! the file carries none.

use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use crate::math::Vec3;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load OBJ file {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
}

/// Raw geometry for one mesh: flat xyz position/normal triples and a
/// triangle index list, ready for a renderer to upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Loads every mesh from an OBJ file.
///
/// Materials are ignored; shading is the renderer's problem. Meshes
/// without usable normals get area-weighted face normals instead.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Vec<MeshData>, AssetError> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Load {
        path: path.display().to_string(),
        source,
    })?;

    let mut meshes = Vec::with_capacity(models.len());
    for m in &models {
        let mesh = &m.mesh;
        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            warn!(
                "mesh {:?} in {} has no normals, reconstructing from faces",
                m.name,
                path.display()
            );
            calculate_face_normals(&mesh.positions, &mesh.indices)
        };

        meshes.push(MeshData {
            positions: mesh.positions.clone(),
            normals,
            indices: mesh.indices.clone(),
        });
    }

    info!("loaded {} mesh(es) from {}", meshes.len(), path.display());
    Ok(meshes)
}

/// Per-vertex normals averaged from the faces sharing each vertex.
pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let vertex = |i: usize| Vec3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]);

    let mut accumulated = vec![Vec3::ZERO; vertex_count];
    for triangle in indices.chunks_exact(3) {
        let (i0, i1, i2) = (
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        );
        let edge1 = vertex(i1) - vertex(i0);
        let edge2 = vertex(i2) - vertex(i0);
        let face_normal = edge1.cross(edge2);
        for &i in &[i0, i1, i2] {
            accumulated[i] += face_normal;
        }
    }

    let mut normals = Vec::with_capacity(positions.len());
    for mut n in accumulated {
        n.normalize();
        normals.extend_from_slice(&[n.x, n.y, n.z]);
    }
    normals
}
