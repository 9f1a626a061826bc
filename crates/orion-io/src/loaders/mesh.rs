// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loads meshes from Wavefront OBJ files.

use super::resolve_relative;
use crate::LoaderError;
use orion_core::asset::{AssetError, AssetLoader, LoadRequest};
use orion_core::resources::{Mesh, Vertex};
use std::io::Cursor;
use std::path::Path;

/// Name of the material slot of faces without a material.
const DEFAULT_MATERIAL: &str = "default";

/// Loader for `.obj` files.
///
/// Faces are triangulated and every OBJ object becomes a sub-mesh over one
/// shared vertex buffer. Material slots are named after the `usemtl`
/// materials, read from the `mtllib` libraries next to the file, or
/// `"default"` when a face has none.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjLoader;

impl AssetLoader for ObjLoader {
    type Asset = Mesh;

    fn file_type(&self) -> &str {
        "obj"
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Mesh, AssetError> {
        let path = request.path;
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };

        let load_library = |library: &Path| {
            let resolved = library.to_str().and_then(|name| resolve_relative(path, name));
            let Some(library) = resolved else {
                return Err(tobj::LoadError::OpenFileFailed);
            };
            match request.manager.open(&library) {
                Ok(source) => tobj::load_mtl_buf(&mut Cursor::new(source.data)),
                Err(err) => {
                    log::warn!("{}: failed to open material library '{}': {}", path, library, err);
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        };
        let (models, materials) =
            tobj::load_obj_buf(&mut Cursor::new(request.data), &options, load_library).map_err(
                |source| LoaderError::Obj {
                    path: path.to_string(),
                    source,
                },
            )?;

        let materials = materials.unwrap_or_else(|err| {
            if !matches!(err, tobj::LoadError::OpenFileFailed) {
                log::warn!("{}: ignoring material libraries: {}", path, err);
            }
            Vec::new()
        });

        let mut vertices = Vec::new();
        let mut objects = Vec::with_capacity(models.len());
        for model in &models {
            let mesh = &model.mesh;
            let base = vertices.len() as u32;
            let count = mesh.positions.len() / 3;
            for i in 0..count {
                let normal = if mesh.normals.len() >= 3 * (i + 1) {
                    [mesh.normals[3 * i], mesh.normals[3 * i + 1], mesh.normals[3 * i + 2]]
                } else {
                    [0.0; 3]
                };
                let texcoord = if mesh.texcoords.len() >= 2 * (i + 1) {
                    [mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1]]
                } else {
                    [0.0; 2]
                };
                vertices.push(Vertex {
                    position: [
                        mesh.positions[3 * i],
                        mesh.positions[3 * i + 1],
                        mesh.positions[3 * i + 2],
                    ],
                    normal,
                    texcoord,
                });
            }

            if mesh.indices.is_empty() {
                continue;
            }
            let indices: Vec<u32> = mesh.indices.iter().map(|index| base + index).collect();
            let material = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map_or(DEFAULT_MATERIAL, |material| material.name.as_str());
            objects.push((material, indices));
        }

        if vertices.is_empty() || objects.is_empty() {
            return Err(LoaderError::invalid(path, "OBJ file contains no faces").into());
        }

        let mut result = Mesh::new(request.gpu(), &vertices);
        for (material, indices) in objects {
            let slot = result.add_material(material);
            result.add_submesh(request.gpu(), &indices, slot);
        }

        log::debug!(
            "Loaded mesh '{}' ({} vertices, {} sub-meshes, {} materials)",
            path,
            result.vertex_count(),
            result.submeshes().len(),
            result.materials().len()
        );
        Ok(result)
    }
}
