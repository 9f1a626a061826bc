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

//! Asset loaders for the engine's file formats.
//!
//! | extension | asset | format |
//! |---|---|---|
//! | `shader` | [`Shader`](orion_core::shading::Shader) | JSON description, GLSL stage files |
//! | `material` | [`Material`](orion_core::shading::Material) | JSON parameter values |
//! | `png`, `tga`, `jpg` | [`Texture2D`](orion_core::resources::Texture2D) | images as RGBA8 |
//! | `obj` | [`Mesh`](orion_core::resources::Mesh) | Wavefront OBJ |
//! | `physmat` | [`PhysicsMaterial`](orion_core::resources::PhysicsMaterial) | JSON |

mod material;
mod mesh;
mod physics_material;
mod shader;
mod texture;

pub use material::MaterialLoader;
pub use mesh::ObjLoader;
pub use physics_material::PhysicsMaterialLoader;
pub use shader::{ShaderLoader, MAX_INCLUDE_DEPTH};
pub use texture::{TextureLoader, TEXTURE_FILE_TYPES};

use crate::LoaderError;
use orion_core::asset::{AssetManager, LoadRequest};
use serde::de::DeserializeOwned;

/// Registers a loader for every file type listed in the module table.
pub fn register_default_loaders(manager: &AssetManager) {
    manager.register_loader(ShaderLoader);
    manager.register_loader(MaterialLoader);
    for file_type in TEXTURE_FILE_TYPES {
        manager.register_loader(TextureLoader::new(file_type));
    }
    manager.register_loader(ObjLoader);
    manager.register_loader(PhysicsMaterialLoader);
}

fn parse_json<T: DeserializeOwned>(request: &LoadRequest<'_>) -> Result<T, LoaderError> {
    serde_json::from_slice(request.data).map_err(|source| LoaderError::Json {
        path: request.path.to_string(),
        source,
    })
}

/// Resolves `relative` against the directory of the asset `base`.
///
/// `..` may climb up to the store root but not out of the store.
fn resolve_relative(base: &str, relative: &str) -> Option<String> {
    let mut components: Vec<&str> = base.split('/').collect();
    components.pop();

    for component in relative.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                // The first component is the store name.
                if components.len() <= 1 {
                    return None;
                }
                components.pop();
            }
            name => components.push(name),
        }
    }
    Some(components.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_the_asset_directory() {
        assert_eq!(
            resolve_relative("game/shaders/lit.vert", "include/common.glsl").as_deref(),
            Some("game/shaders/include/common.glsl")
        );
        assert_eq!(
            resolve_relative("game/shaders/lit.vert", "../textures/./a.png").as_deref(),
            Some("game/textures/a.png")
        );
        assert_eq!(resolve_relative("game/a.obj", "a.mtl").as_deref(), Some("game/a.mtl"));
    }

    #[test]
    fn relative_paths_cannot_leave_the_store() {
        assert_eq!(resolve_relative("game/a.obj", "../other/a.mtl"), None);
    }
}
