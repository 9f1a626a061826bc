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

use super::parse_json;
use crate::LoaderError;
use orion_core::asset::{AssetError, AssetLoader, LoadRequest};
use orion_core::resources::PhysicsMaterial;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PhysicsMaterialDescription {
    restitution: Option<f32>,
    friction: Option<f32>,
}

/// Loader for `.physmat` files: `{ "restitution": 0.2, "friction": 0.8 }`.
/// Omitted properties keep their defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicsMaterialLoader;

impl AssetLoader for PhysicsMaterialLoader {
    type Asset = PhysicsMaterial;

    fn file_type(&self) -> &str {
        "physmat"
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<PhysicsMaterial, AssetError> {
        let description: PhysicsMaterialDescription = parse_json(request)?;
        let mut material = PhysicsMaterial::default();

        if let Some(restitution) = description.restitution {
            if !(0.0..=1.0).contains(&restitution) {
                let reason = format!("restitution {} outside [0, 1]", restitution);
                return Err(LoaderError::invalid(request.path, reason).into());
            }
            material.set_restitution(restitution);
        }
        if let Some(friction) = description.friction {
            if friction < 0.0 {
                let reason = format!("friction {} is negative", friction);
                return Err(LoaderError::invalid(request.path, reason).into());
            }
            material.set_friction(friction);
        }
        Ok(material)
    }
}
