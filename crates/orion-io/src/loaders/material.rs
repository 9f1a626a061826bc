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

//! Loads materials from a JSON description:
//!
//! ```json
//! {
//!     "shader": "game/shaders/lit.shader",
//!     "parameters": {
//!         "albedo": "game/textures/brick.png",
//!         "specular": [1.0, 1.0, 1.0],
//!         "shininess": 32.0
//!     }
//! }
//! ```
//!
//! Values are numbers, arrays of numbers (matrices flattened column by
//! column) or texture asset paths, as the shader declares them.

use super::parse_json;
use crate::LoaderError;
use orion_core::asset::{AssetError, AssetLoader, LoadRequest};
use orion_core::glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use orion_core::resources::Texture2D;
use orion_core::shading::{Material, ParameterValue, Shader, ShaderParameterType};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialDescription {
    shader: String,
    #[serde(default)]
    parameters: Map<String, Value>,
}

/// Loader for `.material` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaterialLoader;

impl AssetLoader for MaterialLoader {
    type Asset = Material;

    fn file_type(&self) -> &str {
        "material"
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Material, AssetError> {
        let description: MaterialDescription = parse_json(request)?;
        let path = request.path;

        let shader = request.manager.load::<Shader>(&description.shader);
        let mut material = Material::new(request.gpu(), shader.clone());

        for (name, value) in &description.parameters {
            let parameter_type = shader
                .read()
                .lookup_parameter(name)
                .map(|parameter| parameter.parameter_type)
                .ok_or_else(|| {
                    LoaderError::invalid(
                        path,
                        format!("shader '{}' has no parameter '{}'", description.shader, name),
                    )
                })?;
            let value = parameter_value(request, name, parameter_type, value)?;
            material.set_value(name, value);
        }

        log::debug!(
            "Loaded material '{}' ({} parameters set)",
            path,
            description.parameters.len()
        );
        Ok(material)
    }
}

/// Converts a JSON value to a value of the declared parameter type.
fn parameter_value(
    request: &LoadRequest<'_>,
    name: &str,
    parameter_type: ShaderParameterType,
    value: &Value,
) -> Result<ParameterValue, LoaderError> {
    let mismatch = || {
        LoaderError::invalid(
            request.path,
            format!("value of parameter '{}' is not a valid {}", name, parameter_type),
        )
    };

    if parameter_type == ShaderParameterType::Texture {
        return match value {
            Value::Null => Ok(ParameterValue::Texture(None)),
            Value::String(texture) => Ok(ParameterValue::Texture(Some(
                request.manager.load::<Texture2D>(texture),
            ))),
            _ => Err(mismatch()),
        };
    }

    let parse_floats = || -> Option<Vec<f32>> {
        let components = match value {
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_f64().map(|v| v as f32))
                .collect::<Option<Vec<_>>>()?,
            other => vec![other.as_f64()? as f32],
        };
        (components.len() == parameter_type.components()).then_some(components)
    };
    let parse_ints = || -> Option<Vec<i32>> {
        let components = match value {
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_i64().and_then(|v| i32::try_from(v).ok()))
                .collect::<Option<Vec<_>>>()?,
            other => vec![i32::try_from(other.as_i64()?).ok()?],
        };
        (components.len() == parameter_type.components()).then_some(components)
    };
    let floats = || parse_floats().ok_or_else(mismatch);
    let ints = || parse_ints().ok_or_else(mismatch);

    let value = match parameter_type {
        ShaderParameterType::Int => ParameterValue::Int(ints()?[0]),
        ShaderParameterType::UnsignedInt => {
            let v = value.as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(mismatch)?;
            ParameterValue::UnsignedInt(v)
        }
        ShaderParameterType::Float => ParameterValue::Float(floats()?[0]),
        ShaderParameterType::Vec2 => ParameterValue::Vec2(Vec2::from_slice(&floats()?)),
        ShaderParameterType::Vec3 => ParameterValue::Vec3(Vec3::from_slice(&floats()?)),
        ShaderParameterType::Vec4 => ParameterValue::Vec4(Vec4::from_slice(&floats()?)),
        ShaderParameterType::Mat2 => ParameterValue::Mat2(Mat2::from_cols_slice(&floats()?)),
        ShaderParameterType::Mat3 => ParameterValue::Mat3(Mat3::from_cols_slice(&floats()?)),
        ShaderParameterType::Mat4 => ParameterValue::Mat4(Mat4::from_cols_slice(&floats()?)),
        ShaderParameterType::IntVec2 => ParameterValue::IntVec2(IVec2::from_slice(&ints()?)),
        ShaderParameterType::IntVec3 => ParameterValue::IntVec3(IVec3::from_slice(&ints()?)),
        ShaderParameterType::IntVec4 => ParameterValue::IntVec4(IVec4::from_slice(&ints()?)),
        ShaderParameterType::Texture => unreachable!("textures are handled above"),
    };
    Ok(value)
}
