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

//! Loads shaders from a JSON description:
//!
//! ```json
//! {
//!     "parameters": [ { "name": "albedo", "type": "texture" } ],
//!     "passes": [ {
//!         "type": "Deferred",
//!         "vertex": { "source": "game/shaders/lit.vert" },
//!         "fragment": { "source": "game/shaders/lit.frag", "keywords": ["NORMAL_MAP"] }
//!     } ]
//! }
//! ```
//!
//! Stage sources are asset paths. They may pull in other files with
//! `#include "path"`, resolved relative to the including file.

use super::{parse_json, resolve_relative};
use crate::LoaderError;
use orion_core::asset::{AssetError, AssetLoader, LoadRequest};
use orion_core::gpu::ShaderStage;
use orion_core::shading::{
    PassDescriptor, PassType, Shader, ShaderBuilder, ShaderParameterType, StageSource,
};
use serde::Deserialize;
use std::collections::HashSet;

/// Maximum nesting of `#include` directives.
pub const MAX_INCLUDE_DEPTH: usize = 16;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShaderDescription {
    #[serde(default)]
    parameters: Vec<ParameterDescription>,
    passes: Vec<PassDescription>,
}

#[derive(Debug, Deserialize)]
struct ParameterDescription {
    name: String,
    #[serde(rename = "type")]
    parameter_type: String,
}

#[derive(Debug, Deserialize)]
struct PassDescription {
    #[serde(rename = "type")]
    pass_type: String,
    vertex: StageDescription,
    fragment: StageDescription,
}

#[derive(Debug, Deserialize)]
struct StageDescription {
    source: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Loader for `.shader` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShaderLoader;

impl AssetLoader for ShaderLoader {
    type Asset = Shader;

    fn file_type(&self) -> &str {
        "shader"
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Shader, AssetError> {
        let description: ShaderDescription = parse_json(request)?;
        let path = request.path;

        let mut builder = ShaderBuilder::new(path);
        let mut names = HashSet::new();
        for parameter in &description.parameters {
            if parameter.name.is_empty() {
                return Err(LoaderError::invalid(path, "parameter name is empty").into());
            }
            if !names.insert(parameter.name.as_str()) {
                let reason = format!("duplicate parameter '{}'", parameter.name);
                return Err(LoaderError::invalid(path, reason).into());
            }
            let parameter_type: ShaderParameterType =
                parameter.parameter_type.parse().map_err(|source| LoaderError::UnknownName {
                    path: path.to_string(),
                    source,
                })?;
            builder.add_parameter(&parameter.name, parameter_type);
        }

        if description.passes.is_empty() {
            return Err(LoaderError::invalid(path, "shader has no passes").into());
        }
        for pass in &description.passes {
            let pass_type: PassType =
                pass.pass_type.parse().map_err(|source| LoaderError::UnknownName {
                    path: path.to_string(),
                    source,
                })?;
            let descriptor = PassDescriptor::new(pass_type)
                .with_stage(ShaderStage::Vertex, load_stage(request, &pass.vertex)?)
                .with_stage(ShaderStage::Fragment, load_stage(request, &pass.fragment)?);
            builder.add_pass(descriptor);
        }

        let shader = builder.build(request.gpu()).map_err(|source| LoaderError::Gpu {
            path: path.to_string(),
            source,
        })?;
        log::debug!(
            "Loaded shader '{}' ({} parameters, {} passes)",
            path,
            shader.parameters().len(),
            description.passes.len()
        );
        Ok(shader)
    }
}

fn load_stage(
    request: &LoadRequest<'_>,
    stage: &StageDescription,
) -> Result<StageSource, LoaderError> {
    let mut source = String::new();
    expand_includes(request, &stage.source, 0, &mut source)?;
    let mut stage_source = StageSource::new(stage.source.as_str(), source);
    for keyword in &stage.keywords {
        stage_source = stage_source.with_keyword(keyword.as_str());
    }
    Ok(stage_source)
}

/// Appends the text of `file` to `out`, replacing `#include "path"` lines
/// with the text of the named file.
fn expand_includes(
    request: &LoadRequest<'_>,
    file: &str,
    depth: usize,
    out: &mut String,
) -> Result<(), LoaderError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(LoaderError::invalid(
            request.path,
            format!("includes nested deeper than {} levels at '{}'", MAX_INCLUDE_DEPTH, file),
        ));
    }

    let data = request
        .manager
        .open(file)
        .map_err(|source| LoaderError::Dependency {
            path: request.path.to_string(),
            dependency: file.to_string(),
            source,
        })?
        .data;
    let text = String::from_utf8(data).map_err(|_| LoaderError::NotUtf8 {
        path: file.to_string(),
    })?;

    for line in text.lines() {
        match line.trim().strip_prefix("#include") {
            Some(target) => {
                let target = target.trim();
                let name = target
                    .strip_prefix('"')
                    .and_then(|rest| rest.strip_suffix('"'))
                    .ok_or_else(|| {
                        let reason = format!("malformed include in '{}': {}", file, line);
                        LoaderError::invalid(request.path, reason)
                    })?;
                let included = resolve_relative(file, name).ok_or_else(|| {
                    let reason = format!("include '{}' in '{}' leaves the store", name, file);
                    LoaderError::invalid(request.path, reason)
                })?;
                expand_includes(request, &included, depth + 1, out)?;
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    Ok(())
}
