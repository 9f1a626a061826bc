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

use super::{Pass, PassDescriptor, PassType, ShaderParameterType, UniformMember, UniformStruct};
use crate::asset::Asset;
use crate::gpu::{
    resource_sets, resource_slots, GpuManager, GpuResourceSetLayout, ResourceError,
    ResourceSetLayoutDescriptor, ResourceType,
};
use crate::{check, fatal};
use std::fmt::Write;
use std::sync::Arc;

/// Name of the uniform block holding a shader's non-texture parameters.
pub const MATERIAL_UNIFORMS: &str = "MaterialUniforms";

/// Instance name of the material uniform block in generated GLSL.
pub const MATERIAL_INSTANCE: &str = "material";

/// Where the value of a shader parameter lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterBinding {
    /// Index of the member in the shader's uniform struct.
    Uniform(usize),
    /// Texture slot; bound at resource slot `1 + slot` of the material set.
    Texture(usize),
}

/// A named input of a [`Shader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderParameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub parameter_type: ShaderParameterType,
    /// Location of the value.
    pub binding: ParameterBinding,
}

/// Resource slot of the material set used by a texture slot.
pub fn texture_resource_slot(texture_slot: usize) -> usize {
    resource_slots::UNIFORMS + 1 + texture_slot
}

/// A compiled shader: parameters, their material layout and the passes.
///
/// Shaders are immutable once built. Use [`ShaderBuilder`] to create one.
#[derive(Debug)]
pub struct Shader {
    name: String,
    parameters: Vec<ShaderParameter>,
    uniform_struct: Option<Arc<UniformStruct>>,
    texture_count: usize,
    layout: Arc<GpuResourceSetLayout>,
    passes: [Vec<Pass>; PassType::COUNT],
}

impl Asset for Shader {}

impl Shader {
    /// Shader name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> &[ShaderParameter] {
        &self.parameters
    }

    /// Finds a parameter by name.
    pub fn lookup_parameter(&self, name: &str) -> Option<&ShaderParameter> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    /// Uniform member holding `parameter`, if it is not a texture.
    pub fn uniform_member(&self, parameter: &ShaderParameter) -> Option<&UniformMember> {
        match parameter.binding {
            ParameterBinding::Uniform(index) => {
                self.uniform_struct.as_ref().map(|s| &s.members()[index])
            }
            ParameterBinding::Texture(_) => None,
        }
    }

    /// Layout of the non-texture parameters, if there are any.
    pub fn uniform_struct(&self) -> Option<&Arc<UniformStruct>> {
        self.uniform_struct.as_ref()
    }

    /// Number of texture slots.
    pub fn texture_count(&self) -> usize {
        self.texture_count
    }

    /// Layout of the material resource set.
    pub fn resource_set_layout(&self) -> &Arc<GpuResourceSetLayout> {
        &self.layout
    }

    /// Number of passes of the given type.
    pub fn num_passes(&self, pass_type: PassType) -> usize {
        self.passes[pass_type.index()].len()
    }

    /// Pass `index` of the given type.
    ///
    /// # Fatal errors
    /// * `index` is out of range.
    pub fn pass(&self, pass_type: PassType, index: usize) -> &Pass {
        let passes = &self.passes[pass_type.index()];
        match passes.get(index) {
            Some(pass) => pass,
            None => fatal!(
                "{} pass {} out of range in shader '{}' (passes: {})",
                pass_type,
                index,
                self.name,
                passes.len()
            ),
        }
    }
}

/// Builds a [`Shader`] from parameter declarations and pass definitions.
#[derive(Debug, Clone)]
pub struct ShaderBuilder {
    name: String,
    parameters: Vec<(String, ShaderParameterType)>,
    passes: Vec<PassDescriptor>,
}

impl ShaderBuilder {
    /// Starts a shader named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            passes: Vec::new(),
        }
    }

    /// Declares a parameter.
    ///
    /// # Fatal errors
    /// * a parameter named `name` was already declared.
    pub fn add_parameter(&mut self, name: &str, parameter_type: ShaderParameterType) -> &mut Self {
        check!(
            !self.parameters.iter().any(|(existing, _)| existing == name),
            "Adding duplicate shader parameter '{}'",
            name
        );
        self.parameters.push((name.to_string(), parameter_type));
        self
    }

    /// Adds a pass.
    pub fn add_pass(&mut self, pass: PassDescriptor) -> &mut Self {
        self.passes.push(pass);
        self
    }

    /// Lays out the parameters and compiles every pass.
    ///
    /// Texture parameters receive texture slots in declaration order; the
    /// others become members of the `MaterialUniforms` struct in declaration
    /// order. Program compilation errors are returned.
    pub fn build(&self, gpu: &GpuManager) -> Result<Shader, ResourceError> {
        let mut uniforms = UniformStruct::new(MATERIAL_UNIFORMS);
        let mut parameters = Vec::with_capacity(self.parameters.len());
        let mut texture_count = 0;

        for (name, parameter_type) in &self.parameters {
            let binding = if parameter_type.is_texture() {
                texture_count += 1;
                ParameterBinding::Texture(texture_count - 1)
            } else {
                uniforms.add_member(name, *parameter_type);
                ParameterBinding::Uniform(uniforms.members().len() - 1)
            };
            parameters.push(ShaderParameter {
                name: name.clone(),
                parameter_type: *parameter_type,
                binding,
            });
        }

        let uniform_struct = (!uniforms.is_empty()).then(|| Arc::new(uniforms));

        let mut slots = vec![ResourceType::None; texture_resource_slot(texture_count)];
        if uniform_struct.is_some() {
            slots[resource_slots::UNIFORMS] = ResourceType::UniformBuffer;
        }
        for slot in 0..texture_count {
            slots[texture_resource_slot(slot)] = ResourceType::Texture;
        }
        let layout = gpu.create_resource_set_layout(ResourceSetLayoutDescriptor { slots });

        let declarations = generate_declarations(uniform_struct.as_deref(), &parameters);
        let mut passes: [Vec<Pass>; PassType::COUNT] = Default::default();
        for descriptor in &self.passes {
            let pass = Pass::build(gpu, descriptor, &declarations, &layout)?;
            passes[descriptor.pass_type.index()].push(pass);
        }

        log::debug!(
            "Built shader '{}' ({} parameters, {} textures, {} passes)",
            self.name,
            parameters.len(),
            texture_count,
            self.passes.len()
        );

        Ok(Shader {
            name: self.name.clone(),
            parameters,
            uniform_struct,
            texture_count,
            layout,
            passes,
        })
    }
}

fn generate_declarations(
    uniform_struct: Option<&UniformStruct>,
    parameters: &[ShaderParameter],
) -> String {
    let mut glsl = String::new();
    if let Some(uniforms) = uniform_struct {
        glsl.push_str(&uniforms.generate_glsl(
            resource_sets::MATERIAL,
            resource_slots::UNIFORMS,
            MATERIAL_INSTANCE,
        ));
    }
    for parameter in parameters {
        if let ParameterBinding::Texture(slot) = parameter.binding {
            let _ = writeln!(
                glsl,
                "layout(set = {}, binding = {}) uniform {} {};",
                resource_sets::MATERIAL,
                texture_resource_slot(slot),
                parameter.parameter_type.glsl_type(),
                parameter.name
            );
        }
    }
    glsl
}
