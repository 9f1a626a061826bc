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

use super::{
    texture_resource_slot, ParameterBinding, ParameterValue, Shader, ShaderParameterType,
    ShaderParameterValue, UniformBuffer, UniformMember,
};
use crate::asset::{Asset, AssetHandle};
use crate::gpu::{resource_slots, BufferUsage, GpuManager, GpuResourceSet};
use crate::resources::Texture2D;
use crate::{check, fatal};

/// Where a resolved parameter is stored in a material.
enum Location {
    Uniform(UniformMember),
    Texture(usize),
}

/// Parameter values for one [`Shader`].
///
/// Non-texture values live in a dirty-tracked [`UniformBuffer`] that is
/// uploaded lazily by [`resources`](Self::resources). Texture values are
/// bound into the material resource set as soon as they are set.
#[derive(Debug)]
pub struct Material {
    shader: AssetHandle<Shader>,
    shader_name: String,
    uniforms: Option<UniformBuffer>,
    textures: Vec<Option<AssetHandle<Texture2D>>>,
    resources: GpuResourceSet,
}

impl Asset for Material {}

impl Material {
    /// Creates a material with zeroed uniforms and no textures.
    ///
    /// # Fatal errors
    /// * `shader` is not loaded.
    pub fn new(gpu: &GpuManager, shader: AssetHandle<Shader>) -> Self {
        check!(
            shader.is_loaded(),
            "Creating material with unloaded shader '{}'",
            shader.path().unwrap_or("<unmanaged>")
        );

        let (shader_name, uniforms, texture_count, mut resources) = {
            let shader = shader.read();
            let uniforms = shader.uniform_struct().map(|uniform_struct| {
                UniformBuffer::new(gpu, uniform_struct.clone(), BufferUsage::DynamicDraw)
            });
            let resources = gpu.create_resource_set(shader.resource_set_layout());
            (shader.name().to_string(), uniforms, shader.texture_count(), resources)
        };

        if let Some(uniforms) = &uniforms {
            resources.bind_uniform_buffer(resource_slots::UNIFORMS, uniforms.gpu());
        }

        Self {
            shader,
            shader_name,
            uniforms,
            textures: vec![None; texture_count],
            resources,
        }
    }

    /// The shader this material parameterises.
    pub fn shader(&self) -> &AssetHandle<Shader> {
        &self.shader
    }

    /// The uniform buffer, if the shader has non-texture parameters.
    pub fn uniforms(&self) -> Option<&UniformBuffer> {
        self.uniforms.as_ref()
    }

    /// Uploads pending uniform changes and returns the material resource set.
    pub fn resources(&self) -> &GpuResourceSet {
        if let Some(uniforms) = &self.uniforms {
            uniforms.gpu();
        }
        &self.resources
    }

    /// Sets a parameter of any type.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`;
    /// * the parameter type differs from the value type.
    pub fn set_value(&mut self, name: &str, value: ParameterValue) {
        match (self.locate(name, value.parameter_type()), value) {
            (Location::Texture(slot), ParameterValue::Texture(texture)) => {
                self.bind_texture(slot, texture)
            }
            (Location::Uniform(member), value) => {
                self.uniform_buffer_mut().write_member(&member, &value.to_std140())
            }
            (Location::Texture(_), _) => {
                unreachable!("texture slots only resolve for texture values")
            }
        }
    }

    /// Current value of a parameter.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`;
    /// * the parameter is not of type `parameter_type`.
    pub fn value(&self, name: &str, parameter_type: ShaderParameterType) -> ParameterValue {
        match self.locate(name, parameter_type) {
            Location::Texture(slot) => ParameterValue::Texture(self.textures[slot].clone()),
            Location::Uniform(member) => {
                let mut data = vec![0; member.size()];
                self.uniform_buffer().read_member(&member, &mut data);
                ParameterValue::from_std140(parameter_type, &data)
            }
        }
    }

    /// Sets a non-texture parameter from a typed value.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`;
    /// * the parameter is not of type `T`.
    pub fn set<T: ShaderParameterValue>(&mut self, name: &str, value: &T) {
        let member = self.uniform_location(name, T::TYPE);
        let mut data = vec![0; member.size()];
        value.write_std140(&mut data);
        self.uniform_buffer_mut().write_member(&member, &data);
    }

    /// Reads a non-texture parameter as a typed value.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`;
    /// * the parameter is not of type `T`.
    pub fn get<T: ShaderParameterValue>(&self, name: &str) -> T {
        let member = self.uniform_location(name, T::TYPE);
        let mut data = vec![0; member.size()];
        self.uniform_buffer().read_member(&member, &mut data);
        T::read_std140(&data)
    }

    /// Sets a non-texture parameter from raw std140 bytes.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`;
    /// * the parameter is not of type `parameter_type`, or is a texture;
    /// * `data` is not exactly the size of the type.
    pub fn set_value_raw(&mut self, name: &str, parameter_type: ShaderParameterType, data: &[u8]) {
        let member = self.uniform_location(name, parameter_type);
        self.uniform_buffer_mut().write_member(&member, data);
    }

    /// Copies the raw std140 bytes of a non-texture parameter into `out`.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`;
    /// * the parameter is not of type `parameter_type`, or is a texture;
    /// * `out` is not exactly the size of the type.
    pub fn value_raw(&self, name: &str, parameter_type: ShaderParameterType, out: &mut [u8]) {
        let member = self.uniform_location(name, parameter_type);
        self.uniform_buffer().read_member(&member, out);
    }

    /// Sets or clears a texture parameter, updating the resource set.
    ///
    /// The texture's current sampler is bound with it.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`, or it is not a texture;
    /// * `texture` is not loaded.
    pub fn set_texture(&mut self, name: &str, texture: Option<AssetHandle<Texture2D>>) {
        match self.locate(name, ShaderParameterType::Texture) {
            Location::Texture(slot) => self.bind_texture(slot, texture),
            Location::Uniform(_) => unreachable!("uniform members are never textures"),
        }
    }

    /// Current texture of a texture parameter.
    ///
    /// # Fatal errors
    /// * the shader has no parameter named `name`, or it is not a texture.
    pub fn texture(&self, name: &str) -> Option<AssetHandle<Texture2D>> {
        match self.locate(name, ShaderParameterType::Texture) {
            Location::Texture(slot) => self.textures[slot].clone(),
            Location::Uniform(_) => unreachable!("uniform members are never textures"),
        }
    }

    fn bind_texture(&mut self, slot: usize, texture: Option<AssetHandle<Texture2D>>) {
        let index = texture_resource_slot(slot);
        match &texture {
            Some(handle) => {
                let texture = handle.read();
                self.resources.bind_texture(index, texture.gpu_texture(), texture.sampler());
            }
            None => self.resources.unbind(index),
        }
        self.textures[slot] = texture;
    }

    fn locate(&self, name: &str, parameter_type: ShaderParameterType) -> Location {
        let shader = self.shader.read();
        let Some(parameter) = shader.lookup_parameter(name) else {
            fatal!("Parameter '{}' in '{}' not found", name, self.shader_name);
        };
        check!(
            parameter.parameter_type == parameter_type,
            "Incorrect type for parameter '{}' in '{}'",
            name,
            self.shader_name
        );
        match parameter.binding {
            ParameterBinding::Texture(slot) => Location::Texture(slot),
            ParameterBinding::Uniform(_) => match shader.uniform_member(parameter) {
                Some(member) => Location::Uniform(member.clone()),
                None => unreachable!("uniform parameters always have a member"),
            },
        }
    }

    fn uniform_location(&self, name: &str, parameter_type: ShaderParameterType) -> UniformMember {
        match self.locate(name, parameter_type) {
            Location::Uniform(member) => member,
            Location::Texture(_) => {
                fatal!("Parameter '{}' in '{}' is a texture", name, self.shader_name)
            }
        }
    }

    fn uniform_buffer(&self) -> &UniformBuffer {
        match &self.uniforms {
            Some(uniforms) => uniforms,
            None => unreachable!("shaders with uniform parameters always have a uniform struct"),
        }
    }

    fn uniform_buffer_mut(&mut self) -> &mut UniformBuffer {
        match &mut self.uniforms {
            Some(uniforms) => uniforms,
            None => unreachable!("shaders with uniform parameters always have a uniform struct"),
        }
    }
}
