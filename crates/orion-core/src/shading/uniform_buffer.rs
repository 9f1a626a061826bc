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

//! CPU-side shadows of uniform blocks, uploaded lazily when used.

use super::{ShaderParameterValue, UniformMember, UniformStruct};
use crate::gpu::{BufferDescriptor, BufferType, BufferUsage, GpuBuffer, GpuManager};
use crate::{check, fatal};
use bytemuck::Pod;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A uniform block laid out by a [`UniformStruct`].
///
/// Writes go to a zero-initialised shadow copy and mark the buffer dirty.
/// [`gpu`](Self::gpu) uploads the shadow copy when dirty, so consecutive
/// writes cost at most one upload before the next use.
#[derive(Debug)]
pub struct UniformBuffer {
    uniform_struct: Arc<UniformStruct>,
    shadow: Vec<u8>,
    buffer: Arc<GpuBuffer>,
    dirty: AtomicBool,
}

impl UniformBuffer {
    /// Creates a buffer for `uniform_struct`.
    ///
    /// # Fatal errors
    /// * the struct is empty.
    pub fn new(gpu: &GpuManager, uniform_struct: Arc<UniformStruct>, usage: BufferUsage) -> Self {
        check!(
            !uniform_struct.is_empty(),
            "Uniform buffer for empty uniform struct '{}'",
            uniform_struct.name()
        );

        let buffer = gpu.create_buffer(&BufferDescriptor {
            label: Some(uniform_struct.name().into()),
            buffer_type: BufferType::Uniform,
            usage,
            size: uniform_struct.size() as u64,
        });
        Self {
            shadow: vec![0; uniform_struct.size()],
            uniform_struct,
            buffer,
            dirty: AtomicBool::new(true),
        }
    }

    /// Layout of the block.
    pub fn uniform_struct(&self) -> &Arc<UniformStruct> {
        &self.uniform_struct
    }

    /// Whether the shadow copy has changes not yet uploaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Uploads pending changes and returns the GPU buffer.
    pub fn gpu(&self) -> &Arc<GpuBuffer> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            log::trace!("Uploading uniform block '{}'", self.uniform_struct.name());
            self.buffer.write(0, &self.shadow);
        }
        &self.buffer
    }

    /// Copies the current value of `member` into `out`.
    ///
    /// # Fatal errors
    /// * `out` is not exactly the size of the member.
    pub fn read_member(&self, member: &UniformMember, out: &mut [u8]) {
        self.check_size(member, out.len());
        out.copy_from_slice(&self.shadow[member.offset..member.offset + member.size()]);
    }

    /// Sets the value of `member` and marks the buffer dirty.
    ///
    /// # Fatal errors
    /// * `data` is not exactly the size of the member.
    pub fn write_member(&mut self, member: &UniformMember, data: &[u8]) {
        self.check_size(member, data.len());
        self.shadow[member.offset..member.offset + member.size()].copy_from_slice(data);
        *self.dirty.get_mut() = true;
    }

    /// Reads the member named `name`.
    ///
    /// # Fatal errors
    /// * no member is named `name`;
    /// * the member is not of type `T`.
    pub fn get<T: ShaderParameterValue>(&self, name: &str) -> T {
        let member = self.typed_member::<T>(name);
        T::read_std140(&self.shadow[member.offset..member.offset + member.size()])
    }

    /// Writes the member named `name`.
    ///
    /// # Fatal errors
    /// * no member is named `name`;
    /// * the member is not of type `T`.
    pub fn set<T: ShaderParameterValue>(&mut self, name: &str, value: &T) {
        let member = self.typed_member::<T>(name).clone();
        value.write_std140(&mut self.shadow[member.offset..member.offset + member.size()]);
        *self.dirty.get_mut() = true;
    }

    fn typed_member<T: ShaderParameterValue>(&self, name: &str) -> &UniformMember {
        let Some(member) = self.uniform_struct.lookup_member(name) else {
            fatal!(
                "Member '{}' in uniform struct '{}' not found",
                name,
                self.uniform_struct.name()
            );
        };
        check!(
            member.member_type == T::TYPE,
            "Member '{}' in uniform struct '{}' has incorrect type",
            name,
            self.uniform_struct.name()
        );
        member
    }

    fn check_size(&self, member: &UniformMember, size: usize) {
        check!(
            size == member.size(),
            "Size mismatch for member '{}' in uniform struct '{}' (expected {}, got {})",
            member.name,
            self.uniform_struct.name(),
            member.size(),
            size
        );
        check!(
            member.offset + member.size() <= self.shadow.len(),
            "Member '{}' at offset {} lies outside uniform struct '{}' ({} bytes)",
            member.name,
            member.offset,
            self.uniform_struct.name(),
            self.shadow.len()
        );
    }
}

/// A uniform block whose layout is a Rust type.
///
/// `T` must be laid out to match its std140 GLSL declaration.
#[derive(Debug)]
pub struct TypedUniformBuffer<T: Pod> {
    data: T,
    buffer: Arc<GpuBuffer>,
    dirty: AtomicBool,
}

impl<T: Pod> TypedUniformBuffer<T> {
    /// Creates a buffer holding `initial`.
    pub fn new(gpu: &GpuManager, label: &str, initial: T, usage: BufferUsage) -> Self {
        let buffer = gpu.create_buffer(&BufferDescriptor {
            label: Some(label.to_string().into()),
            buffer_type: BufferType::Uniform,
            usage,
            size: std::mem::size_of::<T>() as u64,
        });
        Self {
            data: initial,
            buffer,
            dirty: AtomicBool::new(true),
        }
    }

    /// Current contents.
    pub fn read(&self) -> &T {
        &self.data
    }

    /// Mutable contents. Marks the buffer dirty.
    pub fn write(&mut self) -> &mut T {
        *self.dirty.get_mut() = true;
        &mut self.data
    }

    /// Whether the contents have changes not yet uploaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Uploads pending changes and returns the GPU buffer.
    pub fn gpu(&self) -> &Arc<GpuBuffer> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            self.buffer.write(0, bytemuck::bytes_of(&self.data));
        }
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::{mock_manager, MockDevice};
    use crate::shading::ShaderParameterType;
    use glam::{Vec3, Vec4};

    fn material_block() -> Arc<UniformStruct> {
        let mut uniforms = UniformStruct::new("MaterialUniforms");
        uniforms.add_member("shininess", ShaderParameterType::Float);
        uniforms.add_member("tint", ShaderParameterType::Vec3);
        uniforms.add_member("colour", ShaderParameterType::Vec4);
        Arc::new(uniforms)
    }

    fn uniform_buffer() -> (Arc<MockDevice>, UniformBuffer) {
        let (device, manager) = mock_manager();
        let buffer = UniformBuffer::new(&manager, material_block(), BufferUsage::DynamicDraw);
        (device, buffer)
    }

    #[test]
    fn new_buffer_is_zeroed_and_dirty() {
        let (_device, buffer) = uniform_buffer();
        assert!(buffer.is_dirty());
        assert_eq!(buffer.get::<f32>("shininess"), 0.0);
        assert_eq!(buffer.get::<Vec4>("colour"), Vec4::ZERO);
        assert_eq!(buffer.gpu().size(), 48);
    }

    #[test]
    fn upload_happens_once_per_dirty_period() {
        let (device, mut buffer) = uniform_buffer();
        assert_eq!(device.buffer_writes(), 0);

        buffer.gpu();
        buffer.gpu();
        assert!(!buffer.is_dirty());
        assert_eq!(device.buffer_writes(), 1);

        let member = buffer.uniform_struct().lookup_member("shininess").unwrap().clone();
        for value in [1.0f32, 2.0, 32.0] {
            buffer.write_member(&member, &value.to_ne_bytes());
        }
        buffer.set("tint", &Vec3::new(1.0, 0.5, 0.25));
        assert!(buffer.is_dirty());
        assert_eq!(device.buffer_writes(), 1);

        let gpu = buffer.gpu().clone();
        assert!(!buffer.is_dirty());
        assert_eq!(device.buffer_writes(), 2);
        buffer.gpu();
        assert_eq!(device.buffer_writes(), 2);

        assert_eq!(gpu.read(0, 4), 32.0f32.to_ne_bytes());
        assert_eq!(gpu.read(16, 4), 1.0f32.to_ne_bytes());
        assert_eq!(gpu.read(24, 4), 0.25f32.to_ne_bytes());
        assert_eq!(device.buffer_writes(), 2);
    }

    #[test]
    fn raw_member_access_uses_offsets() {
        let (_device, mut buffer) = uniform_buffer();
        let member = buffer.uniform_struct().lookup_member("colour").unwrap().clone();

        let data: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0].iter().flat_map(|v| v.to_ne_bytes()).collect();
        buffer.write_member(&member, &data);

        let mut out = [0u8; 16];
        buffer.read_member(&member, &mut out);
        assert_eq!(&out[..], &data[..]);
        assert_eq!(buffer.get::<Vec4>("colour"), Vec4::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    #[should_panic(expected = "Member 'roughness' in uniform struct 'MaterialUniforms' not found")]
    fn unknown_member_is_fatal() {
        let (_device, mut buffer) = uniform_buffer();
        buffer.set("roughness", &0.5f32);
    }

    #[test]
    #[should_panic(
        expected = "Member 'tint' in uniform struct 'MaterialUniforms' has incorrect type"
    )]
    fn wrong_member_type_is_fatal() {
        let (_device, buffer) = uniform_buffer();
        buffer.get::<Vec4>("tint");
    }

    #[test]
    #[should_panic(expected = "Size mismatch for member 'shininess'")]
    fn raw_write_with_wrong_size_is_fatal() {
        let (_device, mut buffer) = uniform_buffer();
        let member = buffer.uniform_struct().lookup_member("shininess").unwrap().clone();
        buffer.write_member(&member, &[0; 8]);
    }

    #[test]
    #[should_panic(
        expected = "Member 'exposure' at offset 64 lies outside uniform struct 'MaterialUniforms'"
    )]
    fn member_of_another_struct_is_fatal() {
        let (_device, mut buffer) = uniform_buffer();
        let mut view = UniformStruct::new("ViewUniforms");
        view.add_member("projection", ShaderParameterType::Mat4);
        view.add_member("exposure", ShaderParameterType::Float);
        let member = view.lookup_member("exposure").unwrap().clone();
        buffer.write_member(&member, &1.0f32.to_ne_bytes());
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    struct ViewUniforms {
        position: [f32; 4],
        exposure: f32,
        _pad: [f32; 3],
    }

    #[test]
    fn typed_buffer_tracks_writes() {
        let (_device, manager) = mock_manager();
        let mut view = TypedUniformBuffer::new(
            &manager,
            "ViewUniforms",
            ViewUniforms {
                position: [0.0; 4],
                exposure: 1.0,
                _pad: [0.0; 3],
            },
            BufferUsage::DynamicDraw,
        );

        view.gpu();
        assert!(!view.is_dirty());

        view.write().exposure = 2.5;
        assert!(view.is_dirty());
        assert_eq!(view.read().exposure, 2.5);

        let gpu = view.gpu();
        assert_eq!(gpu.read(16, 4), 2.5f32.to_ne_bytes());
    }
}
