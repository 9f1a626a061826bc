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

//! Resource sets: fixed collections of slots binding buffers and textures
//! for shader consumption.
//!
//! Shader resources are grouped into sets by update frequency, which maps
//! onto descriptor sets / bind groups of modern APIs. A
//! [`GpuResourceSetLayout`] fixes the type of each slot; a
//! [`GpuResourceSet`] holds the current bindings and forwards each change
//! to the backend exactly once.

use crate::gpu::{
    BufferId, BufferType, GpuBuffer, GpuDevice, GpuSamplerState, GpuTexture, SamplerId, TextureId,
};
use crate::{check, fatal};
use std::sync::Arc;

/// Standard resource set numbers.
pub mod resource_sets {
    /// Resources of the view the scene is rendered from.
    pub const VIEW: usize = 0;
    /// Resources of the light of the current pass.
    pub const LIGHT: usize = 1;
    /// Resources of the current material (contents defined by its shader).
    pub const MATERIAL: usize = 2;
    /// Resources of the entity being drawn.
    pub const ENTITY: usize = 3;
    /// Number of standard sets.
    pub const COUNT: usize = 4;
}

/// Standard slot numbers within a set.
pub mod resource_slots {
    /// The uniform buffer of a set with uniforms.
    pub const UNIFORMS: usize = 0;
}

/// Type of resource a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceType {
    /// Unused slot.
    #[default]
    None,
    /// A uniform buffer.
    UniformBuffer,
    /// A texture with its sampler.
    Texture,
}

/// A descriptor used to create a [`GpuResourceSetLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceSetLayoutDescriptor {
    /// Slot types, indexed by slot number.
    pub slots: Vec<ResourceType>,
}

/// An opaque handle to a backend resource set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceSetLayoutId(pub usize);

/// An opaque handle to a backend resource set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceSetId(pub usize);

/// The contents of one slot, as seen by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceBinding {
    /// Nothing bound.
    None,
    /// A uniform buffer.
    UniformBuffer(BufferId),
    /// A texture and the sampler to read it with.
    Texture {
        /// The texture.
        texture: TextureId,
        /// The sampler.
        sampler: SamplerId,
    },
}

/// The layout of a resource set: the type of each slot.
#[derive(Debug)]
pub struct GpuResourceSetLayout {
    id: ResourceSetLayoutId,
    descriptor: ResourceSetLayoutDescriptor,
    device: Arc<dyn GpuDevice>,
}

impl GpuResourceSetLayout {
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        id: ResourceSetLayoutId,
        descriptor: ResourceSetLayoutDescriptor,
    ) -> Self {
        Self { id, descriptor, device }
    }

    /// Backend handle.
    pub fn id(&self) -> ResourceSetLayoutId {
        self.id
    }

    /// Descriptor the layout was created from.
    pub fn descriptor(&self) -> &ResourceSetLayoutDescriptor {
        &self.descriptor
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.descriptor.slots.len()
    }

    /// Type of slot `index`.
    pub fn slot_type(&self, index: usize) -> Option<ResourceType> {
        self.descriptor.slots.get(index).copied()
    }
}

impl Drop for GpuResourceSetLayout {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_resource_set_layout(self.id) {
            log::warn!("Failed to destroy resource set layout {:?}: {}", self.id, err);
        }
    }
}

/// What a slot of a [`GpuResourceSet`] currently holds.
#[derive(Debug, Clone, Default)]
pub enum SlotBinding {
    /// Nothing bound.
    #[default]
    Empty,
    /// A uniform buffer.
    UniformBuffer(Arc<GpuBuffer>),
    /// A texture and its sampler.
    Texture {
        /// The texture.
        texture: Arc<GpuTexture>,
        /// The sampler.
        sampler: Arc<GpuSamplerState>,
    },
}

impl SlotBinding {
    fn to_backend(&self) -> ResourceBinding {
        match self {
            SlotBinding::Empty => ResourceBinding::None,
            SlotBinding::UniformBuffer(buffer) => ResourceBinding::UniformBuffer(buffer.id()),
            SlotBinding::Texture { texture, sampler } => ResourceBinding::Texture {
                texture: texture.id(),
                sampler: sampler.id(),
            },
        }
    }
}

/// A set of bound resources following a [`GpuResourceSetLayout`].
///
/// Slots are mutated only through `&mut self`. Rebinding the resource a slot
/// already holds is a no-op; any actual change is forwarded to the backend
/// once.
#[derive(Debug)]
pub struct GpuResourceSet {
    id: ResourceSetId,
    layout: Arc<GpuResourceSetLayout>,
    slots: Vec<SlotBinding>,
    device: Arc<dyn GpuDevice>,
}

impl GpuResourceSet {
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        id: ResourceSetId,
        layout: Arc<GpuResourceSetLayout>,
    ) -> Self {
        let slots = vec![SlotBinding::Empty; layout.slot_count()];
        Self { id, layout, slots, device }
    }

    /// Backend handle.
    pub fn id(&self) -> ResourceSetId {
        self.id
    }

    /// Layout the set follows.
    pub fn layout(&self) -> &Arc<GpuResourceSetLayout> {
        &self.layout
    }

    /// Current binding of slot `index`.
    pub fn slot(&self, index: usize) -> &SlotBinding {
        self.check_index(index);
        &self.slots[index]
    }

    /// Binds a uniform buffer to slot `index`.
    ///
    /// # Fatal errors
    /// * `index` is out of range or not a uniform buffer slot;
    /// * `buffer` is not a uniform buffer.
    pub fn bind_uniform_buffer(&mut self, index: usize, buffer: &Arc<GpuBuffer>) {
        self.check_slot(index, ResourceType::UniformBuffer);
        check!(
            buffer.buffer_type() == BufferType::Uniform,
            "Binding {:?} buffer to uniform buffer slot {}",
            buffer.buffer_type(),
            index
        );

        if let SlotBinding::UniformBuffer(current) = &self.slots[index] {
            if Arc::ptr_eq(current, buffer) {
                return;
            }
        }

        self.slots[index] = SlotBinding::UniformBuffer(buffer.clone());
        self.update_slot(index);
    }

    /// Binds a texture and the sampler to read it with to slot `index`.
    ///
    /// # Fatal errors
    /// * `index` is out of range or not a texture slot.
    pub fn bind_texture(
        &mut self,
        index: usize,
        texture: &Arc<GpuTexture>,
        sampler: &Arc<GpuSamplerState>,
    ) {
        self.check_slot(index, ResourceType::Texture);

        if let SlotBinding::Texture {
            texture: current_texture,
            sampler: current_sampler,
        } = &self.slots[index]
        {
            if Arc::ptr_eq(current_texture, texture) && Arc::ptr_eq(current_sampler, sampler) {
                return;
            }
        }

        self.slots[index] = SlotBinding::Texture {
            texture: texture.clone(),
            sampler: sampler.clone(),
        };
        self.update_slot(index);
    }

    /// Clears slot `index`.
    pub fn unbind(&mut self, index: usize) {
        self.check_index(index);
        if matches!(self.slots[index], SlotBinding::Empty) {
            return;
        }
        self.slots[index] = SlotBinding::Empty;
        self.update_slot(index);
    }

    fn check_index(&self, index: usize) {
        check!(
            index < self.slots.len(),
            "Resource set slot {} out of range (slots: {})",
            index,
            self.slots.len()
        );
    }

    fn check_slot(&self, index: usize, expected: ResourceType) {
        self.check_index(index);
        let actual = self.layout.descriptor().slots[index];
        check!(
            actual == expected,
            "Resource set slot {} has type {:?}, cannot bind {:?}",
            index,
            actual,
            expected
        );
    }

    fn update_slot(&self, index: usize) {
        let binding = self.slots[index].to_backend();
        log::trace!("Resource set {:?} slot {} -> {:?}", self.id, index, binding);
        if let Err(err) = self.device.update_resource_set(self.id, index, &binding) {
            fatal!("Failed to update resource set {:?} slot {}: {}", self.id, index, err);
        }
    }
}

impl Drop for GpuResourceSet {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_resource_set(self.id) {
            log::warn!("Failed to destroy resource set {:?}: {}", self.id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::mock_manager;
    use crate::gpu::{
        BufferDescriptor, BufferUsage, SamplerAddressMode, SamplerStateDescriptor,
        TextureDescriptor,
    };

    fn layout_descriptor() -> ResourceSetLayoutDescriptor {
        ResourceSetLayoutDescriptor {
            slots: vec![ResourceType::UniformBuffer, ResourceType::Texture, ResourceType::None],
        }
    }

    fn buffer(manager: &crate::gpu::GpuManager, buffer_type: BufferType) -> Arc<GpuBuffer> {
        manager.create_buffer(&BufferDescriptor {
            label: None,
            buffer_type,
            usage: BufferUsage::DynamicDraw,
            size: 64,
        })
    }

    #[test]
    fn rebinding_same_buffer_is_a_no_op() {
        let (device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(layout_descriptor());
        let mut set = manager.create_resource_set(&layout);
        let uniforms = buffer(&manager, BufferType::Uniform);

        set.bind_uniform_buffer(0, &uniforms);
        assert_eq!(device.slot_updates(set.id()), 1);

        set.bind_uniform_buffer(0, &uniforms);
        assert_eq!(device.slot_updates(set.id()), 1);

        let other = buffer(&manager, BufferType::Uniform);
        set.bind_uniform_buffer(0, &other);
        assert_eq!(device.slot_updates(set.id()), 2);
    }

    #[test]
    fn rebinding_same_texture_and_sampler_is_a_no_op() {
        let (device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(layout_descriptor());
        let mut set = manager.create_resource_set(&layout);
        let texture = manager.create_texture(&TextureDescriptor::default());
        let clamp = manager.sampler_state(&SamplerStateDescriptor::default());
        let wrap_descriptor =
            SamplerStateDescriptor::default().with_address_mode(SamplerAddressMode::Wrap);
        let wrap = manager.sampler_state(&wrap_descriptor);

        set.bind_texture(1, &texture, &clamp);
        set.bind_texture(1, &texture, &clamp);
        assert_eq!(device.slot_updates(set.id()), 1);

        // Same texture, different sampler is a change.
        set.bind_texture(1, &texture, &wrap);
        assert_eq!(device.slot_updates(set.id()), 2);
        assert!(matches!(
            set.slot(1),
            SlotBinding::Texture { sampler, .. } if Arc::ptr_eq(sampler, &wrap)
        ));
    }

    #[test]
    #[should_panic(expected = "Resource set slot 0 has type UniformBuffer, cannot bind Texture")]
    fn texture_in_uniform_slot_is_fatal() {
        let (_device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(layout_descriptor());
        let mut set = manager.create_resource_set(&layout);
        let texture = manager.create_texture(&TextureDescriptor::default());
        let sampler = manager.sampler_state(&SamplerStateDescriptor::default());
        set.bind_texture(0, &texture, &sampler);
    }

    #[test]
    #[should_panic(expected = "Resource set slot 3 out of range (slots: 3)")]
    fn out_of_range_slot_is_fatal() {
        let (_device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(layout_descriptor());
        let mut set = manager.create_resource_set(&layout);
        let uniforms = buffer(&manager, BufferType::Uniform);
        set.bind_uniform_buffer(3, &uniforms);
    }

    #[test]
    #[should_panic(expected = "Binding Vertex buffer to uniform buffer slot 0")]
    fn vertex_buffer_in_uniform_slot_is_fatal() {
        let (_device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(layout_descriptor());
        let mut set = manager.create_resource_set(&layout);
        let vertices = buffer(&manager, BufferType::Vertex);
        set.bind_uniform_buffer(0, &vertices);
    }

    #[test]
    fn unbinding_clears_the_slot_once() {
        let (device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(layout_descriptor());
        let mut set = manager.create_resource_set(&layout);
        let uniforms = buffer(&manager, BufferType::Uniform);

        set.bind_uniform_buffer(0, &uniforms);
        set.unbind(0);
        set.unbind(0);
        assert_eq!(device.slot_updates(set.id()), 2);
        assert!(matches!(set.slot(0), SlotBinding::Empty));
    }
}
