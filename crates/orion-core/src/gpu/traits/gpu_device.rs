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

use crate::gpu::{
    BufferDescriptor, BufferId, BufferRange, MapAccess, MapFlags, PipelineDescriptor, PipelineId,
    ProgramDescriptor, ProgramId, ResourceBinding, ResourceError, ResourceSetId,
    ResourceSetLayoutDescriptor, ResourceSetLayoutId, SamplerId, SamplerStateDescriptor,
    TextureDescriptor, TextureId, TextureRegion, TextureViewInfo,
};
use std::fmt::Debug;

/// A trait defining the low-level contract of a graphics backend.
///
/// This is the seam between the resource front-end (in `orion-core`) and a
/// concrete backend (in `orion-infra`). The front-end validates every
/// request before forwarding it, so implementations may assume valid
/// arguments and only report failures of the backend itself.
///
/// Resources are referred to by opaque ids minted by the backend. Every
/// id handed out by a `create_*` method is destroyed exactly once by the
/// matching `destroy_*` method.
pub trait GpuDevice: Send + Sync + Debug + 'static {
    /// Human-readable name of the backend.
    fn name(&self) -> &str;

    // --- Buffers ---

    /// Creates a buffer of `descriptor.size` bytes.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Destroys a buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Maps `range` of a buffer and returns its current contents, exactly
    /// `range.size` bytes long. Contents may be arbitrary when an
    /// invalidation flag is set.
    fn map_buffer(
        &self,
        id: BufferId,
        range: BufferRange,
        flags: MapFlags,
        access: MapAccess,
    ) -> Result<Vec<u8>, ResourceError>;

    /// Ends a mapping. `written` carries the new contents of the range when
    /// the mapping was created with write access.
    fn unmap_buffer(
        &self,
        id: BufferId,
        range: BufferRange,
        written: Option<&[u8]>,
    ) -> Result<(), ResourceError>;

    // --- Textures ---

    /// Creates a texture from a resolved descriptor.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Creates a view sharing the storage of `source`.
    fn create_texture_view(
        &self,
        source: TextureId,
        view: &TextureViewInfo,
    ) -> Result<TextureId, ResourceError>;

    /// Destroys a texture or texture view.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Uploads `data` to `region` of one mip level and layer.
    fn write_texture(
        &self,
        id: TextureId,
        region: &TextureRegion,
        mip: u32,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Regenerates mip levels 1.. from level 0.
    fn generate_mipmap(&self, id: TextureId) -> Result<(), ResourceError>;

    // --- Samplers ---

    /// Creates a sampler state object.
    fn create_sampler(
        &self,
        descriptor: &SamplerStateDescriptor,
    ) -> Result<SamplerId, ResourceError>;

    /// Destroys a sampler state object.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    // --- Programs ---

    /// Compiles a program. Compilation failures are reported as
    /// [`ResourceError::Program`].
    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ResourceError>;

    /// Destroys a program.
    fn destroy_program(&self, id: ProgramId) -> Result<(), ResourceError>;

    // --- Resource sets ---

    /// Creates a resource set layout.
    fn create_resource_set_layout(
        &self,
        descriptor: &ResourceSetLayoutDescriptor,
    ) -> Result<ResourceSetLayoutId, ResourceError>;

    /// Destroys a resource set layout.
    fn destroy_resource_set_layout(&self, id: ResourceSetLayoutId) -> Result<(), ResourceError>;

    /// Creates a resource set with every slot empty.
    fn create_resource_set(
        &self,
        layout: ResourceSetLayoutId,
    ) -> Result<ResourceSetId, ResourceError>;

    /// Replaces the binding of one slot.
    fn update_resource_set(
        &self,
        id: ResourceSetId,
        slot: usize,
        binding: &ResourceBinding,
    ) -> Result<(), ResourceError>;

    /// Destroys a resource set.
    fn destroy_resource_set(&self, id: ResourceSetId) -> Result<(), ResourceError>;

    // --- Pipelines ---

    /// Links a pipeline.
    fn create_pipeline(&self, descriptor: &PipelineDescriptor) -> Result<PipelineId, ResourceError>;

    /// Destroys a pipeline.
    fn destroy_pipeline(&self, id: PipelineId) -> Result<(), ResourceError>;
}
