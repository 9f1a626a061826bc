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

//! In-memory device for unit tests.

use crate::gpu::*;
use crate::utils::sync::lock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub(crate) struct MockDevice {
    next_id: AtomicUsize,
    buffers: Mutex<HashMap<usize, Vec<u8>>>,
    last_map_flags: Mutex<Option<MapFlags>>,
    buffer_writes: AtomicUsize,
    texture_writes: AtomicUsize,
    mipmaps_generated: AtomicUsize,
    slot_updates: Mutex<HashMap<ResourceSetId, usize>>,
}

impl MockDevice {
    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn live_buffers(&self) -> usize {
        lock(&self.buffers).len()
    }

    pub(crate) fn last_map_flags(&self) -> Option<MapFlags> {
        *lock(&self.last_map_flags)
    }

    /// Unmaps that wrote data back into a buffer.
    pub(crate) fn buffer_writes(&self) -> usize {
        self.buffer_writes.load(Ordering::Relaxed)
    }

    pub(crate) fn texture_writes(&self) -> usize {
        self.texture_writes.load(Ordering::Relaxed)
    }

    pub(crate) fn mipmaps_generated(&self) -> usize {
        self.mipmaps_generated.load(Ordering::Relaxed)
    }

    pub(crate) fn slot_updates(&self, set: ResourceSetId) -> usize {
        lock(&self.slot_updates).get(&set).copied().unwrap_or(0)
    }
}

impl GpuDevice for MockDevice {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = self.next();
        lock(&self.buffers).insert(id, vec![0; descriptor.size as usize]);
        Ok(BufferId(id))
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        lock(&self.buffers).remove(&id.0).map(|_| ()).ok_or(ResourceError::InvalidHandle)
    }

    fn map_buffer(
        &self,
        id: BufferId,
        range: BufferRange,
        flags: MapFlags,
        _access: MapAccess,
    ) -> Result<Vec<u8>, ResourceError> {
        *lock(&self.last_map_flags) = Some(flags);
        let buffers = lock(&self.buffers);
        let data = buffers.get(&id.0).ok_or(ResourceError::InvalidHandle)?;
        data.get(range.offset as usize..range.end() as usize)
            .map(<[u8]>::to_vec)
            .ok_or(ResourceError::OutOfBounds)
    }

    fn unmap_buffer(
        &self,
        id: BufferId,
        range: BufferRange,
        written: Option<&[u8]>,
    ) -> Result<(), ResourceError> {
        let mut buffers = lock(&self.buffers);
        let data = buffers.get_mut(&id.0).ok_or(ResourceError::InvalidHandle)?;
        if let Some(written) = written {
            self.buffer_writes.fetch_add(1, Ordering::Relaxed);
            data[range.offset as usize..range.end() as usize].copy_from_slice(written);
        }
        Ok(())
    }

    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        Ok(TextureId(self.next()))
    }

    fn create_texture_view(
        &self,
        _source: TextureId,
        _view: &TextureViewInfo,
    ) -> Result<TextureId, ResourceError> {
        Ok(TextureId(self.next()))
    }

    fn destroy_texture(&self, _id: TextureId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn write_texture(
        &self,
        _id: TextureId,
        _region: &TextureRegion,
        _mip: u32,
        _layer: u32,
        _data: &[u8],
    ) -> Result<(), ResourceError> {
        self.texture_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn generate_mipmap(&self, _id: TextureId) -> Result<(), ResourceError> {
        self.mipmaps_generated.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn create_sampler(
        &self,
        _descriptor: &SamplerStateDescriptor,
    ) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.next()))
    }

    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ResourceError> {
        if descriptor.source.windows(6).any(|line| line == b"#error") {
            return Err(ProgramError {
                name: descriptor.name.clone(),
                details: "forced failure".to_string(),
            }
            .into());
        }
        Ok(ProgramId(self.next()))
    }

    fn destroy_program(&self, _id: ProgramId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_resource_set_layout(
        &self,
        _descriptor: &ResourceSetLayoutDescriptor,
    ) -> Result<ResourceSetLayoutId, ResourceError> {
        Ok(ResourceSetLayoutId(self.next()))
    }

    fn destroy_resource_set_layout(&self, _id: ResourceSetLayoutId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_resource_set(
        &self,
        _layout: ResourceSetLayoutId,
    ) -> Result<ResourceSetId, ResourceError> {
        Ok(ResourceSetId(self.next()))
    }

    fn update_resource_set(
        &self,
        id: ResourceSetId,
        _slot: usize,
        _binding: &ResourceBinding,
    ) -> Result<(), ResourceError> {
        *lock(&self.slot_updates).entry(id).or_default() += 1;
        Ok(())
    }

    fn destroy_resource_set(&self, _id: ResourceSetId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_pipeline(
        &self,
        _descriptor: &PipelineDescriptor,
    ) -> Result<PipelineId, ResourceError> {
        Ok(PipelineId(self.next()))
    }

    fn destroy_pipeline(&self, _id: PipelineId) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// A manager over a fresh [`MockDevice`], with the device kept for
/// inspection.
pub(crate) fn mock_manager() -> (Arc<MockDevice>, GpuManager) {
    let device = Arc::new(MockDevice::default());
    let manager = GpuManager::new(device.clone());
    (device, manager)
}
