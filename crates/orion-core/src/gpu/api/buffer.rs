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

//! Defines data structures related to GPU buffer resources.

use crate::gpu::GpuDevice;
use crate::{check, fatal, orion_bitflags};
use std::borrow::Cow;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Vertex attribute data.
    Vertex,
    /// Vertex indices.
    Index,
    /// Shader uniform data.
    Uniform,
}

/// Usage hint, combining the update frequency (stream, static, dynamic) with
/// the access pattern (draw, read, copy).
///
/// Backends use the hint to pick a memory placement; it does not restrict
/// what can be done with the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Modified once, used a few times, written by the CPU.
    StreamDraw,
    /// Modified once, used a few times, read back by the CPU.
    StreamRead,
    /// Modified once, used a few times, GPU to GPU.
    StreamCopy,
    /// Modified once, used many times, written by the CPU.
    #[default]
    StaticDraw,
    /// Modified once, used many times, read back by the CPU.
    StaticRead,
    /// Modified once, used many times, GPU to GPU.
    StaticCopy,
    /// Modified repeatedly, used many times, written by the CPU.
    DynamicDraw,
    /// Modified repeatedly, used many times, read back by the CPU.
    DynamicRead,
    /// Modified repeatedly, used many times, GPU to GPU.
    DynamicCopy,
}

orion_bitflags! {
    /// Behaviour flags for [`GpuBuffer::map`].
    pub struct MapFlags: u32 {
        /// The previous contents of the mapped range may be discarded.
        const INVALIDATE = 1 << 0;
        /// The previous contents of the whole buffer may be discarded.
        const INVALIDATE_BUFFER = 1 << 1;
    }
}

orion_bitflags! {
    /// CPU access requested by [`GpuBuffer::map`].
    pub struct MapAccess: u32 {
        /// The mapping will be read.
        const READ = 1 << 0;
        /// The mapping will be written and its contents flushed on unmap.
        const WRITE = 1 << 1;
    }
}

/// A descriptor used to create a [`GpuBuffer`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// What the buffer is bound as.
    pub buffer_type: BufferType,
    /// Usage hint.
    pub usage: BufferUsage,
    /// The total size of the buffer in bytes. Must be non-zero.
    pub size: u64,
}

/// An opaque handle to a backend buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// A byte range within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferRange {
    /// Start of the range in bytes.
    pub offset: u64,
    /// Length of the range in bytes.
    pub size: u64,
}

impl BufferRange {
    /// One past the last byte of the range.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// GPU-resident linear memory.
///
/// The type, usage and size are fixed at creation. Contents are modified
/// with [`write`](Self::write) or through a scoped [`map`](Self::map); at
/// most one mapping may be outstanding at a time. The backend object is
/// destroyed when the last reference is dropped.
#[derive(Debug)]
pub struct GpuBuffer {
    id: BufferId,
    label: Option<String>,
    buffer_type: BufferType,
    usage: BufferUsage,
    size: u64,
    mapped: AtomicBool,
    device: Arc<dyn GpuDevice>,
}

impl GpuBuffer {
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        id: BufferId,
        descriptor: &BufferDescriptor,
    ) -> Self {
        Self {
            id,
            label: descriptor.label.as_ref().map(|label| label.to_string()),
            buffer_type: descriptor.buffer_type,
            usage: descriptor.usage,
            size: descriptor.size,
            mapped: AtomicBool::new(false),
            device,
        }
    }

    /// Backend handle of this buffer.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Debug label given at creation.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// What the buffer is bound as.
    pub fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    /// Usage hint given at creation.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Total size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether a mapping is currently outstanding.
    pub fn is_mapped(&self) -> bool {
        self.mapped.load(Ordering::Acquire)
    }

    /// Writes `data` at `offset`.
    ///
    /// The range must lie within the buffer. The write goes through a scoped
    /// invalidating mapping which is released on every path out of this
    /// function.
    pub fn write(&self, offset: u64, data: &[u8]) {
        let size = data.len() as u64;
        check!(
            offset.checked_add(size).is_some_and(|end| end <= self.size),
            "Write outside buffer bounds (total: {}, offset: {}, size: {})",
            self.size,
            offset,
            size
        );

        if data.is_empty() {
            return;
        }

        let mut mapping = self.map(offset, size, MapFlags::INVALIDATE, MapAccess::WRITE);
        mapping.copy_from_slice(data);
        mapping.unmap();
    }

    /// Reads `size` bytes starting at `offset`.
    pub fn read(&self, offset: u64, size: u64) -> Vec<u8> {
        let mapping = self.map(offset, size, MapFlags::EMPTY, MapAccess::READ);
        let bytes = mapping.to_vec();
        mapping.unmap();
        bytes
    }

    /// Maps a range of the buffer into CPU memory.
    ///
    /// The returned guard dereferences to the mapped bytes. Dropping it (or
    /// calling [`BufferMapping::unmap`]) releases the mapping, flushing the
    /// contents back to the buffer when `access` includes
    /// [`MapAccess::WRITE`].
    ///
    /// An invalidating map covering the whole buffer is passed to the backend
    /// as [`MapFlags::INVALIDATE_BUFFER`] so it can skip partial-range
    /// synchronisation.
    ///
    /// # Fatal errors
    /// * the range lies outside the buffer;
    /// * both invalidation flags are given;
    /// * another mapping is outstanding.
    pub fn map(
        &self,
        offset: u64,
        size: u64,
        flags: MapFlags,
        access: MapAccess,
    ) -> BufferMapping<'_> {
        check!(
            offset.checked_add(size).is_some_and(|end| end <= self.size),
            "Map outside buffer bounds (total: {}, offset: {}, size: {})",
            self.size,
            offset,
            size
        );
        check!(!access.is_empty(), "Buffer map requested without any access");
        check!(
            !(flags.contains(MapFlags::INVALIDATE) && flags.contains(MapFlags::INVALIDATE_BUFFER)),
            "INVALIDATE and INVALIDATE_BUFFER map flags are mutually exclusive"
        );

        let mut flags = flags;
        if flags.contains(MapFlags::INVALIDATE) && offset == 0 && size == self.size {
            flags.remove(MapFlags::INVALIDATE);
            flags.insert(MapFlags::INVALIDATE_BUFFER);
        }

        if self.mapped.swap(true, Ordering::AcqRel) {
            fatal!("Cannot create multiple buffer mappings");
        }

        let range = BufferRange { offset, size };
        let data = match self.device.map_buffer(self.id, range, flags, access) {
            Ok(data) => data,
            Err(err) => {
                self.mapped.store(false, Ordering::Release);
                fatal!("Failed to map buffer {:?}: {}", self.id, err);
            }
        };

        let mapping = BufferMapping {
            buffer: self,
            range,
            access,
            data,
            released: false,
        };
        check!(
            mapping.data.len() as u64 == size,
            "Backend mapped {} bytes of buffer {:?}, expected {}",
            mapping.data.len(),
            self.id,
            size
        );
        mapping
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        if self.is_mapped() {
            log::error!("Buffer {:?} destroyed while mapped", self.id);
        }
        if let Err(err) = self.device.destroy_buffer(self.id) {
            log::warn!("Failed to destroy buffer {:?}: {}", self.id, err);
        }
    }
}

/// An outstanding mapping of a [`GpuBuffer`] range.
///
/// The mapping borrows its buffer, so the buffer cannot be destroyed while
/// it is mapped.
#[derive(Debug)]
pub struct BufferMapping<'a> {
    buffer: &'a GpuBuffer,
    range: BufferRange,
    access: MapAccess,
    data: Vec<u8>,
    released: bool,
}

impl BufferMapping<'_> {
    /// The mapped range.
    pub fn range(&self) -> BufferRange {
        self.range
    }

    /// The access the mapping was created with.
    pub fn access(&self) -> MapAccess {
        self.access
    }

    /// Releases the mapping.
    pub fn unmap(mut self) {
        if let Err(err) = self.release() {
            fatal!("Failed to unmap buffer {:?}: {}", self.buffer.id, err);
        }
    }

    fn release(&mut self) -> Result<(), crate::gpu::ResourceError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let written = if self.access.contains(MapAccess::WRITE) {
            Some(self.data.as_slice())
        } else {
            None
        };
        let result = self.buffer.device.unmap_buffer(self.buffer.id, self.range, written);
        self.buffer.mapped.store(false, Ordering::Release);
        result
    }
}

impl Deref for BufferMapping<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for BufferMapping<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for BufferMapping<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::error!("Failed to unmap buffer {:?}: {}", self.buffer.id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::mock_manager;

    fn uniform_buffer(size: u64) -> (Arc<crate::gpu::mock::MockDevice>, Arc<GpuBuffer>) {
        let (device, manager) = mock_manager();
        let buffer = manager.create_buffer(&BufferDescriptor {
            label: Some("test".into()),
            buffer_type: BufferType::Uniform,
            usage: BufferUsage::DynamicDraw,
            size,
        });
        (device, buffer)
    }

    #[test]
    fn write_then_read_back_returns_written_bytes() {
        let (_device, buffer) = uniform_buffer(64);
        let payload: Vec<u8> = (0u8..16).collect();

        buffer.write(24, &payload);

        assert_eq!(buffer.read(24, 16), payload);
        assert_eq!(buffer.read(0, 4), vec![0; 4]);
        assert!(!buffer.is_mapped());
    }

    #[test]
    fn write_filling_the_buffer_is_allowed() {
        let (_device, buffer) = uniform_buffer(8);
        buffer.write(0, &[7; 8]);
        assert_eq!(buffer.read(0, 8), vec![7; 8]);
    }

    #[test]
    #[should_panic(expected = "Write outside buffer bounds (total: 16, offset: 12, size: 8)")]
    fn write_past_the_end_is_fatal() {
        let (_device, buffer) = uniform_buffer(16);
        buffer.write(12, &[0; 8]);
    }

    #[test]
    #[should_panic(expected = "Cannot create multiple buffer mappings")]
    fn second_mapping_is_fatal() {
        let (_device, buffer) = uniform_buffer(16);
        let _first = buffer.map(0, 8, MapFlags::EMPTY, MapAccess::READ);
        let _second = buffer.map(8, 8, MapFlags::EMPTY, MapAccess::READ);
    }

    #[test]
    #[should_panic(expected = "Cannot create multiple buffer mappings")]
    fn write_while_mapped_is_fatal() {
        let (_device, buffer) = uniform_buffer(16);
        let _mapping = buffer.map(0, 16, MapFlags::EMPTY, MapAccess::READ);
        buffer.write(0, &[1; 4]);
    }

    #[test]
    #[should_panic(expected = "mutually exclusive")]
    fn conflicting_invalidate_flags_are_fatal() {
        let (_device, buffer) = uniform_buffer(16);
        let _mapping = buffer.map(
            0,
            4,
            MapFlags::INVALIDATE | MapFlags::INVALIDATE_BUFFER,
            MapAccess::WRITE,
        );
    }

    #[test]
    fn dropping_a_mapping_releases_it() {
        let (_device, buffer) = uniform_buffer(16);
        {
            let mut mapping = buffer.map(4, 4, MapFlags::EMPTY, MapAccess::WRITE);
            mapping.copy_from_slice(&[1, 2, 3, 4]);
            assert!(buffer.is_mapped());
        }
        assert!(!buffer.is_mapped());
        assert_eq!(buffer.read(4, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn full_range_invalidate_is_normalised() {
        let (device, buffer) = uniform_buffer(32);

        buffer.write(0, &[0xAB; 32]);
        assert_eq!(device.last_map_flags(), Some(MapFlags::INVALIDATE_BUFFER));

        buffer.write(8, &[0xCD; 8]);
        assert_eq!(device.last_map_flags(), Some(MapFlags::INVALIDATE));
    }

    #[test]
    fn read_only_mapping_does_not_write_back() {
        let (_device, buffer) = uniform_buffer(8);
        buffer.write(0, &[5; 8]);
        {
            let mut mapping = buffer.map(0, 8, MapFlags::EMPTY, MapAccess::READ);
            mapping[0] = 9;
        }
        assert_eq!(buffer.read(0, 1), vec![5]);
    }

    #[test]
    fn dropping_the_buffer_destroys_the_backend_object() {
        let (device, buffer) = uniform_buffer(8);
        assert_eq!(device.live_buffers(), 1);
        drop(buffer);
        assert_eq!(device.live_buffers(), 0);
    }
}
