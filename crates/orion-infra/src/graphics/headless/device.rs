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

use super::storage::TextureStorage;
use orion_core::gpu::{
    BufferDescriptor, BufferId, BufferRange, GpuDevice, MapAccess, MapFlags, PipelineDescriptor,
    PipelineId, ProgramDescriptor, ProgramError, ProgramId, ResourceBinding, ResourceError,
    ResourceSetId, ResourceSetLayoutDescriptor, ResourceSetLayoutId, ResourceType, SamplerId,
    SamplerStateDescriptor, ShaderStage, TextureDescriptor, TextureId, TextureRegion,
    TextureViewInfo,
};
use orion_core::utils::sync::lock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug)]
struct BufferEntry {
    data: Vec<u8>,
    mapping: Option<BufferRange>,
}

#[derive(Debug)]
enum TextureEntry {
    Image(TextureStorage),
    View { source: TextureId, info: TextureViewInfo },
}

#[derive(Debug)]
struct ProgramEntry {
    stage: ShaderStage,
    source: String,
}

#[derive(Debug)]
struct ResourceSetEntry {
    layout: ResourceSetLayoutId,
    bindings: Vec<ResourceBinding>,
    updates: usize,
}

/// Number of objects of each kind currently alive on a [`HeadlessGpuDevice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveObjects {
    /// Buffers.
    pub buffers: usize,
    /// Textures, views excluded.
    pub textures: usize,
    /// Texture views.
    pub texture_views: usize,
    /// Sampler states.
    pub samplers: usize,
    /// Programs.
    pub programs: usize,
    /// Resource set layouts.
    pub resource_set_layouts: usize,
    /// Resource sets.
    pub resource_sets: usize,
    /// Pipelines.
    pub pipelines: usize,
}

impl LiveObjects {
    /// Total number of live objects.
    pub fn total(&self) -> usize {
        self.buffers
            + self.textures
            + self.texture_views
            + self.samplers
            + self.programs
            + self.resource_set_layouts
            + self.resource_sets
            + self.pipelines
    }
}

/// A [`GpuDevice`] that keeps every resource in CPU memory.
///
/// It runs without a window or driver, which makes it the backend of tools
/// and tests. Programs go through a light syntactic check instead of a real
/// compiler: the source must be UTF-8, open with a `#version` directive,
/// contain a `void main` entry point and no `#error` directive. Everything
/// created can be inspected afterwards.
#[derive(Debug, Default)]
pub struct HeadlessGpuDevice {
    buffers: Mutex<HashMap<BufferId, BufferEntry>>,
    textures: Mutex<HashMap<TextureId, TextureEntry>>,
    samplers: Mutex<HashMap<SamplerId, SamplerStateDescriptor>>,
    programs: Mutex<HashMap<ProgramId, ProgramEntry>>,
    layouts: Mutex<HashMap<ResourceSetLayoutId, ResourceSetLayoutDescriptor>>,
    resource_sets: Mutex<HashMap<ResourceSetId, ResourceSetEntry>>,
    pipelines: Mutex<HashMap<PipelineId, PipelineDescriptor>>,

    next_buffer_id: AtomicUsize,
    next_texture_id: AtomicUsize,
    next_sampler_id: AtomicUsize,
    next_program_id: AtomicUsize,
    next_layout_id: AtomicUsize,
    next_resource_set_id: AtomicUsize,
    next_pipeline_id: AtomicUsize,

    last_map_flags: Mutex<Option<MapFlags>>,

    // Memory tracking
    allocated_bytes: AtomicUsize,
    peak_allocated_bytes: AtomicU64,
}

impl HeadlessGpuDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently held by buffers and textures.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Highest value [`allocated_bytes`](Self::allocated_bytes) has reached.
    pub fn peak_allocated_bytes(&self) -> u64 {
        self.peak_allocated_bytes.load(Ordering::Relaxed)
    }

    /// Counts of live objects per kind.
    pub fn live_objects(&self) -> LiveObjects {
        let textures = lock(&self.textures);
        let views = textures
            .values()
            .filter(|entry| matches!(entry, TextureEntry::View { .. }))
            .count();
        LiveObjects {
            buffers: lock(&self.buffers).len(),
            textures: textures.len() - views,
            texture_views: views,
            samplers: lock(&self.samplers).len(),
            programs: lock(&self.programs).len(),
            resource_set_layouts: lock(&self.layouts).len(),
            resource_sets: lock(&self.resource_sets).len(),
            pipelines: lock(&self.pipelines).len(),
        }
    }

    /// Current contents of a buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        lock(&self.buffers).get(&id).map(|entry| entry.data.clone())
    }

    /// Flags of the most recent buffer mapping.
    pub fn last_map_flags(&self) -> Option<MapFlags> {
        *lock(&self.last_map_flags)
    }

    /// Contents of one mip level and layer of a texture. For a view, `mip`
    /// and `layer` are relative to the view.
    pub fn texture_level(&self, id: TextureId, mip: u32, layer: u32) -> Option<Vec<u8>> {
        let textures = lock(&self.textures);
        match textures.get(&id)? {
            TextureEntry::Image(storage) => storage.level(mip, layer).map(<[u8]>::to_vec),
            TextureEntry::View { source, info } => {
                if mip >= info.mips || layer >= info.layers {
                    return None;
                }
                match textures.get(source)? {
                    TextureEntry::Image(storage) => storage
                        .level(info.base_mip + mip, info.base_layer + layer)
                        .map(<[u8]>::to_vec),
                    TextureEntry::View { .. } => None,
                }
            }
        }
    }

    /// The source text a program was compiled from.
    pub fn program_source(&self, id: ProgramId) -> Option<String> {
        lock(&self.programs).get(&id).map(|entry| entry.source.clone())
    }

    /// The binding of one slot of a resource set.
    pub fn resource_set_binding(&self, id: ResourceSetId, slot: usize) -> Option<ResourceBinding> {
        lock(&self.resource_sets)
            .get(&id)
            .and_then(|entry| entry.bindings.get(slot).copied())
    }

    /// Number of slot updates a resource set has received.
    pub fn resource_set_updates(&self, id: ResourceSetId) -> Option<usize> {
        lock(&self.resource_sets).get(&id).map(|entry| entry.updates)
    }

    /// The descriptor a pipeline was linked from.
    pub fn pipeline_descriptor(&self, id: PipelineId) -> Option<PipelineDescriptor> {
        lock(&self.pipelines).get(&id).cloned()
    }

    fn track_allocation(&self, bytes: usize) {
        let current = self.allocated_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak_allocated_bytes.fetch_max(current as u64, Ordering::Relaxed);
    }

    fn track_release(&self, bytes: usize) {
        self.allocated_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    fn image_mut<'a>(
        textures: &'a mut HashMap<TextureId, TextureEntry>,
        id: TextureId,
    ) -> Result<&'a mut TextureStorage, ResourceError> {
        match textures.get_mut(&id) {
            Some(TextureEntry::Image(storage)) => Ok(storage),
            Some(TextureEntry::View { .. }) => Err(ResourceError::Unsupported(
                "writing texture data through a view".to_string(),
            )),
            None => Err(ResourceError::InvalidHandle),
        }
    }
}

/// Checks that `source` looks like a complete GLSL stage.
fn check_program_source(name: &str, source: &[u8]) -> Result<String, ProgramError> {
    let failure = |details: String| ProgramError {
        name: name.to_string(),
        details,
    };

    let text = std::str::from_utf8(source)
        .map_err(|err| failure(format!("source is not UTF-8: {}", err)))?;

    let first = text.lines().map(str::trim).find(|line| !line.is_empty());
    if !first.is_some_and(|line| line.starts_with("#version")) {
        return Err(failure("missing #version directive on the first line".to_string()));
    }

    for (number, line) in text.lines().enumerate() {
        if let Some(message) = line.trim().strip_prefix("#error") {
            return Err(failure(format!("{}: #error{}", number + 1, message)));
        }
    }

    if !text.contains("void main") {
        return Err(failure("no entry point 'void main' found".to_string()));
    }
    Ok(text.to_string())
}

impl GpuDevice for HeadlessGpuDevice {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        let size = descriptor.size as usize;
        lock(&self.buffers).insert(
            id,
            BufferEntry {
                data: vec![0; size],
                mapping: None,
            },
        );
        self.track_allocation(size);
        log::debug!(
            "HeadlessGpuDevice: Created {:?} buffer {:?} ({} bytes)",
            descriptor.buffer_type,
            id,
            size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = lock(&self.buffers).remove(&id).ok_or(ResourceError::InvalidHandle)?;
        if entry.mapping.is_some() {
            log::warn!("HeadlessGpuDevice: Buffer {:?} destroyed while mapped", id);
        }
        self.track_release(entry.data.len());
        log::debug!("HeadlessGpuDevice: Destroyed buffer {:?}", id);
        Ok(())
    }

    fn map_buffer(
        &self,
        id: BufferId,
        range: BufferRange,
        flags: MapFlags,
        _access: MapAccess,
    ) -> Result<Vec<u8>, ResourceError> {
        *lock(&self.last_map_flags) = Some(flags);

        let mut buffers = lock(&self.buffers);
        let entry = buffers.get_mut(&id).ok_or(ResourceError::InvalidHandle)?;
        if entry.mapping.is_some() {
            return Err(ResourceError::BackendError(format!("buffer {:?} is already mapped", id)));
        }
        if range.end() > entry.data.len() as u64 {
            return Err(ResourceError::OutOfBounds);
        }

        if flags.contains(MapFlags::INVALIDATE_BUFFER) {
            entry.data.fill(0);
        }
        let start = range.offset as usize;
        let end = range.end() as usize;
        let contents = if flags.contains(MapFlags::INVALIDATE) {
            vec![0; end - start]
        } else {
            entry.data[start..end].to_vec()
        };
        entry.mapping = Some(range);
        Ok(contents)
    }

    fn unmap_buffer(
        &self,
        id: BufferId,
        range: BufferRange,
        written: Option<&[u8]>,
    ) -> Result<(), ResourceError> {
        let mut buffers = lock(&self.buffers);
        let entry = buffers.get_mut(&id).ok_or(ResourceError::InvalidHandle)?;
        match entry.mapping.take() {
            Some(mapped) if mapped == range => {}
            Some(mapped) => {
                entry.mapping = Some(mapped);
                return Err(ResourceError::BackendError(format!(
                    "unmap range {:?} does not match mapped range {:?}",
                    range, mapped
                )));
            }
            None => {
                return Err(ResourceError::BackendError(format!(
                    "buffer {:?} is not mapped",
                    id
                )))
            }
        }

        if let Some(written) = written {
            if written.len() as u64 != range.size {
                return Err(ResourceError::OutOfBounds);
            }
            entry.data[range.offset as usize..range.end() as usize].copy_from_slice(written);
        }
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let storage = TextureStorage::new(descriptor);
        let size = storage.byte_size();
        let id = TextureId(self.next_texture_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.textures).insert(id, TextureEntry::Image(storage));
        self.track_allocation(size);
        log::debug!(
            "HeadlessGpuDevice: Created texture {:?} ({}x{}, {} mips, {} bytes)",
            id,
            descriptor.width,
            descriptor.height,
            descriptor.mips,
            size
        );
        Ok(id)
    }

    fn create_texture_view(
        &self,
        source: TextureId,
        view: &TextureViewInfo,
    ) -> Result<TextureId, ResourceError> {
        let mut textures = lock(&self.textures);
        match textures.get(&source) {
            Some(TextureEntry::Image(_)) => {}
            Some(TextureEntry::View { .. }) => {
                return Err(ResourceError::Unsupported("views of texture views".to_string()))
            }
            None => return Err(ResourceError::InvalidHandle),
        }
        let id = TextureId(self.next_texture_id.fetch_add(1, Ordering::Relaxed));
        textures.insert(id, TextureEntry::View { source, info: *view });
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = lock(&self.textures).remove(&id).ok_or(ResourceError::InvalidHandle)?;
        if let TextureEntry::Image(storage) = entry {
            self.track_release(storage.byte_size());
        }
        log::debug!("HeadlessGpuDevice: Destroyed texture {:?}", id);
        Ok(())
    }

    fn write_texture(
        &self,
        id: TextureId,
        region: &TextureRegion,
        mip: u32,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let mut textures = lock(&self.textures);
        Self::image_mut(&mut textures, id)?.write(region, mip, layer, data)
    }

    fn generate_mipmap(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut textures = lock(&self.textures);
        Self::image_mut(&mut textures, id)?.generate_mipmap()
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerStateDescriptor,
    ) -> Result<SamplerId, ResourceError> {
        let id = SamplerId(self.next_sampler_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.samplers).insert(id, *descriptor);
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        lock(&self.samplers)
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ResourceError> {
        let source = check_program_source(&descriptor.name, &descriptor.source)?;
        let id = ProgramId(self.next_program_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.programs).insert(
            id,
            ProgramEntry {
                stage: descriptor.stage,
                source,
            },
        );
        log::debug!(
            "HeadlessGpuDevice: Compiled {} program '{}' as {:?}",
            descriptor.stage.name(),
            descriptor.name,
            id
        );
        Ok(id)
    }

    fn destroy_program(&self, id: ProgramId) -> Result<(), ResourceError> {
        lock(&self.programs)
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_resource_set_layout(
        &self,
        descriptor: &ResourceSetLayoutDescriptor,
    ) -> Result<ResourceSetLayoutId, ResourceError> {
        let id = ResourceSetLayoutId(self.next_layout_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.layouts).insert(id, descriptor.clone());
        Ok(id)
    }

    fn destroy_resource_set_layout(&self, id: ResourceSetLayoutId) -> Result<(), ResourceError> {
        lock(&self.layouts)
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_resource_set(
        &self,
        layout: ResourceSetLayoutId,
    ) -> Result<ResourceSetId, ResourceError> {
        let slots = lock(&self.layouts)
            .get(&layout)
            .map(|descriptor| descriptor.slots.len())
            .ok_or(ResourceError::InvalidHandle)?;
        let id = ResourceSetId(self.next_resource_set_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.resource_sets).insert(
            id,
            ResourceSetEntry {
                layout,
                bindings: vec![ResourceBinding::None; slots],
                updates: 0,
            },
        );
        Ok(id)
    }

    fn update_resource_set(
        &self,
        id: ResourceSetId,
        slot: usize,
        binding: &ResourceBinding,
    ) -> Result<(), ResourceError> {
        let mut sets = lock(&self.resource_sets);
        let entry = sets.get_mut(&id).ok_or(ResourceError::InvalidHandle)?;
        let slot_type = lock(&self.layouts)
            .get(&entry.layout)
            .ok_or(ResourceError::InvalidHandle)?
            .slots
            .get(slot)
            .copied()
            .ok_or(ResourceError::OutOfBounds)?;

        match *binding {
            ResourceBinding::None => {}
            ResourceBinding::UniformBuffer(buffer) => {
                if slot_type != ResourceType::UniformBuffer {
                    return Err(ResourceError::BackendError(format!(
                        "slot {} of resource set {:?} holds {:?}, not a uniform buffer",
                        slot, id, slot_type
                    )));
                }
                if !lock(&self.buffers).contains_key(&buffer) {
                    return Err(ResourceError::InvalidHandle);
                }
            }
            ResourceBinding::Texture { texture, sampler } => {
                if slot_type != ResourceType::Texture {
                    return Err(ResourceError::BackendError(format!(
                        "slot {} of resource set {:?} holds {:?}, not a texture",
                        slot, id, slot_type
                    )));
                }
                if !lock(&self.textures).contains_key(&texture)
                    || !lock(&self.samplers).contains_key(&sampler)
                {
                    return Err(ResourceError::InvalidHandle);
                }
            }
        }

        entry.bindings[slot] = *binding;
        entry.updates += 1;
        Ok(())
    }

    fn destroy_resource_set(&self, id: ResourceSetId) -> Result<(), ResourceError> {
        lock(&self.resource_sets)
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_pipeline(
        &self,
        descriptor: &PipelineDescriptor,
    ) -> Result<PipelineId, ResourceError> {
        {
            let programs = lock(&self.programs);
            for (index, program) in descriptor.programs.iter().enumerate() {
                let Some(program) = program else { continue };
                let entry = programs.get(program).ok_or(ResourceError::InvalidHandle)?;
                if entry.stage.index() != index {
                    return Err(ResourceError::BackendError(format!(
                        "{} program {:?} linked into stage slot {}",
                        entry.stage.name(),
                        program,
                        index
                    )));
                }
            }
        }
        {
            let layouts = lock(&self.layouts);
            if descriptor
                .resource_layouts
                .iter()
                .flatten()
                .any(|layout| !layouts.contains_key(layout))
            {
                return Err(ResourceError::InvalidHandle);
            }
        }

        let id = PipelineId(self.next_pipeline_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.pipelines).insert(id, descriptor.clone());
        log::debug!(
            "HeadlessGpuDevice: Linked pipeline {:?} '{}'",
            id,
            descriptor.label.as_deref().unwrap_or("unlabelled")
        );
        Ok(id)
    }

    fn destroy_pipeline(&self, id: PipelineId) -> Result<(), ResourceError> {
        lock(&self.pipelines)
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }
}
