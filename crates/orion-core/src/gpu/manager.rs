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

//! The factory for every GPU resource.

use crate::gpu::{
    BufferDescriptor, GpuBuffer, GpuDevice, GpuPipeline, GpuPipelineDescriptor, GpuProgram,
    GpuResourceSet, GpuResourceSetLayout, GpuSamplerState, GpuTexture, ProgramDescriptor,
    ResourceError, ResourceSetLayoutDescriptor, SamplerStateDescriptor, TextureDescriptor,
    TextureViewDescriptor,
};
use crate::utils::sync::lock;
use crate::{check, fatal};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Validating front-end over a [`GpuDevice`].
///
/// Every request is checked before it reaches the backend. Backend
/// failures on creation are fatal, with the exception of program
/// compilation which is reported to the caller.
///
/// Sampler states are immutable and cached: equal descriptors return the
/// same shared object for as long as the manager lives.
#[derive(Debug)]
pub struct GpuManager {
    device: Arc<dyn GpuDevice>,
    samplers: Mutex<HashMap<SamplerStateDescriptor, Arc<GpuSamplerState>>>,
}

impl GpuManager {
    /// Creates a manager over `device`.
    pub fn new(device: Arc<dyn GpuDevice>) -> Self {
        log::info!("GPU manager created for backend '{}'", device.name());
        Self {
            device,
            samplers: Mutex::new(HashMap::new()),
        }
    }

    /// The backend device.
    pub fn device(&self) -> &Arc<dyn GpuDevice> {
        &self.device
    }

    /// Creates a buffer.
    ///
    /// # Fatal errors
    /// * `descriptor.size` is zero.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Arc<GpuBuffer> {
        check!(descriptor.size > 0, "Buffer size must be non-zero");
        let id = created("buffer", self.device.create_buffer(descriptor));
        log::trace!(
            "Created {:?} buffer {:?} ({} bytes, {:?})",
            descriptor.buffer_type,
            id,
            descriptor.size,
            descriptor.usage
        );
        Arc::new(GpuBuffer::new(self.device.clone(), id, descriptor))
    }

    /// Creates a texture. Depth and mip count are resolved first, see
    /// [`TextureDescriptor::resolve`].
    pub fn create_texture(&self, descriptor: &TextureDescriptor) -> Arc<GpuTexture> {
        let resolved = descriptor.resolve();
        let id = created("texture", self.device.create_texture(&resolved));
        log::trace!(
            "Created {:?} texture {:?} ({}x{}x{}, {} mips, {:?})",
            resolved.texture_type,
            id,
            resolved.width,
            resolved.height,
            resolved.depth,
            resolved.mips,
            resolved.format
        );
        Arc::new(GpuTexture::new(self.device.clone(), id, &resolved))
    }

    /// Creates a view over a range of `source`.
    pub fn create_texture_view(
        &self,
        source: &Arc<GpuTexture>,
        descriptor: &TextureViewDescriptor,
    ) -> Arc<GpuTexture> {
        let view = descriptor.resolve(source);
        let id = created("texture view", self.device.create_texture_view(source.id(), &view));
        Arc::new(GpuTexture::new_view(self.device.clone(), id, source, &view))
    }

    /// Returns the sampler state for `descriptor`, creating it on first use.
    pub fn sampler_state(&self, descriptor: &SamplerStateDescriptor) -> Arc<GpuSamplerState> {
        let mut samplers = lock(&self.samplers);
        if let Some(sampler) = samplers.get(descriptor) {
            return sampler.clone();
        }

        let id = created("sampler", self.device.create_sampler(descriptor));
        log::debug!("Created sampler {:?} for {:?}", id, descriptor);
        let sampler = Arc::new(GpuSamplerState::new(self.device.clone(), id, *descriptor));
        samplers.insert(*descriptor, sampler.clone());
        sampler
    }

    /// Number of distinct sampler states created so far.
    pub fn sampler_count(&self) -> usize {
        lock(&self.samplers).len()
    }

    /// Compiles a program.
    ///
    /// # Errors
    /// Returns the backend error if the program fails to compile.
    pub fn create_program(
        &self,
        descriptor: &ProgramDescriptor,
    ) -> Result<Arc<GpuProgram>, ResourceError> {
        let id = self.device.create_program(descriptor)?;
        log::debug!("Compiled {} program '{}'", descriptor.stage, descriptor.name);
        Ok(Arc::new(GpuProgram::new(self.device.clone(), id, descriptor)))
    }

    /// Links a pipeline.
    ///
    /// # Fatal errors
    /// See [`GpuPipelineDescriptor::validate`].
    pub fn create_pipeline(&self, descriptor: GpuPipelineDescriptor) -> Arc<GpuPipeline> {
        descriptor.validate();
        let id = created("pipeline", self.device.create_pipeline(&descriptor.to_backend()));
        Arc::new(GpuPipeline::new(self.device.clone(), id, descriptor))
    }

    /// Creates a resource set layout.
    pub fn create_resource_set_layout(
        &self,
        descriptor: ResourceSetLayoutDescriptor,
    ) -> Arc<GpuResourceSetLayout> {
        let id = created(
            "resource set layout",
            self.device.create_resource_set_layout(&descriptor),
        );
        Arc::new(GpuResourceSetLayout::new(self.device.clone(), id, descriptor))
    }

    /// Creates a resource set following `layout`, with every slot empty.
    pub fn create_resource_set(&self, layout: &Arc<GpuResourceSetLayout>) -> GpuResourceSet {
        let id = created("resource set", self.device.create_resource_set(layout.id()));
        GpuResourceSet::new(self.device.clone(), id, layout.clone())
    }
}

fn created<T>(what: &str, result: Result<T, ResourceError>) -> T {
    match result {
        Ok(id) => id,
        Err(err) => fatal!("Failed to create {}: {}", what, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::mock_manager;
    use crate::gpu::{BufferType, BufferUsage, SamplerAddressMode, SamplerFilterMode, ShaderStage};

    #[test]
    fn equal_sampler_descriptors_share_one_object() {
        let (_device, manager) = mock_manager();
        let descriptor = SamplerStateDescriptor {
            filter_mode: SamplerFilterMode::Anisotropic,
            max_anisotropy: 8,
            ..Default::default()
        };

        let first = manager.sampler_state(&descriptor);
        let second = manager.sampler_state(&descriptor);
        let wrapped =
            manager.sampler_state(&descriptor.with_address_mode(SamplerAddressMode::Wrap));

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &wrapped));
        assert_eq!(manager.sampler_count(), 2);
    }

    #[test]
    #[should_panic(expected = "Buffer size must be non-zero")]
    fn zero_sized_buffer_is_fatal() {
        let (_device, manager) = mock_manager();
        manager.create_buffer(&BufferDescriptor {
            label: None,
            buffer_type: BufferType::Vertex,
            usage: BufferUsage::StaticDraw,
            size: 0,
        });
    }

    #[test]
    fn program_compile_errors_are_returned() {
        let (_device, manager) = mock_manager();
        let result = manager.create_program(&ProgramDescriptor {
            name: "broken".to_string(),
            stage: ShaderStage::Vertex,
            source: b"#error broken".to_vec(),
        });
        assert!(matches!(result, Err(ResourceError::Program(err)) if err.name == "broken"));
    }
}
