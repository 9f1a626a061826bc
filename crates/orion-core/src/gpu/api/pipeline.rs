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

//! Render pipelines: a program per stage plus the layout of each resource
//! set the programs read.

use crate::check;
use crate::gpu::{
    GpuDevice, GpuProgram, GpuResourceSetLayout, ProgramId, ResourceSetLayoutId, ShaderStage,
};
use std::sync::Arc;

/// An opaque handle to a backend pipeline object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub usize);

/// A pipeline as handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Program per stage, indexed by [`ShaderStage::index`].
    pub programs: [Option<ProgramId>; ShaderStage::COUNT],
    /// Resource set layout per set number. `None` for unused sets.
    pub resource_layouts: Vec<Option<ResourceSetLayoutId>>,
}

/// A descriptor used to create a [`GpuPipeline`].
#[derive(Debug, Clone, Default)]
pub struct GpuPipelineDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Program per stage, indexed by [`ShaderStage::index`].
    pub programs: [Option<Arc<GpuProgram>>; ShaderStage::COUNT],
    /// Resource set layout per set number. `None` for unused sets.
    pub resource_layouts: Vec<Option<Arc<GpuResourceSetLayout>>>,
}

impl GpuPipelineDescriptor {
    /// Creates an empty descriptor.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    /// Sets the program of the stage `program` was compiled for.
    pub fn with_program(mut self, program: Arc<GpuProgram>) -> Self {
        let index = program.stage().index();
        self.programs[index] = Some(program);
        self
    }

    /// Sets the layout of resource set `set`.
    pub fn with_resource_layout(mut self, set: usize, layout: Arc<GpuResourceSetLayout>) -> Self {
        if self.resource_layouts.len() <= set {
            self.resource_layouts.resize(set + 1, None);
        }
        self.resource_layouts[set] = Some(layout);
        self
    }

    /// Checks that every stage has a program compiled for it.
    ///
    /// # Fatal errors
    /// * a stage is missing its program;
    /// * a program sits in the slot of another stage.
    pub fn validate(&self) {
        for stage in ShaderStage::ALL {
            match &self.programs[stage.index()] {
                Some(program) => check!(
                    program.stage() == stage,
                    "Program '{}' is a {} program, used as {} program",
                    program.name(),
                    program.stage(),
                    stage
                ),
                None => crate::fatal!("Pipeline has no {} program", stage),
            }
        }
    }

    pub(crate) fn to_backend(&self) -> PipelineDescriptor {
        PipelineDescriptor {
            label: self.label.clone(),
            programs: [
                self.programs[0].as_ref().map(|program| program.id()),
                self.programs[1].as_ref().map(|program| program.id()),
            ],
            resource_layouts: self
                .resource_layouts
                .iter()
                .map(|layout| layout.as_ref().map(|layout| layout.id()))
                .collect(),
        }
    }
}

/// A compiled pipeline. Keeps its programs and layouts alive.
#[derive(Debug)]
pub struct GpuPipeline {
    id: PipelineId,
    label: Option<String>,
    programs: [Option<Arc<GpuProgram>>; ShaderStage::COUNT],
    resource_layouts: Vec<Option<Arc<GpuResourceSetLayout>>>,
    device: Arc<dyn GpuDevice>,
}

impl GpuPipeline {
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        id: PipelineId,
        descriptor: GpuPipelineDescriptor,
    ) -> Self {
        Self {
            id,
            label: descriptor.label,
            programs: descriptor.programs,
            resource_layouts: descriptor.resource_layouts,
            device,
        }
    }

    /// Backend handle.
    pub fn id(&self) -> PipelineId {
        self.id
    }

    /// Debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Program of `stage`.
    pub fn program(&self, stage: ShaderStage) -> Option<&Arc<GpuProgram>> {
        self.programs[stage.index()].as_ref()
    }

    /// Layout of resource set `set`, if the pipeline uses it.
    pub fn resource_layout(&self, set: usize) -> Option<&Arc<GpuResourceSetLayout>> {
        self.resource_layouts.get(set).and_then(|layout| layout.as_ref())
    }
}

impl Drop for GpuPipeline {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_pipeline(self.id) {
            log::warn!("Failed to destroy pipeline {:?}: {}", self.id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::mock_manager;
    use crate::gpu::{resource_sets, ProgramDescriptor, ResourceSetLayoutDescriptor, ResourceType};

    fn program(
        manager: &crate::gpu::GpuManager,
        name: &str,
        stage: ShaderStage,
    ) -> Arc<GpuProgram> {
        manager
            .create_program(&ProgramDescriptor {
                name: name.to_string(),
                stage,
                source: b"void main() {}".to_vec(),
            })
            .expect("mock programs always compile")
    }

    #[test]
    fn programs_are_placed_by_stage() {
        let (_device, manager) = mock_manager();
        let vertex = program(&manager, "vs", ShaderStage::Vertex);
        let fragment = program(&manager, "fs", ShaderStage::Fragment);
        let layout = manager.create_resource_set_layout(ResourceSetLayoutDescriptor {
            slots: vec![ResourceType::UniformBuffer],
        });

        let pipeline = manager.create_pipeline(
            GpuPipelineDescriptor::new("test")
                .with_program(fragment.clone())
                .with_program(vertex.clone())
                .with_resource_layout(resource_sets::MATERIAL, layout.clone()),
        );

        assert!(Arc::ptr_eq(pipeline.program(ShaderStage::Vertex).unwrap(), &vertex));
        assert!(Arc::ptr_eq(pipeline.program(ShaderStage::Fragment).unwrap(), &fragment));
        assert!(pipeline.resource_layout(resource_sets::VIEW).is_none());
        assert!(Arc::ptr_eq(pipeline.resource_layout(resource_sets::MATERIAL).unwrap(), &layout));
        assert!(pipeline.resource_layout(resource_sets::ENTITY).is_none());
    }

    #[test]
    #[should_panic(expected = "Pipeline has no fragment program")]
    fn missing_fragment_program_is_fatal() {
        let (_device, manager) = mock_manager();
        let vertex = program(&manager, "vs", ShaderStage::Vertex);
        manager.create_pipeline(GpuPipelineDescriptor::new("test").with_program(vertex));
    }

    #[test]
    #[should_panic(expected = "Program 'fs' is a fragment program, used as vertex program")]
    fn misplaced_program_is_fatal() {
        let (_device, manager) = mock_manager();
        let fragment = program(&manager, "fs", ShaderStage::Fragment);
        let mut descriptor = GpuPipelineDescriptor::new("test").with_program(fragment.clone());
        descriptor.programs[ShaderStage::Vertex.index()] = Some(fragment);
        descriptor.validate();
    }
}
