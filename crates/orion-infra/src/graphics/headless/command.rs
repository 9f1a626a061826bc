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

use orion_core::gpu::{
    BufferId, DrawGeometry, GpuCommandList, GpuPipeline, GpuResourceSet, PipelineId, PrimitiveType,
    ResourceSetId,
};

/// One command captured by a [`RecordingCommandList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedCommand {
    /// A pipeline was bound.
    BindPipeline(PipelineId),
    /// A resource set was bound at `index`.
    BindResourceSet {
        /// Resource set index.
        index: usize,
        /// The bound set.
        set: ResourceSetId,
    },
    /// A draw was issued.
    Draw {
        /// Primitive topology.
        primitive: PrimitiveType,
        /// Vertex buffer read by the draw.
        vertex_buffer: BufferId,
        /// Number of vertices in the vertex buffer.
        vertex_count: u32,
        /// Index buffer, for indexed draws.
        index_buffer: Option<BufferId>,
        /// Number of indices drawn.
        index_count: u32,
    },
}

/// A [`GpuCommandList`] that records commands instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingCommandList {
    commands: Vec<RecordedCommand>,
}

impl RecordingCommandList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, in submission order.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Removes and returns the recorded commands.
    pub fn take(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of draws recorded.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, RecordedCommand::Draw { .. }))
            .count()
    }
}

impl GpuCommandList for RecordingCommandList {
    fn bind_pipeline(&mut self, pipeline: &GpuPipeline) {
        log::trace!("RecordingCommandList: bind pipeline {:?}", pipeline.id());
        self.commands.push(RecordedCommand::BindPipeline(pipeline.id()));
    }

    fn bind_resource_set(&mut self, index: usize, set: &GpuResourceSet) {
        self.commands.push(RecordedCommand::BindResourceSet { index, set: set.id() });
    }

    fn draw(&mut self, geometry: &DrawGeometry) {
        self.commands.push(RecordedCommand::Draw {
            primitive: geometry.primitive,
            vertex_buffer: geometry.vertex_buffer.id(),
            vertex_count: geometry.vertex_count,
            index_buffer: geometry.index_buffer.as_ref().map(|buffer| buffer.id()),
            index_count: geometry.index_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeadlessGpuDevice;
    use orion_core::gpu::{BufferDescriptor, BufferType, BufferUsage, GpuManager};
    use std::sync::Arc;

    #[test]
    fn draws_are_recorded_in_order() {
        let manager = GpuManager::new(Arc::new(HeadlessGpuDevice::new()));
        let vertices = manager.create_buffer(&BufferDescriptor {
            label: None,
            buffer_type: BufferType::Vertex,
            usage: BufferUsage::StaticDraw,
            size: 96,
        });
        let indices = manager.create_buffer(&BufferDescriptor {
            label: None,
            buffer_type: BufferType::Index,
            usage: BufferUsage::StaticDraw,
            size: 24,
        });

        let mut list = RecordingCommandList::new();
        list.draw(&DrawGeometry::non_indexed(PrimitiveType::LineList, vertices.clone(), 3));
        list.draw(&DrawGeometry::indexed(
            PrimitiveType::TriangleList,
            vertices.clone(),
            3,
            indices.clone(),
            6,
        ));

        assert_eq!(list.draw_count(), 2);
        assert_eq!(
            list.commands()[1],
            RecordedCommand::Draw {
                primitive: PrimitiveType::TriangleList,
                vertex_buffer: vertices.id(),
                vertex_count: 3,
                index_buffer: Some(indices.id()),
                index_count: 6,
            }
        );

        let taken = list.take();
        assert_eq!(taken.len(), 2);
        assert!(list.commands().is_empty());
    }
}
