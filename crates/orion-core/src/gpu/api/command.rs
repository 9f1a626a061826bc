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

//! Geometry submitted to a [`GpuCommandList`](crate::gpu::GpuCommandList).

use crate::check;
use crate::gpu::{BufferType, GpuBuffer};
use std::sync::Arc;

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Each vertex after the second forms a triangle with the previous two.
    TriangleStrip,
    /// Every two vertices form a line.
    LineList,
    /// Each vertex is a point.
    PointList,
}

/// Buffers and counts for one draw.
#[derive(Debug, Clone)]
pub struct DrawGeometry {
    /// Primitive assembly mode.
    pub primitive: PrimitiveType,
    /// Vertex data.
    pub vertex_buffer: Arc<GpuBuffer>,
    /// Number of vertices in `vertex_buffer`.
    pub vertex_count: u32,
    /// Index data, for indexed draws.
    pub index_buffer: Option<Arc<GpuBuffer>>,
    /// Number of indices in `index_buffer`.
    pub index_count: u32,
}

impl DrawGeometry {
    /// Geometry drawn straight from the vertex buffer.
    pub fn non_indexed(
        primitive: PrimitiveType,
        vertex_buffer: Arc<GpuBuffer>,
        vertex_count: u32,
    ) -> Self {
        check!(
            vertex_buffer.buffer_type() == BufferType::Vertex,
            "Draw vertex buffer has type {:?}",
            vertex_buffer.buffer_type()
        );
        Self {
            primitive,
            vertex_buffer,
            vertex_count,
            index_buffer: None,
            index_count: 0,
        }
    }

    /// Geometry drawn through 32-bit indices.
    pub fn indexed(
        primitive: PrimitiveType,
        vertex_buffer: Arc<GpuBuffer>,
        vertex_count: u32,
        index_buffer: Arc<GpuBuffer>,
        index_count: u32,
    ) -> Self {
        check!(
            index_buffer.buffer_type() == BufferType::Index,
            "Draw index buffer has type {:?}",
            index_buffer.buffer_type()
        );
        Self {
            index_buffer: Some(index_buffer),
            index_count,
            ..Self::non_indexed(primitive, vertex_buffer, vertex_count)
        }
    }

    /// Whether the draw goes through an index buffer.
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }
}
