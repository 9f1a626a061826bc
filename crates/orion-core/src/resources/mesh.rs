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

use crate::asset::Asset;
use crate::check;
use crate::gpu::{
    BufferDescriptor, BufferType, BufferUsage, DrawGeometry, GpuBuffer, GpuManager, PrimitiveType,
};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::sync::Arc;

/// Interleaved vertex layout of every mesh.
///
/// Attribute locations are given by
/// [`vertex_attributes`](crate::shading::vertex_attributes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub texcoord: [f32; 2],
}

/// Axis-aligned bounds of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Bounds of `points`, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |bounds, point| Self {
            min: bounds.min.min(point),
            max: bounds.max.max(point),
        }))
    }

    /// Centre point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Size along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A range of a mesh drawn with one material.
#[derive(Debug, Clone)]
pub struct SubMesh {
    geometry: DrawGeometry,
    material: usize,
}

impl SubMesh {
    /// Indexed geometry over the mesh's shared vertex buffer.
    pub fn geometry(&self) -> &DrawGeometry {
        &self.geometry
    }

    /// Index of the material slot of the owning mesh.
    pub fn material(&self) -> usize {
        self.material
    }
}

/// Triangle geometry: one shared vertex buffer, sub-meshes with their own
/// index buffers, and named material slots.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: Arc<GpuBuffer>,
    vertex_count: u32,
    bounds: BoundingBox,
    materials: Vec<String>,
    submeshes: Vec<SubMesh>,
}

impl Asset for Mesh {}

impl Mesh {
    /// Uploads `vertices` into a new mesh with no sub-meshes.
    ///
    /// # Fatal errors
    /// * `vertices` is empty.
    pub fn new(gpu: &GpuManager, vertices: &[Vertex]) -> Self {
        let positions = vertices.iter().map(|v| Vec3::from(v.position));
        let Some(bounds) = BoundingBox::from_points(positions) else {
            crate::fatal!("Mesh must have at least one vertex");
        };

        let vertex_buffer = gpu.create_buffer(&BufferDescriptor {
            label: Some("mesh vertices".into()),
            buffer_type: BufferType::Vertex,
            usage: BufferUsage::StaticDraw,
            size: std::mem::size_of_val(vertices) as u64,
        });
        vertex_buffer.write(0, bytemuck::cast_slice(vertices));

        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            bounds,
            materials: Vec::new(),
            submeshes: Vec::new(),
        }
    }

    /// The shared vertex buffer.
    pub fn vertex_buffer(&self) -> &Arc<GpuBuffer> {
        &self.vertex_buffer
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Bounds of every vertex.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Material slot names, indexed by slot.
    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    /// Returns the slot named `name`, adding it if needed.
    pub fn add_material(&mut self, name: &str) -> usize {
        match self.material_index(name) {
            Some(index) => index,
            None => {
                self.materials.push(name.to_string());
                self.materials.len() - 1
            }
        }
    }

    /// Slot of the material named `name`.
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|material| material == name)
    }

    /// Sub-meshes in creation order.
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    /// Adds a triangle-list sub-mesh drawn with material slot `material`.
    ///
    /// # Fatal errors
    /// * `indices` is empty or not a whole number of triangles;
    /// * an index is out of range of the vertices;
    /// * `material` is not a slot of this mesh.
    pub fn add_submesh(&mut self, gpu: &GpuManager, indices: &[u32], material: usize) -> &SubMesh {
        check!(
            !indices.is_empty() && indices.len() % 3 == 0,
            "Sub-mesh index count {} is not a positive multiple of 3",
            indices.len()
        );
        check!(
            material < self.materials.len(),
            "Material slot {} out of range (materials: {})",
            material,
            self.materials.len()
        );
        if let Some(index) = indices.iter().find(|&&index| index >= self.vertex_count) {
            crate::fatal!(
                "Sub-mesh index {} out of range (vertices: {})",
                index,
                self.vertex_count
            );
        }

        let index_buffer = gpu.create_buffer(&BufferDescriptor {
            label: Some("mesh indices".into()),
            buffer_type: BufferType::Index,
            usage: BufferUsage::StaticDraw,
            size: std::mem::size_of_val(indices) as u64,
        });
        index_buffer.write(0, bytemuck::cast_slice(indices));

        self.submeshes.push(SubMesh {
            geometry: DrawGeometry::indexed(
                PrimitiveType::TriangleList,
                self.vertex_buffer.clone(),
                self.vertex_count,
                index_buffer,
                indices.len() as u32,
            ),
            material,
        });
        &self.submeshes[self.submeshes.len() - 1]
    }
}
