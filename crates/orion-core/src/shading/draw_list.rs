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

use super::Material;
use crate::gpu::{resource_sets, DrawGeometry, GpuCommandList, GpuPipeline, GpuResourceSet};
use std::sync::Arc;

struct DrawEntry<'a> {
    pipeline: Arc<GpuPipeline>,
    material: &'a Material,
    geometry: DrawGeometry,
}

/// An ordered batch of draws sharing list-wide resource sets.
///
/// Entries are issued in insertion order. Each material's pending uniform
/// changes are uploaded right before its resource set is bound.
#[derive(Default)]
pub struct DrawList<'a> {
    resource_sets: Vec<(usize, &'a GpuResourceSet)>,
    entries: Vec<DrawEntry<'a>>,
}

impl<'a> DrawList<'a> {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `set` at set number `index` before any entry is drawn.
    ///
    /// Setting the same index again replaces the previous set.
    pub fn set_resource_set(&mut self, index: usize, set: &'a GpuResourceSet) {
        crate::check!(
            index < resource_sets::COUNT,
            "Resource set index {} out of range (sets: {})",
            index,
            resource_sets::COUNT
        );
        match self.resource_sets.iter_mut().find(|(existing, _)| *existing == index) {
            Some(entry) => entry.1 = set,
            None => self.resource_sets.push((index, set)),
        }
    }

    /// Appends a draw.
    pub fn add(
        &mut self,
        pipeline: &Arc<GpuPipeline>,
        material: &'a Material,
        geometry: DrawGeometry,
    ) {
        self.entries.push(DrawEntry {
            pipeline: pipeline.clone(),
            material,
            geometry,
        });
    }

    /// Number of draws.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no draws.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records every draw into `commands`.
    pub fn draw(&self, commands: &mut dyn GpuCommandList) {
        for (index, set) in &self.resource_sets {
            commands.bind_resource_set(*index, set);
        }

        let mut bound_pipeline: Option<&Arc<GpuPipeline>> = None;
        let mut bound_material: Option<&Material> = None;
        for entry in &self.entries {
            if !bound_pipeline.is_some_and(|bound| Arc::ptr_eq(bound, &entry.pipeline)) {
                commands.bind_pipeline(&entry.pipeline);
                bound_pipeline = Some(&entry.pipeline);
            }
            if !bound_material.is_some_and(|bound| std::ptr::eq(bound, entry.material)) {
                commands.bind_resource_set(resource_sets::MATERIAL, entry.material.resources());
                bound_material = Some(entry.material);
            }
            commands.draw(&entry.geometry);
        }

        log::trace!("Recorded {} draws", self.entries.len());
    }
}
