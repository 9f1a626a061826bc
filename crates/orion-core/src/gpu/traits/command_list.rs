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

use crate::gpu::{DrawGeometry, GpuPipeline, GpuResourceSet};

/// A sequence of GPU commands being recorded.
///
/// State set with `bind_*` persists for every following draw until it is
/// replaced.
pub trait GpuCommandList {
    /// Sets the pipeline for subsequent draws.
    fn bind_pipeline(&mut self, pipeline: &GpuPipeline);

    /// Binds `set` at set number `index`.
    fn bind_resource_set(&mut self, index: usize, set: &GpuResourceSet);

    /// Records a draw.
    fn draw(&mut self, geometry: &DrawGeometry);
}
