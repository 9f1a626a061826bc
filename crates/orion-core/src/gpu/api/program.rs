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

//! Compiled shader programs for a single pipeline stage.

use crate::gpu::GpuDevice;
use std::fmt;
use std::sync::Arc;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex = 0,
    /// Fragment stage.
    Fragment = 1,
}

impl ShaderStage {
    /// Number of stages.
    pub const COUNT: usize = 2;

    /// All stages, in index order.
    pub const ALL: [ShaderStage; Self::COUNT] = [ShaderStage::Vertex, ShaderStage::Fragment];

    /// Index of the stage, usable for per-stage arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name of the stage.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A descriptor used to create a [`GpuProgram`].
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    /// Name used in diagnostics.
    pub name: String,
    /// Stage the program runs at.
    pub stage: ShaderStage,
    /// Complete program source.
    pub source: Vec<u8>,
}

/// An opaque handle to a backend program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

/// A program compiled for one [`ShaderStage`].
#[derive(Debug)]
pub struct GpuProgram {
    id: ProgramId,
    stage: ShaderStage,
    name: String,
    device: Arc<dyn GpuDevice>,
}

impl GpuProgram {
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        id: ProgramId,
        descriptor: &ProgramDescriptor,
    ) -> Self {
        Self {
            id,
            stage: descriptor.stage,
            name: descriptor.name.clone(),
            device,
        }
    }

    /// Backend handle.
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Stage the program runs at.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Name the program was created with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for GpuProgram {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_program(self.id) {
            log::warn!("Failed to destroy program '{}': {}", self.name, err);
        }
    }
}
