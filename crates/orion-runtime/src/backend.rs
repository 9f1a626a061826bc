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

//! GPU backend selection by name.

use anyhow::{bail, Result};
use orion_core::gpu::GpuDevice;
use orion_infra::HeadlessGpuDevice;
use std::sync::Arc;

/// Name of the in-memory backend.
pub const HEADLESS_BACKEND: &str = "headless";

/// Creates the device of the backend called `name`.
pub fn create_device(name: &str) -> Result<Arc<dyn GpuDevice>> {
    match name {
        HEADLESS_BACKEND => Ok(Arc::new(HeadlessGpuDevice::new())),
        other => bail!("unsupported GPU backend '{}'", other),
    }
}
