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

use crate::asset::AssetManager;
use crate::gpu::{GpuDevice, GpuManager};
use std::sync::Arc;

/// Shared engine services handed to systems and loaders.
#[derive(Debug, Clone)]
pub struct EngineContext {
    /// The GPU front-end.
    pub gpu: Arc<GpuManager>,
    /// The asset manager, backed by `gpu`.
    pub assets: AssetManager,
}

impl EngineContext {
    /// Builds the services over `device`. No stores or loaders are registered.
    pub fn new(device: Arc<dyn GpuDevice>) -> Self {
        let gpu = Arc::new(GpuManager::new(device));
        let assets = AssetManager::new(gpu.clone());
        Self { gpu, assets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::MockDevice;

    #[test]
    fn assets_share_the_gpu_manager() {
        let context = EngineContext::new(Arc::new(MockDevice::default()));
        assert!(Arc::ptr_eq(context.assets.gpu(), &context.gpu));
        assert_eq!(context.gpu.device().name(), "mock");
        assert_eq!(context.assets.cached_count(), 0);
    }
}
