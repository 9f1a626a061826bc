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

use crate::backend::create_device;
use anyhow::{Context, Result};
use orion_core::asset::AssetManager;
use orion_core::config::{AssetStoreConfig, EngineConfig};
use orion_core::gpu::{GpuDevice, GpuManager};
use orion_core::EngineContext;
use orion_io::config::load_config;
use orion_io::{register_default_loaders, register_filesystem_store, FILESYSTEM_STORE_TYPE};
use orion_telemetry::{init_logging, install_fatal_hook, LoggingConfig};
use std::path::Path;
use std::sync::Arc;

/// The engine services built from a configuration.
///
/// Setup order: logging and the fatal hook, the GPU backend, the asset
/// manager with the filesystem store type and the built-in loaders, then
/// every configured store in order.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    context: EngineContext,
}

impl Engine {
    /// Starts the engine on the backend named by `config.gpu_backend`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let device = create_device(&config.gpu_backend)?;
        Self::with_device(config, device)
    }

    /// Starts the engine on an already created device. The configured
    /// backend name is not consulted.
    pub fn with_device(config: EngineConfig, device: Arc<dyn GpuDevice>) -> Result<Self> {
        init_logging(&LoggingConfig::from(&config.logging))
            .context("failed to initialise logging")?;
        install_fatal_hook();

        let context = EngineContext::new(device);
        register_filesystem_store(&context.assets);
        register_default_loaders(&context.assets);

        let engine = Self { config, context };
        for store in &engine.config.asset_stores {
            engine.mount_store(store)?;
        }

        log::info!(
            "Engine '{}' started on the {} backend ({} asset stores)",
            engine.config.title,
            engine.context.gpu.device().name(),
            engine.config.asset_stores.len()
        );
        Ok(engine)
    }

    /// Loads a JSON configuration file and starts the engine.
    ///
    /// Relative filesystem store locations are resolved against the
    /// directory of the file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = load_config(path)?;
        if let Some(base) = path.parent() {
            for store in &mut config.asset_stores {
                if store.store_type == FILESYSTEM_STORE_TYPE
                    && Path::new(&store.location).is_relative()
                {
                    store.location = base.join(&store.location).to_string_lossy().into_owned();
                }
            }
        }
        Self::new(config)
    }

    /// Mounts one more store.
    pub fn mount_store(&self, store: &AssetStoreConfig) -> Result<()> {
        self.context
            .assets
            .mount_store(&store.name, &store.store_type, &store.location)
            .with_context(|| {
                format!("failed to mount asset store '{}' ({})", store.name, store.location)
            })
    }

    /// The configuration the engine was started with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared services.
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// The GPU front-end.
    pub fn gpu(&self) -> &Arc<GpuManager> {
        &self.context.gpu
    }

    /// The asset manager.
    pub fn assets(&self) -> &AssetManager {
        &self.context.assets
    }

    /// Stops the engine. Assets still referenced elsewhere outlive it.
    pub fn shutdown(self) {
        let cached = self.context.assets.cached_count();
        if cached > 0 {
            log::warn!("Shutting down with {} assets still referenced", cached);
        }
        log::info!("Engine '{}' shut down", self.config.title);
    }
}
