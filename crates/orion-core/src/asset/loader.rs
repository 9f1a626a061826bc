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

use super::{Asset, AssetAttributes, AssetError, AssetManager};
use crate::fatal;
use crate::gpu::GpuManager;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Turns the raw data of one file type into an asset.
///
/// A single loader instance is registered per file type and reused for
/// every load of that type; anything specific to one load lives in the
/// [`LoadRequest`].
pub trait AssetLoader: Send + Sync + 'static {
    /// The asset type produced.
    type Asset: Asset;

    /// File extension (without the dot) this loader handles.
    fn file_type(&self) -> &str;

    /// Builds an asset from `request`.
    fn load(&self, request: &LoadRequest<'_>) -> Result<Self::Asset, AssetError>;
}

/// Everything a loader needs for one load.
pub struct LoadRequest<'a> {
    /// Path of the asset being loaded.
    pub path: &'a str,
    /// Raw asset data.
    pub data: &'a [u8],
    /// Loader attributes from the asset metadata.
    pub attributes: &'a AssetAttributes,
    /// The manager, for loading dependencies.
    pub manager: &'a AssetManager,
}

impl LoadRequest<'_> {
    /// GPU manager to create resources with.
    pub fn gpu(&self) -> &Arc<GpuManager> {
        self.manager.gpu()
    }
}

/// A loader with its asset type erased, as held by the registry.
pub trait ErasedAssetLoader: Send + Sync {
    /// File extension handled.
    fn file_type(&self) -> &str;

    /// Name of the asset type produced, for diagnostics.
    fn asset_type_name(&self) -> &'static str;

    /// Loads an asset and returns it boxed.
    fn load_any(&self, request: &LoadRequest<'_>) -> Result<Box<dyn Any + Send>, AssetError>;
}

struct AssetLoaderWrapper<L: AssetLoader>(L);

impl<L: AssetLoader> ErasedAssetLoader for AssetLoaderWrapper<L> {
    fn file_type(&self) -> &str {
        self.0.file_type()
    }

    fn asset_type_name(&self) -> &'static str {
        std::any::type_name::<L::Asset>()
    }

    fn load_any(&self, request: &LoadRequest<'_>) -> Result<Box<dyn Any + Send>, AssetError> {
        let asset = self.0.load(request)?;
        Ok(Box::new(asset))
    }
}

/// Loaders indexed by the file type they handle.
#[derive(Default)]
pub struct AssetLoaderRegistry {
    loaders: HashMap<String, Arc<dyn ErasedAssetLoader>>,
}

impl AssetLoaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `loader` for its file type.
    ///
    /// # Fatal errors
    /// * a loader is already registered for the same file type.
    pub fn register<L: AssetLoader>(&mut self, loader: L) {
        let file_type = loader.file_type().to_string();
        if self.loaders.contains_key(&file_type) {
            fatal!("Registering asset loader for file type '{}' that already exists", file_type);
        }
        log::debug!(
            "Registered asset loader for '{}' ({})",
            file_type,
            std::any::type_name::<L::Asset>()
        );
        self.loaders.insert(file_type, Arc::new(AssetLoaderWrapper(loader)));
    }

    /// The loader for `file_type`, if any.
    pub fn find(&self, file_type: &str) -> Option<Arc<dyn ErasedAssetLoader>> {
        self.loaders.get(file_type).cloned()
    }

    /// Whether a loader handles `file_type`.
    pub fn is_registered(&self, file_type: &str) -> bool {
        self.loaders.contains_key(file_type)
    }

    /// Every registered file type, sorted.
    pub fn file_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for AssetLoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoaderRegistry")
            .field("file_types", &self.file_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Text(String);
    impl Asset for Text {}

    struct TextLoader(&'static str);

    impl AssetLoader for TextLoader {
        type Asset = Text;

        fn file_type(&self) -> &str {
            self.0
        }

        fn load(&self, request: &LoadRequest<'_>) -> Result<Text, AssetError> {
            String::from_utf8(request.data.to_vec()).map(Text).map_err(AssetError::load)
        }
    }

    #[test]
    fn find_returns_loader_by_file_type() {
        let mut registry = AssetLoaderRegistry::new();
        registry.register(TextLoader("txt"));
        registry.register(TextLoader("md"));

        assert!(registry.is_registered("txt"));
        assert!(!registry.is_registered("TXT"));
        assert!(registry.find("png").is_none());
        assert_eq!(registry.file_types(), vec!["md", "txt"]);

        let loader = registry.find("md").unwrap();
        assert_eq!(loader.file_type(), "md");
        assert!(loader.asset_type_name().ends_with("Text"));
    }

    #[test]
    #[should_panic(expected = "Registering asset loader for file type 'txt' that already exists")]
    fn duplicate_registration_is_fatal() {
        let mut registry = AssetLoaderRegistry::new();
        registry.register(TextLoader("txt"));
        registry.register(TextLoader("txt"));
    }
}
