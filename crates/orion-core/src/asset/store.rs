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

use super::{AssetAttributes, AssetError};
use crate::utils::sync::{read, write};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

/// Raw data and metadata of one asset, as returned by a store.
#[derive(Debug, Clone, Default)]
pub struct AssetSource {
    /// Asset data.
    pub data: Vec<u8>,
    /// Loader attributes.
    pub attributes: AssetAttributes,
}

/// A mounted source of asset data.
pub trait AssetStore: Send + Sync + Debug {
    /// Opens the asset at `path`, relative to the store root.
    fn open(&self, path: &str) -> Result<AssetSource, AssetError>;
}

/// Builds a store of some type from a location string.
pub type AssetStoreFactory =
    Box<dyn Fn(&str) -> Result<Box<dyn AssetStore>, AssetError> + Send + Sync>;

/// A store holding its assets in memory.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<HashMap<String, AssetSource>>,
}

impl MemoryAssetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an asset without attributes.
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.insert_with_attributes(path, data, AssetAttributes::new());
    }

    /// Adds or replaces an asset.
    pub fn insert_with_attributes(
        &self,
        path: impl Into<String>,
        data: impl Into<Vec<u8>>,
        attributes: AssetAttributes,
    ) {
        let source = AssetSource {
            data: data.into(),
            attributes,
        };
        write(&self.assets).insert(path.into(), source);
    }

    /// Removes an asset.
    pub fn remove(&self, path: &str) -> bool {
        write(&self.assets).remove(path).is_some()
    }

    /// Paths of every asset in the store, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = read(&self.assets).keys().cloned().collect();
        paths.sort_unstable();
        paths
    }
}

impl AssetStore for MemoryAssetStore {
    fn open(&self, path: &str) -> Result<AssetSource, AssetError> {
        read(&self.assets)
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_returns_copies_of_inserted_data() {
        let store = MemoryAssetStore::new();
        store.insert_with_attributes(
            "a/b.txt",
            b"hello".to_vec(),
            AssetAttributes::new().with("lang", "en"),
        );

        let source = store.open("a/b.txt").unwrap();
        assert_eq!(source.data, b"hello");
        assert_eq!(source.attributes.get_str("lang"), Some("en"));
        assert_eq!(store.paths(), vec!["a/b.txt".to_string()]);

        assert!(store.remove("a/b.txt"));
        assert!(matches!(
            store.open("a/b.txt"),
            Err(AssetError::NotFound(path)) if path == "a/b.txt"
        ));
    }
}
