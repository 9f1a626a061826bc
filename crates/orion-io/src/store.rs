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

//! An asset store reading from a directory tree.
//!
//! Each asset is a file under the store root. Loader attributes live in an
//! optional JSON sidecar next to it, named after the data file with a
//! `.meta` suffix:
//!
//! ```json
//! { "attributes": { "address_mode": "wrap" } }
//! ```

use orion_core::asset::{AssetAttributes, AssetError, AssetManager, AssetSource, AssetStore};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Name the filesystem store type is registered under.
pub const FILESYSTEM_STORE_TYPE: &str = "fs";

/// Extension of attribute sidecar files.
const METADATA_EXTENSION: &str = "meta";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Metadata {
    attributes: AssetAttributes,
}

/// A store serving the files below a root directory.
#[derive(Debug, Clone)]
pub struct FilesystemAssetStore {
    root: PathBuf,
}

impl FilesystemAssetStore {
    /// Opens a store rooted at `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let root = root.into();
        let display = root.display().to_string();
        let metadata = fs::metadata(&root).map_err(|source| AssetError::Io {
            path: display.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(AssetError::Io {
                path: display,
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "asset store root is not a directory",
                ),
            });
        }
        Ok(Self { root })
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths of every asset in the store, sorted, using `/` as the
    /// separator. Sidecar files are not listed.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry.path().extension().and_then(|ext| ext.to_str()) != Some(METADATA_EXTENSION)
            })
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?;
                let components: Option<Vec<&str>> =
                    relative.components().map(|c| c.as_os_str().to_str()).collect();
                components.map(|components| components.join("/"))
            })
            .collect();
        paths.sort_unstable();
        paths
    }

    /// Maps a store-relative asset path onto the filesystem, refusing paths
    /// that would escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(AssetError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn read_metadata(&self, path: &str, file: &Path) -> Result<AssetAttributes, AssetError> {
        let mut sidecar = file.as_os_str().to_owned();
        sidecar.push(".");
        sidecar.push(METADATA_EXTENSION);

        let text = match fs::read_to_string(PathBuf::from(sidecar)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AssetAttributes::new()),
            Err(source) => {
                return Err(AssetError::Io {
                    path: path.to_string(),
                    source,
                })
            }
        };

        serde_json::from_str::<Metadata>(&text)
            .map(|metadata| metadata.attributes)
            .map_err(|err| AssetError::Metadata {
                path: path.to_string(),
                details: err.to_string(),
            })
    }
}

impl AssetStore for FilesystemAssetStore {
    fn open(&self, path: &str) -> Result<AssetSource, AssetError> {
        let file = self.resolve(path)?;
        let data = match fs::read(&file) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(AssetError::NotFound(path.to_string()))
            }
            Err(source) => {
                return Err(AssetError::Io {
                    path: path.to_string(),
                    source,
                })
            }
        };
        let attributes = self.read_metadata(path, &file)?;
        log::trace!("Read {} bytes for asset '{}' from {}", data.len(), path, file.display());
        Ok(AssetSource { data, attributes })
    }
}

/// Registers the `"fs"` store type on `manager`. The store location is the
/// root directory.
pub fn register_filesystem_store(manager: &AssetManager) {
    manager.register_store_type(FILESYSTEM_STORE_TYPE, |location| {
        let store: Box<dyn AssetStore> = Box::new(FilesystemAssetStore::new(location)?);
        Ok(store)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_data_with_sidecar_attributes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("textures"))?;
        fs::write(dir.path().join("textures/brick.png"), b"png")?;
        fs::write(
            dir.path().join("textures/brick.png.meta"),
            r#"{ "attributes": { "address_mode": "wrap", "anisotropy": 4 } }"#,
        )?;

        let store = FilesystemAssetStore::new(dir.path())?;
        let source = store.open("textures/brick.png")?;
        assert_eq!(source.data, b"png");
        assert_eq!(source.attributes.get_str("address_mode"), Some("wrap"));
        assert_eq!(source.attributes.get_u32("anisotropy"), Some(4));
        Ok(())
    }

    #[test]
    fn missing_sidecar_means_no_attributes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("ground.physmat"), b"{}")?;

        let store = FilesystemAssetStore::new(dir.path())?;
        assert!(store.open("ground.physmat")?.attributes.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_sidecar_is_a_metadata_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.txt"), b"")?;
        fs::write(dir.path().join("a.txt.meta"), b"{ not json")?;

        let store = FilesystemAssetStore::new(dir.path())?;
        assert!(matches!(store.open("a.txt"), Err(AssetError::Metadata { .. })));
        Ok(())
    }

    #[test]
    fn missing_files_and_escaping_paths_are_rejected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FilesystemAssetStore::new(dir.path())?;
        assert!(matches!(store.open("nothing.png"), Err(AssetError::NotFound(_))));
        assert!(matches!(store.open("../secret.txt"), Err(AssetError::InvalidPath(_))));
        assert!(matches!(store.open("/etc/passwd"), Err(AssetError::InvalidPath(_))));
        Ok(())
    }

    #[test]
    fn paths_lists_assets_without_sidecars() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("shaders/include"))?;
        fs::write(dir.path().join("shaders/lit.shader"), b"{}")?;
        fs::write(dir.path().join("shaders/lit.shader.meta"), b"{}")?;
        fs::write(dir.path().join("shaders/include/common.glsl"), b"")?;

        let store = FilesystemAssetStore::new(dir.path())?;
        assert_eq!(store.paths(), vec!["shaders/include/common.glsl", "shaders/lit.shader"]);
        Ok(())
    }

    #[test]
    fn root_must_be_a_directory() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("file"), b"")?;
        assert!(FilesystemAssetStore::new(dir.path().join("file")).is_err());
        assert!(FilesystemAssetStore::new(dir.path().join("missing")).is_err());
        Ok(())
    }
}
