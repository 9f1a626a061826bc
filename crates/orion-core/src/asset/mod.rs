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

//! The asset lifecycle: shared handles, the manager that owns the path
//! registry, loaders dispatched by file type and the stores asset data is
//! read from.
//!
//! - [`AssetHandle`]: a reference-counted handle with a load/unload state
//!   machine. Managed handles are created by the [`AssetManager`] for a
//!   path; unmanaged handles wrap data created at runtime.
//! - [`AssetManager`]: resolves paths to shared instances, loads them on
//!   demand and forgets them when the last handle drops.
//! - [`AssetLoader`]: turns the raw data of one file type into an asset.
//! - [`AssetStore`]: a mounted source of raw asset data.

mod attributes;
mod error;
mod handle;
mod loader;
mod manager;
mod store;

pub use attributes::*;
pub use error::*;
pub use handle::*;
pub use loader::*;
pub use manager::*;
pub use store::*;

/// A marker trait for types that can be managed by the asset system.
///
/// The supertraits allow handles to be shared between threads and stored
/// for the lifetime of the application.
pub trait Asset: Send + Sync + 'static {}

/// Load state of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetState {
    /// Asset data is not in memory.
    Unloaded,
    /// Asset data is being loaded.
    Loading,
    /// Asset data is in memory.
    Loaded,
}

/// Returns the file type of an asset path: the extension of its final
/// component, without the dot. Matching is case-sensitive.
pub fn file_type(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => Some(&name[dot + 1..]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_is_extension_of_last_component() {
        assert_eq!(file_type("game/textures/wall.png"), Some("png"));
        assert_eq!(file_type("game/shaders/lit.shader"), Some("shader"));
        assert_eq!(file_type("game/a.b/readme"), None);
        assert_eq!(file_type("game/archive.tar.gz"), Some("gz"));
        assert_eq!(file_type("game/trailing."), None);
        assert_eq!(file_type("game/UPPER.PNG"), Some("PNG"));
    }
}
