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

use std::fmt;
use std::io;

/// An error raised while opening or decoding asset data.
#[derive(Debug)]
pub enum AssetError {
    /// The store has no data at the given path.
    NotFound(String),
    /// The path is not of the form `<store>/<relative path>`.
    InvalidPath(String),
    /// No store is mounted under the given name.
    UnknownStore(String),
    /// No store type is registered under the given name.
    UnknownStoreType(String),
    /// Reading the asset data failed.
    Io {
        /// Path being read.
        path: String,
        /// Underlying error.
        source: io::Error,
    },
    /// The asset metadata could not be parsed.
    Metadata {
        /// Path of the asset.
        path: String,
        /// Parser diagnostics.
        details: String,
    },
    /// A loader failed to decode the asset data.
    Load(Box<dyn std::error::Error + Send + Sync>),
}

impl AssetError {
    /// Wraps any loader error.
    pub fn load(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        AssetError::Load(err.into())
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound(path) => write!(f, "Asset '{path}' not found"),
            AssetError::InvalidPath(path) => write!(f, "Invalid asset path '{path}'"),
            AssetError::UnknownStore(name) => write!(f, "No asset store mounted as '{name}'"),
            AssetError::UnknownStoreType(name) => write!(f, "Unknown asset store type '{name}'"),
            AssetError::Io { path, source } => write!(f, "Failed to read '{path}': {source}"),
            AssetError::Metadata { path, details } => {
                write!(f, "Invalid metadata for asset '{path}': {details}")
            }
            AssetError::Load(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            AssetError::Load(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
