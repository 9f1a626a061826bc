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

use orion_core::asset::AssetError;
use orion_core::gpu::ResourceError;
use orion_core::shading::UnknownNameError;
use thiserror::Error;

/// A failure to decode asset data into an engine resource.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A JSON description could not be parsed.
    #[error("{path}: invalid JSON: {source}")]
    Json {
        /// Asset being loaded.
        path: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Text data is not valid UTF-8.
    #[error("{path}: data is not valid UTF-8")]
    NotUtf8 {
        /// Asset being loaded.
        path: String,
    },

    /// A name (parameter type, pass type, sampler mode) was not recognised.
    #[error("{path}: {source}")]
    UnknownName {
        /// Asset being loaded.
        path: String,
        /// The rejected name.
        #[source]
        source: UnknownNameError,
    },

    /// The description is well-formed JSON but semantically invalid.
    #[error("{path}: {message}")]
    Invalid {
        /// Asset being loaded.
        path: String,
        /// What is wrong.
        message: String,
    },

    /// A dependency could not be opened.
    #[error("{path}: failed to open '{dependency}': {source}")]
    Dependency {
        /// Asset being loaded.
        path: String,
        /// Path of the dependency.
        dependency: String,
        /// Store error.
        #[source]
        source: AssetError,
    },

    /// Image data could not be decoded.
    #[error("{path}: failed to decode image: {source}")]
    Image {
        /// Asset being loaded.
        path: String,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// OBJ data could not be parsed.
    #[error("{path}: failed to parse OBJ: {source}")]
    Obj {
        /// Asset being loaded.
        path: String,
        /// Parser error.
        #[source]
        source: tobj::LoadError,
    },

    /// The GPU backend rejected a resource, e.g. a program failed to build.
    #[error("{path}: {source}")]
    Gpu {
        /// Asset being loaded.
        path: String,
        /// Backend error.
        #[source]
        source: ResourceError,
    },
}

impl LoaderError {
    pub(crate) fn invalid(path: &str, message: impl Into<String>) -> Self {
        LoaderError::Invalid {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<LoaderError> for AssetError {
    fn from(err: LoaderError) -> Self {
        AssetError::load(err)
    }
}
