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

//! I/O services of the engine: the filesystem asset store, configuration
//! files and the loaders turning asset files into engine resources.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loaders;
pub mod store;

pub use error::LoaderError;
pub use loaders::register_default_loaders;
pub use store::{register_filesystem_store, FilesystemAssetStore, FILESYSTEM_STORE_TYPE};
