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

//! # Orion Core
//!
//! Foundational crate containing the GPU resource contracts, the asset
//! lifecycle manager and the shader/material parameter system that together
//! form the runtime core of the engine.
//!
//! Concrete backends, loaders and bootstrap code live in the sibling crates;
//! everything here talks to them through traits ([`gpu::GpuDevice`],
//! [`asset::AssetLoader`], [`asset::AssetStore`]).

#![warn(missing_docs)]

pub mod asset;
pub mod config;
pub mod context;
pub mod gpu;
pub mod resources;
pub mod shading;
pub mod utils;

pub use context::EngineContext;
pub use glam;

#[doc(hidden)]
pub mod __private {
    pub use log;
}
