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

//! The GPU resource layer.
//!
//! This module presents typed, validated GPU resources independent of any
//! native graphics API:
//!
//! - [`api`]: descriptors, ids and the front-end resource objects
//!   ([`GpuBuffer`], [`GpuTexture`], [`GpuSamplerState`],
//!   [`GpuResourceSet`], [`GpuProgram`], [`GpuPipeline`]).
//! - [`traits`]: the backend contract ([`GpuDevice`]) and the command list
//!   used to issue draws ([`GpuCommandList`]).
//! - [`GpuManager`]: the factory through which every resource is created.
//!
//! All validation happens in the front-end before any backend call, so
//! backends only ever see well-formed requests.

pub mod api;
pub mod error;
pub mod manager;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use self::api::*;
pub use self::error::*;
pub use self::manager::GpuManager;
pub use self::traits::*;
