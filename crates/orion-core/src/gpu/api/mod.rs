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

//! Descriptors, handles and front-end objects of the GPU resource layer.

pub mod buffer;
pub mod command;
pub mod pipeline;
pub mod program;
pub mod resource_set;
pub mod sampler;
pub mod texture;

pub use self::buffer::*;
pub use self::command::*;
pub use self::pipeline::*;
pub use self::program::*;
pub use self::resource_set::*;
pub use self::sampler::*;
pub use self::texture::*;
