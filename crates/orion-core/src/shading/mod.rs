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

//! The shader and material parameter system.
//!
//! A [`Shader`] declares named parameters. Its non-texture parameters are
//! packed into a std140 [`UniformStruct`]; its texture parameters receive
//! consecutive texture slots. A [`Material`] holds values for the
//! parameters of one shader in a dirty-tracked [`UniformBuffer`] and a
//! resource set, ready to be bound at draw time by a [`DrawList`].

mod draw_list;
mod material;
mod parameter;
mod pass;
mod shader;
mod uniform;
mod uniform_buffer;

pub use draw_list::*;
pub use material::*;
pub use parameter::*;
pub use pass::*;
pub use shader::*;
pub use uniform::*;
pub use uniform_buffer::*;

use std::fmt;

/// Error returned when parsing an unknown type or pass name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNameError {
    /// What was being parsed.
    pub kind: &'static str,
    /// The rejected name.
    pub name: String,
}

impl fmt::Display for UnknownNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.name)
    }
}

impl std::error::Error for UnknownNameError {}
