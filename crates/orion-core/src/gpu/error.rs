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

//! Error types reported by GPU backends.
//!
//! Backends return these through the [`GpuDevice`](super::GpuDevice) contract.
//! The validating front-end ([`GpuManager`](super::GpuManager) and the
//! resource objects) turns any of them into a fatal error, since a backend
//! refusing a validated request leaves no sensible recovery path.

use std::fmt;

/// A backend failed to turn program source into a usable program object.
#[derive(Debug)]
pub struct ProgramError {
    /// Name of the program that failed.
    pub name: String,
    /// Backend diagnostics.
    pub details: String,
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Program '{}' failed to build: {}", self.name, self.details)
    }
}

impl std::error::Error for ProgramError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A program-specific error occurred.
    Program(ProgramError),
    /// The handle used to reference a resource does not name a live object.
    InvalidHandle,
    /// An access fell outside the bounds of the resource.
    OutOfBounds,
    /// The backend does not support the requested feature or format.
    Unsupported(String),
    /// An error originating from the specific backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Program(err) => write!(f, "Program resource error: {err}"),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle."),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::Unsupported(what) => write!(f, "Unsupported by backend: {what}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Program(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProgramError> for ResourceError {
    fn from(err: ProgramError) -> Self {
        ResourceError::Program(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn resource_error_wraps_program_error() {
        let err: ResourceError = ProgramError {
            name: "lit.shader (POINT_LIGHT)".to_string(),
            details: "syntax error at line 5".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Program resource error: Program 'lit.shader (POINT_LIGHT)' failed to build: \
             syntax error at line 5"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn plain_variants_have_no_source() {
        assert!(ResourceError::InvalidHandle.source().is_none());
        assert_eq!(
            ResourceError::Unsupported("3D render targets".into()).to_string(),
            "Unsupported by backend: 3D render targets"
        );
    }
}
