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

//! Texture sampler state.

use crate::gpu::GpuDevice;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerFilterMode {
    /// Nearest texel, nearest mip.
    Nearest,
    /// Linear within a level, nearest mip.
    #[default]
    Bilinear,
    /// Linear within and between levels.
    Trilinear,
    /// Trilinear with anisotropic filtering.
    Anisotropic,
}

/// Resolution of texture coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerAddressMode {
    /// Coordinates are clamped to the edge.
    #[default]
    Clamp,
    /// Coordinates wrap around, repeating the texture.
    Wrap,
}

/// Error returned when parsing a sampler mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModeError(pub String);

impl fmt::Display for UnknownModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sampler mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownModeError {}

impl FromStr for SamplerFilterMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "trilinear" => Ok(Self::Trilinear),
            "anisotropic" => Ok(Self::Anisotropic),
            other => Err(UnknownModeError(other.to_string())),
        }
    }
}

impl FromStr for SamplerAddressMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clamp" => Ok(Self::Clamp),
            "wrap" => Ok(Self::Wrap),
            other => Err(UnknownModeError(other.to_string())),
        }
    }
}

/// A descriptor for a [`GpuSamplerState`].
///
/// Equal descriptors yield the same cached sampler from
/// [`GpuManager::sampler_state`](crate::gpu::GpuManager::sampler_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerStateDescriptor {
    /// Filtering mode.
    pub filter_mode: SamplerFilterMode,
    /// Maximum anisotropy, only meaningful for [`SamplerFilterMode::Anisotropic`].
    pub max_anisotropy: u32,
    /// Addressing along U.
    pub address_u: SamplerAddressMode,
    /// Addressing along V.
    pub address_v: SamplerAddressMode,
    /// Addressing along W.
    pub address_w: SamplerAddressMode,
}

impl Default for SamplerStateDescriptor {
    fn default() -> Self {
        Self {
            filter_mode: SamplerFilterMode::Bilinear,
            max_anisotropy: 1,
            address_u: SamplerAddressMode::Clamp,
            address_v: SamplerAddressMode::Clamp,
            address_w: SamplerAddressMode::Clamp,
        }
    }
}

impl SamplerStateDescriptor {
    /// Uses `mode` on every axis.
    pub fn with_address_mode(mut self, mode: SamplerAddressMode) -> Self {
        self.address_u = mode;
        self.address_v = mode;
        self.address_w = mode;
        self
    }
}

/// An opaque handle to a backend sampler object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);

/// Immutable sampler state.
#[derive(Debug)]
pub struct GpuSamplerState {
    id: SamplerId,
    descriptor: SamplerStateDescriptor,
    device: Arc<dyn GpuDevice>,
}

impl GpuSamplerState {
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        id: SamplerId,
        descriptor: SamplerStateDescriptor,
    ) -> Self {
        Self { id, descriptor, device }
    }

    /// Backend handle.
    pub fn id(&self) -> SamplerId {
        self.id
    }

    /// Descriptor the sampler was created from.
    pub fn descriptor(&self) -> &SamplerStateDescriptor {
        &self.descriptor
    }
}

impl Drop for GpuSamplerState {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_sampler(self.id) {
            log::warn!("Failed to destroy sampler {:?}: {}", self.id, err);
        }
    }
}
