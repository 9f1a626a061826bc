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

use crate::asset::Asset;
use crate::check;
use crate::gpu::{
    GpuManager, GpuSamplerState, GpuTexture, PixelFormat, SamplerAddressMode, SamplerFilterMode,
    SamplerStateDescriptor, TextureDescriptor, TextureFlags, TextureRegion, TextureType,
};
use std::sync::Arc;

/// Anisotropy used by new textures.
pub const DEFAULT_ANISOTROPY: u32 = 8;

/// A sampled 2D image.
///
/// Sampling settings are kept alongside the texture; changing one swaps in
/// the matching shared sampler state. Materials pick up the sampler current
/// at the time the texture is assigned to them.
#[derive(Debug)]
pub struct Texture2D {
    gpu: Arc<GpuManager>,
    texture: Arc<GpuTexture>,
    sampler_descriptor: SamplerStateDescriptor,
    sampler: Arc<GpuSamplerState>,
}

impl Asset for Texture2D {}

impl Texture2D {
    /// Creates an uninitialised texture. `mips` of 0 selects the full pyramid.
    pub fn new(
        gpu: Arc<GpuManager>,
        width: u32,
        height: u32,
        format: PixelFormat,
        mips: u32,
        flags: TextureFlags,
    ) -> Self {
        let texture = gpu.create_texture(&TextureDescriptor {
            label: None,
            texture_type: TextureType::Texture2D,
            width,
            height,
            depth: 1,
            format,
            mips,
            flags,
        });
        let sampler_descriptor = SamplerStateDescriptor {
            filter_mode: SamplerFilterMode::Anisotropic,
            max_anisotropy: DEFAULT_ANISOTROPY,
            ..Default::default()
        }
        .with_address_mode(SamplerAddressMode::Clamp);
        let sampler = gpu.sampler_state(&sampler_descriptor);

        Self {
            gpu,
            texture,
            sampler_descriptor,
            sampler,
        }
    }

    /// Width of mip 0.
    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    /// Height of mip 0.
    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.texture.format()
    }

    /// Number of mip levels.
    pub fn mips(&self) -> u32 {
        self.texture.mips()
    }

    /// The GPU texture.
    pub fn gpu_texture(&self) -> &Arc<GpuTexture> {
        &self.texture
    }

    /// The sampler matching the current settings.
    pub fn sampler(&self) -> &Arc<GpuSamplerState> {
        &self.sampler
    }

    /// Filtering mode.
    pub fn filter_mode(&self) -> SamplerFilterMode {
        self.sampler_descriptor.filter_mode
    }

    /// Sets the filtering mode.
    pub fn set_filter_mode(&mut self, mode: SamplerFilterMode) {
        self.update_sampler(SamplerStateDescriptor {
            filter_mode: mode,
            ..self.sampler_descriptor
        });
    }

    /// Maximum anisotropy.
    pub fn anisotropy(&self) -> u32 {
        self.sampler_descriptor.max_anisotropy
    }

    /// Sets the maximum anisotropy.
    ///
    /// # Fatal errors
    /// * `anisotropy` is zero.
    pub fn set_anisotropy(&mut self, anisotropy: u32) {
        check!(anisotropy > 0, "Texture anisotropy must be at least 1");
        self.update_sampler(SamplerStateDescriptor {
            max_anisotropy: anisotropy,
            ..self.sampler_descriptor
        });
    }

    /// Addressing mode, shared by both axes.
    pub fn address_mode(&self) -> SamplerAddressMode {
        self.sampler_descriptor.address_u
    }

    /// Sets the addressing mode on both axes.
    pub fn set_address_mode(&mut self, mode: SamplerAddressMode) {
        self.update_sampler(self.sampler_descriptor.with_address_mode(mode));
    }

    /// Replaces the whole of mip 0.
    ///
    /// # Fatal errors
    /// * `data` is not exactly one mip 0 image in the texture format.
    pub fn update(&self, data: &[u8]) {
        self.update_region(&TextureRegion::area(0, 0, self.width(), self.height()), data, 0);
    }

    /// Replaces a region of one mip level. Updating mip 0 regenerates the
    /// other levels when the texture has [`TextureFlags::AUTO_MIPMAP`].
    pub fn update_region(&self, region: &TextureRegion, data: &[u8], mip: u32) {
        self.texture.update(region, data, mip, 0);
        if mip == 0
            && self.texture.mips() > 1
            && self.texture.flags().contains(TextureFlags::AUTO_MIPMAP)
        {
            self.texture.generate_mipmap();
        }
    }

    fn update_sampler(&mut self, descriptor: SamplerStateDescriptor) {
        if descriptor != self.sampler_descriptor {
            self.sampler_descriptor = descriptor;
            self.sampler = self.gpu.sampler_state(&descriptor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::{mock_manager, MockDevice};

    fn texture(flags: TextureFlags) -> (Arc<MockDevice>, Arc<GpuManager>, Texture2D) {
        let (device, manager) = mock_manager();
        let manager = Arc::new(manager);
        let texture = Texture2D::new(manager.clone(), 8, 4, PixelFormat::R8G8B8A8, 0, flags);
        (device, manager, texture)
    }

    #[test]
    fn defaults_to_clamped_anisotropic_sampling() {
        let (_device, _manager, texture) = texture(TextureFlags::EMPTY);
        assert_eq!(texture.filter_mode(), SamplerFilterMode::Anisotropic);
        assert_eq!(texture.anisotropy(), DEFAULT_ANISOTROPY);
        assert_eq!(texture.address_mode(), SamplerAddressMode::Clamp);
        assert_eq!(texture.mips(), 4);
        assert_eq!((texture.width(), texture.height()), (8, 4));
    }

    #[test]
    fn sampler_settings_share_cached_states() {
        let (_device, manager, mut texture) = texture(TextureFlags::EMPTY);
        let original = texture.sampler().clone();

        texture.set_address_mode(SamplerAddressMode::Wrap);
        assert!(!Arc::ptr_eq(&original, texture.sampler()));
        assert_eq!(texture.sampler().descriptor().address_v, SamplerAddressMode::Wrap);

        texture.set_address_mode(SamplerAddressMode::Clamp);
        assert!(Arc::ptr_eq(&original, texture.sampler()));
        assert_eq!(manager.sampler_count(), 2);

        texture.set_filter_mode(SamplerFilterMode::Nearest);
        texture.set_anisotropy(1);
        assert_eq!(texture.sampler().descriptor().filter_mode, SamplerFilterMode::Nearest);
        assert_eq!(manager.sampler_count(), 4);
    }

    #[test]
    fn updating_mip_zero_regenerates_mipmaps() {
        let (device, _manager, texture) = texture(TextureFlags::AUTO_MIPMAP);
        texture.update(&[0xff; 8 * 4 * 4]);
        assert_eq!(device.texture_writes(), 1);
        assert_eq!(device.mipmaps_generated(), 1);

        texture.update_region(&TextureRegion::area(0, 0, 2, 1), &[0; 8], 1);
        assert_eq!(device.texture_writes(), 2);
        assert_eq!(device.mipmaps_generated(), 1);
    }

    #[test]
    fn plain_textures_skip_mipmap_generation() {
        let (device, _manager, texture) = texture(TextureFlags::EMPTY);
        texture.update(&[0; 8 * 4 * 4]);
        assert_eq!(device.mipmaps_generated(), 0);
    }

    #[test]
    #[should_panic(expected = "Texture update data is 16 bytes, expected 128")]
    fn update_checks_data_size() {
        let (_device, _manager, texture) = texture(TextureFlags::EMPTY);
        texture.update(&[0; 16]);
    }
}
