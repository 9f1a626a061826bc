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

//! Loads 2D textures from image files.

use crate::LoaderError;
use orion_core::asset::{AssetAttributes, AssetError, AssetLoader, LoadRequest};
use orion_core::gpu::{PixelFormat, SamplerAddressMode, SamplerFilterMode, TextureFlags};
use orion_core::resources::Texture2D;
use std::str::FromStr;

/// Image extensions handled by [`TextureLoader`].
pub const TEXTURE_FILE_TYPES: [&str; 3] = ["png", "tga", "jpg"];

/// Decodes an image into an RGBA8 [`Texture2D`].
///
/// Attributes:
/// * `address_mode`: `"clamp"` (default) or `"wrap"`;
/// * `filter_mode`: `"nearest"`, `"bilinear"`, `"trilinear"` or
///   `"anisotropic"` (default);
/// * `anisotropy`: maximum anisotropy, at least 1;
/// * `mips`: number of mip levels, 0 (default) for the full pyramid. Levels
///   below the first are generated from the image.
#[derive(Debug, Clone, Copy)]
pub struct TextureLoader {
    file_type: &'static str,
}

impl TextureLoader {
    /// A loader for images with extension `file_type`.
    pub fn new(file_type: &'static str) -> Self {
        Self { file_type }
    }
}

impl AssetLoader for TextureLoader {
    type Asset = Texture2D;

    fn file_type(&self) -> &str {
        self.file_type
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Texture2D, AssetError> {
        let path = request.path;
        let image = image::load_from_memory(request.data)
            .map_err(|source| LoaderError::Image {
                path: path.to_string(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();

        let attributes = request.attributes;
        let mips = u32_attribute(path, attributes, "mips")?.unwrap_or(0);
        let flags = if mips == 1 {
            TextureFlags::EMPTY
        } else {
            TextureFlags::AUTO_MIPMAP
        };

        let mut texture = Texture2D::new(
            request.gpu().clone(),
            width,
            height,
            PixelFormat::R8G8B8A8,
            mips,
            flags,
        );
        texture.update(image.as_raw());

        let address_mode = mode_attribute::<SamplerAddressMode>(path, attributes, "address_mode")?;
        if let Some(mode) = address_mode {
            texture.set_address_mode(mode);
        }
        if let Some(mode) = mode_attribute::<SamplerFilterMode>(path, attributes, "filter_mode")? {
            texture.set_filter_mode(mode);
        }
        if let Some(anisotropy) = u32_attribute(path, attributes, "anisotropy")? {
            if anisotropy == 0 {
                return Err(LoaderError::invalid(path, "anisotropy must be at least 1").into());
            }
            texture.set_anisotropy(anisotropy);
        }

        log::debug!(
            "Loaded texture '{}' ({}x{}, {} mips)",
            path,
            width,
            height,
            texture.mips()
        );
        Ok(texture)
    }
}

fn u32_attribute(
    path: &str,
    attributes: &AssetAttributes,
    name: &str,
) -> Result<Option<u32>, LoaderError> {
    if !attributes.contains(name) {
        return Ok(None);
    }
    attributes
        .get_u32(name)
        .map(Some)
        .ok_or_else(|| {
            LoaderError::invalid(path, format!("attribute '{}' must be an unsigned integer", name))
        })
}

fn mode_attribute<T>(
    path: &str,
    attributes: &AssetAttributes,
    name: &str,
) -> Result<Option<T>, LoaderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if !attributes.contains(name) {
        return Ok(None);
    }
    let value = attributes.get_str(name).ok_or_else(|| {
        LoaderError::invalid(path, format!("attribute '{}' must be a string", name))
    })?;
    value
        .parse()
        .map(Some)
        .map_err(|err| LoaderError::invalid(path, format!("attribute '{}': {}", name, err)))
}
