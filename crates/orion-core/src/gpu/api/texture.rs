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

//! Defines data structures related to GPU texture resources.

use crate::gpu::GpuDevice;
use crate::{check, fatal, orion_bitflags};
use std::borrow::Cow;
use std::sync::Arc;

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    /// A single 2D image.
    #[default]
    Texture2D,
    /// An array of 2D images (`depth` is the layer count).
    Texture2DArray,
    /// Six square 2D faces.
    TextureCube,
    /// A volume (`depth` is the third dimension).
    Texture3D,
}

/// Faces of a cube texture, in layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X.
    PositiveX,
    /// -X.
    NegativeX,
    /// +Y.
    PositiveY,
    /// -Y.
    NegativeY,
    /// +Z.
    PositiveZ,
    /// -Z.
    NegativeZ,
}

impl CubeFace {
    /// Number of faces (and layers) of a cube texture.
    pub const COUNT: u32 = 6;

    /// Layer index of the face.
    pub fn layer(self) -> u32 {
        self as u32
    }
}

/// Pixel formats understood by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 8-bit RGBA, unsigned normalised.
    #[default]
    R8G8B8A8,
    /// 8-bit BGRA, unsigned normalised.
    B8G8R8A8,
    /// 8-bit RGB, unsigned normalised.
    R8G8B8,
    /// 8-bit RG, unsigned normalised.
    R8G8,
    /// 8-bit R, unsigned normalised.
    R8,
    /// 16-bit float RGBA.
    FloatR16G16B16A16,
    /// 32-bit float RGBA.
    FloatR32G32B32A32,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

impl PixelFormat {
    /// Size of one pixel in bytes.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::R8G8B8A8 | PixelFormat::B8G8R8A8 => 4,
            PixelFormat::R8G8B8 => 3,
            PixelFormat::R8G8 => 2,
            PixelFormat::R8 => 1,
            PixelFormat::FloatR16G16B16A16 => 8,
            PixelFormat::FloatR32G32B32A32 => 16,
            PixelFormat::Depth24Stencil8 => 4,
        }
    }

    /// Whether this is a depth (or depth/stencil) format.
    pub fn is_depth(self) -> bool {
        matches!(self, PixelFormat::Depth24Stencil8)
    }
}

orion_bitflags! {
    /// Behaviour flags for a texture.
    pub struct TextureFlags: u32 {
        /// The mipmap chain is generated from level 0 by the backend.
        const AUTO_MIPMAP = 1 << 0;
        /// The texture will be rendered to.
        const RENDER_TARGET = 1 << 1;
    }
}

/// A descriptor used to create a [`GpuTexture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label for the texture.
    pub label: Option<Cow<'a, str>>,
    /// Dimensionality.
    pub texture_type: TextureType,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels (equal to `width` for cube textures).
    pub height: u32,
    /// Depth (3D) or layer count (2D array); ignored for other types.
    pub depth: u32,
    /// Pixel format.
    pub format: PixelFormat,
    /// Number of mip levels, 0 for the full pyramid.
    pub mips: u32,
    /// Behaviour flags.
    pub flags: TextureFlags,
}

impl Default for TextureDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            texture_type: TextureType::Texture2D,
            width: 1,
            height: 1,
            depth: 1,
            format: PixelFormat::R8G8B8A8,
            mips: 0,
            flags: TextureFlags::EMPTY,
        }
    }
}

impl TextureDescriptor<'_> {
    /// Validates the descriptor and returns it with `depth` and `mips`
    /// resolved to their effective values.
    ///
    /// # Fatal errors
    /// * zero width or height;
    /// * zero depth for a 2D array or 3D texture;
    /// * a non-square cube texture.
    pub fn resolve(&self) -> Self {
        check!(self.width > 0, "Texture width must be non-zero");
        check!(self.height > 0, "Texture height must be non-zero");

        let depth = match self.texture_type {
            TextureType::Texture2DArray | TextureType::Texture3D => {
                check!(
                    self.depth > 0,
                    "Texture depth must be non-zero for {:?}",
                    self.texture_type
                );
                self.depth
            }
            _ => 1,
        };

        if self.texture_type == TextureType::TextureCube {
            check!(
                self.width == self.height,
                "Cube texture must be square (width: {}, height: {})",
                self.width,
                self.height
            );
        }

        let max_mips = max_mip_levels(self.texture_type, self.width, self.height, depth);
        let mips = if self.mips == 0 { max_mips } else { self.mips.min(max_mips) };

        Self {
            depth,
            mips,
            ..self.clone()
        }
    }
}

/// Number of levels in the full mip pyramid of a texture.
///
/// Each level halves every dimension still larger than 1; the depth only
/// shrinks for 3D textures since array layers are not filtered.
pub fn max_mip_levels(texture_type: TextureType, width: u32, height: u32, depth: u32) -> u32 {
    let mut width = width;
    let mut height = height;
    let mut depth = if texture_type == TextureType::Texture3D { depth } else { 1 };

    let mut levels = 1;
    while width > 1 || height > 1 || depth > 1 {
        width = (width >> 1).max(1);
        height = (height >> 1).max(1);
        depth = (depth >> 1).max(1);
        levels += 1;
    }
    levels
}

/// Size of mip level `mip` for a base dimension.
pub fn mip_dimension(base: u32, mip: u32) -> u32 {
    base.checked_shr(mip).unwrap_or(0).max(1)
}

/// `start..start + len` ends at or before `limit` without overflowing.
fn fits_within(start: u32, len: u32, limit: u32) -> bool {
    start.checked_add(len).is_some_and(|end| end <= limit)
}

/// A descriptor used to create a view of an existing texture.
///
/// A count of 0 means "from the base to the end of the source range".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureViewDescriptor {
    /// Dimensionality of the view.
    pub texture_type: TextureType,
    /// Format of the view, `None` to reuse the source format.
    pub format: Option<PixelFormat>,
    /// First mip level visible through the view.
    pub base_mip: u32,
    /// Number of mip levels, 0 for the remainder of the source.
    pub mips: u32,
    /// First array layer (or cube face) visible through the view.
    pub base_layer: u32,
    /// Number of layers, 0 for the remainder of the source.
    pub layers: u32,
}

/// A fully resolved texture view, as handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureViewInfo {
    /// Dimensionality of the view.
    pub texture_type: TextureType,
    /// Format of the view.
    pub format: PixelFormat,
    /// First mip level of the source visible through the view.
    pub base_mip: u32,
    /// Number of mip levels.
    pub mips: u32,
    /// First layer of the source visible through the view.
    pub base_layer: u32,
    /// Number of layers.
    pub layers: u32,
}

impl TextureViewDescriptor {
    /// Validates the descriptor against `source` and fills in the unset
    /// counts.
    ///
    /// # Fatal errors
    /// * `source` is itself a view;
    /// * the base mip or base layer lies outside the source;
    /// * the requested range runs past the end of the source;
    /// * the view type cannot be expressed over the source layers.
    pub fn resolve(&self, source: &GpuTexture) -> TextureViewInfo {
        check!(!source.is_view(), "Cannot create a view of a texture view");
        check!(
            self.base_mip < source.mips(),
            "View base mip {} outside source range (mips: {})",
            self.base_mip,
            source.mips()
        );
        check!(
            self.base_layer < source.layers(),
            "View base layer {} outside source range (layers: {})",
            self.base_layer,
            source.layers()
        );

        let mips = if self.mips == 0 { source.mips() - self.base_mip } else { self.mips };
        let layers = if self.layers == 0 { source.layers() - self.base_layer } else { self.layers };

        check!(
            self.base_mip.checked_add(mips).is_some_and(|end| end <= source.mips()),
            "View mip range {}..{} outside source range (mips: {})",
            self.base_mip,
            self.base_mip.saturating_add(mips),
            source.mips()
        );
        check!(
            self.base_layer.checked_add(layers).is_some_and(|end| end <= source.layers()),
            "View layer range {}..{} outside source range (layers: {})",
            self.base_layer,
            self.base_layer.saturating_add(layers),
            source.layers()
        );

        match self.texture_type {
            TextureType::Texture2D => {
                check!(layers == 1, "2D texture view must cover exactly one layer (got {})", layers)
            }
            TextureType::Texture2DArray => {}
            TextureType::TextureCube => {
                check!(
                    matches!(
                        source.texture_type(),
                        TextureType::TextureCube | TextureType::Texture2DArray
                    ),
                    "Cube texture view requires a cube or 2D array source"
                );
                check!(
                    layers == CubeFace::COUNT,
                    "Cube texture view must cover exactly {} layers (got {})",
                    CubeFace::COUNT,
                    layers
                );
            }
            TextureType::Texture3D => {
                check!(
                    source.texture_type() == TextureType::Texture3D,
                    "3D texture view requires a 3D source"
                )
            }
        }

        TextureViewInfo {
            texture_type: self.texture_type,
            format: self.format.unwrap_or(source.format()),
            base_mip: self.base_mip,
            mips,
            base_layer: self.base_layer,
            layers,
        }
    }
}

/// A box within one mip level of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRegion {
    /// X origin.
    pub x: u32,
    /// Y origin.
    pub y: u32,
    /// Z origin (3D textures only).
    pub z: u32,
    /// Width of the region.
    pub width: u32,
    /// Height of the region.
    pub height: u32,
    /// Depth of the region (1 for non-3D textures).
    pub depth: u32,
}

impl TextureRegion {
    /// A rectangle on a 2D image.
    pub fn area(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, z: 0, width, height, depth: 1 }
    }

    /// Number of pixels covered.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }
}

/// An opaque handle to a backend texture object (or texture view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// The part of a view that refers back to its source.
#[derive(Debug)]
struct ViewSource {
    texture: Arc<GpuTexture>,
    base_mip: u32,
    base_layer: u32,
}

/// A multi-dimensional image resource on the GPU, or a view of one.
///
/// A view shares the GPU memory of its source and keeps the source alive.
#[derive(Debug)]
pub struct GpuTexture {
    id: TextureId,
    label: Option<String>,
    texture_type: TextureType,
    width: u32,
    height: u32,
    depth: u32,
    layers: u32,
    format: PixelFormat,
    mips: u32,
    flags: TextureFlags,
    source: Option<ViewSource>,
    device: Arc<dyn GpuDevice>,
}

fn layer_count(texture_type: TextureType, depth: u32) -> u32 {
    match texture_type {
        TextureType::Texture2D | TextureType::Texture3D => 1,
        TextureType::Texture2DArray => depth,
        TextureType::TextureCube => CubeFace::COUNT,
    }
}

impl GpuTexture {
    /// `descriptor` must already be resolved.
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        id: TextureId,
        descriptor: &TextureDescriptor,
    ) -> Self {
        Self {
            id,
            label: descriptor.label.as_ref().map(|label| label.to_string()),
            texture_type: descriptor.texture_type,
            width: descriptor.width,
            height: descriptor.height,
            depth: descriptor.depth,
            layers: layer_count(descriptor.texture_type, descriptor.depth),
            format: descriptor.format,
            mips: descriptor.mips,
            flags: descriptor.flags,
            source: None,
            device,
        }
    }

    pub(crate) fn new_view(
        device: Arc<dyn GpuDevice>,
        id: TextureId,
        source: &Arc<GpuTexture>,
        view: &TextureViewInfo,
    ) -> Self {
        let depth = match view.texture_type {
            TextureType::Texture3D => mip_dimension(source.depth, view.base_mip),
            TextureType::Texture2DArray => view.layers,
            _ => 1,
        };
        Self {
            id,
            label: source.label.as_ref().map(|label| format!("{label} (view)")),
            texture_type: view.texture_type,
            width: mip_dimension(source.width, view.base_mip),
            height: mip_dimension(source.height, view.base_mip),
            depth,
            layers: view.layers,
            format: view.format,
            mips: view.mips,
            flags: TextureFlags::EMPTY,
            source: Some(ViewSource {
                texture: source.clone(),
                base_mip: view.base_mip,
                base_layer: view.base_layer,
            }),
            device,
        }
    }

    /// Backend handle of this texture.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Debug label given at creation.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Dimensionality.
    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    /// Width of mip level 0.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of mip level 0.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth of mip level 0 (3D), layer count (2D array), 1 otherwise.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of array layers: 1 for 2D and 3D, `depth` for 2D arrays, 6 for
    /// cubes.
    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of mip levels.
    pub fn mips(&self) -> u32 {
        self.mips
    }

    /// Behaviour flags.
    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    /// Whether this texture is a view of another.
    pub fn is_view(&self) -> bool {
        self.source.is_some()
    }

    /// Source of a view.
    pub fn source(&self) -> Option<&Arc<GpuTexture>> {
        self.source.as_ref().map(|source| &source.texture)
    }

    /// First source mip level of a view (0 for non-views).
    pub fn base_mip(&self) -> u32 {
        self.source.as_ref().map_or(0, |source| source.base_mip)
    }

    /// First source layer of a view (0 for non-views).
    pub fn base_layer(&self) -> u32 {
        self.source.as_ref().map_or(0, |source| source.base_layer)
    }

    /// Replaces the contents of `region` in one mip level and layer.
    ///
    /// `data` is tightly packed in the texture format. For cube textures the
    /// layer is the [`CubeFace`].
    pub fn update(&self, region: &TextureRegion, data: &[u8], mip: u32, layer: u32) {
        check!(!self.is_view(), "Cannot update texture data through a view");
        check!(mip < self.mips, "Mip level {} out of range (mips: {})", mip, self.mips);
        check!(layer < self.layers, "Layer {} out of range (layers: {})", layer, self.layers);

        let mip_width = mip_dimension(self.width, mip);
        let mip_height = mip_dimension(self.height, mip);
        let mip_depth = if self.texture_type == TextureType::Texture3D {
            mip_dimension(self.depth, mip)
        } else {
            1
        };
        check!(
            fits_within(region.x, region.width, mip_width)
                && fits_within(region.y, region.height, mip_height)
                && fits_within(region.z, region.depth, mip_depth),
            "Texture update area {:?} outside mip {} bounds ({}x{}x{})",
            region,
            mip,
            mip_width,
            mip_height,
            mip_depth
        );

        let expected = region.pixel_count() * self.format.bytes_per_pixel() as u64;
        check!(
            data.len() as u64 == expected,
            "Texture update data is {} bytes, expected {}",
            data.len(),
            expected
        );

        if let Err(err) = self.device.write_texture(self.id, region, mip, layer, data) {
            fatal!("Failed to update texture {:?}: {}", self.id, err);
        }
    }

    /// Regenerates mip levels 1.. from level 0.
    pub fn generate_mipmap(&self) {
        check!(!self.is_view(), "Cannot generate mipmaps through a view");
        check!(
            self.flags.contains(TextureFlags::AUTO_MIPMAP),
            "Texture {:?} was not created with AUTO_MIPMAP",
            self.id
        );

        if let Err(err) = self.device.generate_mipmap(self.id) {
            fatal!("Failed to generate mipmaps for texture {:?}: {}", self.id, err);
        }
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        if let Err(err) = self.device.destroy_texture(self.id) {
            log::warn!("Failed to destroy texture {:?}: {}", self.id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::mock_manager;

    fn descriptor(
        texture_type: TextureType,
        width: u32,
        height: u32,
        depth: u32,
    ) -> TextureDescriptor<'static> {
        TextureDescriptor {
            texture_type,
            width,
            height,
            depth,
            ..Default::default()
        }
    }

    #[test]
    fn zero_mips_selects_full_pyramid() {
        for (width, height) in [(1, 1), (2, 1), (256, 256), (640, 480), (1, 1000)] {
            let resolved = descriptor(TextureType::Texture2D, width, height, 1).resolve();
            let expected = (width.max(height) as f32).log2().floor() as u32 + 1;
            assert_eq!(resolved.mips, expected, "{width}x{height}");
        }
    }

    #[test]
    fn three_dimensional_depth_counts_towards_the_pyramid() {
        let resolved = descriptor(TextureType::Texture3D, 4, 4, 32).resolve();
        assert_eq!(resolved.mips, 6);

        let array = descriptor(TextureType::Texture2DArray, 4, 4, 32).resolve();
        assert_eq!(array.mips, 3);
    }

    #[test]
    fn requested_mips_are_clamped() {
        let mut desc = descriptor(TextureType::Texture2D, 64, 16, 1);
        desc.mips = 20;
        assert_eq!(desc.resolve().mips, 7);

        desc.mips = 3;
        assert_eq!(desc.resolve().mips, 3);
    }

    #[test]
    fn depth_is_forced_to_one_for_flat_types() {
        let resolved = descriptor(TextureType::Texture2D, 8, 8, 12).resolve();
        assert_eq!(resolved.depth, 1);
        let cube = descriptor(TextureType::TextureCube, 8, 8, 0).resolve();
        assert_eq!(cube.depth, 1);
    }

    #[test]
    #[should_panic(expected = "Cube texture must be square (width: 8, height: 4)")]
    fn non_square_cube_is_fatal() {
        descriptor(TextureType::TextureCube, 8, 4, 1).resolve();
    }

    #[test]
    #[should_panic(expected = "Texture depth must be non-zero")]
    fn zero_depth_array_is_fatal() {
        descriptor(TextureType::Texture2DArray, 8, 8, 0).resolve();
    }

    #[test]
    #[should_panic(expected = "Texture width must be non-zero")]
    fn zero_width_is_fatal() {
        descriptor(TextureType::Texture2D, 0, 8, 1).resolve();
    }

    #[test]
    fn view_counts_default_to_remainder_of_source() {
        let (_device, manager) = mock_manager();
        let source = manager.create_texture(&descriptor(TextureType::Texture2DArray, 64, 64, 8));

        let view = manager.create_texture_view(
            &source,
            &TextureViewDescriptor {
                texture_type: TextureType::Texture2DArray,
                base_mip: 2,
                base_layer: 3,
                ..Default::default()
            },
        );

        assert_eq!(view.mips(), source.mips() - 2);
        assert_eq!(view.layers(), source.depth() - 3);
        assert_eq!(view.width(), 16);
        assert_eq!(view.base_layer(), 3);
        assert!(view.is_view());
        assert!(Arc::ptr_eq(view.source().unwrap(), &source));
    }

    #[test]
    fn cube_source_layers_are_faces() {
        let (_device, manager) = mock_manager();
        let cube = manager.create_texture(&descriptor(TextureType::TextureCube, 32, 32, 1));

        let faces = manager.create_texture_view(
            &cube,
            &TextureViewDescriptor {
                texture_type: TextureType::Texture2DArray,
                base_layer: 2,
                ..Default::default()
            },
        );
        assert_eq!(faces.layers(), CubeFace::COUNT - 2);

        let face = manager.create_texture_view(
            &cube,
            &TextureViewDescriptor {
                texture_type: TextureType::Texture2D,
                base_layer: CubeFace::NegativeZ.layer(),
                layers: 1,
                ..Default::default()
            },
        );
        assert_eq!(face.layers(), 1);
        assert_eq!(face.mips(), cube.mips());
    }

    #[test]
    #[should_panic(expected = "Cannot create a view of a texture view")]
    fn view_of_a_view_is_fatal() {
        let (_device, manager) = mock_manager();
        let source = manager.create_texture(&descriptor(TextureType::Texture2DArray, 8, 8, 4));
        let view = manager.create_texture_view(
            &source,
            &TextureViewDescriptor {
                texture_type: TextureType::Texture2DArray,
                ..Default::default()
            },
        );
        manager.create_texture_view(&view, &TextureViewDescriptor::default());
    }

    #[test]
    #[should_panic(expected = "View base mip 4 outside source range (mips: 4)")]
    fn view_base_mip_must_lie_within_source() {
        let (_device, manager) = mock_manager();
        let source = manager.create_texture(&descriptor(TextureType::Texture2D, 8, 8, 1));
        manager.create_texture_view(
            &source,
            &TextureViewDescriptor {
                base_mip: 4,
                ..Default::default()
            },
        );
    }

    #[test]
    #[should_panic(expected = "View mip range 1..4294967295 outside source range (mips: 4)")]
    fn view_mip_range_cannot_wrap_around() {
        let (_device, manager) = mock_manager();
        let source = manager.create_texture(&descriptor(TextureType::Texture2D, 8, 8, 1));
        manager.create_texture_view(
            &source,
            &TextureViewDescriptor {
                base_mip: 1,
                mips: u32::MAX,
                ..Default::default()
            },
        );
    }

    #[test]
    #[should_panic(expected = "outside mip 0 bounds (8x8x1)")]
    fn update_area_cannot_wrap_around() {
        let (_device, manager) = mock_manager();
        let texture = manager.create_texture(&descriptor(TextureType::Texture2D, 8, 8, 1));
        texture.update(&TextureRegion::area(u32::MAX, 0, 2, 2), &[0; 2 * 2 * 4], 0, 0);
    }

    #[test]
    #[should_panic(expected = "outside mip 1 bounds")]
    fn update_outside_mip_is_fatal() {
        let (_device, manager) = mock_manager();
        let texture = manager.create_texture(&descriptor(TextureType::Texture2D, 8, 8, 1));
        texture.update(&TextureRegion::area(0, 0, 8, 8), &[0; 8 * 8 * 4], 1, 0);
    }

    #[test]
    fn update_reaches_the_backend() {
        let (device, manager) = mock_manager();
        let texture = manager.create_texture(&descriptor(TextureType::Texture2D, 4, 4, 1));
        texture.update(&TextureRegion::area(1, 1, 2, 2), &[0xFF; 2 * 2 * 4], 0, 0);
        assert_eq!(device.texture_writes(), 1);
    }

    #[test]
    #[should_panic(expected = "was not created with AUTO_MIPMAP")]
    fn mipmap_generation_requires_flag() {
        let (_device, manager) = mock_manager();
        let texture = manager.create_texture(&descriptor(TextureType::Texture2D, 4, 4, 1));
        texture.generate_mipmap();
    }
}
