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

//! CPU storage for texture images.

use orion_core::gpu::{
    mip_dimension, PixelFormat, ResourceError, TextureDescriptor, TextureRegion, TextureType,
};

/// Every mip level of every layer of one texture, tightly packed.
#[derive(Debug)]
pub(crate) struct TextureStorage {
    texture_type: TextureType,
    width: u32,
    height: u32,
    depth: u32,
    layers: u32,
    format: PixelFormat,
    mips: u32,
    /// Indexed by `mip * layers + layer`.
    levels: Vec<Vec<u8>>,
}

impl TextureStorage {
    pub(crate) fn new(descriptor: &TextureDescriptor) -> Self {
        let layers = match descriptor.texture_type {
            TextureType::Texture2D | TextureType::Texture3D => 1,
            TextureType::Texture2DArray => descriptor.depth,
            TextureType::TextureCube => 6,
        };
        let depth = if descriptor.texture_type == TextureType::Texture3D {
            descriptor.depth
        } else {
            1
        };

        let mut storage = Self {
            texture_type: descriptor.texture_type,
            width: descriptor.width,
            height: descriptor.height,
            depth,
            layers,
            format: descriptor.format,
            mips: descriptor.mips,
            levels: Vec::new(),
        };
        storage.levels = (0..storage.mips)
            .flat_map(|mip| std::iter::repeat(mip).take(layers as usize))
            .map(|mip| vec![0; storage.level_size(mip)])
            .collect();
        storage
    }

    /// Total bytes held.
    pub(crate) fn byte_size(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub(crate) fn level(&self, mip: u32, layer: u32) -> Option<&[u8]> {
        if mip >= self.mips || layer >= self.layers {
            return None;
        }
        self.levels.get(self.level_index(mip, layer)).map(Vec::as_slice)
    }

    pub(crate) fn write(
        &mut self,
        region: &TextureRegion,
        mip: u32,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        if mip >= self.mips || layer >= self.layers {
            return Err(ResourceError::OutOfBounds);
        }
        let (width, height, depth) = self.level_extent(mip);
        let fits = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(region.x, region.width, width)
            || !fits(region.y, region.height, height)
            || !fits(region.z, region.depth, depth)
        {
            return Err(ResourceError::OutOfBounds);
        }
        let bpp = self.format.bytes_per_pixel() as usize;
        let row = region.width as usize * bpp;
        if data.len() != row * region.height as usize * region.depth as usize {
            return Err(ResourceError::BackendError(format!(
                "texture upload of {} bytes does not match region {:?}",
                data.len(),
                region
            )));
        }

        let index = self.level_index(mip, layer);
        let level = &mut self.levels[index];
        for z in 0..region.depth as usize {
            for y in 0..region.height as usize {
                let src = (z * region.height as usize + y) * row;
                let dst_row = (region.z as usize + z) * height as usize + region.y as usize + y;
                let dst_texel = dst_row * width as usize + region.x as usize;
                let dst = dst_texel * bpp;
                level[dst..dst + row].copy_from_slice(&data[src..src + row]);
            }
        }
        Ok(())
    }

    /// Box-filters every level from the one above it.
    pub(crate) fn generate_mipmap(&mut self) -> Result<(), ResourceError> {
        let channel = match self.format {
            PixelFormat::R8G8B8A8
            | PixelFormat::B8G8R8A8
            | PixelFormat::R8G8B8
            | PixelFormat::R8G8
            | PixelFormat::R8 => Channel::Unorm8,
            PixelFormat::FloatR32G32B32A32 => Channel::Float32,
            other => {
                return Err(ResourceError::Unsupported(format!(
                    "mipmap generation for {:?}",
                    other
                )))
            }
        };
        let components = (self.format.bytes_per_pixel() / channel.size()) as usize;

        for mip in 1..self.mips {
            let src_extent = self.level_extent(mip - 1);
            let dst_extent = self.level_extent(mip);
            for layer in 0..self.layers {
                let src = &self.levels[self.level_index(mip - 1, layer)];
                let filtered = downsample(src, src_extent, dst_extent, components, channel);
                let index = self.level_index(mip, layer);
                self.levels[index] = filtered;
            }
        }
        Ok(())
    }

    fn level_index(&self, mip: u32, layer: u32) -> usize {
        (mip * self.layers + layer) as usize
    }

    fn level_extent(&self, mip: u32) -> (u32, u32, u32) {
        let depth = if self.texture_type == TextureType::Texture3D {
            mip_dimension(self.depth, mip)
        } else {
            1
        };
        (mip_dimension(self.width, mip), mip_dimension(self.height, mip), depth)
    }

    fn level_size(&self, mip: u32) -> usize {
        let (width, height, depth) = self.level_extent(mip);
        width as usize * height as usize * depth as usize * self.format.bytes_per_pixel() as usize
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Unorm8,
    Float32,
}

impl Channel {
    fn size(self) -> u32 {
        match self {
            Channel::Unorm8 => 1,
            Channel::Float32 => 4,
        }
    }

    fn read(self, data: &[u8], index: usize) -> f32 {
        match self {
            Channel::Unorm8 => data[index] as f32,
            Channel::Float32 => {
                let at = index * 4;
                f32::from_ne_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
            }
        }
    }

    fn write(self, out: &mut Vec<u8>, value: f32) {
        match self {
            Channel::Unorm8 => out.push(value.round().clamp(0.0, 255.0) as u8),
            Channel::Float32 => out.extend_from_slice(&value.to_ne_bytes()),
        }
    }
}

fn downsample(
    src: &[u8],
    (src_w, src_h, src_d): (u32, u32, u32),
    (dst_w, dst_h, dst_d): (u32, u32, u32),
    components: usize,
    channel: Channel,
) -> Vec<u8> {
    let (src_w, src_h, src_d) = (src_w as usize, src_h as usize, src_d as usize);
    let texels = dst_w as usize * dst_h as usize * dst_d as usize;
    let mut out = Vec::with_capacity(texels * components * channel.size() as usize);

    for z in 0..dst_d as usize {
        for y in 0..dst_h as usize {
            for x in 0..dst_w as usize {
                // Footprint in the source level, clamped where a dimension stopped halving.
                let xs = [2 * x, (2 * x + 1).min(src_w - 1)];
                let ys = [2 * y, (2 * y + 1).min(src_h - 1)];
                let zs = [2 * z, (2 * z + 1).min(src_d - 1)];
                for component in 0..components {
                    let mut sum = 0.0;
                    let mut count = 0.0;
                    for &sz in &zs {
                        for &sy in &ys {
                            for &sx in &xs {
                                let texel = (sz * src_h + sy) * src_w + sx;
                                sum += channel.read(src, texel * components + component);
                                count += 1.0;
                            }
                        }
                    }
                    channel.write(&mut out, sum / count);
                }
            }
        }
    }
    out
}
