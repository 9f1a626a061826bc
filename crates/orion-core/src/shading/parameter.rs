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

//! Shader parameter types and their std140 representation.

use super::UnknownNameError;
use crate::asset::AssetHandle;
use crate::check;
use crate::resources::Texture2D;
use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use std::fmt;
use std::str::FromStr;

/// Type of a shader parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderParameterType {
    /// `int`
    Int,
    /// `uint`
    UnsignedInt,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat2`
    Mat2,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `ivec2`
    IntVec2,
    /// `ivec3`
    IntVec3,
    /// `ivec4`
    IntVec4,
    /// A 2D texture, bound through a resource slot rather than a uniform.
    Texture,
}

impl ShaderParameterType {
    /// Size of the type in a std140 uniform block.
    ///
    /// # Fatal errors
    /// * called on [`Texture`](Self::Texture).
    pub fn size(self) -> usize {
        match self {
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Vec2 | Self::IntVec2 => 8,
            Self::Vec3 | Self::IntVec3 => 12,
            Self::Vec4 | Self::IntVec4 => 16,
            Self::Mat2 => 32,
            Self::Mat3 => 48,
            Self::Mat4 => 64,
            Self::Texture => crate::fatal!("Texture parameters have no uniform size"),
        }
    }

    /// Alignment of the type in a std140 uniform block.
    ///
    /// # Fatal errors
    /// * called on [`Texture`](Self::Texture).
    pub fn alignment(self) -> usize {
        match self {
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Vec2 | Self::IntVec2 => 8,
            Self::Vec3 | Self::IntVec3 | Self::Vec4 | Self::IntVec4 => 16,
            Self::Mat2 | Self::Mat3 | Self::Mat4 => 16,
            Self::Texture => crate::fatal!("Texture parameters have no uniform alignment"),
        }
    }

    /// Whether the parameter is a texture.
    pub fn is_texture(self) -> bool {
        self == Self::Texture
    }

    /// GLSL spelling of the type.
    pub fn glsl_type(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::UnsignedInt => "uint",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::IntVec2 => "ivec2",
            Self::IntVec3 => "ivec3",
            Self::IntVec4 => "ivec4",
            Self::Texture => "sampler2D",
        }
    }

    /// Name of the type in shader descriptions.
    pub fn name(self) -> &'static str {
        match self {
            Self::Texture => "texture",
            other => other.glsl_type(),
        }
    }

    /// Number of scalar components, for non-texture types.
    pub fn components(self) -> usize {
        match self {
            Self::Int | Self::UnsignedInt | Self::Float => 1,
            Self::Vec2 | Self::IntVec2 => 2,
            Self::Vec3 | Self::IntVec3 => 3,
            Self::Vec4 | Self::IntVec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
            Self::Texture => 0,
        }
    }
}

impl fmt::Display for ShaderParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderParameterType {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "int" => Self::Int,
            "uint" => Self::UnsignedInt,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "mat2" => Self::Mat2,
            "mat3" => Self::Mat3,
            "mat4" => Self::Mat4,
            "ivec2" => Self::IntVec2,
            "ivec3" => Self::IntVec3,
            "ivec4" => Self::IntVec4,
            "texture" => Self::Texture,
            other => {
                return Err(UnknownNameError {
                    kind: "shader parameter type",
                    name: other.to_string(),
                })
            }
        })
    }
}

/// A Rust type usable as the value of a non-texture shader parameter.
pub trait ShaderParameterValue: Sized {
    /// The matching parameter type.
    const TYPE: ShaderParameterType;

    /// Writes the std140 representation into `out`, which is exactly
    /// `TYPE.size()` bytes long.
    fn write_std140(&self, out: &mut [u8]);

    /// Reads a value from its std140 representation.
    fn read_std140(data: &[u8]) -> Self;
}

macro_rules! plain_parameter_value {
    ($($ty:ty => $param:ident),* $(,)?) => {
        $(
            impl ShaderParameterValue for $ty {
                const TYPE: ShaderParameterType = ShaderParameterType::$param;

                fn write_std140(&self, out: &mut [u8]) {
                    out.copy_from_slice(bytemuck::bytes_of(self));
                }

                fn read_std140(data: &[u8]) -> Self {
                    bytemuck::pod_read_unaligned(data)
                }
            }
        )*
    };
}

plain_parameter_value! {
    i32 => Int,
    u32 => UnsignedInt,
    f32 => Float,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    IVec2 => IntVec2,
    IVec3 => IntVec3,
    IVec4 => IntVec4,
    Mat4 => Mat4,
}

/// Matrix columns occupy a full vec4 each.
const COLUMN_STRIDE: usize = 16;

impl ShaderParameterValue for Mat2 {
    const TYPE: ShaderParameterType = ShaderParameterType::Mat2;

    fn write_std140(&self, out: &mut [u8]) {
        out.fill(0);
        for (index, column) in [self.x_axis, self.y_axis].iter().enumerate() {
            let start = index * COLUMN_STRIDE;
            out[start..start + 8].copy_from_slice(bytemuck::bytes_of(column));
        }
    }

    fn read_std140(data: &[u8]) -> Self {
        let column = |index: usize| -> Vec2 {
            let start = index * COLUMN_STRIDE;
            bytemuck::pod_read_unaligned(&data[start..start + 8])
        };
        Mat2::from_cols(column(0), column(1))
    }
}

impl ShaderParameterValue for Mat3 {
    const TYPE: ShaderParameterType = ShaderParameterType::Mat3;

    fn write_std140(&self, out: &mut [u8]) {
        out.fill(0);
        for (index, column) in [self.x_axis, self.y_axis, self.z_axis].iter().enumerate() {
            let start = index * COLUMN_STRIDE;
            out[start..start + 12].copy_from_slice(bytemuck::bytes_of(column));
        }
    }

    fn read_std140(data: &[u8]) -> Self {
        let column = |index: usize| -> Vec3 {
            let start = index * COLUMN_STRIDE;
            bytemuck::pod_read_unaligned(&data[start..start + 12])
        };
        Mat3::from_cols(column(0), column(1), column(2))
    }
}

/// A parameter value of any type.
#[derive(Debug, Clone)]
pub enum ParameterValue {
    /// `int`
    Int(i32),
    /// `uint`
    UnsignedInt(u32),
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat2`
    Mat2(Mat2),
    /// `mat3`
    Mat3(Mat3),
    /// `mat4`
    Mat4(Mat4),
    /// `ivec2`
    IntVec2(IVec2),
    /// `ivec3`
    IntVec3(IVec3),
    /// `ivec4`
    IntVec4(IVec4),
    /// A texture, or none.
    Texture(Option<AssetHandle<Texture2D>>),
}

impl ParameterValue {
    /// Type of the value.
    pub fn parameter_type(&self) -> ShaderParameterType {
        match self {
            Self::Int(_) => ShaderParameterType::Int,
            Self::UnsignedInt(_) => ShaderParameterType::UnsignedInt,
            Self::Float(_) => ShaderParameterType::Float,
            Self::Vec2(_) => ShaderParameterType::Vec2,
            Self::Vec3(_) => ShaderParameterType::Vec3,
            Self::Vec4(_) => ShaderParameterType::Vec4,
            Self::Mat2(_) => ShaderParameterType::Mat2,
            Self::Mat3(_) => ShaderParameterType::Mat3,
            Self::Mat4(_) => ShaderParameterType::Mat4,
            Self::IntVec2(_) => ShaderParameterType::IntVec2,
            Self::IntVec3(_) => ShaderParameterType::IntVec3,
            Self::IntVec4(_) => ShaderParameterType::IntVec4,
            Self::Texture(_) => ShaderParameterType::Texture,
        }
    }

    /// std140 bytes of a non-texture value.
    ///
    /// # Fatal errors
    /// * the value is a texture.
    pub fn to_std140(&self) -> Vec<u8> {
        fn encode<T: ShaderParameterValue>(value: &T) -> Vec<u8> {
            let mut out = vec![0; T::TYPE.size()];
            value.write_std140(&mut out);
            out
        }

        match self {
            Self::Int(v) => encode(v),
            Self::UnsignedInt(v) => encode(v),
            Self::Float(v) => encode(v),
            Self::Vec2(v) => encode(v),
            Self::Vec3(v) => encode(v),
            Self::Vec4(v) => encode(v),
            Self::Mat2(v) => encode(v),
            Self::Mat3(v) => encode(v),
            Self::Mat4(v) => encode(v),
            Self::IntVec2(v) => encode(v),
            Self::IntVec3(v) => encode(v),
            Self::IntVec4(v) => encode(v),
            Self::Texture(_) => crate::fatal!("Texture values have no uniform representation"),
        }
    }

    /// Decodes a non-texture value of `parameter_type` from std140 bytes.
    ///
    /// # Fatal errors
    /// * `parameter_type` is a texture;
    /// * `data` is not exactly the size of the type.
    pub fn from_std140(parameter_type: ShaderParameterType, data: &[u8]) -> Self {
        check!(
            data.len() == parameter_type.size(),
            "Expected {} bytes for a {} value, got {}",
            parameter_type.size(),
            parameter_type,
            data.len()
        );

        match parameter_type {
            ShaderParameterType::Int => Self::Int(i32::read_std140(data)),
            ShaderParameterType::UnsignedInt => Self::UnsignedInt(u32::read_std140(data)),
            ShaderParameterType::Float => Self::Float(f32::read_std140(data)),
            ShaderParameterType::Vec2 => Self::Vec2(Vec2::read_std140(data)),
            ShaderParameterType::Vec3 => Self::Vec3(Vec3::read_std140(data)),
            ShaderParameterType::Vec4 => Self::Vec4(Vec4::read_std140(data)),
            ShaderParameterType::Mat2 => Self::Mat2(Mat2::read_std140(data)),
            ShaderParameterType::Mat3 => Self::Mat3(Mat3::read_std140(data)),
            ShaderParameterType::Mat4 => Self::Mat4(Mat4::read_std140(data)),
            ShaderParameterType::IntVec2 => Self::IntVec2(IVec2::read_std140(data)),
            ShaderParameterType::IntVec3 => Self::IntVec3(IVec3::read_std140(data)),
            ShaderParameterType::IntVec4 => Self::IntVec4(IVec4::read_std140(data)),
            ShaderParameterType::Texture => unreachable!("texture size check is fatal"),
        }
    }
}

macro_rules! parameter_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

parameter_value_from! {
    i32 => Int,
    u32 => UnsignedInt,
    f32 => Float,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
    IVec2 => IntVec2,
    IVec3 => IntVec3,
    IVec4 => IntVec4,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    #[test]
    fn type_names_parse_back() {
        for name in [
            "int", "uint", "float", "vec2", "vec3", "vec4", "mat2", "mat3", "mat4", "ivec2",
            "ivec3", "ivec4", "texture",
        ] {
            let parsed: ShaderParameterType = name.parse().unwrap();
            assert_eq!(parsed.name(), name);
        }
        let err = "double".parse::<ShaderParameterType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown shader parameter type 'double'");
    }

    #[test]
    fn vec3_is_twelve_bytes_aligned_to_sixteen() {
        assert_eq!(ShaderParameterType::Vec3.size(), 12);
        assert_eq!(ShaderParameterType::Vec3.alignment(), 16);
        assert_eq!(ShaderParameterType::IntVec3.size(), 12);
        assert_eq!(ShaderParameterType::Mat3.size(), 48);
    }

    #[test]
    fn mat3_columns_are_padded() {
        let matrix = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let bytes = ParameterValue::Mat3(matrix).to_std140();

        assert_eq!(floats(&bytes), [1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0, 7.0, 8.0, 9.0, 0.0]);
        assert!(matches!(
            ParameterValue::from_std140(ShaderParameterType::Mat3, &bytes),
            ParameterValue::Mat3(decoded) if decoded == matrix
        ));
    }

    #[test]
    fn mat2_columns_are_padded() {
        let matrix = Mat2::from_cols(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0));
        let mut bytes = [0xFFu8; 32];
        matrix.write_std140(&mut bytes);

        assert_eq!(floats(&bytes), [1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0]);
        assert_eq!(Mat2::read_std140(&bytes), matrix);
    }

    #[test]
    #[should_panic(expected = "Expected 16 bytes for a vec4 value, got 12")]
    fn decoding_with_wrong_size_is_fatal() {
        ParameterValue::from_std140(ShaderParameterType::Vec4, &[0; 12]);
    }
}
