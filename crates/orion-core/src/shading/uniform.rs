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

use super::ShaderParameterType;
use crate::{check, fatal};
use std::fmt::Write;

/// One member of a [`UniformStruct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    /// Member name.
    pub name: String,
    /// Member type. Never a texture.
    pub member_type: ShaderParameterType,
    /// Byte offset within the struct.
    pub offset: usize,
}

impl UniformMember {
    /// Size of the member in bytes.
    pub fn size(&self) -> usize {
        self.member_type.size()
    }
}

/// The std140 layout of a uniform block.
///
/// Members are laid out in insertion order, each at the struct size so far
/// rounded up to its type alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformStruct {
    name: String,
    members: Vec<UniformMember>,
    size: usize,
}

impl UniformStruct {
    /// Creates an empty struct.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            size: 0,
        }
    }

    /// Struct name, used as the GLSL block name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in layout order.
    pub fn members(&self) -> &[UniformMember] {
        &self.members
    }

    /// Total size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the struct has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Appends a member and returns it.
    ///
    /// # Fatal errors
    /// * a member named `name` already exists;
    /// * `member_type` is a texture.
    pub fn add_member(&mut self, name: &str, member_type: ShaderParameterType) -> &UniformMember {
        check!(
            !member_type.is_texture(),
            "Uniform struct member '{}' in '{}' cannot be a texture",
            name,
            self.name
        );
        if self.lookup_member(name).is_some() {
            fatal!("Adding duplicate member '{}' to uniform struct '{}'", name, self.name);
        }

        let offset = self.size.next_multiple_of(member_type.alignment());
        self.size = offset + member_type.size();
        self.members.push(UniformMember {
            name: name.to_string(),
            member_type,
            offset,
        });
        &self.members[self.members.len() - 1]
    }

    /// Finds a member by name.
    pub fn lookup_member(&self, name: &str) -> Option<&UniformMember> {
        self.members.iter().find(|member| member.name == name)
    }

    /// GLSL declaration of the block at the given set and binding.
    ///
    /// ```text
    /// layout(std140, set = 2, binding = 0) uniform MaterialUniforms {
    ///     vec4 colour;
    ///     float shininess;
    /// } material;
    /// ```
    pub fn generate_glsl(&self, set: usize, binding: usize, instance_name: &str) -> String {
        let mut glsl = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(
            glsl,
            "layout(std140, set = {}, binding = {}) uniform {} {{",
            set, binding, self.name
        );
        for member in &self.members {
            let _ = writeln!(glsl, "    {} {};", member.member_type.glsl_type(), member.name);
        }
        if instance_name.is_empty() {
            glsl.push_str("};\n");
        } else {
            let _ = writeln!(glsl, "}} {};", instance_name);
        }
        glsl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::ShaderParameterType::*;

    #[test]
    fn members_follow_std140_offsets() {
        let mut uniforms = UniformStruct::new("MaterialUniforms");
        let layout = [
            ("shininess", Float, 0),
            ("tint", Vec3, 16),
            ("flags", UnsignedInt, 28),
            ("offset", Vec2, 32),
            ("transform", Mat3, 48),
            ("index", Int, 96),
            ("cells", IntVec4, 112),
            ("projection", Mat4, 128),
            ("scale", Mat2, 192),
        ];

        for (name, member_type, offset) in layout {
            assert_eq!(uniforms.add_member(name, member_type).offset, offset, "{name}");
        }

        assert_eq!(uniforms.size(), 224);
        assert_eq!(uniforms.lookup_member("flags").map(|m| m.offset), Some(28));
        assert!(uniforms.lookup_member("missing").is_none());
    }

    #[test]
    fn vec3_after_float_packs_tightly() {
        let mut uniforms = UniformStruct::new("Block");
        uniforms.add_member("direction", Vec3);
        assert_eq!(uniforms.add_member("intensity", Float).offset, 12);
        assert_eq!(uniforms.size(), 16);
    }

    #[test]
    #[should_panic(
        expected = "Adding duplicate member 'tint' to uniform struct 'MaterialUniforms'"
    )]
    fn duplicate_member_is_fatal() {
        let mut uniforms = UniformStruct::new("MaterialUniforms");
        uniforms.add_member("tint", Vec4);
        uniforms.add_member("tint", Float);
    }

    #[test]
    #[should_panic(expected = "cannot be a texture")]
    fn texture_member_is_fatal() {
        UniformStruct::new("MaterialUniforms").add_member("albedo", Texture);
    }

    #[test]
    fn glsl_declares_members_in_order() {
        let mut uniforms = UniformStruct::new("MaterialUniforms");
        uniforms.add_member("colour", Vec4);
        uniforms.add_member("shininess", Float);

        assert_eq!(
            uniforms.generate_glsl(2, 0, "material"),
            concat!(
                "layout(std140, set = 2, binding = 0) uniform MaterialUniforms {\n",
                "    vec4 colour;\n",
                "    float shininess;\n",
                "} material;\n",
            )
        );
        assert!(uniforms.generate_glsl(2, 0, "").ends_with("};\n"));
    }
}
