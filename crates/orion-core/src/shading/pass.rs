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

//! Render passes of a shader and their keyword variations.

use super::UnknownNameError;
use crate::fatal;
use crate::gpu::{
    resource_sets, GpuManager, GpuPipeline, GpuPipelineDescriptor, GpuResourceSetLayout,
    ProgramDescriptor, ResourceError, ShaderStage,
};
use std::fmt::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

/// GLSL version every generated stage source declares.
pub const GLSL_VERSION: u32 = 450;

/// Vertex input locations shared by meshes and vertex programs.
pub mod vertex_attributes {
    /// Object-space position, `vec3`.
    pub const POSITION: u32 = 0;
    /// Object-space normal, `vec3`.
    pub const NORMAL: u32 = 1;
    /// Texture coordinate, `vec2`.
    pub const TEXCOORD: u32 = 2;
}

/// The renderer stages a shader can take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassType {
    /// Forward rendering.
    Basic,
    /// G-buffer fill.
    Deferred,
    /// Depth-only rendering into shadow maps.
    ShadowCaster,
    /// Light accumulation over the G-buffer.
    DeferredLight,
    /// Full-screen post-processing.
    PostEffect,
}

impl PassType {
    /// Number of pass types.
    pub const COUNT: usize = 5;

    /// Every pass type, in index order.
    pub const ALL: [PassType; Self::COUNT] = [
        PassType::Basic,
        PassType::Deferred,
        PassType::ShadowCaster,
        PassType::DeferredLight,
        PassType::PostEffect,
    ];

    /// Position in [`PassType::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in shader definition files.
    pub fn name(self) -> &'static str {
        match self {
            PassType::Basic => "Basic",
            PassType::Deferred => "Deferred",
            PassType::ShadowCaster => "ShadowCaster",
            PassType::DeferredLight => "DeferredLight",
            PassType::PostEffect => "PostEffect",
        }
    }

    /// Preprocessor symbol defined in every program of this pass type.
    pub fn define(self) -> &'static str {
        match self {
            PassType::Basic => "BASIC_PASS",
            PassType::Deferred => "DEFERRED_PASS",
            PassType::ShadowCaster => "SHADOW_CASTER_PASS",
            PassType::DeferredLight => "DEFERRED_LIGHT_PASS",
            PassType::PostEffect => "POST_EFFECT_PASS",
        }
    }

    /// Keyword sets a pass of this type is compiled with.
    pub fn variations(self) -> &'static [&'static [&'static str]] {
        match self {
            PassType::DeferredLight => &[
                &["AMBIENT_LIGHT"],
                &["DIRECTIONAL_LIGHT"],
                &["DIRECTIONAL_LIGHT", "SHADOW"],
                &["POINT_LIGHT"],
                &["POINT_LIGHT", "SHADOW"],
                &["SPOT_LIGHT"],
                &["SPOT_LIGHT", "SHADOW"],
            ],
            _ => &[&[]],
        }
    }
}

impl fmt::Display for PassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PassType {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PassType::ALL
            .into_iter()
            .find(|pass_type| pass_type.name() == s)
            .ok_or_else(|| UnknownNameError {
                kind: "pass type",
                name: s.to_string(),
            })
    }
}

/// Key identifying a variation: its keywords joined by spaces.
pub fn variation_key(keywords: &[&str]) -> String {
    keywords.join(" ")
}

/// Source of one stage of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSource {
    /// Name used for the compiled programs, usually the source asset path.
    pub name: String,
    /// GLSL body, without version or declarations.
    pub source: String,
    /// Additional symbols defined for this stage in every variation.
    pub keywords: Vec<String>,
}

impl StageSource {
    /// A stage source without extra keywords.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            keywords: Vec::new(),
        }
    }

    /// Adds a keyword defined for this stage.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }
}

/// Definition of one pass of a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassDescriptor {
    /// Renderer stage the pass belongs to.
    pub pass_type: PassType,
    /// Per-stage sources, indexed by [`ShaderStage::index`].
    pub stages: [Option<StageSource>; ShaderStage::COUNT],
}

impl PassDescriptor {
    /// A pass with no stages yet.
    pub fn new(pass_type: PassType) -> Self {
        Self {
            pass_type,
            stages: Default::default(),
        }
    }

    /// Sets the source of `stage`.
    pub fn with_stage(mut self, stage: ShaderStage, source: StageSource) -> Self {
        self.stages[stage.index()] = Some(source);
        self
    }
}

/// A compiled pass: one pipeline per keyword variation of its type.
#[derive(Debug)]
pub struct Pass {
    pass_type: PassType,
    pipelines: Vec<(String, Arc<GpuPipeline>)>,
}

impl Pass {
    /// Compiles every variation of `descriptor`.
    ///
    /// `declarations` is the GLSL declaring the shader's material resources;
    /// it is placed after the defines and before the stage body. `layout`
    /// is used at the material set of every pipeline.
    pub(crate) fn build(
        gpu: &GpuManager,
        descriptor: &PassDescriptor,
        declarations: &str,
        layout: &Arc<GpuResourceSetLayout>,
    ) -> Result<Self, ResourceError> {
        let pass_type = descriptor.pass_type;
        let mut pipelines = Vec::new();

        for keywords in pass_type.variations() {
            let key = variation_key(keywords);
            let mut pipeline = GpuPipelineDescriptor::new(format!("{} [{}]", pass_type, key))
                .with_resource_layout(resource_sets::MATERIAL, layout.clone());

            for stage in ShaderStage::ALL {
                let Some(stage_source) = &descriptor.stages[stage.index()] else {
                    continue;
                };
                let program = gpu.create_program(&ProgramDescriptor {
                    name: program_name(&stage_source.name, keywords),
                    stage,
                    source: generate_source(pass_type, stage, stage_source, keywords, declarations)
                        .into_bytes(),
                })?;
                pipeline = pipeline.with_program(program);
            }

            log::trace!("Built {} pass variation '{}'", pass_type, key);
            pipelines.push((key, gpu.create_pipeline(pipeline)));
        }

        Ok(Self { pass_type, pipelines })
    }

    /// The pass type.
    pub fn pass_type(&self) -> PassType {
        self.pass_type
    }

    /// Variation keys in declaration order.
    pub fn variations(&self) -> impl Iterator<Item = &str> {
        self.pipelines.iter().map(|(key, _)| key.as_str())
    }

    /// Pipeline for the variation with the given keywords.
    ///
    /// # Fatal errors
    /// * the pass type has no such variation.
    pub fn pipeline(&self, keywords: &[&str]) -> &Arc<GpuPipeline> {
        let key = variation_key(keywords);
        match self.pipelines.iter().find(|(candidate, _)| *candidate == key) {
            Some((_, pipeline)) => pipeline,
            None => fatal!("Unknown variation '{}' for {} pass", key, self.pass_type),
        }
    }
}

fn program_name(name: &str, keywords: &[&str]) -> String {
    if keywords.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, keywords.join(", "))
    }
}

fn generate_source(
    pass_type: PassType,
    stage: ShaderStage,
    stage_source: &StageSource,
    keywords: &[&str],
    declarations: &str,
) -> String {
    let mut source = String::new();
    let _ = writeln!(source, "#version {}", GLSL_VERSION);
    let _ = writeln!(source, "#define {} 1", pass_type.define());
    let stage_keywords = stage_source.keywords.iter().map(String::as_str);
    for keyword in keywords.iter().copied().chain(stage_keywords) {
        let _ = writeln!(source, "#define {} 1", keyword);
    }
    if stage == ShaderStage::Vertex {
        let _ = writeln!(source, "#define POSITION_LOCATION {}", vertex_attributes::POSITION);
        let _ = writeln!(source, "#define NORMAL_LOCATION {}", vertex_attributes::NORMAL);
        let _ = writeln!(source, "#define TEXCOORD_LOCATION {}", vertex_attributes::TEXCOORD);
    }
    source.push_str(declarations);
    source.push_str(&stage_source.source);
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::mock::mock_manager;
    use crate::gpu::{ResourceSetLayoutDescriptor, ResourceType};

    fn descriptor(pass_type: PassType) -> PassDescriptor {
        PassDescriptor::new(pass_type)
            .with_stage(
                ShaderStage::Vertex,
                StageSource::new("shaders/lit.vert", "void main() {}\n"),
            )
            .with_stage(
                ShaderStage::Fragment,
                StageSource::new("shaders/lit.frag", "void main() {}\n").with_keyword("ALPHA_TEST"),
            )
    }

    #[test]
    fn pass_type_names_round_trip() {
        for pass_type in PassType::ALL {
            assert_eq!(pass_type.name().parse::<PassType>(), Ok(pass_type));
        }
        assert_eq!(
            "Forward".parse::<PassType>().unwrap_err().to_string(),
            "unknown pass type 'Forward'"
        );
    }

    #[test]
    fn deferred_light_has_seven_variations() {
        let keys: Vec<_> = PassType::DeferredLight
            .variations()
            .iter()
            .map(|keywords| variation_key(keywords))
            .collect();
        assert_eq!(keys.len(), 7);
        assert_eq!(keys[2], "DIRECTIONAL_LIGHT SHADOW");
        assert_eq!(PassType::Basic.variations(), &[&[] as &[&str]]);
    }

    #[test]
    fn generated_source_orders_preamble() {
        let stage = StageSource::new("lit.frag", "void main() {}\n").with_keyword("ALPHA_TEST");
        let source = generate_source(
            PassType::DeferredLight,
            ShaderStage::Fragment,
            &stage,
            &["POINT_LIGHT", "SHADOW"],
            "uniform sampler2D albedo;\n",
        );
        assert_eq!(
            source,
            "#version 450\n#define DEFERRED_LIGHT_PASS 1\n#define POINT_LIGHT 1\n#define SHADOW 1\n\
             #define ALPHA_TEST 1\nuniform sampler2D albedo;\nvoid main() {}\n"
        );
    }

    #[test]
    fn vertex_stage_gets_attribute_locations() {
        let stage = StageSource::new("lit.vert", "void main() {}\n");
        let source = generate_source(PassType::Basic, ShaderStage::Vertex, &stage, &[], "");
        assert!(source.contains("#define POSITION_LOCATION 0\n"));
        assert!(source.contains("#define TEXCOORD_LOCATION 2\n"));
    }

    #[test]
    fn program_names_list_keywords() {
        assert_eq!(program_name("lit.frag", &[]), "lit.frag");
        assert_eq!(
            program_name("lit.frag", &["POINT_LIGHT", "SHADOW"]),
            "lit.frag (POINT_LIGHT, SHADOW)"
        );
    }

    #[test]
    fn build_creates_one_pipeline_per_variation() {
        let (_device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(ResourceSetLayoutDescriptor {
            slots: vec![ResourceType::UniformBuffer],
        });

        let pass =
            Pass::build(&manager, &descriptor(PassType::DeferredLight), "", &layout).unwrap();
        assert_eq!(pass.variations().count(), 7);

        let pipeline = pass.pipeline(&["SPOT_LIGHT", "SHADOW"]);
        let fragment = pipeline.program(ShaderStage::Fragment).unwrap();
        assert_eq!(fragment.name(), "shaders/lit.frag (SPOT_LIGHT, SHADOW)");
        assert!(Arc::ptr_eq(
            pipeline.resource_layout(resource_sets::MATERIAL).unwrap(),
            &layout
        ));
    }

    #[test]
    fn compile_errors_are_returned() {
        let (_device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(ResourceSetLayoutDescriptor::default());
        let mut broken = descriptor(PassType::Basic);
        broken.stages[ShaderStage::Fragment.index()] =
            Some(StageSource::new("broken.frag", "#error nope\n"));

        let err = Pass::build(&manager, &broken, "", &layout).unwrap_err();
        assert!(err.to_string().contains("broken.frag"), "{err}");
    }

    #[test]
    #[should_panic(expected = "Unknown variation 'POINT_LIGHT' for Basic pass")]
    fn unknown_variation_is_fatal() {
        let (_device, manager) = mock_manager();
        let layout = manager.create_resource_set_layout(ResourceSetLayoutDescriptor::default());
        let pass = Pass::build(&manager, &descriptor(PassType::Basic), "", &layout).unwrap();
        pass.pipeline(&["POINT_LIGHT"]);
    }
}
