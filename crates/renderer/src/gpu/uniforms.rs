use wgpu::naga;

use crate::contract::UniformKind;

/// Byte location of one member of the reflected uniform block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BlockMember {
    pub name: String,
    pub slot: UniformSlot,
}

/// Layout of the `set = 0, binding = 0` uniform block as the shader sees it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct UniformBlock {
    pub size: u32,
    pub members: Vec<BlockMember>,
}

impl UniformBlock {
    /// Finds the uniform block in `module`. Members of other types (ints,
    /// matrices, arrays) are kept out of the table and never written.
    pub fn reflect(module: &naga::Module) -> Option<Self> {
        let (_, global) = module.global_variables.iter().find(|(_, global)| {
            global.space == naga::AddressSpace::Uniform
                && global.binding
                    == Some(naga::ResourceBinding {
                        group: 0,
                        binding: 0,
                    })
        })?;
        let naga::TypeInner::Struct { members, span } = &module.types[global.ty].inner else {
            return None;
        };

        let members = members
            .iter()
            .filter_map(|member| {
                let name = member.name.clone()?;
                let kind = member_kind(&module.types[member.ty].inner)?;
                Some(BlockMember {
                    name,
                    slot: UniformSlot {
                        offset: member.offset,
                        kind,
                    },
                })
            })
            .collect();

        Some(Self {
            size: *span,
            members,
        })
    }

    pub fn slot(&self, name: &str, kind: UniformKind) -> Option<UniformSlot> {
        self.members
            .iter()
            .find(|member| member.name == name)
            .map(|member| member.slot)
            .filter(|slot| slot.kind == kind)
    }

    /// Buffer size rounded up to the 16-byte std140 granule, never zero.
    pub fn buffer_size(&self) -> u64 {
        u64::from(self.size.max(16)).div_ceil(16) * 16
    }
}

fn member_kind(inner: &naga::TypeInner) -> Option<UniformKind> {
    let is_f32 = |scalar: &naga::Scalar| {
        scalar.kind == naga::ScalarKind::Float && scalar.width == 4
    };
    match inner {
        naga::TypeInner::Scalar(scalar) if is_f32(scalar) => Some(UniformKind::Float),
        naga::TypeInner::Vector { size, scalar } if is_f32(scalar) => match size {
            naga::VectorSize::Bi => Some(UniformKind::Vec2),
            naga::VectorSize::Tri => Some(UniformKind::Vec3),
            naga::VectorSize::Quad => None,
        },
        _ => None,
    }
}

/// CPU copy of the uniform block, sized once at link time.
#[derive(Debug)]
pub(crate) struct UniformStaging {
    bytes: Vec<u8>,
}

impl UniformStaging {
    pub fn new(size: u64) -> Self {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    pub fn write(&mut self, slot: UniformSlot, value: &[f32]) {
        let count = value.len().min(slot.kind.components());
        let src: &[u8] = bytemuck::cast_slice(&value[..count]);
        let start = slot.offset as usize;
        if let Some(dst) = self.bytes.get_mut(start..start + src.len()) {
            dst.copy_from_slice(src);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ShaderStage;
    use crate::compile::parse_glsl;
    use crate::contract::UniformContract;

    const BASIC_FRAG: &str = include_str!("../../../shaderlab/shaders/basic.frag");
    const LAB_FRAG: &str = include_str!("../../../shaderlab/shaders/lab.frag");

    const BLOCK_SHADER: &str = r"#version 450
layout(location = 0) out vec4 color;
layout(std140, set = 0, binding = 0) uniform LabParams {
    float uTime;
    vec2 uResolution;
    float uHue;
    vec3 uThemeA;
    int uUnused;
} lab;

void main() {
    color = vec4(lab.uThemeA * lab.uHue, lab.uTime + lab.uResolution.x + float(lab.uUnused));
}
";

    #[test]
    fn reflects_std140_offsets_for_supported_members() {
        let module = parse_glsl(ShaderStage::Fragment, BLOCK_SHADER).expect("shader parses");
        let block = UniformBlock::reflect(&module).expect("block present");

        assert_eq!(
            block.slot("uTime", UniformKind::Float),
            Some(UniformSlot { offset: 0, kind: UniformKind::Float })
        );
        assert_eq!(
            block.slot("uResolution", UniformKind::Vec2),
            Some(UniformSlot { offset: 8, kind: UniformKind::Vec2 })
        );
        let theme = block.slot("uThemeA", UniformKind::Vec3).expect("vec3 member");
        assert_eq!(theme.offset % 16, 0);
        assert!(block.slot("uUnused", UniformKind::Float).is_none());
        assert!(block.slot("uHue", UniformKind::Vec3).is_none());
        assert_eq!(block.buffer_size() % 16, 0);
    }

    fn assert_declares_contract(source: &str, contract: &UniformContract) {
        let module = parse_glsl(ShaderStage::Fragment, source).unwrap_or_else(|err| panic!("{err}"));
        let block = UniformBlock::reflect(&module).expect("uniform block at set 0 binding 0");
        for decl in contract.decls() {
            assert!(
                block.slot(&decl.name, decl.kind).is_some(),
                "{} missing or not {}",
                decl.name,
                decl.kind
            );
        }
        assert!(block.buffer_size() >= u64::from(block.size));
    }

    #[test]
    fn bundled_basic_shader_exposes_its_contract() {
        assert_declares_contract(BASIC_FRAG, &UniformContract::basic());
    }

    #[test]
    fn bundled_lab_shader_exposes_its_contract() {
        assert_declares_contract(LAB_FRAG, &UniformContract::lab());
    }

    #[test]
    fn staging_writes_components_at_offsets() {
        let mut staging = UniformStaging::new(32);
        staging.write(UniformSlot { offset: 16, kind: UniformKind::Vec3 }, &[1.0, 2.0, 3.0]);
        let floats: Vec<f32> = staging
            .as_bytes()
            .chunks_exact(4)
            .map(|chunk| bytemuck::pod_read_unaligned(chunk))
            .collect();
        assert_eq!(&floats[4..7], &[1.0, 2.0, 3.0]);
        assert_eq!(floats[0], 0.0);
    }

    #[test]
    fn staging_ignores_writes_past_the_end() {
        let mut staging = UniformStaging::new(16);
        staging.write(UniformSlot { offset: 12, kind: UniformKind::Vec2 }, &[1.0, 2.0]);
        assert!(staging.as_bytes().iter().all(|byte| *byte == 0));
    }
}
