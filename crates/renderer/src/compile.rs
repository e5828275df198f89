use std::borrow::Cow;

use wgpu::naga;

use crate::backend::ShaderStage;

/// Full-screen triangle vertex stage. Reads `vec2` positions from vertex
/// buffer slot 0 and passes a `[0, 1]` UV to the fragment stage.
pub const FULLSCREEN_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = position * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(position, 0.0, 1.0);
}
";

const DEFAULT_VERSION: &str = "#version 450";

/// Ensures the source opens with a `#version` directive.
///
/// Fragment files written for the preview often omit it; the GLSL front end
/// rejects sources without one.
pub fn with_version_directive(source: &str) -> Cow<'_, str> {
    let has_version = source
        .lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with("#version"));
    if has_version {
        Cow::Borrowed(source)
    } else {
        Cow::Owned(format!("{DEFAULT_VERSION}\n{source}"))
    }
}

pub(crate) fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parses and validates GLSL, returning the IR or a rendered diagnostic.
pub(crate) fn parse_glsl(stage: ShaderStage, source: &str) -> Result<naga::Module, String> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(naga_stage(stage));
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| errors.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|error| error.emit_to_string(source))?;
    Ok(module)
}
