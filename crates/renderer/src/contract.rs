//! Uniform vocabulary shared between shader sources and the engine.
//!
//! A [`UniformContract`] lists every uniform the engine knows how to feed,
//! where its value comes from, and the range the shader expects. Shaders
//! declare these names in a single std140 block at `set = 0, binding = 0`:
//!
//! ```glsl
//! layout(std140, set = 0, binding = 0) uniform LabParams {
//!     float uTime;
//!     vec2 uResolution;
//!     float uHue;
//! };
//! ```
//!
//! Names are a build-time agreement. A uniform the contract lists but the
//! shader omits is reported as a [`crate::UniformResolutionWarning`]; a
//! parameter uniform with no snapshot entry is a configuration error.

use std::fmt;

use crate::snapshot::UniformValue;

/// Shape of a uniform as seen by the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
}

impl UniformKind {
    /// Number of `f32` components carried by the uniform.
    pub fn components(self) -> usize {
        match self {
            UniformKind::Float => 1,
            UniformKind::Vec2 => 2,
            UniformKind::Vec3 => 3,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Float => f.write_str("float"),
            UniformKind::Vec2 => f.write_str("vec2"),
            UniformKind::Vec3 => f.write_str("vec3"),
        }
    }
}

/// Where the engine reads a uniform's value from on every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformSource {
    /// Seconds since the engine was created.
    Time,
    /// Backing buffer size in device pixels.
    Resolution,
    /// Value mirrored from the uniform snapshot.
    Parameter,
}

/// One entry of the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
    pub source: UniformSource,
    /// Inclusive range the shader expects; applied per component at upload.
    pub range: Option<(f32, f32)>,
    /// Seed value for the snapshot entry of a parameter uniform.
    pub default: UniformValue,
}

impl UniformDecl {
    pub fn time(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: UniformKind::Float,
            source: UniformSource::Time,
            range: None,
            default: UniformValue::Float(0.0),
        }
    }

    pub fn resolution(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: UniformKind::Vec2,
            source: UniformSource::Resolution,
            range: None,
            default: UniformValue::Vec2([0.0, 0.0]),
        }
    }

    pub fn float(name: &str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.to_string(),
            kind: UniformKind::Float,
            source: UniformSource::Parameter,
            range: Some((min, max)),
            default: UniformValue::Float(default),
        }
    }

    pub fn color(name: &str, default: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            kind: UniformKind::Vec3,
            source: UniformSource::Parameter,
            range: Some((0.0, 1.0)),
            default: UniformValue::Vec3(default),
        }
    }

    /// Clamps every component of `value` into the declared range.
    ///
    /// NaN components collapse to the lower bound so the shader never sees
    /// a non-finite input.
    pub fn clamp(&self, value: UniformValue) -> UniformValue {
        match self.range {
            Some((min, max)) => value.map(|component| clamp_component(component, min, max)),
            None => value,
        }
    }
}

fn clamp_component(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Which of the built-in uniform sets a shader was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderVariant {
    /// Hue / speed / intensity preview.
    Basic,
    /// Layered emblem, companion, trail, and background controls.
    #[default]
    Lab,
}

impl ShaderVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ShaderVariant::Basic => "basic",
            ShaderVariant::Lab => "lab",
        }
    }
}

impl fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShaderVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(ShaderVariant::Basic),
            "lab" => Ok(ShaderVariant::Lab),
            other => Err(format!(
                "unknown shader variant '{other}'; expected 'basic' or 'lab'"
            )),
        }
    }
}

/// Ordered list of uniform declarations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformContract {
    decls: Vec<UniformDecl>,
}

impl UniformContract {
    pub fn new(decls: Vec<UniformDecl>) -> Self {
        Self { decls }
    }

    pub fn for_variant(variant: ShaderVariant) -> Self {
        match variant {
            ShaderVariant::Basic => Self::basic(),
            ShaderVariant::Lab => Self::lab(),
        }
    }

    pub fn basic() -> Self {
        Self::new(vec![
            UniformDecl::time("uTime"),
            UniformDecl::resolution("uResolution"),
            UniformDecl::float("uHue", 0.0, 1.0, 0.5),
            UniformDecl::float("uSpeed", 0.0, 3.0, 1.0),
            UniformDecl::float("uIntensity", 0.0, 2.0, 1.0),
            UniformDecl::float("uMaster", 0.0, 1.0, 1.0),
        ])
    }

    pub fn lab() -> Self {
        Self::new(vec![
            UniformDecl::time("uTime"),
            UniformDecl::resolution("uResolution"),
            UniformDecl::float("uMaster", 0.0, 1.0, 0.8),
            UniformDecl::float("uEmblemHue", 0.0, 1.0, 0.6),
            UniformDecl::float("uEmblemGloss", 0.0, 1.0, 0.4),
            UniformDecl::float("uEmblemRough", 0.0, 1.0, 0.4),
            UniformDecl::float("uRimStrength", 0.0, 2.0, 0.6),
            UniformDecl::float("uCompanion", 0.0, 1.0, 0.48),
            UniformDecl::float("uCompanionCount", 0.0, 6.0, 3.0),
            UniformDecl::float("uCompanionSize", 0.0, 1.0, 0.35),
            UniformDecl::float("uTrail", 0.0, 1.0, 0.56),
            UniformDecl::float("uTrailLength", 0.0, 1.0, 0.5),
            UniformDecl::float("uBackground", 0.0, 1.0, 0.4),
            UniformDecl::float("uVignette", 0.0, 1.0, 0.25),
            UniformDecl::float("uGrain", 0.0, 1.0, 0.15),
            UniformDecl::color("uThemeA", [0.16, 0.42, 1.0]),
            UniformDecl::color("uThemeB", [0.92, 0.32, 0.68]),
        ])
    }

    pub fn decls(&self) -> &[UniformDecl] {
        &self.decls
    }

    pub fn get(&self, name: &str) -> Option<&UniformDecl> {
        self.decls.iter().find(|decl| decl.name == name)
    }

    /// Declarations whose values come from the snapshot.
    pub fn parameters(&self) -> impl Iterator<Item = &UniformDecl> {
        self.decls
            .iter()
            .filter(|decl| decl.source == UniformSource::Parameter)
    }
}
