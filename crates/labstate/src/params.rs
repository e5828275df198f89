use std::fmt;

use renderer::{ShaderVariant, UniformValue};
use serde::{Deserialize, Serialize};

/// Raw value of one control: a slider position or an RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f32),
    Color([f32; 3]),
}

impl ParamValue {
    pub fn is_finite(&self) -> bool {
        match self {
            ParamValue::Scalar(value) => value.is_finite(),
            ParamValue::Color(rgb) => rgb.iter().all(|c| c.is_finite()),
        }
    }

    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            ParamValue::Scalar(value) => Some(*value),
            ParamValue::Color(_) => None,
        }
    }

    pub fn to_uniform(self) -> UniformValue {
        match self {
            ParamValue::Scalar(value) => UniformValue::Float(value),
            ParamValue::Color(rgb) => UniformValue::Vec3(rgb),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<[f32; 3]> for ParamValue {
    fn from(value: [f32; 3]) -> Self {
        ParamValue::Color(value)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(value) => write!(f, "{value:.3}"),
            ParamValue::Color([r, g, b]) => write!(f, "({r:.2}, {g:.2}, {b:.2})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Scalar {
        min: f32,
        max: f32,
        default: f32,
        step: f32,
    },
    Color {
        default: [f32; 3],
    },
}

/// One user-facing control and the uniform it drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDef {
    /// Stable identifier used for persistence and skins.
    pub key: &'static str,
    pub uniform: &'static str,
    pub label: &'static str,
    pub tab: &'static str,
    pub kind: ParamKind,
    /// Effective value is `raw * master` when set.
    pub scaled_by_master: bool,
    pub query_key: &'static str,
}

impl ParameterDef {
    const fn scalar(
        key: &'static str,
        uniform: &'static str,
        label: &'static str,
        tab: &'static str,
        range: (f32, f32),
        default: f32,
        query_key: &'static str,
    ) -> Self {
        Self {
            key,
            uniform,
            label,
            tab,
            kind: ParamKind::Scalar {
                min: range.0,
                max: range.1,
                default,
                step: (range.1 - range.0) / 100.0,
            },
            scaled_by_master: false,
            query_key,
        }
    }

    const fn color(
        key: &'static str,
        uniform: &'static str,
        label: &'static str,
        default: [f32; 3],
        query_key: &'static str,
    ) -> Self {
        Self {
            key,
            uniform,
            label,
            tab: "Theme",
            kind: ParamKind::Color { default },
            scaled_by_master: false,
            query_key,
        }
    }

    const fn mastered(mut self) -> Self {
        self.scaled_by_master = true;
        self
    }

    const fn with_step(mut self, step: f32) -> Self {
        if let ParamKind::Scalar { min, max, default, .. } = self.kind {
            self.kind = ParamKind::Scalar {
                min,
                max,
                default,
                step,
            };
        }
        self
    }

    pub fn default_value(&self) -> ParamValue {
        match self.kind {
            ParamKind::Scalar { default, .. } => ParamValue::Scalar(default),
            ParamKind::Color { default } => ParamValue::Color(default),
        }
    }

    /// Clamps a raw value into the control's range. `None` when the shape
    /// does not match the control.
    pub fn clamp_raw(&self, value: ParamValue) -> Option<ParamValue> {
        match (self.kind, value) {
            (ParamKind::Scalar { min, max, .. }, ParamValue::Scalar(raw)) => {
                Some(ParamValue::Scalar(raw.clamp(min, max)))
            }
            (ParamKind::Color { .. }, ParamValue::Color(rgb)) => {
                Some(ParamValue::Color(rgb.map(|c| c.clamp(0.0, 1.0))))
            }
            _ => None,
        }
    }

    pub fn range(&self) -> (f32, f32) {
        match self.kind {
            ParamKind::Scalar { min, max, .. } => (min, max),
            ParamKind::Color { .. } => (0.0, 1.0),
        }
    }

    pub fn step(&self) -> Option<f32> {
        match self.kind {
            ParamKind::Scalar { step, .. } => Some(step),
            ParamKind::Color { .. } => None,
        }
    }
}

pub const MASTER_KEY: &str = "master";

const BASIC_PARAMS: &[ParameterDef] = &[
    ParameterDef::scalar("hue", "uHue", "Hue", "Colors", (0.0, 1.0), 0.5, "h"),
    ParameterDef::scalar("speed", "uSpeed", "Speed", "Motion", (0.0, 3.0), 1.0, "s"),
    ParameterDef::scalar("intensity", "uIntensity", "Intensity", "FX", (0.0, 2.0), 1.0, "i")
        .mastered(),
    ParameterDef::scalar(MASTER_KEY, "uMaster", "Master", "FX", (0.0, 1.0), 1.0, "m"),
];

const LAB_PARAMS: &[ParameterDef] = &[
    ParameterDef::scalar(MASTER_KEY, "uMaster", "Master", "Global", (0.0, 1.0), 0.8, "m"),
    ParameterDef::scalar("emblemHue", "uEmblemHue", "Hue", "Emblem", (0.0, 1.0), 0.6, "eh"),
    ParameterDef::scalar("emblemGloss", "uEmblemGloss", "Gloss", "Emblem", (0.0, 1.0), 0.5, "eg")
        .mastered(),
    ParameterDef::scalar("emblemRough", "uEmblemRough", "Roughness", "Emblem", (0.0, 1.0), 0.4, "er"),
    ParameterDef::scalar("rim", "uRimStrength", "Rim", "Emblem", (0.0, 2.0), 0.6, "r"),
    ParameterDef::scalar("companion", "uCompanion", "Amount", "Companion", (0.0, 1.0), 0.6, "c")
        .mastered(),
    ParameterDef::scalar("companionCount", "uCompanionCount", "Count", "Companion", (0.0, 6.0), 3.0, "cc")
        .with_step(1.0),
    ParameterDef::scalar("companionSize", "uCompanionSize", "Size", "Companion", (0.0, 1.0), 0.35, "cs"),
    ParameterDef::scalar("trail", "uTrail", "Amount", "Trail", (0.0, 1.0), 0.7, "t").mastered(),
    ParameterDef::scalar("trailLength", "uTrailLength", "Length", "Trail", (0.0, 1.0), 0.5, "tl"),
    ParameterDef::scalar("background", "uBackground", "Amount", "Background", (0.0, 1.0), 0.5, "b")
        .mastered(),
    ParameterDef::scalar("vignette", "uVignette", "Vignette", "Background", (0.0, 1.0), 0.25, "v"),
    ParameterDef::scalar("grain", "uGrain", "Grain", "Background", (0.0, 1.0), 0.15, "g"),
    ParameterDef::color("themeA", "uThemeA", "Theme A", [0.16, 0.42, 1.0], "ta"),
    ParameterDef::color("themeB", "uThemeB", "Theme B", [0.92, 0.32, 0.68], "tb"),
];

/// Ordered controls for one shader variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    variant: ShaderVariant,
    defs: &'static [ParameterDef],
}

impl ParameterSet {
    pub fn for_variant(variant: ShaderVariant) -> Self {
        let defs = match variant {
            ShaderVariant::Basic => BASIC_PARAMS,
            ShaderVariant::Lab => LAB_PARAMS,
        };
        Self { variant, defs }
    }

    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn defs(&self) -> &'static [ParameterDef] {
        self.defs
    }

    /// Looks a control up by key or by uniform name.
    pub fn get(&self, name: &str) -> Option<&'static ParameterDef> {
        self.position(name).map(|index| &self.defs[index])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.defs
            .iter()
            .position(|def| def.key == name || def.uniform == name)
    }

    /// Tab names in first-appearance order.
    pub fn tabs(&self) -> Vec<&'static str> {
        let mut tabs: Vec<&'static str> = Vec::new();
        for def in self.defs {
            if !tabs.contains(&def.tab) {
                tabs.push(def.tab);
            }
        }
        tabs
    }

    pub fn in_tab<'a>(&'a self, tab: &'a str) -> impl Iterator<Item = &'static ParameterDef> + 'a {
        self.defs.iter().filter(move |def| def.tab == tab)
    }
}
