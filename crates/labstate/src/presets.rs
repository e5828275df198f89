//! Named value bundles: built-in looks, config-defined presets, and theme
//! colour pairs.

use std::collections::BTreeMap;

use renderer::ShaderVariant;
use tracing::info;

use crate::error::{Result, StateError};
use crate::params::ParamValue;
use crate::store::ParameterStore;

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub variant: ShaderVariant,
    pub values: BTreeMap<String, ParamValue>,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        variant: ShaderVariant,
        values: BTreeMap<String, ParamValue>,
    ) -> Self {
        Self {
            name: name.into(),
            variant,
            values,
        }
    }

    fn lab(name: &str, scalars: &[(&str, f32)]) -> Self {
        let values = scalars
            .iter()
            .map(|(key, value)| (key.to_string(), ParamValue::Scalar(*value)))
            .collect();
        Self::new(name, ShaderVariant::Lab, values)
    }
}

pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::lab(
            "planet",
            &[
                ("master", 1.0),
                ("emblemHue", 0.62),
                ("emblemGloss", 0.55),
                ("emblemRough", 0.35),
                ("rim", 0.5),
                ("companion", 0.5),
                ("trail", 0.6),
                ("vignette", 0.25),
            ],
        ),
        Preset::lab(
            "neon",
            &[
                ("master", 0.9),
                ("emblemHue", 0.82),
                ("emblemGloss", 0.8),
                ("emblemRough", 0.15),
                ("rim", 0.65),
                ("companion", 0.35),
                ("trail", 0.9),
                ("vignette", 0.18),
            ],
        ),
        Preset::lab(
            "minimal",
            &[
                ("master", 0.7),
                ("emblemHue", 0.05),
                ("emblemGloss", 0.25),
                ("emblemRough", 0.6),
                ("rim", 0.35),
                ("companion", 0.2),
                ("trail", 0.1),
                ("vignette", 0.12),
            ],
        ),
    ]
}

/// Built-in presets followed by custom ones; a custom preset with a
/// built-in's name and variant replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self {
            presets: builtin_presets(),
        }
    }
}

impl PresetCatalog {
    pub fn with_custom(custom: impl IntoIterator<Item = Preset>) -> Self {
        let mut catalog = Self::default();
        for preset in custom {
            match catalog
                .presets
                .iter_mut()
                .find(|p| p.name == preset.name && p.variant == preset.variant)
            {
                Some(existing) => *existing = preset,
                None => catalog.presets.push(preset),
            }
        }
        catalog
    }

    pub fn for_variant(&self, variant: ShaderVariant) -> impl Iterator<Item = &Preset> {
        self.presets.iter().filter(move |p| p.variant == variant)
    }

    pub fn get(&self, variant: ShaderVariant, name: &str) -> Result<&Preset> {
        self.for_variant(variant)
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| StateError::UnknownPreset(name.to_string()))
    }

    /// Preset following `current` for the variant, wrapping around.
    pub fn next_after(&self, variant: ShaderVariant, current: Option<&str>) -> Option<&Preset> {
        let presets: Vec<&Preset> = self.for_variant(variant).collect();
        if presets.is_empty() {
            return None;
        }
        let next = current
            .and_then(|name| presets.iter().position(|p| p.name == name))
            .map_or(0, |index| (index + 1) % presets.len());
        Some(presets[next])
    }

    /// Applies a preset on top of the store's current values.
    pub fn apply(&self, store: &mut ParameterStore, name: &str) -> Result<usize> {
        let preset = self.get(store.variant(), name)?;
        let applied = store.apply(&preset.values);
        info!(preset = %preset.name, applied, "applied preset");
        Ok(applied)
    }
}

/// A pair of theme colours for the lab shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePair {
    pub name: &'static str,
    pub a: [f32; 3],
    pub b: [f32; 3],
}

pub const THEMES: &[ThemePair] = &[
    ThemePair {
        name: "cobalt-rose",
        a: [0.16, 0.42, 1.0],
        b: [0.92, 0.32, 0.68],
    },
    ThemePair {
        name: "ember",
        a: [1.0, 0.45, 0.12],
        b: [0.55, 0.08, 0.2],
    },
    ThemePair {
        name: "mint",
        a: [0.3, 0.95, 0.7],
        b: [0.1, 0.35, 0.55],
    },
    ThemePair {
        name: "mono",
        a: [0.9, 0.9, 0.9],
        b: [0.25, 0.25, 0.28],
    },
];

impl ThemePair {
    pub fn values(&self) -> BTreeMap<String, ParamValue> {
        BTreeMap::from([
            ("themeA".to_string(), ParamValue::Color(self.a)),
            ("themeB".to_string(), ParamValue::Color(self.b)),
        ])
    }

    /// Theme after the one whose first colour matches `current_a`.
    pub fn next(current_a: Option<[f32; 3]>) -> &'static ThemePair {
        let index = current_a
            .and_then(|a| THEMES.iter().position(|theme| theme.a == a))
            .map_or(0, |index| (index + 1) % THEMES.len());
        &THEMES[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_only_touch_known_lab_parameters() {
        for preset in builtin_presets() {
            let mut store = ParameterStore::new(preset.variant).unwrap();
            assert_eq!(store.apply(&preset.values), preset.values.len(), "{}", preset.name);
        }
    }

    #[test]
    fn applying_neon_sets_raw_and_scaled_values() {
        let catalog = PresetCatalog::default();
        let mut store = ParameterStore::new(ShaderVariant::Lab).unwrap();
        catalog.apply(&mut store, "NEON").unwrap();
        assert_eq!(store.get("emblemGloss"), Some(ParamValue::Scalar(0.8)));
        let trail = store.effective("trail").and_then(|v| v.as_float()).unwrap();
        assert!((trail - 0.81).abs() < 1e-5);
        assert!(matches!(
            catalog.apply(&mut store, "sunset"),
            Err(StateError::UnknownPreset(_))
        ));
    }

    #[test]
    fn custom_presets_extend_and_override() {
        let custom = vec![
            Preset::lab("planet", &[("master", 0.2)]),
            Preset::new(
                "warm",
                ShaderVariant::Basic,
                BTreeMap::from([("hue".to_string(), ParamValue::Scalar(0.05))]),
            ),
        ];
        let catalog = PresetCatalog::with_custom(custom);
        assert_eq!(catalog.for_variant(ShaderVariant::Lab).count(), 3);
        assert_eq!(
            catalog.get(ShaderVariant::Lab, "planet").unwrap().values.len(),
            1
        );
        assert!(catalog.get(ShaderVariant::Basic, "warm").is_ok());
        assert!(catalog.get(ShaderVariant::Basic, "planet").is_err());
    }

    #[test]
    fn cycling_wraps_around() {
        let catalog = PresetCatalog::default();
        let lab = ShaderVariant::Lab;
        assert_eq!(catalog.next_after(lab, None).unwrap().name, "planet");
        assert_eq!(catalog.next_after(lab, Some("planet")).unwrap().name, "neon");
        assert_eq!(catalog.next_after(lab, Some("minimal")).unwrap().name, "planet");
        assert!(catalog.next_after(ShaderVariant::Basic, None).is_none());
    }

    #[test]
    fn theme_cycle_starts_after_current() {
        assert_eq!(ThemePair::next(Some(THEMES[0].a)).name, "ember");
        assert_eq!(ThemePair::next(Some(THEMES[3].a)).name, "cobalt-rose");
        assert_eq!(ThemePair::next(None).name, "cobalt-rose");
    }
}
