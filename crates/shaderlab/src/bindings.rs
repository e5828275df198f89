//! Translates CLI flags and `config.toml` into launch settings and preset
//! definitions. CLI values win over the config file, which wins over the
//! built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use labconfig::{LabConfig, PresetValue, Variant};
use labstate::{ParamValue, Preset};
use renderer::{with_version_directive, ShaderVariant, DEFAULT_DPR_CAP};

use crate::cli::RunArgs;

pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 720);

const BASIC_FRAGMENT: &str = include_str!("../shaders/basic.frag");
const LAB_FRAGMENT: &str = include_str!("../shaders/lab.frag");

#[derive(Debug, Clone)]
pub struct FragmentSource {
    /// Path the source was read from; `None` for the embedded shader.
    pub path: Option<PathBuf>,
    pub source: String,
}

impl FragmentSource {
    pub fn builtin(variant: ShaderVariant) -> Self {
        let source = match variant {
            ShaderVariant::Basic => BASIC_FRAGMENT,
            ShaderVariant::Lab => LAB_FRAGMENT,
        };
        Self {
            path: None,
            source: source.to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read fragment shader at {}", path.display()))?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            source: with_version_directive(&raw).into_owned(),
        })
    }

    pub fn label(&self) -> String {
        match &self.path {
            Some(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            None => "built-in".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub variant: ShaderVariant,
    pub fragment: FragmentSource,
    pub size: (u32, u32),
    pub dpr_cap: f64,
    /// Debounce interval when persistence is on.
    pub persist_debounce: Option<Duration>,
    pub preset: Option<String>,
    pub skin: Option<String>,
    pub query: Option<String>,
}

impl LaunchSettings {
    /// `config_dir` anchors relative fragment paths from the config file.
    pub fn resolve(args: &RunArgs, config: &LabConfig, config_dir: &Path) -> Result<Self> {
        let variant = args
            .variant
            .unwrap_or_else(|| map_variant(config.variant()));

        let fragment = match (&args.shader, &config.preview.fragment) {
            (Some(path), _) => FragmentSource::load(path)?,
            (None, Some(path)) => FragmentSource::load(&config_dir.join(path))?,
            (None, None) => FragmentSource::builtin(variant),
        };

        let size = match &args.size {
            Some(raw) => labconfig::parse_size(raw)?,
            None => config.size()?.unwrap_or(DEFAULT_WINDOW_SIZE),
        };

        let dpr_cap = match args.dpr_cap.or(config.preview.dpr_cap) {
            Some(cap) => labconfig::validate_dpr_cap(cap)?,
            None => DEFAULT_DPR_CAP,
        };

        let persist_debounce = (!args.no_persist && config.persistence.enabled)
            .then_some(config.persistence.debounce);

        Ok(Self {
            variant,
            fragment,
            size,
            dpr_cap,
            persist_debounce,
            preset: args.preset.clone(),
            skin: args.skin.clone(),
            query: args.state.clone(),
        })
    }
}

pub fn map_variant(variant: Variant) -> ShaderVariant {
    match variant {
        Variant::Basic => ShaderVariant::Basic,
        Variant::Lab => ShaderVariant::Lab,
    }
}

pub fn presets_from_config(config: &LabConfig) -> Vec<Preset> {
    config
        .presets
        .iter()
        .map(|(name, preset)| {
            let values = preset
                .values
                .iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        PresetValue::Scalar(v) => ParamValue::Scalar(*v),
                        PresetValue::Vector(_) => ParamValue::Color(value.as_color()?),
                    };
                    Some((key.clone(), value))
                })
                .collect();
            Preset::new(name.clone(), map_variant(preset.variant), values)
        })
        .collect()
}
