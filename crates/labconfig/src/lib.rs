use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const MIN_DPR_CAP: f64 = 1.0;
pub const MAX_DPR_CAP: f64 = 4.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Basic,
    #[default]
    Lab,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabConfig {
    pub version: u32,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub presets: BTreeMap<String, PresetConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewConfig {
    pub variant: Option<Variant>,
    /// Fragment shader overriding the embedded one for the variant.
    pub fragment: Option<PathBuf>,
    pub dpr_cap: Option<f64>,
    /// Initial window size as `WIDTHxHEIGHT`.
    pub size: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(
        default = "default_debounce",
        deserialize_with = "deserialize_duration"
    )]
    pub debounce: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debounce: default_debounce(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresetConfig {
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub values: BTreeMap<String, PresetValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PresetValue {
    Scalar(f32),
    Vector(Vec<f32>),
}

impl PresetValue {
    /// Colour components when this is a 3-vector.
    pub fn as_color(&self) -> Option<[f32; 3]> {
        match self {
            PresetValue::Vector(values) => <[f32; 3]>::try_from(values.as_slice()).ok(),
            PresetValue::Scalar(_) => None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_debounce() -> Duration {
    Duration::from_millis(150)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as milliseconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_millis(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_millis(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v / 1000.0))
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Parses `WIDTHxHEIGHT` into a non-zero size.
pub fn parse_size(raw: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::Invalid(format!("size '{raw}' must look like 1280x720"));
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(ConfigError::Invalid(format!(
            "size '{raw}' must be non-zero in both dimensions"
        )));
    }
    Ok((width, height))
}

pub fn validate_dpr_cap(cap: f64) -> Result<f64, ConfigError> {
    if cap.is_finite() && (MIN_DPR_CAP..=MAX_DPR_CAP).contains(&cap) {
        Ok(cap)
    } else {
        Err(ConfigError::Invalid(format!(
            "dpr_cap {cap} must be between {MIN_DPR_CAP} and {MAX_DPR_CAP}"
        )))
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            version: 1,
            preview: PreviewConfig::default(),
            persistence: PersistenceConfig::default(),
            presets: BTreeMap::new(),
        }
    }
}

impl LabConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: LabConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads the config at `path`, falling back to defaults when absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn variant(&self) -> Variant {
        self.preview.variant.unwrap_or_default()
    }

    pub fn size(&self) -> Result<Option<(u32, u32)>, ConfigError> {
        self.preview.size.as_deref().map(parse_size).transpose()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(cap) = self.preview.dpr_cap {
            validate_dpr_cap(cap)?;
        }

        self.size()?;

        if let Some(fragment) = &self.preview.fragment {
            if fragment.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "preview.fragment may not be empty".into(),
                ));
            }
        }

        for (name, preset) in &self.presets {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("preset name may not be empty".into()));
            }
            for (key, value) in &preset.values {
                match value {
                    PresetValue::Scalar(v) if !v.is_finite() => {
                        return Err(ConfigError::Invalid(format!(
                            "preset '{name}' value '{key}' must be finite"
                        )));
                    }
                    PresetValue::Vector(values) if values.len() != 3 => {
                        return Err(ConfigError::Invalid(format!(
                            "preset '{name}' value '{key}' must be a number or a 3-component colour"
                        )));
                    }
                    PresetValue::Vector(values) if values.iter().any(|v| !v.is_finite()) => {
                        return Err(ConfigError::Invalid(format!(
                            "preset '{name}' value '{key}' must be finite"
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[preview]
variant = "lab"
fragment = "shaders/custom.frag"
dpr_cap = 1.5
size = "1280x720"

[persistence]
enabled = false
debounce = "250ms"

[presets.sunset]
variant = "lab"

[presets.sunset.values]
master = 0.9
themeA = [1.0, 0.5, 0.2]

[presets.calm]
variant = "basic"
values = { hue = 0.6, speed = 0.5 }
"#;

    #[test]
    fn parses_sample_config() {
        let config = LabConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.variant(), Variant::Lab);
        assert_eq!(config.preview.dpr_cap, Some(1.5));
        assert_eq!(config.size().unwrap(), Some((1280, 720)));
        assert!(!config.persistence.enabled);
        assert_eq!(config.persistence.debounce, Duration::from_millis(250));
        let sunset = &config.presets["sunset"];
        assert_eq!(sunset.values["master"], PresetValue::Scalar(0.9));
        assert_eq!(sunset.values["themeA"].as_color(), Some([1.0, 0.5, 0.2]));
        assert_eq!(config.presets["calm"].variant, Variant::Basic);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = LabConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.variant(), Variant::Lab);
        assert!(config.persistence.enabled);
        assert_eq!(config.persistence.debounce, Duration::from_millis(150));
        assert_eq!(config.size().unwrap(), None);
    }

    #[test]
    fn numeric_debounce_is_milliseconds() {
        let config = LabConfig::from_toml_str("version = 1\n[persistence]\ndebounce = 40").unwrap();
        assert_eq!(config.persistence.debounce, Duration::from_millis(40));
    }

    #[test]
    fn rejects_out_of_range_dpr_cap() {
        let err = LabConfig::from_toml_str("version = 1\n[preview]\ndpr_cap = 8.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_sizes() {
        for size in ["0x720", "1280", "wide x tall"] {
            let input = format!("version = 1\n[preview]\nsize = \"{size}\"");
            let err = LabConfig::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{size}");
        }
        assert_eq!(parse_size(" 640X480 ").unwrap(), (640, 480));
    }

    #[test]
    fn rejects_two_component_preset_colour() {
        let config = r#"
version = 1
[presets.odd.values]
themeA = [1.0, 0.5]
"#;
        let err = LabConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = LabConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_default() {
        let config = LabConfig::load_or_default(Path::new("/nonexistent/shaderlab.toml")).unwrap();
        assert_eq!(config.version, 1);
    }
}
