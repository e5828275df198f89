use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use renderer::ShaderVariant;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StateError};
use crate::params::ParamValue;
use crate::skins::SkinBook;

/// On-disk lab state: last raw values per variant plus saved skins.
///
/// ```toml
/// [values.lab]
/// master = 0.8
/// themeA = [0.16, 0.42, 1.0]
///
/// [[skins]]
/// name = "Skin 1"
/// variant = "lab"
/// created_at = "2024-05-01T12:00:00Z"
/// [skins.values]
/// master = 0.6
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredState {
    pub values: BTreeMap<String, BTreeMap<String, ParamValue>>,
    pub skins: SkinBook,
}

impl StoredState {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no stored lab state");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| StateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StateError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let serialized = toml::to_string_pretty(self)?;
        fs::write(path, serialized).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "persisted lab state");
        Ok(())
    }

    pub fn values_for(&self, variant: ShaderVariant) -> Option<&BTreeMap<String, ParamValue>> {
        self.values.get(variant.as_str())
    }

    pub fn record_values(&mut self, variant: ShaderVariant, values: BTreeMap<String, ParamValue>) {
        self.values.insert(variant.as_str().to_string(), values);
    }

    pub fn clear_values(&mut self, variant: ShaderVariant) -> bool {
        self.values.remove(variant.as_str()).is_some()
    }
}
