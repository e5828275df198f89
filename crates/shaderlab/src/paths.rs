//! Resolves where shaderlab keeps its configuration file and persisted
//! parameter state, honouring `SHADERLAB_CONFIG_DIR` / `SHADERLAB_DATA_DIR`.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "SHADERLAB_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "SHADERLAB_DATA_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "shaderlab";
const APPLICATION: &str = "shaderlab";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let overrides = (env_override(ENV_CONFIG_DIR), env_override(ENV_DATA_DIR));
        if let (Some(config_dir), Some(data_dir)) = overrides.clone() {
            return Ok(Self {
                config_dir,
                data_dir,
            });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: overrides
                .0
                .unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            data_dir: overrides
                .1
                .unwrap_or_else(|| project_dirs.data_dir().to_path_buf()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("params.toml")
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
