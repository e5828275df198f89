//! Launches the interactive preview: resolves paths and config, restores the
//! parameter store, and hands the shared snapshot to the renderer's window
//! loop together with the keyboard controls.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use labconfig::LabConfig;
use labstate::{
    ParameterStore, PresetCatalog, StateError, StoredState, DEFAULT_PERSIST_DEBOUNCE,
};
use renderer::{run_preview, PreviewOptions, ShaderSources, SnapshotHandle, UniformContract};
use tracing_subscriber::EnvFilter;

use crate::bindings::{presets_from_config, LaunchSettings};
use crate::cli::RunArgs;
use crate::controls::LabControls;
use crate::paths::AppPaths;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let (config, config_dir) = load_config(&args, &paths)?;
    let settings = LaunchSettings::resolve(&args, &config, &config_dir)?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        "resolved shaderlab paths"
    );

    let state_path = settings.persist_debounce.map(|_| paths.state_file());
    let stored = match &state_path {
        Some(path) => StoredState::load_or_default(path)?,
        None => StoredState::default(),
    };

    let contract = UniformContract::for_variant(settings.variant);
    let snapshot = SnapshotHandle::from_contract(&contract);
    let mut store = ParameterStore::with_snapshot(settings.variant, snapshot.clone())?;
    let presets = PresetCatalog::with_custom(presets_from_config(&config));
    let overlay = match (&settings.preset, &settings.skin) {
        (Some(name), _) => Some(presets.get(settings.variant, name)?.clone()),
        (None, Some(name)) => Some(
            stored
                .skins
                .get(name)
                .ok_or_else(|| StateError::UnknownSkin(name.clone()))?
                .to_preset(),
        ),
        (None, None) => None,
    };
    labstate::restore(
        &mut store,
        &stored,
        overlay.as_ref(),
        settings.query.as_deref(),
    );

    tracing::info!(
        variant = %settings.variant,
        shader = %settings.fragment.label(),
        width = settings.size.0,
        height = settings.size.1,
        dpr_cap = settings.dpr_cap,
        persist = state_path.is_some(),
        "starting shaderlab preview"
    );

    let options = PreviewOptions {
        title: format!("shaderlab: {}", settings.fragment.label()),
        size: settings.size,
        contract,
        sources: ShaderSources::fullscreen(settings.fragment.source),
        dpr_cap: settings.dpr_cap,
    };
    let mut controls = LabControls::new(
        store,
        presets,
        stored,
        state_path,
        settings.persist_debounce.unwrap_or(DEFAULT_PERSIST_DEBOUNCE),
    );
    run_preview(options, snapshot, &mut controls)?;
    tracing::info!(variant = %controls.store().variant(), "preview closed");
    Ok(())
}

/// Loads the config named on the command line (which must exist) or the
/// default one (which may not). Returns it with the directory relative
/// fragment paths resolve against.
pub fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<(LabConfig, PathBuf)> {
    let path = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            path.clone()
        }
        None => paths.config_file(),
    };
    let config = LabConfig::load_or_default(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_dir().to_path_buf());
    Ok((config, dir))
}

pub fn initialise_tracing() {
    let default_filter = "warn,shaderlab=info,renderer=info,labstate=info,labconfig=info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error,smithay_client_toolkit=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
