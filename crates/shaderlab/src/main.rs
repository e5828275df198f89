//! Entry point wiring for shaderlab: parses the CLI, initialises tracing, and
//! either launches the interactive preview (`run.rs`) or runs one of the
//! state maintenance subcommands.
//!
//! Functions:
//!
//! - `main` dispatches between the preview and subcommands.
//! - `handle_skins_command`, `run_link`, `run_reset`, and `run_paths` operate
//!   on the persisted `params.toml` without opening a window.

mod bindings;
mod cli;
mod controls;
mod paths;
mod run;

use anyhow::Result;
use cli::{Command, RunArgs, SkinsAction};
use labstate::{encode_query, ParameterStore, StoredState};
use paths::AppPaths;
use renderer::ShaderVariant;

use crate::bindings::map_variant;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Skins(skins)) => handle_skins_command(skins.action),
        Some(Command::Link) => run_link(&cli.run),
        Some(Command::Reset) => run_reset(&cli.run),
        Some(Command::Paths) => run_paths(),
        None => run::run(cli.run),
    }
}

fn handle_skins_command(action: SkinsAction) -> Result<()> {
    let paths = AppPaths::discover()?;
    let state_file = paths.state_file();
    let mut state = StoredState::load_or_default(&state_file)?;

    match action {
        SkinsAction::List => {
            if state.skins.is_empty() {
                println!("No skins saved.");
            }
            for skin in state.skins.iter() {
                println!(
                    "{}\t{}\t{}",
                    skin.name,
                    skin.variant,
                    skin.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        SkinsAction::Export { name } => println!("{}", state.skins.export_json(&name)?),
        SkinsAction::Delete { name } => {
            state.skins.delete(&name)?;
            state.persist(&state_file)?;
            println!("Deleted skin '{name}'.");
        }
    }
    Ok(())
}

fn selected_variant(args: &RunArgs, paths: &AppPaths) -> Result<ShaderVariant> {
    match args.variant {
        Some(variant) => Ok(variant),
        None => {
            let (config, _) = run::load_config(args, paths)?;
            Ok(map_variant(config.variant()))
        }
    }
}

fn run_link(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let variant = selected_variant(args, &paths)?;
    let state = StoredState::load_or_default(&paths.state_file())?;
    let mut store = ParameterStore::new(variant)?;
    labstate::restore(&mut store, &state, None, args.state.as_deref());
    println!("{}", encode_query(&store.parameter_set(), &store.values()));
    Ok(())
}

fn run_reset(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let variant = selected_variant(args, &paths)?;
    let state_file = paths.state_file();
    let mut state = StoredState::load_or_default(&state_file)?;
    if state.clear_values(variant) {
        state.persist(&state_file)?;
        println!("Cleared stored {variant} values.");
    } else {
        println!("No stored {variant} values.");
    }
    Ok(())
}

fn run_paths() -> Result<()> {
    let paths = AppPaths::discover()?;
    println!("Configuration:");
    println!("  config dir:  {}", paths.config_dir().display());
    println!("  config file: {}", paths.config_file().display());
    println!("State:");
    println!("  data dir:    {}", paths.data_dir().display());
    println!("  params:      {}", paths.state_file().display());
    Ok(())
}
