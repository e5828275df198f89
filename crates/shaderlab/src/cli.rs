use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::ShaderVariant;

#[derive(Parser, Debug)]
#[command(
    name = "shaderlab",
    author,
    version,
    about = "Real-time parameter-driven shader preview",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Uniform set to drive: `lab` (default) or `basic`.
    #[arg(long, value_name = "VARIANT", value_parser = parse_variant)]
    pub variant: Option<ShaderVariant>,

    /// Fragment shader to preview instead of the built-in one.
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,

    /// Configuration file; defaults to `config.toml` in the config directory.
    #[arg(long, value_name = "PATH", env = "SHADERLAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Apply a named preset on launch (e.g. `planet`, `neon`, `minimal`).
    #[arg(long, value_name = "NAME", conflicts_with = "skin")]
    pub preset: Option<String>,

    /// Load a saved skin on launch.
    #[arg(long, value_name = "NAME")]
    pub skin: Option<String>,

    /// Shared state query string such as `h=0.25&s=0.5`.
    #[arg(long, value_name = "QUERY")]
    pub state: Option<String>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Upper bound on the device pixel ratio used for the backing buffer.
    #[arg(long, value_name = "RATIO")]
    pub dpr_cap: Option<f64>,

    /// Neither load nor save parameter state.
    #[arg(long)]
    pub no_persist: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage saved skins.
    Skins(SkinsCommand),
    /// Print the share query for the stored values of the selected variant.
    Link,
    /// Forget the stored values of the selected variant.
    Reset,
    /// Show where configuration and state live.
    Paths,
}

#[derive(Parser, Debug)]
pub struct SkinsCommand {
    #[command(subcommand)]
    pub action: SkinsAction,
}

#[derive(Subcommand, Debug)]
pub enum SkinsAction {
    List,
    /// Print a skin as JSON.
    Export { name: String },
    Delete { name: String },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_variant(value: &str) -> Result<ShaderVariant, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("variant must not be empty".to_string());
    }
    trimmed.parse()
}
