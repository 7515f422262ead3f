//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use wsgate_config::{LayerStatus, WsgateConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the merged configuration, defaults included
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./wsgate.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = wsgate_config::discover(None)?;

    for warning in loaded.warnings() {
        eprintln!("warning: {}", warning);
    }

    if loaded.applied().next().is_none() {
        println!("# No config files loaded (using defaults)");
    } else if ctx.verbose {
        for layer in loaded.applied() {
            println!("# Loaded {}: {}", layer.kind, layer.path.display());
        }
    }

    let config = &loaded.config;
    let resolved = WsgateConfig {
        server: Some(config.server()),
        sessions: Some(config.sessions()),
        auth: Some(config.auth()),
    };
    print!("{}", resolved.to_toml()?);

    if let Err(e) = resolved.validate() {
        eprintln!("warning: {}", e);
    }

    Ok(())
}

fn cmd_which() -> Result<()> {
    let loaded = wsgate_config::discover(None)?;

    println!("Config file search order (later overrides earlier):\n");

    for layer in &loaded.layers {
        let status = match &layer.status {
            LayerStatus::Applied => "loaded   ".to_string(),
            LayerStatus::Absent => "not found".to_string(),
            LayerStatus::Skipped(reason) => format!("skipped ({})", reason),
        };
        println!("  {:<8} {} {}", layer.kind, status, layer.path.display());
    }

    println!();
    let loaded_count = loaded.applied().count();
    if loaded_count == 0 {
        println!("No config files found. Run 'wsgate config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("wsgate.toml")
    } else {
        wsgate_config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    wsgate_config::write_config(&WsgateConfig::example(), &path)?;
    println!("Created {}", path.display());
    println!("Sessions are denied until [auth] mode is changed.");

    Ok(())
}

fn cmd_path() -> Result<()> {
    if let Some(path) = wsgate_config::user_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}
