//! Start command - runs the wsgate server in the foreground.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::{error, info};

use wsgate_config::{AuthMode, AuthSection, LoadedConfig, WsgateConfig};
use wsgate_server::{AllowAll, AllowList, DenyAll, Server, ServerConfig, UuidSessions};
use wsgate_session::SharedAuthorizer;

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long, env = "WSGATE_PORT")]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long, env = "WSGATE_BIND")]
    pub bind: Option<String>,

    /// Session lifetime in seconds (overrides config)
    #[arg(long)]
    pub ttl_secs: Option<u64>,

    /// Seconds between expiry sweeps (overrides config)
    #[arg(long)]
    pub sweep_interval_secs: Option<u64>,

    /// Seconds shutdown waits before forcing close (overrides config)
    #[arg(long)]
    pub shutdown_grace_secs: Option<u64>,

    /// Authorizer: deny_all, allow_all, allow_list, uuid (overrides config)
    #[arg(long)]
    pub auth: Option<String>,

    /// Session ID to add to the allow list (can be specified multiple times)
    #[arg(long = "allow")]
    pub allow: Vec<String>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let loaded = load(&args)?;

    for warning in loaded.warnings() {
        eprintln!("warning: {}", warning);
    }

    if ctx.verbose {
        let mut applied = loaded.applied().peekable();
        if applied.peek().is_none() {
            println!("No config files found, using defaults + CLI args");
        }
        for layer in applied {
            println!("Loaded {} config: {}", layer.kind, layer.path.display());
        }
    }

    let mut config = loaded.config;
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    let auth = config.auth();
    let server_config = server_config(&config)?;
    let authorizer = build_authorizer(&auth);

    if auth.mode == AuthMode::DenyAll {
        eprintln!("warning: auth mode is deny_all, every session will be refused");
    }

    let running = Server::new(server_config)
        .with_shared_authorizer(authorizer)
        .start()
        .await?;

    println!("wsgate listening on ws://{}/ws/sessions/{{id}}", running.local_addr());
    println!("Auth mode: {}", auth.mode);
    println!("Press Ctrl+C to stop");

    running
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C, shutting down");
            }
        })
        .await?;

    info!("wsgate exited cleanly");
    Ok(())
}

/// Load configuration from an explicit file or by discovery.
fn load(args: &StartArgs) -> Result<LoadedConfig> {
    let loaded = match args.config {
        Some(ref path) => LoadedConfig::from_file(path)?,
        None => wsgate_config::discover(None)?,
    };
    Ok(loaded)
}

/// Apply CLI overrides on top of file values.
fn apply_overrides(config: &mut WsgateConfig, args: &StartArgs) -> Result<()> {
    let mut server = config.server();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(ref bind) = args.bind {
        server.bind = bind.clone();
    }
    if let Some(secs) = args.shutdown_grace_secs {
        server.shutdown_grace_secs = secs;
    }
    config.server = Some(server);

    let mut sessions = config.sessions();
    if let Some(secs) = args.ttl_secs {
        sessions.ttl_secs = secs;
    }
    if let Some(secs) = args.sweep_interval_secs {
        sessions.sweep_interval_secs = secs;
    }
    config.sessions = Some(sessions);

    let mut auth = config.auth();
    if let Some(ref mode) = args.auth {
        auth.mode = parse_auth_mode(mode)?;
    }
    auth.sessions.extend(args.allow.iter().cloned());
    config.auth = Some(auth);

    Ok(())
}

/// Convert the file model into the server's runtime configuration.
fn server_config(config: &WsgateConfig) -> Result<ServerConfig> {
    let server = config.server();
    let sessions = config.sessions();

    let addr = server
        .socket_addr()
        .context("invalid [server] bind address")?;

    Ok(ServerConfig::new()
        .with_bind_address(addr)
        .with_session_ttl(sessions.ttl())
        .with_sweep_interval(sessions.sweep_interval())
        .with_handshake_timeout(server.handshake_timeout())
        .with_buffer_sizes(server.read_buffer_size, server.write_buffer_size)
        .with_max_message_size(server.max_message_size)
        .with_shutdown_grace_period(server.shutdown_grace_period()))
}

/// Build the authorizer selected by `[auth]`.
fn build_authorizer(auth: &AuthSection) -> SharedAuthorizer {
    match auth.mode {
        AuthMode::DenyAll => Arc::new(DenyAll),
        AuthMode::AllowAll => Arc::new(AllowAll),
        AuthMode::AllowList => Arc::new(AllowList::new(auth.sessions.iter().cloned())),
        AuthMode::Uuid => Arc::new(UuidSessions),
    }
}

fn parse_auth_mode(s: &str) -> Result<AuthMode> {
    match s.to_lowercase().replace('-', "_").as_str() {
        "deny_all" => Ok(AuthMode::DenyAll),
        "allow_all" => Ok(AuthMode::AllowAll),
        "allow_list" => Ok(AuthMode::AllowList),
        "uuid" => Ok(AuthMode::Uuid),
        other => Err(anyhow::anyhow!(
            "Unknown auth mode '{}'. Valid: deny_all, allow_all, allow_list, uuid",
            other
        )),
    }
}
