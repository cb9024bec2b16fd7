//! Daemon entry point (§5): parse CLI/env configuration, build the
//! `Context`, spawn its background tasks, then block on a shutdown
//! signal and tear everything down in reverse order within a hard
//! deadline.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::info;

use poolbridge::config::{self, AppConfig};
use poolbridge::context::{self, Context};
use poolbridge::controller_type::ControllerType;

/// Drain-and-flush deadline once a shutdown signal arrives (§5).
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "poolbridged", about = "RS-485 pool-automation protocol bridge")]
struct Cli {
    /// Which board protocol this daemon's primary port speaks.
    #[arg(long, env = "POOL_CONTROLLER_TYPE", value_enum, default_value_t = ControllerType::IntelliCenter)]
    controller_type: ControllerType,

    /// Directory holding pool-config.json / pool-state.json and their
    /// quarantine/tmp siblings.
    #[arg(long, env = "POOL_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Defaults-template config file, lowest precedence of the three
    /// config sources (§6).
    #[arg(long, env = "POOL_DEFAULTS_CONFIG", default_value = "config/defaults.json")]
    defaults_config: PathBuf,

    /// User overlay config file; hot-reloaded on change (§6).
    #[arg(long, env = "POOL_USER_CONFIG", default_value = "config/user.json")]
    user_config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.defaults_config, &cli.user_config).await?;
    init_logging(&config.log.app.level);

    let state_dir = cli.state_dir.unwrap_or_else(context::default_state_dir);
    tokio::fs::create_dir_all(&state_dir).await?;
    info!("poolbridged: state directory {}", state_dir.display());

    let mut ctx = Context::build(config, cli.controller_type, &state_dir).await;

    let change_for_reload = std::sync::Arc::clone(&ctx.change);
    config::spawn_hot_reload(cli.defaults_config, cli.user_config, move |_reloaded| {
        info!("poolbridged: configuration reloaded; comms/location take effect on restart");
        change_for_reload.publish_configuration_reloaded();
    });

    ctx.spawn_tasks();
    info!(
        "poolbridged: running ({} on port {})",
        ctx.board.controller_type(),
        ctx.port.id
    );

    wait_for_shutdown_signal().await;
    info!("poolbridged: shutdown signal received, draining within {SHUTDOWN_DEADLINE:?}");
    ctx.shutdown(SHUTDOWN_DEADLINE).await;
    Ok(())
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level.to_string());
    env_logger::Builder::from_env(env).init();
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
