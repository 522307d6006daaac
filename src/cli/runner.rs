use anyhow::Result;
use tracing::info;

use crate::cli::args::{Cli, Command};
use crate::cli::context::init_configs;
use crate::cli::position::handle_position;
use crate::cli::remove::handle_remove;
use crate::config::LpburnConfig;

pub async fn run(cli: Cli, config: LpburnConfig) -> Result<()> {
    if let Some(addr) = crate::monitoring::try_init_prometheus(&config.prometheus)? {
        info!(
            target: "monitoring",
            listen = %addr,
            "Prometheus exporter 已启动"
        );
    }

    match cli.command {
        Command::Position(args) => handle_position(&config, args).await?,
        Command::Remove(cmd) => handle_remove(&config, cmd).await?,
        Command::Init(args) => init_configs(args)?,
    }

    Ok(())
}
