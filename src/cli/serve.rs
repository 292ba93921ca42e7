//! CLI subcommand: `filegate serve`

use anyhow::Result;
use clap::Args;
use tracing::warn;

use crate::config::Config;
use crate::server::Server;

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured port
    #[arg(short, long, env = "FILEGATE_PORT")]
    pub port: Option<u16>,

    /// Override the configured bind address
    #[arg(short, long, env = "FILEGATE_BIND")]
    pub bind: Option<String>,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = Config::load()?;

    if !config.server.enabled {
        anyhow::bail!("Server is disabled in config (server.enabled = false)");
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    if !config.protected_file_path().exists() {
        warn!(
            "Protected file {} does not exist yet; verify will fail until it is provisioned",
            config.protected_file_path().display()
        );
    }

    let server = Server::new(&config)?;
    server.run().await
}
