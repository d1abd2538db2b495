use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use dirserve::config::Config;
use dirserve::server::Server;

/// Serve a directory listing and its files over HTTP/1.0.
#[derive(Parser, Debug)]
#[command(name = "dirserve", version, about)]
struct Cli {
    /// Address to bind (default: 0.0.0.0)
    #[arg(short = 'b', long)]
    bind_address: Option<String>,

    /// Port to listen on (default: 8888)
    port: Option<u16>,

    /// Directory to serve (default: current directory)
    #[arg(short = 'd', long)]
    directory: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short = 'c', long, env = "DIRSERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };
        cfg.apply_env();

        if let Some(bind) = self.bind_address {
            cfg.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(dir) = self.directory {
            if dir.is_dir() {
                cfg.static_files.root = dir;
            } else {
                tracing::warn!(
                    directory = %dir.display(),
                    "Directory not found, serving the current directory"
                );
                cfg.static_files.root = PathBuf::from(".");
            }
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let cfg = cli.into_config()?;

    let server = match Server::bind(&cfg) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };
    let shutdown = server.shutdown_handle();
    let mut event_loop = tokio::task::spawn_blocking(move || server.run());

    tokio::select! {
        res = &mut event_loop => {
            res.context("event loop panicked")??;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
            event_loop.await.context("event loop panicked")??;
        }
    }

    Ok(())
}
