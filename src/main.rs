mod config;
mod delegation_filter;
mod dispatcher;
mod dns;
mod error;
mod provider;
mod reverse_ipv6_provider;
mod zone_file_provider;
mod zonefile;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dispatcher::Dispatcher;

#[derive(Parser)]
#[command(name = "montague", about = "An authoritative DNS server")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Overrides the config file's `listen` address.
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Overrides RUST_LOG for this run (e.g. "debug", "montague=trace").
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let mut loaded = match config::load(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            return ExitCode::from(2);
        }
    };
    if let Some(listen) = cli.listen {
        loaded.listen = listen;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start tokio runtime");
            return ExitCode::from(1);
        }
    };

    runtime.block_on(run(loaded))
}

async fn run(loaded: config::LoadedConfig) -> ExitCode {
    let dispatcher = Arc::new(Dispatcher::new(loaded.providers, loaded.work_deadline));

    let serve = dispatcher.run(loaded.listen, loaded.tcp_backlog);
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => {
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to bind listeners");
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal, exiting");
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(override_level: Option<&str>) {
    let filter = match override_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
