//! sipmon - Live SIP signaling monitor.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sipmon::config::ConfigLoader;
use sipmon::monitor::MonitorService;
use sipmon::server::MonitorServer;

#[derive(Parser)]
#[command(name = "sipmon", about = "Live SIP signaling monitor", version)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor server.
    Serve {
        /// Path to a config file, instead of the default search paths.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
        /// Interface to capture on.
        #[arg(short, long)]
        interface: Option<String>,
        /// Start capturing immediately instead of waiting for an API call.
        #[arg(long)]
        capture: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            interface,
            capture,
        } => {
            let loader = match config {
                Some(path) => ConfigLoader::with_path(path),
                None => ConfigLoader::new(),
            };
            let mut config = match loader.load() {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(error = %e, "failed to load configuration");
                    return std::process::ExitCode::FAILURE;
                }
            };

            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(interface) = interface {
                config.capture.interface = interface;
            }

            let service = Arc::new(MonitorService::new(config));

            if capture {
                if let Err(e) = service.start_capture(None) {
                    tracing::error!(error = %e, "failed to start capture");
                    return std::process::ExitCode::FAILURE;
                }
            }

            // Ctrl-C triggers the same graceful path as an API shutdown.
            let shutdown_service = Arc::clone(&service);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, shutting down");
                    shutdown_service.shutdown();
                }
            });

            let server = MonitorServer::new(Arc::clone(&service));
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "server error");
                service.shutdown();
                return std::process::ExitCode::FAILURE;
            }

            service.shutdown();
            std::process::ExitCode::SUCCESS
        }
    }
}
