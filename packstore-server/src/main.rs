use clap::{Parser, Subcommand};
use packstore_server::config::Config;
use packstore_server::server::run_server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "packstore")]
#[command(about = "Replicated per-node store for cluster-shared artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node server
    Server {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Initialize a new node's data directory
    Init {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server { config } => {
            tracing::info!("Starting packstore server with config: {}", config);

            let cfg = match Config::from_file(&config) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };

            tracing::info!(
                "Node ID: {}, advertise address: {}",
                cfg.node.node_id,
                cfg.node.advertise_addr
            );

            if let Err(e) = run_server(cfg).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Init { config } => {
            tracing::info!("Initializing packstore node with config: {}", config);

            let cfg = match Config::from_file(&config) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };

            match std::fs::create_dir_all(&cfg.node.data_dir) {
                Ok(_) => tracing::info!("Created data directory: {:?}", cfg.node.data_dir),
                Err(e) => {
                    tracing::error!(
                        "Failed to create data directory {:?}: {}",
                        cfg.node.data_dir,
                        e
                    );
                    std::process::exit(1);
                }
            }

            tracing::info!("Node {} initialized successfully", cfg.node.node_id);
        }
    }
}
