//! MonSphere command line.
//!
//! Renders pages as text, reading through a JSON-RPC endpoint.
//!
//! Usage:
//!   monsphere --rpc-url http://127.0.0.1:8545 forum 3
//!   monsphere sessions 0x52908400098527886E0F7030069857D2E4169EE7
//!   monsphere theme toggle
//!
//! Environment variables:
//!   MONSPHERE_CONFIG - Configuration file (default: built-in Monad testnet settings)
//!   MONSPHERE_RPC_URL - JSON-RPC endpoint (default: first `network.add_chain.rpc_urls` entry)
//!   RUST_LOG - Log filter, overrides --log-level

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use monsphere::chain::Eip1193Provider;
use monsphere::shared::MonsphereConfig;
use monsphere::ui::FileStore;
use monsphere::{execute, App, AppResult, Command, HttpProvider, TerminalNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PREFERENCES_FILE: &str = "preferences.toml";

#[derive(Parser, Debug)]
#[command(name = "monsphere")]
#[command(about = "MonSphere social client on Monad")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "MONSPHERE_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint for reads
    #[arg(long, env = "MONSPHERE_RPC_URL")]
    rpc_url: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

fn preferences_path() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from(PREFERENCES_FILE),
        |dir| dir.join("monsphere").join(PREFERENCES_FILE),
    )
}

async fn run(cli: Cli) -> AppResult<String> {
    let config = MonsphereConfig::load_or_default(cli.config.as_deref())?;

    let endpoint = cli.rpc_url.or_else(|| {
        config
            .network
            .add_chain
            .as_ref()
            .and_then(|params| params.rpc_urls.first().cloned())
    });
    let read_only = endpoint.map(|url| {
        tracing::debug!(%url, "reading through JSON-RPC");
        Arc::new(HttpProvider::new(&url)) as Arc<dyn Eip1193Provider>
    });

    let app = App::new(
        config,
        None,
        read_only,
        Arc::new(TerminalNotifier),
        Arc::new(FileStore::new(preferences_path())),
    );
    app.start(false).await;
    execute(&app, cli.command).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
