use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "payroll-engine",
    about = "Evaluate payroll components and process payroll runs",
    version
)]
struct Cli {
    /// Directory holding engine.yaml, components.yaml and changes/
    #[arg(long, global = true, default_value = "./config/standard")]
    config_dir: PathBuf,
    /// Log level or filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the catalog report as JSON
    Report,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    let config = ConfigLoader::load(&cli.config_dir)?;
    info!(
        catalog = %config.metadata().name,
        version = %config.metadata().version,
        components = config.catalog().len(),
        "Loaded component catalog"
    );

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(config, args).await,
        Command::Report => {
            println!("{}", serde_json::to_string_pretty(&config.catalog().report())?);
            Ok(())
        }
    }
}

async fn serve(config: ConfigLoader, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!(address = %listener.local_addr()?, "Listening");
    axum::serve(listener, router).await?;
    Ok(())
}
