use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;

mod catalog;
mod config;
mod feed;
mod fetch;
mod init;
mod output;
mod poll;
mod scheduler;
mod status;
mod store;
mod submit;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "feeder", about = "Polls RSS/Atom feeds and queues new videos on MeTube")]
struct Cli {
    /// Config file (default feeder.json, or FEEDER_CONFIG)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,
    /// Postgres DSN for the state store (or DATABASE_URL); JSON files otherwise
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Directory for JSON state files (default .feeder-state, or FEEDER_STATE_DIR)
    #[arg(global = true, long)]
    state_dir: Option<PathBuf>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare the state store and write a starter config
    Init,
    Feed(feed::FeedCmd),
    Poll(poll::PollCmd),
    Run(scheduler::RunCmd),
    Status(status::StatusCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and FEEDER_LOG_FORMAT
    telemetry::config::init_tracing();

    let config_path = config::resolve_config_path(cli.config);
    let target = store::StoreTarget::resolve(cli.dsn, config::resolve_state_dir(cli.state_dir));

    match cli.command {
        Commands::Init => init::run(&config_path, &target).await?,
        Commands::Feed(args) => feed::run(&config_path, args).await?,
        Commands::Poll(args) => poll::run(&config_path, &target, args).await?,
        Commands::Run(args) => scheduler::run(&config_path, &target, args).await?,
        Commands::Status(args) => status::run(&config_path, &target, args).await?,
    }

    Ok(())
}
