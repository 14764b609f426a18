use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;

mod config;
mod device;
mod error;
mod geo;
mod output;
mod recipes;
mod telemetry;
mod viewmodel;
mod vision;

#[derive(Parser)]
#[command(name = "cookbook", about = "Browse recipes from a remote feed")]
struct Cli {
    /// Recipe feed URL; overrides COOKBOOK_RECIPES_URL
    #[arg(global = true, long)]
    url: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,
    /// Answer "yes" to every prompt
    #[arg(global = true, short = 'y', long, default_value_t = false)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and list recipes
    List(recipes::ListCmd),
    /// Find the recipe closest to a position
    Closest(recipes::ClosestCmd),
    /// Show one recipe
    Details(recipes::DetailsCmd),
    /// Tag a dish photo with the configured vision service
    Tag(recipes::TagCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and COOKBOOK_LOG_FORMAT
    telemetry::config::init_tracing();

    let mut cfg = config::AppConfig::from_env();
    if let Some(url) = cli.url {
        cfg.recipes_url = url;
    }
    let session = recipes::Session { cfg, assume_yes: cli.yes };

    match cli.command {
        Commands::List(args) => recipes::list(&session, args).await?,
        Commands::Closest(args) => recipes::closest(&session, args).await?,
        Commands::Details(args) => recipes::details(&session, args).await?,
        Commands::Tag(args) => recipes::tag(&session, args).await?,
    }

    Ok(())
}
