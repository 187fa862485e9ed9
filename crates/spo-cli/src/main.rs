mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "spo")]
#[command(about = "Shopping points optimiser: loyalty and cashback rates for the page you shop on")]
struct Cli {
    /// Read the shop list from this YAML file instead of the service
    /// (overrides `SPO_SHOPS_PATH`).
    #[arg(long, global = true)]
    shops_file: Option<PathBuf>,

    /// Print views as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the domain key and proposal URL derived from a page URL.
    Domain { url: String },
    /// Show which known shop a page URL belongs to.
    Match { url: String },
    /// Show the rates of a shop, best offer per program.
    Rates { shop_id: i64 },
    /// Run the full popup lookup for a page URL.
    Lookup { url: String },
    /// Autocomplete shop names.
    Search { query: String },
    /// Propose a page URL as an additional address of a known shop.
    Propose {
        url: String,
        #[arg(long)]
        shop_id: i64,
    },
    /// Estimate what a purchase earns, or what a voucher costs, per program.
    Estimate {
        shop_id: i64,
        /// Purchase amount in euros.
        #[arg(long, conflicts_with = "voucher", required_unless_present = "voucher")]
        amount: Option<f64>,
        /// Voucher value in euros.
        #[arg(long)]
        voucher: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = spo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = cli.shops_file {
        config.shops_path = Some(path);
    }
    let output = if cli.json {
        render::Output::Json
    } else {
        render::Output::Text
    };

    match cli.command {
        Some(Commands::Domain { url }) => commands::run_domain(&url, output)?,
        Some(Commands::Match { url }) => commands::run_match(&config, &url, output).await?,
        Some(Commands::Rates { shop_id }) => {
            commands::run_rates(&config, shop_id, output).await?;
        }
        Some(Commands::Lookup { url }) => commands::run_lookup(&config, &url, output).await?,
        Some(Commands::Search { query }) => commands::run_search(&config, &query, output).await?,
        Some(Commands::Propose { url, shop_id }) => {
            commands::run_propose(&config, &url, shop_id, output).await?;
        }
        Some(Commands::Estimate {
            shop_id,
            amount,
            voucher,
        }) => {
            let mode = match (amount, voucher) {
                (Some(amount), _) => commands::EstimateMode::Purchase(amount),
                (None, Some(voucher)) => commands::EstimateMode::Voucher(voucher),
                (None, None) => anyhow::bail!("either --amount or --voucher is required"),
            };
            commands::run_estimate(&config, shop_id, mode, output).await?;
        }
        None => println!("spo ready; run `spo --help` for commands"),
    }

    Ok(())
}
