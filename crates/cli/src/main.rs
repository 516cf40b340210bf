//! Lot Costing CLI - migrations, lot receipt, recipes and production.
//!
//! # Usage
//!
//! ```bash
//! # Create or upgrade the database schema
//! lotcost migrate
//!
//! # Receive 10 kg of flour costing 50.00 for the whole lot
//! lotcost lot add flour 10 50 --total --date 2026-10-01
//!
//! # Define a recipe and check stock for 5 loaves
//! lotcost recipe add bread flour 0.5
//! lotcost check bread 5
//!
//! # Quote, then produce
//! lotcost preview bread 5
//! lotcost produce bread 5 --sale-price 12.50
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `lot` - Receive and inspect raw-material lots
//! - `recipe` - Manage recipes (including YAML seeding)
//! - `check` / `preview` / `produce` - Production costing
//! - `batch` - Inspect the production ledger and set sale prices
//!
//! Pass `--json` to any command for machine-readable output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lot_costing_core::{CostBasis, ProductionBatchId, RecipeLineId};
use lot_costing_engine::models::{
    BatchFilter, CreateLotInput, CreateRecipeLineInput, LotFilter, ProductionRequest, RecipeFilter,
};
use lot_costing_engine::{EngineConfig, LogFormat};

mod commands;

#[derive(Parser)]
#[command(name = "lotcost")]
#[command(author, version, about = "Lot-based FIFO inventory costing")]
struct Cli {
    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Receive and inspect raw-material lots
    Lot {
        #[command(subcommand)]
        action: LotAction,
    },
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        action: RecipeAction,
    },
    /// Check whether stock covers a production run
    Check {
        /// Finished-good name
        product: String,
        /// Units to produce
        #[arg(value_parser = parse_amount)]
        quantity: Decimal,
    },
    /// Quote the material cost of a run without consuming stock
    Preview {
        /// Finished-good name
        product: String,
        /// Units to produce
        #[arg(value_parser = parse_amount)]
        quantity: Decimal,
    },
    /// Produce a batch, consuming lots oldest first
    Produce {
        /// Finished-good name
        product: String,
        /// Units to produce
        #[arg(value_parser = parse_amount)]
        quantity: Decimal,
        /// Sale price to record on the batch
        #[arg(long, value_parser = parse_amount)]
        sale_price: Option<Decimal>,
        /// Production date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Inspect production batches
    Batch {
        #[command(subcommand)]
        action: BatchAction,
    },
}

#[derive(Subcommand)]
enum LotAction {
    /// Receive a new lot
    Add {
        /// Material name
        item: String,
        /// Quantity received
        #[arg(value_parser = parse_amount)]
        quantity: Decimal,
        /// Cost per unit, or for the whole lot with `--total`
        #[arg(value_parser = parse_amount)]
        cost: Decimal,
        /// Treat COST as the total paid for the lot
        #[arg(long)]
        total: bool,
        /// Acquisition date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List open lots, oldest first
    List {
        /// Only items whose name contains this text
        #[arg(long)]
        item: Option<String>,
        /// Received on or after this date
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Received on or before this date
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Maximum number of lots
        #[arg(long)]
        limit: Option<i64>,
        /// Number of lots to skip
        #[arg(long)]
        offset: Option<i64>,
    },
    /// List every item name ever received
    Items,
    /// Show quantity and value on hand per item
    Stock,
}

#[derive(Subcommand)]
enum RecipeAction {
    /// Add an ingredient line to a recipe
    Add {
        /// Finished-good name
        product: String,
        /// Raw-material name
        ingredient: String,
        /// Quantity needed per unit produced
        #[arg(value_parser = parse_amount)]
        quantity_per_unit: Decimal,
    },
    /// Remove a recipe line by ID
    Remove {
        /// Recipe line ID
        id: i64,
    },
    /// List recipe lines
    List {
        /// Only products whose name contains this text
        #[arg(long)]
        product: Option<String>,
    },
    /// Replace recipes from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum BatchAction {
    /// List batches, newest first
    List {
        /// Only products whose name contains this text
        #[arg(long)]
        product: Option<String>,
        /// Produced on or after this date
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Produced on or before this date
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Maximum number of batches
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show a batch and the lots it consumed
    Show {
        /// Batch ID
        id: i64,
    },
    /// Set the sale price of a batch
    SetPrice {
        /// Batch ID
        id: i64,
        /// New sale price
        #[arg(value_parser = parse_amount)]
        price: Decimal,
    },
}

fn parse_amount(input: &str) -> Result<Decimal, String> {
    lot_costing_core::parse_decimal("value", input).map_err(|e| e.to_string())
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lot_costing_engine=info,lot_costing_cli=info".into());

    let is_json = format == LogFormat::Json;
    // stdout is reserved for command output.
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Text);
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_format);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let out = commands::Output { json: cli.json };
    let inventory = commands::connect(config).await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&inventory).await?,
        Commands::Lot { action } => match action {
            LotAction::Add {
                item,
                quantity,
                cost,
                total,
                date,
            } => {
                let input = CreateLotInput {
                    item,
                    quantity,
                    cost,
                    cost_basis: CostBasis::from_total_flag(total),
                    entry_date: date.unwrap_or_else(|| Utc::now().date_naive()),
                };
                commands::lot::add(&inventory, out, input).await?;
            }
            LotAction::List {
                item,
                from,
                to,
                limit,
                offset,
            } => {
                let filter = LotFilter {
                    item,
                    start_date: from,
                    end_date: to,
                    limit,
                    offset,
                };
                commands::lot::list(&inventory, out, &filter).await?;
            }
            LotAction::Items => commands::lot::items(&inventory, out).await?,
            LotAction::Stock => commands::lot::stock(&inventory, out).await?,
        },
        Commands::Recipe { action } => match action {
            RecipeAction::Add {
                product,
                ingredient,
                quantity_per_unit,
            } => {
                let input = CreateRecipeLineInput {
                    product,
                    ingredient,
                    quantity_per_unit,
                };
                commands::recipe::add(&inventory, out, input).await?;
            }
            RecipeAction::Remove { id } => {
                commands::recipe::remove(&inventory, out, RecipeLineId::new(id)).await?;
            }
            RecipeAction::List { product } => {
                commands::recipe::list(&inventory, out, &RecipeFilter { product }).await?;
            }
            RecipeAction::Seed { file } => commands::seed::recipes(&inventory, out, &file).await?,
        },
        Commands::Check { product, quantity } => {
            commands::production::check(&inventory, out, &product, quantity).await?;
        }
        Commands::Preview { product, quantity } => {
            commands::production::preview(&inventory, out, &product, quantity).await?;
        }
        Commands::Produce {
            product,
            quantity,
            sale_price,
            date,
        } => {
            let request = ProductionRequest {
                product,
                quantity,
                sale_price,
                produced_on: date,
            };
            commands::production::produce(&inventory, out, request).await?;
        }
        Commands::Batch { action } => match action {
            BatchAction::List {
                product,
                from,
                to,
                limit,
            } => {
                let filter = BatchFilter {
                    product,
                    start_date: from,
                    end_date: to,
                    limit,
                    offset: None,
                };
                commands::batch::list(&inventory, out, &filter).await?;
            }
            BatchAction::Show { id } => {
                commands::batch::show(&inventory, out, ProductionBatchId::new(id)).await?;
            }
            BatchAction::SetPrice { id, price } => {
                commands::batch::set_price(&inventory, out, ProductionBatchId::new(id), price).await?;
            }
        },
    }
    Ok(())
}
