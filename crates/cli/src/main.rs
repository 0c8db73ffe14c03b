//! Hearth CLI - database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! hearth-cli migrate
//!
//! # Import a catalog file, the default tariff and a sample promotion
//! hearth-cli seed --products data/products.json
//!
//! # Run one catalog sync from the configured source
//! hearth-cli sync
//!
//! # Quote delivery without a server
//! hearth-cli delivery quote --city Казань --weight 12,5 --subtotal 48000
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "hearth-cli")]
#[command(author, version, about = "Hearth CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with a catalog and reference data
    Seed {
        /// Catalog JSON document (`{"products": [...]}`)
        #[arg(short, long, default_value = "data/products.json")]
        products: PathBuf,

        /// Do not create the sample promotion
        #[arg(long)]
        skip_promotions: bool,
    },
    /// Run one catalog sync from the configured source
    Sync,
    /// Delivery tools
    Delivery {
        #[command(subcommand)]
        action: DeliveryAction,
    },
}

#[derive(Subcommand)]
enum DeliveryAction {
    /// Quote every delivery method for a city
    Quote {
        /// Destination city
        #[arg(short, long)]
        city: String,

        /// Parcel weight in kg (`,` or `.` as decimal separator)
        #[arg(short, long, default_value = "1")]
        weight: String,

        /// Cart subtotal in rubles
        #[arg(short, long, default_value = "0")]
        subtotal: Decimal,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            products,
            skip_promotions,
        } => {
            commands::seed::run(&commands::seed::SeedOptions {
                products,
                skip_promotions,
            })
            .await?;
        }
        Commands::Sync => commands::sync::run().await?,
        Commands::Delivery { action } => match action {
            DeliveryAction::Quote {
                city,
                weight,
                subtotal,
            } => commands::delivery::quote_command(&city, &weight, subtotal),
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delivery_quote() {
        let cli = Cli::try_parse_from([
            "hearth-cli",
            "delivery",
            "quote",
            "--city",
            "Казань",
            "--subtotal",
            "48000",
        ])
        .unwrap();
        let Commands::Delivery {
            action: DeliveryAction::Quote {
                city,
                weight,
                subtotal,
            },
        } = cli.command
        else {
            panic!("expected delivery quote");
        };
        assert_eq!(city, "Казань");
        assert_eq!(weight, "1");
        assert_eq!(subtotal, Decimal::new(48_000, 0));
    }
}
