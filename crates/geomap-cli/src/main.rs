//! geomap - record companies and their locations, and list them as map
//! markers.
//!
//! Talks to the company REST service through `geomap-core`. The service URL
//! comes from `--api-url`, `GEOMAP_API_URL` or the config file.

mod commands;

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use geomap_core::{Config, QueryClient};

#[derive(Parser, Debug)]
#[command(name = "geomap", version, about = "Record company locations and view them on a map")]
struct Cli {
    /// Base URL of the company service (overrides GEOMAP_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or change the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    #[command(flatten)]
    Service(ServiceCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Save the service URL to the config file
    SetUrl { url: String },

    /// Print the effective configuration
    Show,
}

/// Commands that talk to the company service.
#[derive(Subcommand, Debug)]
enum ServiceCommand {
    /// List all companies
    List,

    /// Show one company
    Get { id: i64 },

    /// Add a company
    Create {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        industry: String,

        #[arg(long, default_value = "", allow_negative_numbers = true)]
        latitude: String,

        #[arg(long, default_value = "", allow_negative_numbers = true)]
        longitude: String,

        #[arg(long)]
        address: Option<String>,
    },

    /// Change fields of an existing company
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        latitude: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        longitude: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Remove a company
    Delete { id: i64 },

    /// Print one marker per company
    Map,

    /// Check that the service is up
    Health,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_url = Some(url);
    }

    let command = match cli.command {
        Command::Config { action } => {
            let path = Config::config_path()?;
            return match action {
                ConfigAction::SetUrl { url } => commands::set_url(&path, &url),
                ConfigAction::Show => commands::show_config(&config, &path),
            };
        }
        Command::Service(command) => command,
    };

    let api = config.api_client()?;
    info!(api_url = api.base_url(), "geomap starting");

    let client = QueryClient::with_options(api.clone(), config.query_options());
    let result = match command {
        ServiceCommand::List => commands::list(&client).await,
        ServiceCommand::Get { id } => commands::get(&client, id).await,
        ServiceCommand::Create {
            name,
            industry,
            latitude,
            longitude,
            address,
        } => {
            let form = geomap_core::CompanyForm {
                name,
                industry,
                latitude: latitude.into(),
                longitude: longitude.into(),
                address,
            };
            commands::create(&client, &form).await
        }
        ServiceCommand::Update {
            id,
            name,
            industry,
            latitude,
            longitude,
            address,
        } => {
            let form = geomap_core::UpdateCompanyForm {
                name,
                industry,
                latitude: latitude.map(Into::into),
                longitude: longitude.map(Into::into),
                address,
            };
            commands::update(&client, id, &form).await
        }
        ServiceCommand::Delete { id } => commands::delete(&client, id).await,
        ServiceCommand::Map => commands::map(&client).await,
        ServiceCommand::Health => commands::health(&api).await,
    };

    client.teardown();
    result
}
