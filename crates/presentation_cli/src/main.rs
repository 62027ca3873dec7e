//! mapframe CLI
//!
//! Command-line interface for geocoding, search, routing and projection.

#![allow(clippy::print_stdout)]

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use domain::value_objects::{Coordinate, TransportType};
use infrastructure::{AppConfig, MapServices, init_telemetry};

/// mapframe CLI
#[derive(Parser)]
#[command(name = "mapframe-cli")]
#[command(author, version, about = "Typed maps client", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./mapframe.toml if present)
    #[arg(short, long, env = "MAPFRAME_CONFIG")]
    config: Option<PathBuf>,

    /// Result language (BCP 47), overriding the configuration
    #[arg(short, long, global = true)]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an address or place name
    Geocode {
        /// Address or place name
        query: String,

        /// Prefer results near this position ("lat,lon")
        #[arg(long, value_parser = commands::parse_coordinate)]
        near: Option<Coordinate>,

        /// Limit results to these countries (ISO 3166-1 alpha-2)
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
    },

    /// Describe the places at a position
    Reverse {
        /// Position ("lat,lon")
        #[arg(value_parser = commands::parse_coordinate, allow_hyphen_values = true)]
        coordinate: Coordinate,
    },

    /// Find places matching a query
    Search {
        /// Search text
        query: String,

        /// Prefer results near this position ("lat,lon")
        #[arg(long, value_parser = commands::parse_coordinate)]
        near: Option<Coordinate>,
    },

    /// Suggest completions for a partial query
    Autocomplete {
        /// Partial search text
        query: String,

        /// Prefer results near this position ("lat,lon")
        #[arg(long, value_parser = commands::parse_coordinate)]
        near: Option<Coordinate>,
    },

    /// Plan a route
    ///
    /// Endpoints are addresses or "lat,lon" positions.
    /// Example: mapframe-cli directions "Cupertino" "37.7749,-122.4194" --alternates
    Directions {
        /// Start of the route
        origin: String,

        /// End of the route
        destination: String,

        /// Mode of travel (automobile or walking)
        #[arg(short, long, default_value = "automobile")]
        transport: TransportType,

        /// Ask for alternate routes
        #[arg(long)]
        alternates: bool,
    },

    /// Project a position onto the map's unit square (offline)
    Project {
        /// Position ("lat,lon")
        #[arg(value_parser = commands::parse_coordinate, allow_hyphen_values = true)]
        coordinate: Coordinate,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        config.telemetry.log_filter = filter.to_string();
    }
    if let Some(language) = cli.language {
        config.mapkit.language = Some(language);
    }
    init_telemetry(&config.telemetry)?;

    let output = match cli.command {
        Commands::Project { coordinate } => commands::project(coordinate),
        command => {
            let services = MapServices::from_config(&config)?;
            run(&services, command).await?
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(services: &MapServices, command: Commands) -> anyhow::Result<serde_json::Value> {
    match command {
        Commands::Geocode {
            query,
            near,
            countries,
        } => commands::geocode(services, &query, near, countries).await,
        Commands::Reverse { coordinate } => commands::reverse(services, coordinate).await,
        Commands::Search { query, near } => commands::search(services, &query, near).await,
        Commands::Autocomplete { query, near } => {
            commands::autocomplete(services, &query, near).await
        },
        Commands::Directions {
            origin,
            destination,
            transport,
            alternates,
        } => {
            let request =
                commands::directions_request(&origin, &destination, transport, alternates);
            commands::directions(services, request).await
        },
        Commands::Project { coordinate } => Ok(commands::project(coordinate)),
    }
}
