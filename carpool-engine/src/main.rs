use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use carpool_engine::directions::{DirectionsClient, DirectionsConfig, FixtureProvider, RouteProvider};
use carpool_engine::dto::{ErrorResponse, RoutePreviewResponse, parse_departure};
use carpool_engine::engine::EngineError;
use carpool_engine::route::{RoutePlan, RouteQuery, Resolver};

#[derive(Parser)]
#[command(
    name = "carpool-engine",
    about = "Carpool trip routing tools",
    long_about = "Resolve carpool routes against the live directions API\n\
                  or a recorded transcript and print the result as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a route through optional stops and print it
    Preview {
        /// Trip start
        #[arg(long)]
        origin: String,
        /// Trip destination
        #[arg(long)]
        destination: String,
        /// Intermediate stop; repeat for several
        #[arg(long = "stop")]
        stops: Vec<String>,
        /// Departure as YYYY-MM-DDTHH:MM (defaults to now)
        #[arg(long)]
        departure: Option<String>,
        /// Replay responses from a transcript instead of calling the API
        #[arg(long)]
        fixture: Option<PathBuf>,
        /// Directions API key
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Seconds to wait for the provider
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Preview {
            origin,
            destination,
            stops,
            departure,
            fixture,
            api_key,
            timeout,
        } => {
            preview(
                origin,
                destination,
                stops,
                departure,
                fixture,
                api_key,
                Duration::from_secs(timeout),
            )
            .await
        }
    };

    match result {
        Ok(plan) => print_json(&RoutePreviewResponse::from(&plan)),
        Err(e) => {
            print_json(&ErrorResponse::from(&e));
            ExitCode::FAILURE
        }
    }
}

async fn preview(
    origin: String,
    destination: String,
    stops: Vec<String>,
    departure: Option<String>,
    fixture: Option<PathBuf>,
    api_key: Option<String>,
    timeout: Duration,
) -> Result<RoutePlan, EngineError> {
    let departure: NaiveDateTime = match departure {
        Some(text) => parse_departure(&text)?,
        None => Local::now().naive_local(),
    };
    let query = RouteQuery {
        start: origin,
        destination,
        waypoints: stops,
        extra_stop: None,
        departure,
    };

    match fixture {
        Some(path) => {
            let provider = FixtureProvider::load(&path).map_err(provider_error)?;
            info!(path = %path.display(), entries = provider.len().await, "loaded transcript");
            resolve(&provider, &query, timeout).await
        }
        None => {
            let api_key = api_key.ok_or_else(|| {
                EngineError::Validation("GOOGLE_API_KEY is not set".to_string())
            })?;
            let config = DirectionsConfig::new(api_key).with_timeout(timeout.as_secs());
            let client = DirectionsClient::new(config).map_err(provider_error)?;
            resolve(&client, &query, timeout).await
        }
    }
}

async fn resolve<P: RouteProvider>(
    provider: &P,
    query: &RouteQuery,
    timeout: Duration,
) -> Result<RoutePlan, EngineError> {
    Ok(Resolver::new(provider, timeout).resolve(query).await?)
}

fn provider_error(e: carpool_engine::directions::DirectionsError) -> EngineError {
    EngineError::RouteUnavailable(e.into())
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to encode output: {e}");
            ExitCode::FAILURE
        }
    }
}
