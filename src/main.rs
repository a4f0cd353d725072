use chrono::Utc;
use clap::{Parser, Subcommand};
use quake_scraper::config::Config;
use quake_scraper::constants::{HIGH_MAGNITUDE_THRESHOLD, RECENT_WINDOW_HOURS};
use quake_scraper::filter::{high_magnitude_count, recent_within};
use quake_scraper::pipeline::Pipeline;
use quake_scraper::types::{EarthquakeQuery, EarthquakeResponse};
use quake_scraper::{logging, metrics, server};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "quake_scraper")]
#[command(about = "Latest earthquakes in Turkey from AFAD and Kandilli")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest earthquakes once and print them
    Fetch {
        /// Only show events in this province (diacritics are ignored)
        #[arg(long)]
        province: Option<String>,
        /// Only show events at or above this magnitude
        #[arg(long)]
        min_magnitude: Option<f64>,
        /// Maximum number of events to print
        #[arg(long)]
        limit: Option<usize>,
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
        /// Window used for the "recent" count in the summary
        #[arg(long, default_value_t = RECENT_WINDOW_HOURS)]
        recent_hours: i64,
    },
    /// Serve the earthquake API over HTTP
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let config = Config::load()?;
    let pipeline = Pipeline::new(config.pipeline.clone())?;
    info!("Sources in priority order: {:?}", pipeline.source_names());

    match cli.command {
        Commands::Fetch {
            province,
            min_magnitude,
            limit,
            json,
            recent_hours,
        } => {
            let query = EarthquakeQuery {
                province,
                min_magnitude,
                limit,
            };
            let response = pipeline.get_latest_with(&query).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                let offset = config.pipeline.local_offset()?;
                let now = Utc::now().with_timezone(&offset).naive_local();
                print_summary(&response, now, recent_hours);
            }
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            if let Err(e) = server::start_server(Arc::new(pipeline), port).await {
                error!("HTTP server failed: {}", e);
                println!("❌ HTTP server failed: {}", e);
                return Err(e.into());
            }
        }
    }
    Ok(())
}

fn print_summary(response: &EarthquakeResponse, now: chrono::NaiveDateTime, recent_hours: i64) {
    if response.status {
        println!("\n🌍 {}", response.message);
    } else {
        println!("\n⚠️  {}", response.message);
    }
    println!("   Shown: {}", response.count);
    println!(
        "   Last {}h: {}",
        recent_hours,
        recent_within(&response.result, now, recent_hours).len()
    );
    println!(
        "   M{:.1}+: {}",
        HIGH_MAGNITUDE_THRESHOLD,
        high_magnitude_count(&response.result, HIGH_MAGNITUDE_THRESHOLD)
    );

    if response.result.is_empty() {
        return;
    }
    println!();
    for quake in &response.result {
        let province = quake
            .province
            .as_deref()
            .map(|p| format!(" [{}]", p))
            .unwrap_or_default();
        println!(
            "   {} {}  M{:.1}  {:>5.1} km  {}{}",
            quake.occurred_date.format("%d.%m.%Y"),
            quake.occurred_time.format("%H:%M:%S"),
            quake.magnitude,
            quake.depth_km,
            quake.location,
            province
        );
    }
}
