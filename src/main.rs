use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use lifecost::api::AppState;
use lifecost::aqi::{AqiCategory, health_impact_score, normalize_existing_aqi};
use lifecost::etl::{self, EtlPipeline, EtlReport};
use lifecost::{
    AqiNormalizer, CityStore, LifeCostCalculator, LifeCostConfig, Pollutant, PollutantSample,
    ResponseCache, telemetry, web,
};

#[derive(Parser, Debug)]
#[command(name = "lifecost")]
#[command(about = "Compare cities by cost of living, air quality and life expectancy")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "LIFECOST_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API and the front end
    Serve,
    /// Collect provider data for all tracked cities, or refresh one city
    Etl {
        #[arg(long, requires = "country")]
        city: Option<String>,
        #[arg(long, requires = "city")]
        country: Option<String>,
    },
    /// Load the built-in demo dataset
    SeedDemo,
    /// Compare two stored cities ("City" or "City, Country")
    Compare {
        origin: String,
        destination: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Standardized AQI from pollutant concentrations in µg/m³
    Aqi(AqiArgs),
    /// List stored cities and their latest data
    Cities,
}

#[derive(Args, Debug)]
struct AqiArgs {
    #[arg(long)]
    pm25: Option<f64>,
    #[arg(long)]
    pm10: Option<f64>,
    #[arg(long)]
    no2: Option<f64>,
    #[arg(long)]
    so2: Option<f64>,
    #[arg(long)]
    co: Option<f64>,
    #[arg(long)]
    o3: Option<f64>,
    /// An index already reported under a national scale
    #[arg(long, conflicts_with_all = ["pm25", "pm10", "no2", "so2", "co", "o3"])]
    reported: Option<f64>,
    /// Scale of --reported: epa, cn, india or eu
    #[arg(long, default_value = "epa", requires = "reported")]
    standard: String,
}

impl AqiArgs {
    fn sample(&self) -> PollutantSample {
        PollutantSample::new()
            .with(Pollutant::Pm25, self.pm25)
            .with(Pollutant::Pm10, self.pm10)
            .with(Pollutant::No2, self.no2)
            .with(Pollutant::So2, self.so2)
            .with(Pollutant::Co, self.co)
            .with(Pollutant::O3, self.o3)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = LifeCostConfig::load_from_path(cli.config.clone())?;
    let _telemetry = telemetry::init(&config.logging, &config.telemetry, cli.verbose)?;

    match cli.command {
        Command::Aqi(args) => aqi(&args),
        Command::Serve => serve(&config).await,
        Command::Etl { city, country } => run_etl(&config, city.zip(country)).await,
        Command::SeedDemo => {
            let store = open_store(&config)?;
            let report = etl::seed_demo(&store).await?;
            print_report(&report);
            Ok(())
        }
        Command::Compare {
            origin,
            destination,
            json,
        } => compare(&config, &origin, &destination, json).await,
        Command::Cities => cities(&config).await,
    }
}

fn open_store(config: &LifeCostConfig) -> Result<CityStore> {
    let path = config.store_path();
    CityStore::open(&path).with_context(|| format!("Failed to open store at {}", path.display()))
}

fn pipeline(config: &LifeCostConfig, store: CityStore) -> Result<EtlPipeline> {
    let cache = match ResponseCache::open(config.cache_path(), config.cache_ttl()) {
        Ok(cache) => Some(cache),
        Err(err) => {
            warn!(error = %err, "Response cache unavailable, continuing without it");
            None
        }
    };
    if config.api.rapidapi_key.is_none() {
        warn!("No RapidAPI key configured; only life expectancy will be collected");
    }
    EtlPipeline::from_config(config, store, cache)
}

fn aqi(args: &AqiArgs) -> Result<()> {
    if let Some(reported) = args.reported {
        let aqi = normalize_existing_aqi(reported, &args.standard);
        let category = AqiCategory::from_aqi(aqi);
        println!("AQI: {aqi:.1} ({category}), from {reported} on the {} scale", args.standard);
        println!("Health impact score: {:.0}/100", health_impact_score(aqi));
        println!("{}", category.health_message());
        return Ok(());
    }

    let sample = args.sample();
    if sample.is_empty() {
        bail!("Give at least one concentration, e.g. --pm25 35.4");
    }
    let Some(aqi) = AqiNormalizer::standardized_aqi(&sample) else {
        bail!("No valid concentration given");
    };
    let category = AqiCategory::from_aqi(aqi);

    println!("AQI: {aqi:.1} ({category})");
    println!("Health impact score: {:.0}/100", health_impact_score(aqi));
    if let Some(dominant) = AqiNormalizer::dominant_pollutant(&sample) {
        println!("Dominant pollutant: {dominant}");
    }
    for (pollutant, concentration) in sample.iter() {
        if let Some(index) = AqiNormalizer::sub_index(pollutant, concentration) {
            println!("  {pollutant:<6} {concentration:>8.1} µg/m³ → {index:.1}");
        }
    }
    println!("{}", category.health_message());
    Ok(())
}

async fn serve(config: &LifeCostConfig) -> Result<()> {
    let store = open_store(config)?;
    let pipeline = pipeline(config, store.clone())?;
    let state = Arc::new(AppState::new(store, Some(pipeline)));
    web::run(config, state).await?;
    info!("Server shutdown complete");
    Ok(())
}

async fn run_etl(config: &LifeCostConfig, target: Option<(String, String)>) -> Result<()> {
    let store = open_store(config)?;
    let pipeline = pipeline(config, store)?;
    let report = match target {
        Some((city, country)) => pipeline.update_city(&city, &country).await?,
        None => pipeline.run_full().await?,
    };
    print_report(&report);
    Ok(())
}

fn print_report(report: &EtlReport) {
    println!("Cities seeded:          {}", report.cities_seeded);
    println!(
        "Air quality:            {} updated, {} without data",
        report.air_quality_updated, report.air_quality_missing
    );
    println!(
        "Cost of living:         {} updated, {} without data",
        report.cost_of_living_updated, report.cost_of_living_missing
    );
    println!(
        "Life expectancy:        {} updated, {} estimated",
        report.life_expectancy_updated, report.life_expectancy_estimated
    );
    if !report.failures.is_empty() {
        println!("Failures:");
        for failure in &report.failures {
            println!("  - {failure}");
        }
    }
}

async fn compare(
    config: &LifeCostConfig,
    origin: &str,
    destination: &str,
    json: bool,
) -> Result<()> {
    let store = open_store(config)?;
    let origin = store.find_record(origin).await?;
    let destination = store.find_record(destination).await?;
    let result = LifeCostCalculator::compare(&origin, &destination);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{result}");
    }
    Ok(())
}

async fn cities(config: &LifeCostConfig) -> Result<()> {
    let store = open_store(config)?;
    let rows = store.analysis().await?;
    if rows.is_empty() {
        println!("No cities stored. Run `lifecost etl` or `lifecost seed-demo` first.");
        return Ok(());
    }

    let show = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    println!("{:<32} {:>7} {:>7} {:>7}", "City", "AQI", "Cost", "Life");
    for row in &rows {
        println!(
            "{:<32} {:>7} {:>7} {:>7}",
            row.key.label(),
            show(row.standardized_aqi),
            show(row.cost_of_living_index),
            show(row.life_expectancy)
        );
    }
    Ok(())
}
