// dugout entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config
// 3. Initialize tracing (log to file, stdout is for results)
// 4. Wire Ctrl+C to a cancel token
// 5. Run the subcommand and print its result

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use dugout_app::card::{CardRequest, PlayerCard};
use dugout_app::render::{render_card, render_career};
use dugout_app::service::{current_season, DatasetCaches, FetchOutcome, StatsService};
use dugout_app::source::{CsvPopulation, MlbStatsClient};
use dugout_baseball::{enhance, QualificationRules, StatGroup};
use dugout_core::config::{self, Config, LoggingConfig};
use dugout_core::cancel_pair;

#[derive(Parser, Debug)]
#[command(name = "dugout")]
#[command(about = "Baseball stat lines, career aggregation and percentile ranks", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config dir, then built-in values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Season line with percentiles against the qualified league
    Card {
        player_id: u32,

        /// Season (defaults to the current year)
        #[arg(long)]
        season: Option<u16>,

        #[arg(long, default_value = "hitting")]
        group: StatGroup,
    },

    /// Season-by-season table, rated against the player's own seasons
    Career {
        player_id: u32,

        #[arg(long, default_value = "hitting")]
        group: StatGroup,
    },

    /// Rank a player from a local CSV population
    Rank {
        csv: PathBuf,

        /// Player name as it appears in the file
        name: String,

        #[arg(long, default_value = "hitting")]
        group: StatGroup,

        /// Season label for the card header
        #[arg(long)]
        season: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref()).context("failed to load configuration")?;

    init_tracing(&config.logging)?;
    info!("dugout starting up");

    let (cancel, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling in-flight requests");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Card {
            player_id,
            season,
            group,
        } => {
            let service = api_service(&config)?;
            let request = CardRequest {
                player_id,
                season: season.unwrap_or_else(current_season),
                group,
            };
            if let Some(card) = finish(service.player_card(request, &token).await)? {
                print!("{}", render_card(&card));
            }
        }
        Commands::Career { player_id, group } => {
            let service = api_service(&config)?;
            if let Some(table) = finish(service.career(player_id, group, &token).await)? {
                print!("{}", render_career(&table));
            }
        }
        Commands::Rank {
            csv,
            name,
            group,
            season,
        } => {
            let card = rank_from_csv(&config, csv, &name, group, season)?;
            print!("{}", render_card(&card));
        }
    }

    info!("dugout finished");
    Ok(())
}

fn api_service(config: &Config) -> anyhow::Result<StatsService<MlbStatsClient>> {
    let client = MlbStatsClient::from_config(&config.api).context("failed to build HTTP client")?;
    let caches = Arc::new(DatasetCaches::from_config(&config.cache));
    Ok(StatsService::new(client, caches, config))
}

/// Ready → `Some`, cancelled → `None` with a note on stderr, failed → error.
fn finish<T>(outcome: FetchOutcome<T>) -> anyhow::Result<Option<T>> {
    let value = outcome.into_result().context("fetch failed")?;
    if value.is_none() {
        eprintln!("cancelled");
    }
    Ok(value)
}

fn rank_from_csv(
    config: &Config,
    path: PathBuf,
    name: &str,
    group: StatGroup,
    season: Option<u16>,
) -> anyhow::Result<PlayerCard> {
    let source = CsvPopulation::new(path, group);
    let population = source
        .load()
        .with_context(|| format!("failed to load {}", source.path().display()))?;

    let entry = population
        .find_by_name(name)
        .with_context(|| format!("no player named {name:?} in {}", source.path().display()))?;
    let line = enhance(&entry.line, group);

    let rules = QualificationRules {
        min_plate_appearances: config.qualification.min_plate_appearances,
        min_innings_pitched: config.qualification.min_innings_pitched,
    };
    let qualified = population.enhanced().qualify(&rules);
    info!(
        "ranking {} against {} of {} lines",
        name,
        qualified.len(),
        population.len()
    );

    let request = CardRequest {
        player_id: entry.player_id.unwrap_or_default(),
        season: season.unwrap_or_else(current_season),
        group,
    };
    Ok(PlayerCard::build(request, line, &qualified))
}

/// Initialize tracing to log to a file (stdout carries command output).
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = logging.resolved_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("dugout.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
