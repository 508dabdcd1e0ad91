use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mindmate::app::App;
use mindmate::config::MindmateConfig;
use mindmate::dashboard::DashboardSnapshot;
use mindmate::entry_filter::{end_of_day, start_of_day, EntryFilter};
use mindmate::journal_entry::MoodRating;
use mindmate::journal_store::{sort_newest_first, JournalStore};
use mindmate::sentiment::Sentiment;
use mindmate::ui::UI;

#[derive(Parser)]
#[command(name = "mindmate")]
#[command(about = "Mood journal with sentiment tagging and a mood dashboard")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "MINDMATE_CONFIG", default_value = "mindmate.toml")]
    config: PathBuf,

    /// Seed for the generated sample entries (overrides config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of sample entries to generate (overrides config file)
    #[arg(long)]
    sample_entries: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Print the dashboard snapshot as JSON
    Dashboard,
    /// Print journal entries as JSON, newest first
    Entries {
        /// Case-insensitive text or tag search
        #[arg(long)]
        search: Option<String>,
        /// Only entries with this mood (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        mood: Option<u8>,
        /// Only entries with this sentiment
        #[arg(long)]
        sentiment: Option<Sentiment>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let mut config = MindmateConfig::load(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.sample_seed = Some(seed);
    }
    if let Some(count) = cli.sample_entries {
        config.sample_entries = count;
    }

    let command = cli.command.unwrap_or(Command::Tui);
    init_tracing(&config, matches!(command, Command::Tui))?;
    info!(config = %cli.config.display(), entries = config.sample_entries, "starting MindMate");

    let mut rng = match config.sample_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let store = JournalStore::with_sample_entries(config.sample_entries, &mut rng, config.event_capacity);

    match command {
        Command::Tui => {
            let mut ui = UI::new()?;
            App::new(config, store).run(&mut ui)?;
        }
        Command::Dashboard => {
            let snapshot = DashboardSnapshot::build(store.entries(), Local::now(), config.dashboard_options());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Entries {
            search,
            mood,
            sentiment,
            from,
            to,
        } => {
            let filter = EntryFilter {
                search: search.unwrap_or_default(),
                mood: mood.map(MoodRating::new).transpose()?,
                sentiment,
                start: from.and_then(start_of_day),
                end: to.and_then(end_of_day),
            };
            let mut entries = store.filter(&filter);
            sort_newest_first(&mut entries);
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

/// The terminal UI owns the screen, so it logs to a file; the JSON commands log to stderr.
fn init_tracing(config: &MindmateConfig, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    if to_file {
        let file = File::create(&config.log_file)
            .wrap_err_with(|| format!("failed to create log file {}", config.log_file.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
