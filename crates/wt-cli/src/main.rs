use std::io;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wt_cli::commands::{
    categories, classify, ingest, overrides, pattern, record, retention, stats, status, util,
};
use wt_cli::{CategoriesAction, Cli, Commands, Config, OverrideAction, PatternAction};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let mut tracker = wt_cli::open_tracker(&config)?;

    let mut stdout = io::stdout().lock();
    let now = Utc::now();

    match command {
        Commands::Record(args) => record::run(&mut stdout, &mut tracker, args, now)?,
        Commands::Ingest => {
            let summary = ingest::run(io::stdin().lock(), &mut stdout, &mut tracker, now)?;
            tracing::debug!(?summary, "ingest finished");
        }
        Commands::Classify { url, explain } => {
            classify::run(&mut stdout, &tracker, &url, explain)?;
        }
        Commands::Stats { date, json } => {
            let date = match date {
                Some(date) => util::parse_date(&date, now)?,
                None => now.date_naive(),
            };
            stats::run(&mut stdout, &tracker, date, json)?;
        }
        Commands::Categories(action) => match action {
            CategoriesAction::List => categories::list(&mut stdout, &tracker)?,
            CategoriesAction::Add { name } => categories::add(&mut stdout, &mut tracker, &name)?,
            CategoriesAction::Remove { name } => {
                categories::remove(&mut stdout, &mut tracker, &name)?;
            }
        },
        Commands::Override(action) => match action {
            OverrideAction::Set { domain, category } => {
                overrides::set(&mut stdout, &mut tracker, &domain, &category)?;
            }
            OverrideAction::Remove { domain } => {
                overrides::remove(&mut stdout, &mut tracker, &domain)?;
            }
            OverrideAction::List => overrides::list(&mut stdout, &tracker)?,
        },
        Commands::Pattern(action) => match action {
            PatternAction::Add { category, pattern } => {
                pattern::add(&mut stdout, &mut tracker, &category, &pattern)?;
            }
            PatternAction::List => pattern::list(&mut stdout, &tracker)?,
        },
        Commands::Retention { days } => retention::run(&mut stdout, &mut tracker, days, now)?,
        Commands::Status => status::run(&mut stdout, &tracker, &config)?,
    }

    Ok(())
}
