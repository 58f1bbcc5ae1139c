//! Main entry point for the rotation binary
//!
//! Wires the scheduler to a JSON recipe book on disk and the system clock,
//! runs one weekly rotation and prints the committed menu as JSON.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

use rotation::{
    services::{JsonRecipeBook, SystemClock},
    RotationScheduler, SchedulerConfig,
};
use shared::logging;

/// Weekly menu rotation over a recipe book
#[derive(Parser)]
#[command(name = "rotation")]
#[command(about = "Picks a diverse weekly menu from a recipe book and records it")]
pub struct Args {
    /// Recipe book JSON file (dishes plus the current weekly menu)
    #[arg(long, default_value = "recipes.json")]
    pub book: PathBuf,

    /// Dishes per menu (overrides ROTATION_MENU_SIZE)
    #[arg(long)]
    pub menu_size: Option<usize>,

    /// Category every candidate must carry (overrides ROTATION_FILTER_TAG)
    #[arg(long)]
    pub filter_tag: Option<String>,

    /// Seed for the least-recently-used tie-break, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the menu that would be picked without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Allow dishes from the current menu to be picked again
    #[arg(long)]
    pub keep_previous: bool,

    /// Fail instead of committing a short menu when the corpus is too small
    #[arg(long)]
    pub strict: bool,
}

impl Args {
    fn apply(&self, mut config: SchedulerConfig) -> SchedulerConfig {
        if let Some(menu_size) = self.menu_size {
            config = config.with_menu_size(menu_size);
        }
        if let Some(tag) = &self.filter_tag {
            config = config.with_filter_tag(tag.trim());
        }
        if self.keep_previous {
            config = config.with_exclude_previous_menu(false);
        }
        if self.strict {
            config = config.with_allow_short_menu(false);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init_tracing(Some(&args.log_level));

    let config = args.apply(SchedulerConfig::from_env().context("loading scheduler configuration")?);
    config.validate().context("validating scheduler configuration")?;

    logging::log_startup(&format!(
        "weekly rotation over {} ({} dishes tagged '{}')",
        args.book.display(),
        config.menu_size,
        config.filter_tag
    ));

    let book_path = args.book.clone();
    let recipe_book = Arc::new(JsonRecipeBook::new(&book_path));

    let mut scheduler = RotationScheduler::new(
        config,
        Arc::clone(&recipe_book),
        Arc::clone(&recipe_book),
        Arc::new(SystemClock),
    )?;
    if let Some(seed) = args.seed {
        scheduler = scheduler.with_seed(seed);
    }

    if args.dry_run {
        let preview = scheduler.preview().await?;
        let keys: Vec<String> = preview.selection.picked.iter().map(|dish| dish.menu_key()).collect();
        println!("{}", serde_json::to_string_pretty(&keys)?);
        logging::log_shutdown("dry run finished, nothing written");
        return Ok(());
    }

    // Held until exit so a second process over the same book fails fast
    let _book_lock = recipe_book
        .try_lock_run()
        .with_context(|| format!("locking {}", book_path.display()))?;

    // Ctrl+C before the commit abandons the run without touching the book
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown("Received Ctrl+C signal");
                let _ = cancel_tx.send(true);
            }
            Err(err) => {
                tracing::error!(error = %err, "❌ Signal handling failed");
            }
        }
    });

    let outcome = scheduler
        .run_with_cancel(&cancel_rx)
        .await
        .with_context(|| format!("rotating {}", book_path.display()))?;

    if let Some(shortfall) = outcome.shortfall {
        eprintln!(
            "warning: only {} of {} dishes available",
            shortfall.available, shortfall.requested
        );
    }
    println!("{}", serde_json::to_string_pretty(&outcome.menu)?);

    Ok(())
}
