//! Rotation scheduler
//!
//! Owns one rotation run end to end: takes the run lock for the corpus scope,
//! fetches the eligible dishes, drops last week's menu, checks the corpus
//! preconditions, runs the selector and hands the result to the commit
//! coordinator. Everything before the commit is side-effect free, so a
//! cancellation observed before that point leaves the store untouched.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use shared::{logging, run_debug, run_info, run_warn, Dish, RunId, WeeklyMenu};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::commit::CommitCoordinator;
use crate::config::SchedulerConfig;
use crate::core::normalizer::IngredientNormalizer;
use crate::core::scorer::DiversityScorer;
use crate::core::selector::{MenuSelection, RotationSelector};
use crate::error::{RotationError, RotationResult};
use crate::run_lock::RunLock;
use crate::traits::{Clock, CorpusSource, MenuStore};

/// The corpus had fewer eligible dishes than the configured menu size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub available: usize,
    pub requested: usize,
}

/// Result of a committed rotation run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub menu: WeeklyMenu,
    pub selection: MenuSelection,
    /// Set when the menu is shorter than requested
    pub shortfall: Option<Shortfall>,
}

/// Selection computed without committing
#[derive(Debug, Clone)]
pub struct RotationPreview {
    pub run_id: RunId,
    pub reference_time: DateTime<Utc>,
    pub selection: MenuSelection,
    pub shortfall: Option<Shortfall>,
}

/// Weekly menu scheduler over a corpus source and a menu store
pub struct RotationScheduler<C, S>
where
    C: CorpusSource + 'static,
    S: MenuStore + 'static,
{
    config: SchedulerConfig,

    /// Injected services
    corpus: C,
    store: S,
    clock: Arc<dyn Clock>,

    selector: RotationSelector,
    coordinator: CommitCoordinator,

    /// Tie-break source for LRU seeding
    rng: Mutex<Box<dyn RngCore + Send>>,

    run_lock: RunLock,
}

impl<C, S> RotationScheduler<C, S>
where
    C: CorpusSource + 'static,
    S: MenuStore + 'static,
{
    /// Create a scheduler with injected dependencies and an entropy-seeded RNG
    ///
    /// Runs are serialized per corpus scope across every scheduler in the
    /// process; see [`RunLock::process_wide`].
    pub fn new(config: SchedulerConfig, corpus: C, store: S, clock: Arc<dyn Clock>) -> RotationResult<Self> {
        config.validate()?;

        let scorer = DiversityScorer::new(config.weights, IngredientNormalizer::new())
            .with_recency_horizon(config.recency_horizon_days);
        let selector = RotationSelector::new(scorer, config.menu_size);
        let coordinator = CommitCoordinator::new(Arc::clone(&clock));

        Ok(Self {
            config,
            corpus,
            store,
            clock,
            selector,
            coordinator,
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
            run_lock: RunLock::process_wide(),
        })
    }

    /// Replace the tie-break RNG, e.g. with a seeded one for reproducible runs
    pub fn with_rng<R>(self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            rng: Mutex::new(Box::new(rng)),
            ..self
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    /// Replace the process-wide run lock, e.g. with an isolated one
    pub fn with_run_lock(mut self, run_lock: RunLock) -> Self {
        self.run_lock = run_lock;
        self
    }

    /// Use a custom common-ingredient list instead of the built-in one
    pub fn with_normalizer(mut self, normalizer: IngredientNormalizer) -> Self {
        let scorer = DiversityScorer::new(self.config.weights, normalizer)
            .with_recency_horizon(self.config.recency_horizon_days);
        self.selector = RotationSelector::new(scorer, self.config.menu_size);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn corpus(&self) -> &C {
        &self.corpus
    }

    pub fn run_lock(&self) -> &RunLock {
        &self.run_lock
    }

    /// Run one rotation that cannot be cancelled
    pub async fn run(&self) -> RotationResult<RunOutcome> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_with_cancel(&cancel_rx).await
    }

    /// Run one rotation, abandoning it if `cancel` turns true before the commit
    pub async fn run_with_cancel(&self, cancel: &watch::Receiver<bool>) -> RotationResult<RunOutcome> {
        let run_id = RunId::new();
        let scope = self.config.corpus_scope.clone();

        let _guard = self.run_lock.try_acquire(&scope).ok_or_else(|| {
            run_warn!(run_id, "🔒 Rotation already in progress for scope '{}'", scope);
            RotationError::RunInProgress { scope: scope.clone() }
        })?;
        run_info!(run_id, "🔄 Starting rotation run for scope '{}'", scope);

        let preview = self.select(run_id.clone(), cancel).await?;

        // Last point at which the run can be abandoned without side effects
        ensure_not_cancelled(&run_id, cancel)?;

        let menu = match self.coordinator.commit(&preview.selection.picked, &self.store).await {
            Ok(menu) => menu,
            Err(e) => {
                logging::log_error(&run_id, "Menu commit", &e);
                return Err(e.into());
            }
        };

        logging::log_success(
            &run_id,
            &format!("Committed {}-dish menu: {}", menu.len(), menu.keys().join(", ")),
        );

        Ok(RunOutcome {
            run_id: preview.run_id,
            menu,
            selection: preview.selection,
            shortfall: preview.shortfall,
        })
    }

    /// Compute the next menu without committing it
    pub async fn preview(&self) -> RotationResult<RotationPreview> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.select(RunId::new(), &cancel_rx).await
    }

    async fn select(&self, run_id: RunId, cancel: &watch::Receiver<bool>) -> RotationResult<RotationPreview> {
        let dishes = self.eligible_dishes(&run_id).await?;
        ensure_not_cancelled(&run_id, cancel)?;

        if dishes.is_empty() {
            run_warn!(run_id, "🍽️  No eligible dishes in scope '{}'", self.config.corpus_scope);
            return Err(RotationError::EmptyCorpus {
                scope: self.config.corpus_scope.clone(),
            });
        }

        let shortfall = self.check_corpus_size(&run_id, dishes.len())?;
        let reference_time = self.clock.now();

        let selection = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.selector.run(dishes, reference_time, &mut **rng)
        };

        for (day, round) in selection.rounds.iter().enumerate() {
            match &round.score {
                None => {
                    run_debug!(
                        run_id,
                        "🌱 Day {}: seeded {} from {} least recently used",
                        day + 1,
                        round.dish_id,
                        round.lru_ties
                    );
                }
                Some(score) => {
                    run_debug!(
                        run_id,
                        "📊 Day {}: {} (score {:.3} = ingredients {:.2}, tags {:.2}, recency {:.2})",
                        day + 1,
                        round.dish_id,
                        score.total,
                        score.ingredient_overlap,
                        score.tag_overlap,
                        score.recency
                    );
                }
            }
        }

        Ok(RotationPreview {
            run_id,
            reference_time,
            selection,
            shortfall,
        })
    }

    async fn eligible_dishes(&self, run_id: &RunId) -> RotationResult<Vec<Dish>> {
        let mut dishes = self.corpus.fetch_eligible_dishes(&self.config.filter_tag).await?;
        ensure_unique(&dishes)?;
        logging::log_progress(
            run_id,
            "Corpus fetched",
            &format!("{} dishes tagged '{}'", dishes.len(), self.config.filter_tag),
        );

        if self.config.exclude_previous_menu {
            if let Some(previous) = self.store.load_menu().await? {
                let before = dishes.len();
                dishes.retain(|dish| !previous.contains(&dish.id));
                run_debug!(
                    run_id,
                    "⏭️  Excluded {} dishes from last week's menu",
                    before - dishes.len()
                );
            }
        }

        Ok(dishes)
    }

    fn check_corpus_size(&self, run_id: &RunId, available: usize) -> RotationResult<Option<Shortfall>> {
        let requested = self.selector.target();
        if available >= requested {
            return Ok(None);
        }
        if !self.config.allow_short_menu {
            return Err(RotationError::InsufficientCorpus { available, requested });
        }
        run_warn!(
            run_id,
            "⚠️  Only {} eligible dishes for a {}-dish menu, committing a short menu",
            available,
            requested
        );
        Ok(Some(Shortfall { available, requested }))
    }
}

fn ensure_not_cancelled(run_id: &RunId, cancel: &watch::Receiver<bool>) -> RotationResult<()> {
    if *cancel.borrow() {
        run_warn!(run_id, "🛑 Rotation cancelled before commit, nothing persisted");
        return Err(RotationError::Cancelled {
            run_id: run_id.to_string(),
        });
    }
    Ok(())
}

/// Dish ids and names must be unique within one run's corpus
fn ensure_unique(dishes: &[Dish]) -> RotationResult<()> {
    let mut ids = HashSet::with_capacity(dishes.len());
    let mut names = HashSet::with_capacity(dishes.len());
    for dish in dishes {
        if !ids.insert(&dish.id) {
            return Err(RotationError::DuplicateDish {
                key: dish.id.to_string(),
            });
        }
        if !names.insert(dish.name.as_str()) {
            return Err(RotationError::DuplicateDish { key: dish.name.clone() });
        }
    }
    Ok(())
}
