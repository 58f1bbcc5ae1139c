//! Test helpers and builder patterns for rotation tests
//!
//! The builder wires a scheduler over one shared in-memory store acting as
//! both corpus and menu store, with a fixed clock, a stepping RNG that always
//! picks the first LRU candidate and an isolated run lock, so tests running in
//! parallel never contend on the process-wide one.

use rand::rngs::mock::StepRng;
use shared::{Dish, DishId};
use std::sync::Arc;

use super::fixtures::TestFixtures;
use rotation::services::{FixedClock, InMemoryStore};
use rotation::*;

pub type TestScheduler = RotationScheduler<Arc<InMemoryStore>, Arc<InMemoryStore>>;

/// Builder for schedulers with sensible test defaults
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    store: Arc<InMemoryStore>,
    clock: FixedClock,
    seed: Option<u64>,
    run_lock: Option<RunLock>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default().with_menu_size(4),
            store: Arc::new(InMemoryStore::with_dishes(TestFixtures::scenario_corpus())),
            clock: FixedClock(TestFixtures::now()),
            seed: None,
            run_lock: None,
        }
    }

    pub fn with_dishes(mut self, dishes: Vec<Dish>) -> Self {
        self.store = Arc::new(InMemoryStore::with_dishes(dishes));
        self
    }

    pub fn with_store(mut self, store: Arc<InMemoryStore>) -> Self {
        self.store = store;
        self
    }

    /// Adjust the configuration with a setup function
    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(SchedulerConfig) -> SchedulerConfig,
    {
        self.config = setup(self.config);
        self
    }

    pub fn with_clock(mut self, clock: FixedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Use a seeded RNG instead of the first-candidate stepper
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_run_lock(mut self, run_lock: RunLock) -> Self {
        self.run_lock = Some(run_lock);
        self
    }

    /// Build the scheduler; the store handle stays available to the test
    pub fn build(self) -> (TestScheduler, Arc<InMemoryStore>) {
        let scheduler = RotationScheduler::new(
            self.config,
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::new(self.clock),
        )
        .expect("valid test configuration");

        let scheduler = match self.seed {
            Some(seed) => scheduler.with_seed(seed),
            None => scheduler.with_rng(StepRng::new(0, 0)),
        };
        let scheduler = scheduler.with_run_lock(self.run_lock.unwrap_or_default());

        (scheduler, self.store)
    }
}

/// Test helper functions for common operations
pub struct TestHelpers;

impl TestHelpers {
    /// Ids of a menu in order
    pub fn menu_ids(menu: &shared::WeeklyMenu) -> Vec<String> {
        menu.dish_ids().map(|id| id.to_string()).collect()
    }

    pub fn picked_ids(selection: &MenuSelection) -> Vec<String> {
        selection.picked.iter().map(|dish| dish.id.to_string()).collect()
    }

    /// Mock corpus that hands out `dishes` on every fetch
    pub fn corpus_returning(dishes: Vec<Dish>) -> MockCorpusSource {
        let mut corpus = MockCorpusSource::new();
        corpus
            .expect_fetch_eligible_dishes()
            .returning(move |_| Ok(dishes.clone()));
        corpus
    }

    /// Mock store with no previous menu that must never be written to
    pub fn untouchable_store() -> MockMenuStore {
        let mut store = MockMenuStore::new();
        store.expect_load_menu().returning(|| Ok(None));
        store.expect_write_batch().times(0);
        store
    }

    /// Assert the store holds `last_used` for each id
    pub fn assert_last_used(store: &InMemoryStore, ids: &[&str], expected: Option<chrono::DateTime<chrono::Utc>>) {
        for id in ids {
            let dish = store.dish(id).unwrap_or_else(|| panic!("dish {id} missing"));
            assert_eq!(dish.last_used, expected, "last_used of {id}");
        }
    }

    pub fn dish_id(id: &str) -> DishId {
        DishId::new(id)
    }
}
