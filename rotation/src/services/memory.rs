//! In-memory corpus and menu store
//!
//! Not durable, but applies batches with the same all-or-nothing contract as
//! a real store, which makes it the workhorse for scheduler tests. Commit
//! failures can be injected to exercise the atomicity guarantee.

use async_trait::async_trait;
use shared::{Dish, MenuBatch, WeeklyMenu};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::is_eligible;
use crate::error::{CommitError, RotationResult};
use crate::traits::{CorpusSource, MenuStore};

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    fail_commits: AtomicBool,
}

#[derive(Default)]
struct Inner {
    dishes: Vec<Dish>,
    menu: Option<WeeklyMenu>,
    commits: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dishes(dishes: Vec<Dish>) -> Self {
        let store = Self::new();
        store.lock().dishes = dishes;
        store
    }

    pub fn with_menu(self, menu: WeeklyMenu) -> Self {
        self.lock().menu = Some(menu);
        self
    }

    /// Make every following `write_batch` fail until switched off again
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn dishes(&self) -> Vec<Dish> {
        self.lock().dishes.clone()
    }

    pub fn dish(&self, id: &str) -> Option<Dish> {
        self.lock().dishes.iter().find(|dish| dish.id.as_str() == id).cloned()
    }

    pub fn menu(&self) -> Option<WeeklyMenu> {
        self.lock().menu.clone()
    }

    /// Number of batches applied so far
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CorpusSource for InMemoryStore {
    async fn fetch_eligible_dishes(&self, filter_tag: &str) -> RotationResult<Vec<Dish>> {
        Ok(self
            .lock()
            .dishes
            .iter()
            .filter(|dish| is_eligible(dish, filter_tag))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MenuStore for InMemoryStore {
    async fn load_menu(&self) -> RotationResult<Option<WeeklyMenu>> {
        Ok(self.menu())
    }

    async fn write_batch(&self, batch: MenuBatch) -> Result<(), CommitError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(CommitError::new("in-memory store rejected the batch"));
        }

        let mut inner = self.lock();

        // Resolve every update before touching anything
        let positions: HashMap<_, usize> = inner
            .dishes
            .iter()
            .enumerate()
            .map(|(index, dish)| (dish.id.clone(), index))
            .collect();
        let mut resolved = Vec::with_capacity(batch.last_used_updates.len());
        for update in &batch.last_used_updates {
            let index = positions
                .get(&update.dish_id)
                .copied()
                .ok_or_else(|| CommitError::new(format!("unknown dish {}", update.dish_id)))?;
            resolved.push((index, update.last_used));
        }

        for (index, last_used) in resolved {
            inner.dishes[index].last_used = Some(last_used);
        }
        inner.menu = Some(batch.menu);
        inner.commits += 1;
        Ok(())
    }
}
