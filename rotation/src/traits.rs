//! Trait definitions with mockall annotations for testing
//!
//! These are the seams between the rotation core and the outside world: the
//! corpus the dishes come from, the store the menu goes to and the clock that
//! stamps it. Every trait gets a generated mock for dependency injection.

use chrono::{DateTime, Utc};
use shared::{Dish, MenuBatch, WeeklyMenu};
use std::sync::Arc;

use crate::error::{CommitError, RotationResult};

/// Source of candidate dishes
#[mockall::automock]
#[async_trait::async_trait]
pub trait CorpusSource: Send + Sync {
    /// Fetch every eligible dish carrying `filter_tag`
    ///
    /// # Parameters
    /// - `filter_tag`: Category a dish must carry (e.g. "Entrée"); empty means any tagged dish
    ///
    /// # Returns
    /// Dishes in a deterministic order. The selector uses this order to break
    /// score ties, so it must be stable across calls.
    async fn fetch_eligible_dishes(&self, filter_tag: &str) -> RotationResult<Vec<Dish>>;
}

/// Persistence for the weekly menu and `last_used` bookkeeping
#[mockall::automock]
#[async_trait::async_trait]
pub trait MenuStore: Send + Sync {
    /// Load the currently persisted weekly menu, if any
    async fn load_menu(&self) -> RotationResult<Option<WeeklyMenu>>;

    /// Apply a menu batch atomically
    ///
    /// Either the menu overwrite and every `last_used` update land, or none
    /// of them do. Implementations must not retry.
    async fn write_batch(&self, batch: MenuBatch) -> Result<(), CommitError>;
}

/// Wall clock abstraction so reference and commit times can be pinned in tests
#[mockall::automock]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

// Shared handles, so one backend can serve as both corpus and store
#[async_trait::async_trait]
impl<T: CorpusSource + ?Sized> CorpusSource for Arc<T> {
    async fn fetch_eligible_dishes(&self, filter_tag: &str) -> RotationResult<Vec<Dish>> {
        (**self).fetch_eligible_dishes(filter_tag).await
    }
}

#[async_trait::async_trait]
impl<T: MenuStore + ?Sized> MenuStore for Arc<T> {
    async fn load_menu(&self) -> RotationResult<Option<WeeklyMenu>> {
        (**self).load_menu().await
    }

    async fn write_batch(&self, batch: MenuBatch) -> Result<(), CommitError> {
        (**self).write_batch(batch).await
    }
}
