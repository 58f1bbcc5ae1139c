//! Commit coordination
//!
//! Turns the selected dishes into a single [`MenuBatch`] (menu overwrite plus
//! one `last_used` update per picked dish, all stamped with the same commit
//! time) and hands it to the store in one call. This call is the only point
//! where a rotation run changes persisted state.

use chrono::{DateTime, Utc};
use shared::{Dish, LastUsedUpdate, MenuBatch, MenuEntry, WeeklyMenu};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::CommitError;
use crate::traits::{Clock, MenuStore};

/// Packages a selection into one atomic write
#[derive(Clone)]
pub struct CommitCoordinator {
    clock: Arc<dyn Clock>,
}

impl CommitCoordinator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Build the batch for `picked`, stamped with the current clock time
    ///
    /// The stamp is raised to the newest existing `last_used` among the picked
    /// dishes if the clock is behind it, so `last_used` never moves backwards.
    pub fn build_batch(&self, picked: &[Dish]) -> Result<MenuBatch, CommitError> {
        if picked.is_empty() {
            return Err(CommitError::new("refusing to commit an empty menu"));
        }

        let mut seen = HashSet::with_capacity(picked.len());
        for dish in picked {
            if !seen.insert(&dish.id) {
                return Err(CommitError::new(format!("dish {} appears twice in the menu", dish.id)));
            }
        }

        let committed_at = commit_timestamp(self.clock.now(), picked);
        let menu = WeeklyMenu {
            entries: picked.iter().map(MenuEntry::from).collect(),
            committed_at,
        };
        let last_used_updates = picked
            .iter()
            .map(|dish| LastUsedUpdate {
                dish_id: dish.id.clone(),
                last_used: committed_at,
            })
            .collect();

        Ok(MenuBatch { menu, last_used_updates })
    }

    /// Persist the menu and `last_used` updates in one store write
    ///
    /// Store failures come back unchanged; nothing is retried here.
    pub async fn commit<S>(&self, picked: &[Dish], store: &S) -> Result<WeeklyMenu, CommitError>
    where
        S: MenuStore + ?Sized,
    {
        let batch = self.build_batch(picked)?;
        let menu = batch.menu.clone();
        store.write_batch(batch).await?;
        Ok(menu)
    }
}

fn commit_timestamp(now: DateTime<Utc>, picked: &[Dish]) -> DateTime<Utc> {
    picked
        .iter()
        .filter_map(|dish| dish.last_used)
        .fold(now, |latest, last_used| latest.max(last_used))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockClock, MockMenuStore};
    use chrono::{Duration, TimeZone};

    fn commit_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
    }

    fn coordinator() -> CommitCoordinator {
        let mut clock = MockClock::new();
        clock.expect_now().returning(commit_time);
        CommitCoordinator::new(Arc::new(clock))
    }

    fn menu_dishes() -> Vec<Dish> {
        vec![
            Dish::new("dal", "Dal Tadka", ["curry"], ["lentil"]).with_last_used(commit_time() - Duration::days(40)),
            Dish::new("blt", "BLT", ["sandwich"], ["bacon"]),
        ]
    }

    #[test]
    fn test_batch_shares_one_timestamp() {
        let batch = coordinator().build_batch(&menu_dishes()).unwrap();

        assert_eq!(batch.menu.committed_at, commit_time());
        assert_eq!(batch.menu.keys(), vec!["dal-tadka", "blt"]);
        assert_eq!(batch.last_used_updates.len(), 2);
        assert!(batch
            .last_used_updates
            .iter()
            .all(|update| update.last_used == batch.menu.committed_at));
    }

    #[test]
    fn test_timestamp_never_moves_backwards() {
        let ahead = commit_time() + Duration::hours(3);
        let dishes = vec![Dish::new("x", "X", ["t"], ["y"]).with_last_used(ahead)];

        let batch = coordinator().build_batch(&dishes).unwrap();
        assert_eq!(batch.menu.committed_at, ahead);
    }

    #[test]
    fn test_empty_and_duplicate_menus_rejected() {
        assert!(coordinator().build_batch(&[]).is_err());

        let dish = Dish::new("x", "X", ["t"], ["y"]);
        assert!(coordinator().build_batch(&[dish.clone(), dish]).is_err());
    }

    #[tokio::test]
    async fn test_commit_writes_once_in_selection_order() {
        let mut store = MockMenuStore::new();
        store
            .expect_write_batch()
            .withf(|batch| {
                let ids: Vec<&str> = batch.menu.dish_ids().map(|id| id.as_str()).collect();
                ids == vec!["dal", "blt"]
            })
            .times(1)
            .returning(|_| Ok(()));

        let menu = coordinator().commit(&menu_dishes(), &store).await.unwrap();
        assert_eq!(menu.len(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_verbatim() {
        let mut store = MockMenuStore::new();
        store
            .expect_write_batch()
            .times(1)
            .returning(|_| Err(CommitError::new("transaction aborted")));

        let err = coordinator().commit(&menu_dishes(), &store).await.unwrap_err();
        assert_eq!(err, CommitError::new("transaction aborted"));
    }
}
