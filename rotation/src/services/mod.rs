//! Service implementations
//!
//! This module contains real implementations of the service traits: the
//! system clock, an in-memory corpus/store and the JSON recipe-book file.

pub mod clock;
pub mod memory;
pub mod recipe_book;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use clock::{FixedClock, SystemClock};
pub use memory::InMemoryStore;
pub use recipe_book::{BookLock, JsonRecipeBook};

use shared::Dish;

/// Whether `dish` belongs in a corpus filtered on `filter_tag`
///
/// Untagged dishes are never eligible; an empty filter accepts any tagged dish.
pub(crate) fn is_eligible(dish: &Dish, filter_tag: &str) -> bool {
    !dish.tags.is_empty() && (filter_tag.is_empty() || dish.has_tag(filter_tag))
}
