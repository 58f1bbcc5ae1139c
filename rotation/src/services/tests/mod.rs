//! Service-specific tests
//!
//! Each service has its own test file with dedicated fixtures and helpers.


/// Common test utilities for services
pub mod common {
    use chrono::{DateTime, TimeZone, Utc};
    use shared::{Dish, DishId, LastUsedUpdate, MenuBatch, MenuEntry, WeeklyMenu};

    pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    pub fn entree(id: &str, name: &str, ingredients: &[&str]) -> Dish {
        Dish::new(id, name, ["Entrée"], ingredients.iter().copied())
    }

    pub fn pantry() -> Vec<Dish> {
        vec![
            entree("dal", "Dal Tadka", &["lentil", "ghee", "cumin"]).with_last_used(at(2026, 9, 1)),
            entree("blt", "BLT", &["bacon", "lettuce", "tomato"]),
            Dish::new("brownie", "Brownie", ["Dessert"], ["cocoa", "butter"]),
        ]
    }

    /// Batch putting `ids` on the menu, all stamped with `when`
    pub fn batch_for(ids: &[&str], when: DateTime<Utc>) -> MenuBatch {
        let entries = ids
            .iter()
            .map(|id| MenuEntry {
                dish_id: DishId::new(*id),
                key: id.to_string(),
            })
            .collect();
        let last_used_updates = ids
            .iter()
            .map(|id| LastUsedUpdate {
                dish_id: DishId::new(*id),
                last_used: when,
            })
            .collect();
        MenuBatch {
            menu: WeeklyMenu {
                entries,
                committed_at: when,
            },
            last_used_updates,
        }
    }
}
