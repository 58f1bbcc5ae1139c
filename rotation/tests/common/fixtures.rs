//! Test fixtures and data for rotation tests
//!
//! The five-dish curry/stir-fry/sandwich corpus is the reference scenario:
//! A and E are tied as least recently used, D shares nothing with A, and B
//! shares both an ingredient and the tag with A.

use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{Dish, DishId, MenuEntry, WeeklyMenu};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const ENTREE: &'static str = "Entrée";
    pub const SCOPE: &'static str = "recipes";

    /// Reference "now" for every run
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
    }

    pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    pub fn days_ago(days: i64) -> DateTime<Utc> {
        Self::now() - Duration::days(days)
    }

    pub fn dish(id: &str, tag: &str, ingredients: &[&str], last_used: DateTime<Utc>) -> Dish {
        Dish::new(id, format!("Dish {id}"), [Self::ENTREE, tag], ingredients.iter().copied()).with_last_used(last_used)
    }

    /// Corpus of five in the order A, B, C, D, E
    pub fn scenario_corpus() -> Vec<Dish> {
        vec![
            Self::dish("A", "curry", &["rice", "lentil"], Self::date(2026, 1, 1)),
            Self::dish("B", "curry", &["rice", "naan"], Self::date(2026, 9, 10)),
            Self::dish("C", "stir-fry", &["noodle", "tofu"], Self::date(2026, 9, 20)),
            Self::dish("D", "sandwich", &["bread", "cheese"], Self::date(2026, 9, 1)),
            Self::dish("E", "curry", &["rice", "lentil"], Self::date(2026, 1, 1)),
        ]
    }

    /// Menu expected from the scenario corpus when seeding lands on A
    pub fn scenario_menu() -> Vec<&'static str> {
        vec!["A", "D", "C", "B"]
    }

    /// A larger corpus where every dish has a distinct `last_used`
    pub fn week_corpus() -> Vec<Dish> {
        vec![
            Self::dish("dal", "curry", &["lentil", "ghee", "garlic"], Self::days_ago(45)),
            Self::dish("thali", "curry", &["lentil", "naan", "onion"], Self::days_ago(30)),
            Self::dish("ramen", "soup", &["noodle", "egg", "scallions"], Self::days_ago(12)),
            Self::dish("blt", "sandwich", &["bread", "bacon", "tomato"], Self::days_ago(20)),
            Self::dish("tacos", "mexican", &["tortilla", "beans", "chilli"], Self::days_ago(8)),
            Self::dish("risotto", "italian", &["arborio", "parmesan", "stock"], Self::days_ago(25)),
            Self::dish("pho", "soup", &["noodle", "beef", "star anise"], Self::days_ago(40)),
            Self::dish("paella", "spanish", &["rice", "saffron", "prawn"], Self::days_ago(3)),
            Self::dish("curry-laksa", "curry", &["noodle", "coconut", "prawn"], Self::days_ago(15)),
            Self::dish("shakshuka", "brunch", &["egg", "tomato", "paprika"], Self::days_ago(60)),
        ]
    }

    /// A dish carrying only a non-entrée tag
    pub fn dessert() -> Dish {
        Dish::new("brownie", "Brownie", ["Dessert"], ["cocoa", "butter"])
    }

    /// Persisted menu naming `ids`
    pub fn menu_of(ids: &[&str], committed_at: DateTime<Utc>) -> WeeklyMenu {
        WeeklyMenu {
            entries: ids
                .iter()
                .map(|id| MenuEntry {
                    dish_id: DishId::new(*id),
                    key: id.to_lowercase(),
                })
                .collect(),
            committed_at,
        }
    }
}
