//! Ingredient normalization
//!
//! Strips low-signal pantry staples from an ingredient list so that overlap
//! scoring is driven only by the ingredients that make a dish distinctive.

use shared::{Dish, DishId};
use std::collections::BTreeSet;

/// Staples ignored when comparing dishes, in match order
///
/// Matching is a case-insensitive substring test, so "yellow bell pepper"
/// and "Garlic cloves" are both treated as common.
pub const COMMON_INGREDIENTS: &[&str] = &[
    "garlic",
    "ginger",
    "salt",
    "salt and pepper",
    "pepper",
    "oil",
    "scallions",
    "onion",
    "cumin",
    "chilli powder",
    "chilli",
    "paprika",
    "cayenne",
    "water",
    "bell pepper",
];

/// Filters ingredient names against a fixed common-ingredient list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientNormalizer {
    common: Vec<String>,
}

/// Distinctive-ingredient view of a dish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDish {
    pub id: DishId,
    pub distinctive_ingredients: BTreeSet<String>,
}

impl IngredientNormalizer {
    /// Normalizer over [`COMMON_INGREDIENTS`]
    pub fn new() -> Self {
        Self::with_common_list(COMMON_INGREDIENTS.iter().copied())
    }

    /// Normalizer over a caller-supplied list, order preserved
    pub fn with_common_list<I, S>(common: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            common: common
                .into_iter()
                .map(|entry| normalize_name(entry.as_ref()))
                .filter(|entry| !entry.is_empty())
                .collect(),
        }
    }

    pub fn common_ingredients(&self) -> &[String] {
        &self.common
    }

    pub fn is_common(&self, ingredient: &str) -> bool {
        let name = normalize_name(ingredient);
        self.common.iter().any(|common| name.contains(common.as_str()))
    }

    /// Distinct, lower-cased ingredient names that are not common staples
    pub fn normalize<I, S>(&self, ingredient_names: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ingredient_names
            .into_iter()
            .map(|name| normalize_name(name.as_ref()))
            .filter(|name| !name.is_empty())
            .filter(|name| !self.common.iter().any(|common| name.contains(common.as_str())))
            .collect()
    }

    pub fn normalize_dish(&self, dish: &Dish) -> NormalizedDish {
        NormalizedDish {
            id: dish.id.clone(),
            distinctive_ingredients: self.normalize(&dish.ingredients),
        }
    }
}

impl Default for IngredientNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
