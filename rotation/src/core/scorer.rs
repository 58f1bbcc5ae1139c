//! Diversity scoring
//!
//! Scores a candidate dish against the dishes already picked for this menu.
//! Lower is better: overlap with the menu raises the score, staleness lowers it.
//!
//! ```text
//! score = ingredient_overlap * Wi + tag_overlap * Wt - recency * Wr
//! ```
//!
//! Every component lies in [0, 1]. Overlap is measured on distinctive
//! ingredients only (see [`IngredientNormalizer`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::Dish;
use std::collections::BTreeSet;

use super::normalizer::IngredientNormalizer;
use crate::error::{RotationError, RotationResult};

/// Days after which a dish counts as fully stale
pub const DEFAULT_RECENCY_HORIZON_DAYS: f64 = 30.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Weights of the three score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub ingredient: f64,
    pub tag: f64,
    pub recency: f64,
}

impl ScoringWeights {
    pub fn new(ingredient: f64, tag: f64, recency: f64) -> RotationResult<Self> {
        let weights = Self { ingredient, tag, recency };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> RotationResult<()> {
        for (name, value) in [
            ("ingredient_weight", self.ingredient),
            ("tag_weight", self.tag),
            ("recency_weight", self.recency),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RotationError::config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            ingredient: 0.5,
            tag: 0.3,
            recency: 0.2,
        }
    }
}

/// Per-component view of one score, for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub ingredient_overlap: f64,
    pub tag_overlap: f64,
    pub recency: f64,
    pub total: f64,
}

/// Union of distinctive ingredients and tags over the dishes picked so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickedProfile {
    ingredients: BTreeSet<String>,
    tags: BTreeSet<String>,
}

impl PickedProfile {
    pub fn from_dishes(normalizer: &IngredientNormalizer, picked: &[Dish]) -> Self {
        let mut profile = Self::default();
        for dish in picked {
            profile.absorb(&normalizer.normalize(&dish.ingredients), &dish.tags);
        }
        profile
    }

    pub fn absorb(&mut self, distinctive_ingredients: &BTreeSet<String>, tags: &BTreeSet<String>) {
        self.ingredients.extend(distinctive_ingredients.iter().cloned());
        self.tags.extend(tags.iter().cloned());
    }

    pub fn ingredients(&self) -> &BTreeSet<String> {
        &self.ingredients
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Pure scoring function over a candidate, the current menu and a reference time
#[derive(Debug, Clone)]
pub struct DiversityScorer {
    weights: ScoringWeights,
    normalizer: IngredientNormalizer,
    recency_horizon_days: f64,
}

impl DiversityScorer {
    pub fn new(weights: ScoringWeights, normalizer: IngredientNormalizer) -> Self {
        Self {
            weights,
            normalizer,
            recency_horizon_days: DEFAULT_RECENCY_HORIZON_DAYS,
        }
    }

    pub fn with_recency_horizon(mut self, days: f64) -> Self {
        self.recency_horizon_days = days;
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn normalizer(&self) -> &IngredientNormalizer {
        &self.normalizer
    }

    /// Score `candidate` against `picked`; lower means more desirable
    pub fn score(&self, candidate: &Dish, picked: &[Dish], reference_time: DateTime<Utc>) -> f64 {
        self.breakdown(candidate, picked, reference_time).total
    }

    pub fn breakdown(&self, candidate: &Dish, picked: &[Dish], reference_time: DateTime<Utc>) -> ScoreBreakdown {
        let profile = PickedProfile::from_dishes(&self.normalizer, picked);
        let distinctive = self.normalizer.normalize(&candidate.ingredients);
        self.breakdown_against(&distinctive, candidate, &profile, reference_time)
    }

    /// Score with the candidate's distinctive ingredients and the menu profile
    /// already computed; the selector uses this to avoid re-normalizing every round.
    pub fn breakdown_against(
        &self,
        distinctive: &BTreeSet<String>,
        candidate: &Dish,
        profile: &PickedProfile,
        reference_time: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let ingredient_overlap = overlap_ratio(distinctive, profile.ingredients());
        let tag_overlap = overlap_ratio(&candidate.tags, profile.tags());
        let recency = self.recency_score(candidate.last_used, reference_time);

        let total = ingredient_overlap * self.weights.ingredient + tag_overlap * self.weights.tag
            - recency * self.weights.recency;

        ScoreBreakdown {
            ingredient_overlap,
            tag_overlap,
            recency,
            total,
        }
    }

    /// `min(days_since / horizon, 1)`; never used saturates at 1, future dates give 0
    pub fn recency_score(&self, last_used: Option<DateTime<Utc>>, reference_time: DateTime<Utc>) -> f64 {
        let Some(last_used) = last_used else {
            return 1.0;
        };
        let days_since = (reference_time - last_used).num_milliseconds() as f64 / MILLIS_PER_DAY;
        (days_since.max(0.0) / self.recency_horizon_days).min(1.0)
    }
}

/// Fraction of `candidate` already present in `seen`; an empty candidate overlaps nothing
fn overlap_ratio(candidate: &BTreeSet<String>, seen: &BTreeSet<String>) -> f64 {
    if candidate.is_empty() {
        return 0.0;
    }
    let shared = candidate.intersection(seen).count();
    shared as f64 / candidate.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
    }

    fn scorer() -> DiversityScorer {
        DiversityScorer::new(ScoringWeights::default(), IngredientNormalizer::new())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_novel_candidate_against_empty_menu() {
        let candidate = Dish::new("c", "Mapo Tofu", ["stir-fry"], ["tofu", "noodle"]);
        let breakdown = scorer().breakdown(&candidate, &[], reference());

        assert_eq!(breakdown.ingredient_overlap, 0.0);
        assert_eq!(breakdown.tag_overlap, 0.0);
        assert_eq!(breakdown.recency, 1.0);
        assert!(approx(breakdown.total, -0.2));
    }

    #[test]
    fn test_partial_overlap() {
        let picked = vec![Dish::new("a", "Dal", ["curry"], ["rice", "lentil"]).with_last_used(reference())];
        let candidate = Dish::new("b", "Butter Naan Thali", ["curry", "bread"], ["rice", "naan"])
            .with_last_used(reference() - Duration::days(15));

        let breakdown = scorer().breakdown(&candidate, &picked, reference());
        assert!(approx(breakdown.ingredient_overlap, 0.5));
        assert!(approx(breakdown.tag_overlap, 0.5));
        assert!(approx(breakdown.recency, 0.5));
        assert!(approx(breakdown.total, 0.25 + 0.15 - 0.1));
    }

    #[test]
    fn test_common_ingredients_do_not_count_as_overlap() {
        let picked = vec![Dish::new("a", "Soup", ["soup"], ["garlic", "onion", "carrot"])];
        let candidate = Dish::new("b", "Stew", ["stew"], ["Garlic", "red onion", "beef"]);

        let breakdown = scorer().breakdown(&candidate, &picked, reference());
        assert_eq!(breakdown.ingredient_overlap, 0.0);
    }

    #[test]
    fn test_candidate_with_only_staples_has_zero_overlap() {
        let picked = vec![Dish::new("a", "Soup", ["soup"], ["salt", "water"])];
        let candidate = Dish::new("b", "Broth", ["soup"], ["salt", "water"]);

        let breakdown = scorer().breakdown(&candidate, &picked, reference());
        assert_eq!(breakdown.ingredient_overlap, 0.0);
        assert_eq!(breakdown.tag_overlap, 1.0);
    }

    #[test]
    fn test_recency_saturates_and_clamps() {
        let scorer = scorer();
        let now = reference();

        assert_eq!(scorer.recency_score(None, now), 1.0);
        assert_eq!(scorer.recency_score(Some(now - Duration::days(90)), now), 1.0);
        assert!(approx(scorer.recency_score(Some(now - Duration::days(3)), now), 0.1));
        assert_eq!(scorer.recency_score(Some(now), now), 0.0);
        assert_eq!(scorer.recency_score(Some(now + Duration::days(2)), now), 0.0);
    }

    #[test]
    fn test_custom_recency_horizon() {
        let scorer = scorer().with_recency_horizon(7.0);
        let now = reference();

        assert!(approx(scorer.recency_score(Some(now - Duration::days(7)), now), 1.0));
        assert!(approx(scorer.recency_score(Some(now - Duration::hours(84)), now), 0.5));
    }

    #[test]
    fn test_score_is_pure() {
        let scorer = scorer();
        let picked = vec![Dish::new("a", "Dal", ["curry"], ["rice", "lentil"])];
        let candidate = Dish::new("b", "Biryani", ["curry"], ["rice", "chicken"]);

        let first = scorer.score(&candidate, &picked, reference());
        let second = scorer.score(&candidate, &picked, reference());
        assert_eq!(first, second);
    }

    #[test]
    fn test_profile_matches_incremental_absorb() {
        let normalizer = IngredientNormalizer::new();
        let picked = vec![
            Dish::new("a", "Dal", ["curry"], ["rice", "lentil", "salt"]),
            Dish::new("b", "Club", ["sandwich"], ["bread", "cheese"]),
        ];

        let mut incremental = PickedProfile::default();
        for dish in &picked {
            incremental.absorb(&normalizer.normalize(&dish.ingredients), &dish.tags);
        }

        let profile = PickedProfile::from_dishes(&normalizer, &picked);
        assert_eq!(profile, incremental);
        assert_eq!(profile.ingredients().len(), 4);
        assert_eq!(profile.tags().len(), 2);
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoringWeights::new(0.4, 0.4, 0.2).is_ok());
        assert!(ScoringWeights::new(-0.1, 0.3, 0.2).is_err());
        assert!(ScoringWeights::new(0.5, f64::NAN, 0.2).is_err());
        assert!(ScoringWeights::new(0.5, 0.3, f64::INFINITY).is_err());
    }
}
