//! Core business logic modules
//!
//! This module contains pure selection logic with no I/O dependencies.
//! Randomness and time are passed in, so every function is deterministic
//! and easily testable.

pub mod normalizer;
pub mod scorer;
pub mod selector;

pub use normalizer::{IngredientNormalizer, COMMON_INGREDIENTS};
pub use scorer::{DiversityScorer, PickedProfile, ScoreBreakdown, ScoringWeights};
pub use selector::{MenuSelection, RotationSelector, RoundPick, SelectionState, SelectorPhase};
