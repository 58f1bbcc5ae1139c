//! Weekly menu rotation scheduler
//!
//! Picks a diverse weekly menu from a recipe corpus: seed with the least
//! recently used dish, then greedily add the dish that overlaps least with
//! what is already on the menu, and commit the menu together with the new
//! `last_used` stamps in one atomic write.

pub mod commit;
pub mod config;
pub mod core;
pub mod error;
pub mod run_lock;
pub mod scheduler;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use crate::core::{
    DiversityScorer, IngredientNormalizer, MenuSelection, RotationSelector, ScoreBreakdown, ScoringWeights,
    SelectorPhase,
};
pub use commit::CommitCoordinator;
pub use config::SchedulerConfig;
pub use error::{CommitError, RotationError, RotationResult};
pub use run_lock::{RunGuard, RunLock};
pub use scheduler::{RotationPreview, RotationScheduler, RunOutcome, Shortfall};
pub use traits::{Clock, CorpusSource, MenuStore, MockClock, MockCorpusSource, MockMenuStore};
