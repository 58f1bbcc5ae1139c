//! Scheduler configuration
//!
//! ## Configuration Sources
//! Values are loaded from, in increasing precedence:
//! 1. Built-in defaults (7-day menu, 0.5 / 0.3 / 0.2 weights, 30-day horizon)
//! 2. `.env` file in the current directory or parent directories (if present)
//! 3. System environment variables
//! 4. Command-line flags applied by the binary on top of [`SchedulerConfig::from_env`]
//!
//! ## Environment Keys
//! - `ROTATION_MENU_SIZE`: dishes per weekly menu
//! - `ROTATION_INGREDIENT_WEIGHT`, `ROTATION_TAG_WEIGHT`, `ROTATION_RECENCY_WEIGHT`: scoring weights
//! - `ROTATION_RECENCY_HORIZON_DAYS`: days after which a dish counts as fully stale
//! - `ROTATION_FILTER_TAG`: category every candidate must carry
//! - `ROTATION_SCOPE`: corpus scope name used for the run lock
//! - `ROTATION_EXCLUDE_PREVIOUS`: skip dishes on the current menu (`true`/`false`)
//! - `ROTATION_ALLOW_SHORT_MENU`: accept menus shorter than the target size

use serde::{Deserialize, Serialize};
use shared::SharedError;
use std::str::FromStr;

use crate::core::scorer::{ScoringWeights, DEFAULT_RECENCY_HORIZON_DAYS};
use crate::error::{RotationError, RotationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target number of dishes per menu
    pub menu_size: usize,

    pub weights: ScoringWeights,

    /// Days after which recency saturates
    pub recency_horizon_days: f64,

    /// Category every candidate must carry; empty accepts any tagged dish
    pub filter_tag: String,

    /// Name of the corpus the run lock is keyed on
    pub corpus_scope: String,

    /// Drop dishes on the currently persisted menu before seeding
    pub exclude_previous_menu: bool,

    /// Commit a short menu when the corpus has fewer dishes than `menu_size`
    pub allow_short_menu: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            menu_size: 7,
            weights: ScoringWeights::default(),
            recency_horizon_days: DEFAULT_RECENCY_HORIZON_DAYS,
            filter_tag: "Entrée".to_string(),
            corpus_scope: "recipes".to_string(),
            exclude_previous_menu: true,
            allow_short_menu: true,
        }
    }
}

impl SchedulerConfig {
    pub fn with_menu_size(mut self, menu_size: usize) -> Self {
        self.menu_size = menu_size;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_recency_horizon_days(mut self, days: f64) -> Self {
        self.recency_horizon_days = days;
        self
    }

    pub fn with_filter_tag(mut self, tag: impl Into<String>) -> Self {
        self.filter_tag = tag.into();
        self
    }

    pub fn with_corpus_scope(mut self, scope: impl Into<String>) -> Self {
        self.corpus_scope = scope.into();
        self
    }

    pub fn with_exclude_previous_menu(mut self, exclude: bool) -> Self {
        self.exclude_previous_menu = exclude;
        self
    }

    pub fn with_allow_short_menu(mut self, allow: bool) -> Self {
        self.allow_short_menu = allow;
        self
    }

    /// Load from `.env` and the process environment over the defaults
    pub fn from_env() -> RotationResult<Self> {
        // Missing .env is fine
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup over the defaults
    pub fn from_lookup<F>(lookup: F) -> RotationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = parse_key(&lookup, "ROTATION_MENU_SIZE")? {
            config.menu_size = value;
        }
        if let Some(value) = parse_key(&lookup, "ROTATION_INGREDIENT_WEIGHT")? {
            config.weights.ingredient = value;
        }
        if let Some(value) = parse_key(&lookup, "ROTATION_TAG_WEIGHT")? {
            config.weights.tag = value;
        }
        if let Some(value) = parse_key(&lookup, "ROTATION_RECENCY_WEIGHT")? {
            config.weights.recency = value;
        }
        if let Some(value) = parse_key(&lookup, "ROTATION_RECENCY_HORIZON_DAYS")? {
            config.recency_horizon_days = value;
        }
        if let Some(value) = lookup("ROTATION_FILTER_TAG") {
            config.filter_tag = value.trim().to_string();
        }
        if let Some(value) = lookup("ROTATION_SCOPE") {
            config.corpus_scope = value.trim().to_string();
        }
        if let Some(value) = parse_key(&lookup, "ROTATION_EXCLUDE_PREVIOUS")? {
            config.exclude_previous_menu = value;
        }
        if let Some(value) = parse_key(&lookup, "ROTATION_ALLOW_SHORT_MENU")? {
            config.allow_short_menu = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RotationResult<()> {
        if self.menu_size == 0 {
            return Err(RotationError::config("menu_size must be at least 1"));
        }
        self.weights.validate()?;
        if !self.recency_horizon_days.is_finite() || self.recency_horizon_days <= 0.0 {
            return Err(RotationError::config(format!(
                "recency_horizon_days must be positive, got {}",
                self.recency_horizon_days
            )));
        }
        if self.corpus_scope.is_empty() {
            return Err(RotationError::config("corpus_scope must not be empty"));
        }
        Ok(())
    }
}

fn parse_key<F, T>(lookup: &F, key: &str) -> RotationResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            RotationError::SharedError(SharedError::InvalidConfig {
                field: key.to_string(),
                value: raw,
            })
        }),
    }
}
