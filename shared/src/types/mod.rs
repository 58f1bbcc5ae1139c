//! Core types used throughout the rotation scheduler

use crate::errors::{SharedError, SharedResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a dish in the external corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DishId(String);

impl DishId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DishId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of one rotation run, attached to every log line of that run
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate recipe as seen by the scheduler
///
/// Built only through [`Dish::new`] or the validated [`RawDish`] conversion,
/// so every field the scorer touches is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    pub tags: BTreeSet<String>,
    pub ingredients: Vec<String>,
    pub last_used: Option<DateTime<Utc>>,
}

impl Dish {
    pub fn new<T, I, TS, IS>(id: impl Into<String>, name: impl Into<String>, tags: T, ingredients: I) -> Self
    where
        T: IntoIterator<Item = TS>,
        I: IntoIterator<Item = IS>,
        TS: Into<String>,
        IS: Into<String>,
    {
        Self {
            id: DishId::new(id),
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            last_used: None,
        }
    }

    pub fn with_last_used(mut self, last_used: DateTime<Utc>) -> Self {
        self.last_used = Some(last_used);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Human-readable key the menu is persisted under
    pub fn menu_key(&self) -> String {
        menu_key(&self.name)
    }
}

/// Kebab-case key for a dish name, matching the links the recipe site builds:
/// "Chana Masala" -> "chana-masala", "ChickenTikka" -> "chicken-tikka"
///
/// Only an ASCII lowercase letter directly followed by an ASCII uppercase one
/// gets a dash between them; each run of whitespace or underscores becomes a
/// single dash; existing dashes are kept as they are.
pub fn menu_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    let mut in_gap = false;

    for ch in name.chars() {
        if ch.is_whitespace() || ch == '_' {
            if !in_gap {
                key.push('-');
                in_gap = true;
            }
            prev = Some(ch);
            continue;
        }
        in_gap = false;
        if prev.is_some_and(|p| p.is_ascii_lowercase()) && ch.is_ascii_uppercase() {
            key.push('-');
        }
        key.push(ch);
        prev = Some(ch);
    }

    key.to_lowercase()
}

/// Ingredient entry as stored upstream: a bare name or a proportion row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawIngredient {
    Name(String),
    Proportion(RawProportion),
}

/// Quantity row carrying an ingredient name; quantities are passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProportion {
    pub ingredient: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawIngredient {
    pub fn name(&self) -> &str {
        match self {
            RawIngredient::Name(name) => name,
            RawIngredient::Proportion(proportion) => &proportion.ingredient,
        }
    }
}

/// Loosely structured recipe record as found in the external corpus
///
/// Every field is optional here; [`Dish::try_from`] is the ingestion boundary
/// that rejects records missing what the scheduler needs. Fields the scheduler
/// does not understand are kept in `extra` so stores can write them back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDish {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<RawIngredient>>,
    #[serde(default, alias = "lastCooked")]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawDish> for Dish {
    type Error = SharedError;

    fn try_from(raw: RawDish) -> SharedResult<Self> {
        let label = raw
            .id
            .clone()
            .or_else(|| raw.name.clone())
            .unwrap_or_else(|| "<unnamed>".to_string());

        let id = non_blank(raw.id, &label, "id")?;
        let name = non_blank(raw.name, &label, "name")?;

        let tags: BTreeSet<String> = raw
            .tags
            .ok_or_else(|| SharedError::MissingField { dish: label.clone(), field: "tags" })?
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(SharedError::InvalidField {
                dish: label,
                field: "tags",
                reason: "at least one tag is required".to_string(),
            });
        }

        let ingredients = raw
            .ingredients
            .ok_or_else(|| SharedError::MissingField { dish: label.clone(), field: "ingredients" })?
            .iter()
            .map(|ingredient| ingredient.name().trim().to_string())
            .filter(|ingredient| !ingredient.is_empty())
            .collect();

        Ok(Dish {
            id: DishId::new(id),
            name,
            tags,
            ingredients,
            last_used: raw.last_used,
        })
    }
}

fn non_blank(value: Option<String>, label: &str, field: &'static str) -> SharedResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(SharedError::InvalidField {
            dish: label.to_string(),
            field,
            reason: "must not be blank".to_string(),
        }),
        None => Err(SharedError::MissingField { dish: label.to_string(), field }),
    }
}

/// One day of the weekly menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub dish_id: DishId,
    pub key: String,
}

impl From<&Dish> for MenuEntry {
    fn from(dish: &Dish) -> Self {
        Self {
            dish_id: dish.id.clone(),
            key: dish.menu_key(),
        }
    }
}

/// The persisted weekly menu, in selection order (day 1..N)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyMenu {
    pub entries: Vec<MenuEntry>,
    pub committed_at: DateTime<Utc>,
}

impl WeeklyMenu {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dish_ids(&self) -> impl Iterator<Item = &DishId> {
        self.entries.iter().map(|entry| &entry.dish_id)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.key.as_str()).collect()
    }

    pub fn contains(&self, dish_id: &DishId) -> bool {
        self.entries.iter().any(|entry| &entry.dish_id == dish_id)
    }
}

/// New `last_used` value for one picked dish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastUsedUpdate {
    pub dish_id: DishId,
    pub last_used: DateTime<Utc>,
}

/// Everything one rotation run persists, applied by the store all-or-nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuBatch {
    pub menu: WeeklyMenu,
    pub last_used_updates: Vec<LastUsedUpdate>,
}
