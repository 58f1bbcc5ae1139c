//! JSON recipe-book file acting as both corpus source and menu store
//!
//! The book is one JSON document:
//!
//! ```json
//! {
//!   "dishes": [
//!     { "id": "dal", "name": "Dal Tadka", "tags": ["Entrée"],
//!       "ingredients": ["lentil", {"ingredient": "ghee", "quantity": "2"}],
//!       "last_used": "2026-09-01T00:00:00Z" }
//!   ],
//!   "weekly_menu": null
//! }
//! ```
//!
//! Batches are applied to an in-memory copy of the document, written to a
//! uniquely named temp file in the same directory and persisted over the book,
//! so readers only ever see the old document or the fully updated one. The
//! read-modify-write of a batch runs under an exclusive lock on
//! `<book>.lock`; a whole rotation run can additionally hold `<book>.run.lock`
//! to keep other processes off the same book.

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use shared::{Dish, MenuBatch, RawDish, WeeklyMenu};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;

use super::is_eligible;
use crate::error::{CommitError, RotationError, RotationResult};
use crate::traits::{CorpusSource, MenuStore};

const COMMIT_LOCK_SUFFIX: &str = ".lock";
const RUN_LOCK_SUFFIX: &str = ".run.lock";

/// On-disk layout of the recipe book
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBookDocument {
    #[serde(default)]
    pub dishes: Vec<RawDish>,
    #[serde(default)]
    pub weekly_menu: Option<WeeklyMenu>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Recipe book stored at a single path
pub struct JsonRecipeBook {
    path: PathBuf,
}

impl JsonRecipeBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh book containing `dishes` and no menu
    pub async fn create(path: impl Into<PathBuf>, dishes: &[Dish]) -> RotationResult<Self> {
        let book = Self::new(path);
        let document = RecipeBookDocument {
            dishes: dishes.iter().map(to_raw).collect(),
            ..Default::default()
        };
        book.replace(document).await?;
        Ok(book)
    }

    pub async fn read_document(&self) -> RotationResult<RecipeBookDocument> {
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every dish in the book, validated at the ingestion boundary
    pub async fn dishes(&self) -> RotationResult<Vec<Dish>> {
        let document = self.read_document().await?;
        let mut dishes = Vec::with_capacity(document.dishes.len());
        for raw in document.dishes {
            dishes.push(Dish::try_from(raw)?);
        }
        Ok(dishes)
    }

    /// Claim the book for one rotation run, failing fast if another holds it
    pub fn try_lock_run(&self) -> RotationResult<BookLock> {
        let path = sibling(&self.path, RUN_LOCK_SUFFIX);
        let file = open_lock_file(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(BookLock { file, path }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(RotationError::RunInProgress {
                scope: self.path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, document: RecipeBookDocument) -> RotationResult<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_document(&path, &document))
            .await
            .map_err(std::io::Error::from)?
    }
}

/// Exclusive advisory lock on a recipe book; released on drop
#[derive(Debug)]
pub struct BookLock {
    file: File,
    path: PathBuf,
}

impl BookLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BookLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[async_trait]
impl CorpusSource for JsonRecipeBook {
    async fn fetch_eligible_dishes(&self, filter_tag: &str) -> RotationResult<Vec<Dish>> {
        let dishes = self
            .dishes()
            .await
            .map_err(|e| RotationError::corpus(format!("{}: {e}", self.path.display())))?;
        Ok(dishes.into_iter().filter(|dish| is_eligible(dish, filter_tag)).collect())
    }
}

#[async_trait]
impl MenuStore for JsonRecipeBook {
    async fn load_menu(&self) -> RotationResult<Option<WeeklyMenu>> {
        Ok(self.read_document().await?.weekly_menu)
    }

    async fn write_batch(&self, batch: MenuBatch) -> Result<(), CommitError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || apply_batch(&path, batch))
            .await
            .map_err(|e| CommitError::new(format!("commit task failed: {e}")))?
    }
}

/// Read, update and replace the book while holding its commit lock
fn apply_batch(path: &Path, batch: MenuBatch) -> Result<(), CommitError> {
    let lock_path = sibling(path, COMMIT_LOCK_SUFFIX);
    let lock = open_lock_file(&lock_path)
        .and_then(|file| file.lock_exclusive().map(|()| file))
        .map_err(|e| CommitError::new(format!("locking {}: {e}", lock_path.display())))?;

    let mut document =
        read_document_blocking(path).map_err(|e| CommitError::new(format!("reading {}: {e}", path.display())))?;

    let positions: HashMap<String, usize> = document
        .dishes
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| raw.id.as_ref().map(|id| (id.trim().to_string(), index)))
        .collect();

    for update in &batch.last_used_updates {
        let index = positions
            .get(update.dish_id.as_str())
            .copied()
            .ok_or_else(|| CommitError::new(format!("unknown dish {}", update.dish_id)))?;
        document.dishes[index].last_used = Some(update.last_used);
    }
    document.weekly_menu = Some(batch.menu);

    // Only the copy was touched so far; persisting the temp file is the commit point
    let result = persist_document(path, &document)
        .map_err(|e| CommitError::new(format!("writing {}: {e}", path.display())));
    let _ = lock.unlock();
    result
}

fn read_document_blocking(path: &Path) -> RotationResult<RecipeBookDocument> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn persist_document(path: &Path, document: &RecipeBookDocument) -> RotationResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp_file = NamedTempFile::new_in(parent)?;
    let mut writer = BufWriter::new(temp_file.as_file());
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.flush()?;
    drop(writer);
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "recipe-book.json".into());
    name.push(suffix);
    path.with_file_name(name)
}

fn open_lock_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path)
}

fn to_raw(dish: &Dish) -> RawDish {
    RawDish {
        id: Some(dish.id.to_string()),
        name: Some(dish.name.clone()),
        tags: Some(dish.tags.iter().cloned().collect()),
        ingredients: Some(
            dish.ingredients
                .iter()
                .cloned()
                .map(shared::RawIngredient::Name)
                .collect(),
        ),
        last_used: dish.last_used,
        extra: serde_json::Map::new(),
    }
}
