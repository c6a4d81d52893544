//! Catalog stores: categories, exercises and questions on top of a [`Storage`].
//!
//! [`Catalog`] is a cheap, cloneable handle. Its operations are split by entity
//! across the submodules, plus the cascade (`crate::cascade`) and rename/move
//! (`crate::relocate`) engines.

use std::sync::Arc;

use crate::storage::{MemoryStorage, Storage};

pub mod category;
pub mod exercise;
pub mod question;

pub use exercise::{ExerciseDraft, ExercisePatch, ExerciseRemoval};

#[derive(Clone)]
pub struct Catalog {
  storage: Arc<dyn Storage>,
}

impl Catalog {
  pub fn new(storage: Arc<dyn Storage>) -> Self {
    Self { storage }
  }

  pub fn in_memory() -> Self {
    Self::new(Arc::new(MemoryStorage::new()))
  }

  pub fn storage(&self) -> &dyn Storage {
    self.storage.as_ref()
  }
}
