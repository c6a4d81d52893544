//! Persistence seam.
//!
//! The stores in `crate::store` only speak to a [`Storage`] backend. Each method
//! is one atomic operation on the backend: uniqueness checks happen together
//! with the write they guard. Nothing here spans several calls, so composite
//! operations (cascades, moves of exercises) are only as consistent as their
//! individual steps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
  Attempt, Category, CategoryId, Exercise, ExerciseId, Question, QuestionId, UserId,
};
use crate::error::Result;

pub mod memory;

pub use memory::MemoryStorage;

/// Target state of a category rename/move.
#[derive(Clone, Debug)]
pub struct CategoryChange {
  pub route: String,
  pub uri_name: String,
  pub name: String,
  pub description: Option<String>,
}

/// Outcome of [`Storage::relocate_category`].
#[derive(Clone, Debug)]
pub struct Relocated {
  pub category: Category,
  pub previous_uri: String,
  /// Descendants whose route was rewritten to follow the new uri.
  pub rerouted: usize,
}

/// Edit of an exercise's ordered question list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionListEdit {
  Append(QuestionId),
  /// Fails with `NotFound` when the id is not a member.
  Remove(QuestionId),
}

/// Partial update of an exercise; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct ExerciseChange {
  pub name: Option<String>,
  pub uri_name: Option<String>,
  pub description: Option<String>,
  pub category: Option<CategoryId>,
  pub questions: Option<QuestionListEdit>,
  pub modified: Option<(DateTime<Utc>, UserId)>,
}

#[async_trait]
pub trait Storage: Send + Sync {
  // Categories, keyed by (route, uri_name).

  /// Insert, failing with `AlreadyExists` if the key is taken.
  async fn insert_category(&self, category: Category) -> Result<Category>;
  async fn category_by_key(&self, route: &str, uri_name: &str) -> Result<Option<Category>>;
  async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>>;
  /// Categories whose route is exactly `route`, ordered by `uri_name`.
  async fn categories_with_route(&self, route: &str) -> Result<Vec<Category>>;
  /// Categories anywhere below `uri` (segment-aware prefix on route).
  async fn categories_under(&self, uri: &str) -> Result<Vec<Category>>;
  /// Categories on `route` whose `uri_name` starts with `uri_name_prefix`.
  async fn categories_matching(&self, route: &str, uri_name_prefix: &str, limit: usize) -> Result<Vec<Category>>;
  /// Categories whose route starts with `prefix` (raw string prefix).
  async fn categories_with_route_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<Category>>;
  /// Collision check, write and descendant re-routing in one critical section.
  async fn relocate_category(&self, id: CategoryId, change: CategoryChange) -> Result<Relocated>;
  /// Returns false when the category was already gone.
  async fn remove_category(&self, id: CategoryId) -> Result<bool>;

  // Exercises, keyed by (category, uri_name).

  async fn insert_exercise(&self, exercise: Exercise) -> Result<Exercise>;
  async fn exercise_by_key(&self, category: CategoryId, uri_name: &str) -> Result<Option<Exercise>>;
  async fn exercises_in(&self, category: CategoryId) -> Result<Vec<Exercise>>;
  /// Apply `change`, failing with `Conflict` if the new key belongs to another exercise.
  async fn update_exercise(&self, id: ExerciseId, change: ExerciseChange) -> Result<Exercise>;
  async fn remove_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>>;

  // Questions.

  async fn insert_question(&self, question: Question) -> Result<QuestionId>;
  /// Questions in the order of `ids`; unknown ids are skipped.
  async fn questions_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>>;
  async fn remove_question(&self, id: QuestionId) -> Result<bool>;

  // Attempts.

  async fn insert_attempt(&self, attempt: Attempt) -> Result<Attempt>;
  async fn latest_attempt(&self, exercise: ExerciseId, by: &str) -> Result<Option<Attempt>>;
  async fn remove_attempts_for(&self, exercise: ExerciseId) -> Result<usize>;

  /// Document counts, for startup logs and health checks.
  async fn inventory(&self) -> Result<Inventory>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
  pub categories: usize,
  pub exercises: usize,
  pub questions: usize,
  pub attempts: usize,
}
