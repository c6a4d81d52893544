//! In-memory backend.
//!
//! Categories are indexed by an ordered `(route, uri_name)` key so that child and
//! descendant lookups are range scans instead of full-table filters. Each table
//! sits behind its own `RwLock`; a method holds at most one of them.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::{
  Attempt, Category, CategoryId, Exercise, ExerciseId, Question, QuestionId, UserId,
};
use crate::error::{CatalogError, Result};
use crate::uri::{is_within, join_category, rebase_route};

use super::{CategoryChange, ExerciseChange, Inventory, QuestionListEdit, Relocated, Storage};

type CategoryKey = (String, String);
type ExerciseKey = (CategoryId, String);

#[derive(Default)]
struct CategoryTable {
  by_key: BTreeMap<CategoryKey, CategoryId>,
  rows: HashMap<CategoryId, Category>,
}

impl CategoryTable {
  /// Keys whose route starts with `prefix`, in key order.
  fn keys_from<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a CategoryKey, &'a CategoryId)> + 'a {
    self.by_key
      .range((prefix.to_string(), String::new())..)
      .take_while(move |((route, _), _)| route.starts_with(prefix))
  }

  fn rows_of<'a>(&self, ids: impl Iterator<Item = &'a CategoryId>) -> Vec<Category> {
    ids.filter_map(|id| self.rows.get(id).cloned()).collect()
  }
}

#[derive(Default)]
struct ExerciseTable {
  by_key: BTreeMap<ExerciseKey, ExerciseId>,
  rows: HashMap<ExerciseId, Exercise>,
}

/// Attempts grouped per exercise, then per user, in submission order.
type AttemptTable = HashMap<ExerciseId, HashMap<UserId, Vec<Attempt>>>;

#[derive(Default)]
pub struct MemoryStorage {
  categories: RwLock<CategoryTable>,
  exercises: RwLock<ExerciseTable>,
  questions: RwLock<HashMap<QuestionId, Question>>,
  attempts: RwLock<AttemptTable>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Storage for MemoryStorage {
  #[instrument(level = "debug", skip(self, category), fields(route = %category.route, uri_name = %category.uri_name))]
  async fn insert_category(&self, category: Category) -> Result<Category> {
    let mut table = self.categories.write().await;
    let key = category.key();
    if table.by_key.contains_key(&key) {
      return Err(CatalogError::AlreadyExists { what: "category" });
    }
    table.by_key.insert(key, category.id);
    table.rows.insert(category.id, category.clone());
    Ok(category)
  }

  async fn category_by_key(&self, route: &str, uri_name: &str) -> Result<Option<Category>> {
    let table = self.categories.read().await;
    let key = (route.to_string(), uri_name.to_string());
    Ok(table.by_key.get(&key).and_then(|id| table.rows.get(id)).cloned())
  }

  async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>> {
    Ok(self.categories.read().await.rows.get(&id).cloned())
  }

  async fn categories_with_route(&self, route: &str) -> Result<Vec<Category>> {
    let table = self.categories.read().await;
    let ids = table
      .keys_from(route)
      .take_while(|((r, _), _)| r == route)
      .map(|(_, id)| id);
    Ok(table.rows_of(ids))
  }

  async fn categories_under(&self, uri: &str) -> Result<Vec<Category>> {
    let table = self.categories.read().await;
    let ids = table
      .keys_from(uri)
      .filter(|((route, _), _)| is_within(route, uri))
      .map(|(_, id)| id);
    Ok(table.rows_of(ids))
  }

  async fn categories_matching(&self, route: &str, uri_name_prefix: &str, limit: usize) -> Result<Vec<Category>> {
    let table = self.categories.read().await;
    let ids = table
      .by_key
      .range((route.to_string(), uri_name_prefix.to_string())..)
      .take_while(|((r, n), _)| r == route && n.starts_with(uri_name_prefix))
      .take(limit)
      .map(|(_, id)| id);
    Ok(table.rows_of(ids))
  }

  async fn categories_with_route_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<Category>> {
    let table = self.categories.read().await;
    let ids = table.keys_from(prefix).take(limit).map(|(_, id)| id);
    Ok(table.rows_of(ids))
  }

  #[instrument(level = "debug", skip(self, change), fields(route = %change.route, uri_name = %change.uri_name))]
  async fn relocate_category(&self, id: CategoryId, change: CategoryChange) -> Result<Relocated> {
    let mut table = self.categories.write().await;
    let current = table
      .rows
      .get(&id)
      .cloned()
      .ok_or_else(|| CatalogError::not_found("category"))?;
    let previous_uri = current.uri();
    let old_key = current.key();
    let new_key = (change.route.clone(), change.uri_name.clone());

    if new_key != old_key && table.by_key.contains_key(&new_key) {
      return Err(CatalogError::Conflict { what: "category" });
    }
    if is_within(&change.route, &previous_uri) {
      return Err(CatalogError::field("route", "cannot move a category under itself"));
    }

    // (id, old key, new route) for every descendant that follows the move.
    let new_uri = join_category(&change.route, &change.uri_name);
    let mut moves: Vec<(CategoryId, CategoryKey, String)> = Vec::new();
    if new_uri != previous_uri {
      for ((route, uri_name), did) in table.keys_from(&previous_uri) {
        if let Some(new_route) = rebase_route(route, &previous_uri, &new_uri) {
          moves.push((*did, (route.clone(), uri_name.clone()), new_route));
        }
      }
      let moving: HashSet<CategoryId> = moves.iter().map(|m| m.0).chain(std::iter::once(id)).collect();
      for (_, (_, uri_name), new_route) in &moves {
        let target = (new_route.clone(), uri_name.clone());
        if let Some(other) = table.by_key.get(&target) {
          if !moving.contains(other) {
            return Err(CatalogError::Conflict { what: "category" });
          }
        }
      }
    }

    table.by_key.remove(&old_key);
    for (_, old, _) in &moves {
      table.by_key.remove(old);
    }
    for (did, (_, uri_name), new_route) in &moves {
      table.by_key.insert((new_route.clone(), uri_name.clone()), *did);
      if let Some(row) = table.rows.get_mut(did) {
        row.route = new_route.clone();
      }
    }
    table.by_key.insert(new_key, id);

    let row = table
      .rows
      .get_mut(&id)
      .ok_or_else(|| CatalogError::Internal(format!("category {id} lost during relocation")))?;
    row.route = change.route;
    row.uri_name = change.uri_name;
    row.name = change.name;
    row.description = change.description;
    let category = row.clone();

    debug!(target: "storage", %previous_uri, new_uri = %category.uri(), rerouted = moves.len(), "Category relocated");
    Ok(Relocated { category, previous_uri, rerouted: moves.len() })
  }

  async fn remove_category(&self, id: CategoryId) -> Result<bool> {
    let mut table = self.categories.write().await;
    match table.rows.remove(&id) {
      Some(row) => {
        table.by_key.remove(&row.key());
        Ok(true)
      }
      None => Ok(false),
    }
  }

  #[instrument(level = "debug", skip(self, exercise), fields(category = %exercise.category, uri_name = %exercise.uri_name))]
  async fn insert_exercise(&self, exercise: Exercise) -> Result<Exercise> {
    let mut table = self.exercises.write().await;
    let key = (exercise.category, exercise.uri_name.clone());
    if table.by_key.contains_key(&key) {
      return Err(CatalogError::AlreadyExists { what: "exercise" });
    }
    table.by_key.insert(key, exercise.id);
    table.rows.insert(exercise.id, exercise.clone());
    Ok(exercise)
  }

  async fn exercise_by_key(&self, category: CategoryId, uri_name: &str) -> Result<Option<Exercise>> {
    let table = self.exercises.read().await;
    let key = (category, uri_name.to_string());
    Ok(table.by_key.get(&key).and_then(|id| table.rows.get(id)).cloned())
  }

  async fn exercises_in(&self, category: CategoryId) -> Result<Vec<Exercise>> {
    let table = self.exercises.read().await;
    Ok(table
      .by_key
      .range((category, String::new())..)
      .take_while(|((c, _), _)| *c == category)
      .filter_map(|(_, id)| table.rows.get(id).cloned())
      .collect())
  }

  #[instrument(level = "debug", skip(self, change))]
  async fn update_exercise(&self, id: ExerciseId, change: ExerciseChange) -> Result<Exercise> {
    let mut table = self.exercises.write().await;
    let mut row = table
      .rows
      .get(&id)
      .cloned()
      .ok_or_else(|| CatalogError::not_found("exercise"))?;
    let old_key = (row.category, row.uri_name.clone());

    if let Some(category) = change.category {
      row.category = category;
    }
    if let Some(uri_name) = change.uri_name {
      row.uri_name = uri_name;
    }
    let new_key = (row.category, row.uri_name.clone());
    if new_key != old_key && table.by_key.get(&new_key).is_some_and(|other| *other != id) {
      return Err(CatalogError::Conflict { what: "exercise" });
    }

    match change.questions {
      Some(QuestionListEdit::Append(qid)) => row.questions_ids.push(qid),
      Some(QuestionListEdit::Remove(qid)) => {
        let pos = row
          .questions_ids
          .iter()
          .position(|q| *q == qid)
          .ok_or_else(|| CatalogError::not_found("question"))?;
        row.questions_ids.remove(pos);
      }
      None => {}
    }
    if let Some(name) = change.name {
      row.name = name;
    }
    if let Some(description) = change.description {
      row.description = description;
    }
    if let Some((at, by)) = change.modified {
      row.last_modified = at;
      row.last_modified_by = by;
    }

    table.by_key.remove(&old_key);
    table.by_key.insert(new_key, id);
    table.rows.insert(id, row.clone());
    Ok(row)
  }

  async fn remove_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>> {
    let mut table = self.exercises.write().await;
    let removed = table.rows.remove(&id);
    if let Some(row) = &removed {
      table.by_key.remove(&(row.category, row.uri_name.clone()));
    }
    Ok(removed)
  }

  async fn insert_question(&self, question: Question) -> Result<QuestionId> {
    let id = question.id;
    self.questions.write().await.insert(id, question);
    Ok(id)
  }

  async fn questions_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>> {
    let questions = self.questions.read().await;
    Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
  }

  async fn remove_question(&self, id: QuestionId) -> Result<bool> {
    Ok(self.questions.write().await.remove(&id).is_some())
  }

  async fn insert_attempt(&self, attempt: Attempt) -> Result<Attempt> {
    self
      .attempts
      .write()
      .await
      .entry(attempt.exercise)
      .or_default()
      .entry(attempt.by.clone())
      .or_default()
      .push(attempt.clone());
    Ok(attempt)
  }

  async fn latest_attempt(&self, exercise: ExerciseId, by: &str) -> Result<Option<Attempt>> {
    let attempts = self.attempts.read().await;
    // `max_by_key` keeps the last of equal dates, i.e. the later submission.
    Ok(attempts
      .get(&exercise)
      .and_then(|per_user| per_user.get(by))
      .and_then(|list| list.iter().max_by_key(|a| a.submission_date))
      .cloned())
  }

  async fn remove_attempts_for(&self, exercise: ExerciseId) -> Result<usize> {
    let removed = self.attempts.write().await.remove(&exercise);
    Ok(removed.map_or(0, |per_user| per_user.values().map(Vec::len).sum()))
  }

  async fn inventory(&self) -> Result<Inventory> {
    Ok(Inventory {
      categories: self.categories.read().await.rows.len(),
      exercises: self.exercises.read().await.rows.len(),
      questions: self.questions.read().await.len(),
      attempts: self.attempts.read().await.values().flat_map(|per_user| per_user.values()).map(Vec::len).sum(),
    })
  }
}
