//! Exercise store. An exercise is anchored to one category id and owns the
//! membership list of its questions.

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Answer, Attempt, Category, Exercise, ExerciseId, QuestionDraft};
use crate::error::{CatalogError, Result};
use crate::storage::ExerciseChange;
use crate::uri::{decode, encode_name, EXERCISE_SEP};

use super::Catalog;

/// Validated input of [`Catalog::create_exercise`].
#[derive(Clone, Debug)]
pub struct ExerciseDraft {
  pub name: String,
  pub description: String,
  pub questions: Vec<QuestionDraft>,
}

/// Partial update; `category_uri` moves the exercise.
#[derive(Clone, Debug, Default)]
pub struct ExercisePatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub category_uri: Option<String>,
}

/// What a deletion took with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExerciseRemoval {
  pub exercises: usize,
  pub questions: usize,
  pub attempts: usize,
}

impl Catalog {
  /// Create an exercise under `category_uri`. Questions are stored first, in
  /// the given order, then the exercise that lists them.
  #[instrument(level = "info", skip(self, draft), fields(name = %draft.name, questions = draft.questions.len()))]
  pub async fn create_exercise(&self, category_uri: &str, draft: ExerciseDraft, author: &str) -> Result<(Category, Exercise)> {
    let category = self.find_category(category_uri).await?;
    let uri_name = encode_name(&draft.name)?;
    if self.storage().exercise_by_key(category.id, &uri_name).await?.is_some() {
      return Err(CatalogError::AlreadyExists { what: "exercise" });
    }

    let questions_ids = self.insert_questions(draft.questions).await?;
    let exercise = Exercise {
      id: Uuid::new_v4(),
      uri_name,
      name: draft.name,
      description: draft.description,
      category: category.id,
      questions_ids: questions_ids.clone(),
      last_modified: Utc::now(),
      last_modified_by: author.to_string(),
    };
    match self.storage().insert_exercise(exercise).await {
      Ok(exercise) => {
        info!(target: "catalog", uri = %exercise.uri_in(&category), id = %exercise.id, "Exercise created");
        Ok((category, exercise))
      }
      Err(e) => {
        // Lost a race on the key; drop the questions written for it.
        warn!(target: "catalog", error = %e, "Exercise insert failed; removing its questions");
        self.drop_questions(&questions_ids).await;
        Err(e)
      }
    }
  }

  pub async fn find_exercise(&self, category_uri: &str, uri_name: &str) -> Result<(Category, Exercise)> {
    let category = self.find_category(category_uri).await?;
    let exercise = self
      .storage()
      .exercise_by_key(category.id, uri_name)
      .await?
      .ok_or_else(|| CatalogError::not_found("exercise"))?;
    Ok((category, exercise))
  }

  /// Resolve `<category uri>/<uri name>`.
  pub async fn find_exercise_by_uri(&self, exercise_uri: &str) -> Result<(Category, Exercise)> {
    let parts = decode(exercise_uri, EXERCISE_SEP);
    if parts.route.is_empty() {
      return Err(CatalogError::not_found("exercise"));
    }
    self.find_exercise(&parts.route, &parts.uri_name).await
  }

  pub async fn list_exercises(&self, category: &Category) -> Result<Vec<Exercise>> {
    self.storage().exercises_in(category.id).await
  }

  /// Rename, describe or move an exercise. Returns the (possibly new) parent.
  #[instrument(level = "info", skip(self, patch), fields(moving = patch.category_uri.is_some()))]
  pub async fn update_exercise(
    &self,
    category_uri: &str,
    uri_name: &str,
    patch: ExercisePatch,
    author: &str,
  ) -> Result<(Category, Exercise)> {
    let (current, exercise) = self.find_exercise(category_uri, uri_name).await?;
    let destination = match &patch.category_uri {
      Some(uri) => self.find_category(uri).await.map_err(|e| match e {
        CatalogError::NotFound { .. } => CatalogError::not_found("destination category"),
        other => other,
      })?,
      None => current,
    };

    let change = ExerciseChange {
      uri_name: patch.name.as_deref().map(encode_name).transpose()?,
      name: patch.name,
      description: patch.description,
      category: (destination.id != exercise.category).then_some(destination.id),
      questions: None,
      modified: Some((Utc::now(), author.to_string())),
    };
    let updated = self.storage().update_exercise(exercise.id, change).await?;
    info!(target: "catalog", uri = %updated.uri_in(&destination), by = %author, "Exercise updated");
    Ok((destination, updated))
  }

  #[instrument(level = "info", skip(self))]
  pub async fn delete_exercise(&self, category_uri: &str, uri_name: &str) -> Result<ExerciseRemoval> {
    let (_, exercise) = self.find_exercise(category_uri, uri_name).await?;
    self.purge_exercise(exercise.id).await
  }

  /// Remove an exercise, then its questions, then the attempts made on it.
  /// An exercise that is already gone counts as nothing removed.
  pub(crate) async fn purge_exercise(&self, id: ExerciseId) -> Result<ExerciseRemoval> {
    let Some(exercise) = self.storage().remove_exercise(id).await? else {
      return Ok(ExerciseRemoval::default());
    };
    let mut removal = ExerciseRemoval { exercises: 1, ..Default::default() };
    for qid in &exercise.questions_ids {
      if self.storage().remove_question(*qid).await? {
        removal.questions += 1;
      }
    }
    removal.attempts = self.storage().remove_attempts_for(exercise.id).await?;
    Ok(removal)
  }

  /// Store a graded submission. Grading itself happens elsewhere.
  pub async fn record_attempt(&self, exercise_uri: &str, by: &str, answers: Vec<Answer>, solved: bool) -> Result<Attempt> {
    let (_, exercise) = self.find_exercise_by_uri(exercise_uri).await?;
    self
      .storage()
      .insert_attempt(Attempt {
        id: Uuid::new_v4(),
        exercise: exercise.id,
        by: by.to_string(),
        answers,
        solved,
        submission_date: Utc::now(),
      })
      .await
  }

  pub async fn latest_attempt(&self, exercise: &Exercise, by: &str) -> Result<Option<Attempt>> {
    self.storage().latest_attempt(exercise.id, by).await
  }
}
