use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::domain::{Exercise, Question, QuestionDraft, QuestionId};
use crate::error::{CatalogError, Result};
use crate::storage::{ExerciseChange, QuestionListEdit};

use super::Catalog;

impl Catalog {
  /// Store drafts one by one, keeping their order in the returned ids. On
  /// failure the questions already written are dropped again.
  pub(crate) async fn insert_questions(&self, drafts: Vec<QuestionDraft>) -> Result<Vec<QuestionId>> {
    let mut ids = Vec::with_capacity(drafts.len());
    for draft in drafts {
      match self.storage().insert_question(Question::from_draft(draft)).await {
        Ok(id) => ids.push(id),
        Err(e) => {
          warn!(target: "catalog", error = %e, written = ids.len(), "Question insert failed; rolling back");
          self.drop_questions(&ids).await;
          return Err(e);
        }
      }
    }
    Ok(ids)
  }

  /// Best-effort removal of questions nothing references. Failures are logged
  /// so the caller can still report the error that got it here.
  pub(crate) async fn drop_questions(&self, ids: &[QuestionId]) {
    for id in ids {
      if let Err(e) = self.storage().remove_question(*id).await {
        warn!(target: "catalog", error = %e, question = %id, "Could not drop orphaned question");
      }
    }
  }

  /// Append a question to the end of an exercise's list.
  #[instrument(level = "info", skip(self, draft), fields(title = %draft.title))]
  pub async fn add_question(
    &self,
    category_uri: &str,
    uri_name: &str,
    draft: QuestionDraft,
    author: &str,
  ) -> Result<Question> {
    let (_, exercise) = self.find_exercise(category_uri, uri_name).await?;
    let question = Question::from_draft(draft);
    let id = self.storage().insert_question(question.clone()).await?;

    let change = ExerciseChange {
      questions: Some(QuestionListEdit::Append(id)),
      modified: Some((Utc::now(), author.to_string())),
      ..Default::default()
    };
    if let Err(e) = self.storage().update_exercise(exercise.id, change).await {
      warn!(target: "catalog", error = %e, question = %id, "Exercise vanished; dropping new question");
      self.drop_questions(&[id]).await;
      return Err(e);
    }
    info!(target: "catalog", exercise = %exercise.id, question = %id, "Question added");
    Ok(question)
  }

  /// Take a question out of an exercise and delete it. Ids that are not in the
  /// exercise's list are reported as not found, even if the question exists.
  #[instrument(level = "info", skip(self))]
  pub async fn remove_question(&self, category_uri: &str, uri_name: &str, id: QuestionId, author: &str) -> Result<()> {
    let (_, exercise) = self.find_exercise(category_uri, uri_name).await?;
    if !exercise.questions_ids.contains(&id) {
      return Err(CatalogError::not_found("question"));
    }
    let change = ExerciseChange {
      questions: Some(QuestionListEdit::Remove(id)),
      modified: Some((Utc::now(), author.to_string())),
      ..Default::default()
    };
    self.storage().update_exercise(exercise.id, change).await?;
    self.storage().remove_question(id).await?;
    info!(target: "catalog", exercise = %exercise.id, question = %id, "Question removed");
    Ok(())
  }

  /// The exercise's questions, in list order.
  pub async fn questions_of(&self, exercise: &Exercise) -> Result<Vec<Question>> {
    self.storage().questions_by_ids(&exercise.questions_ids).await
  }
}
