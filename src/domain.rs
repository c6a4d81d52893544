//! Domain models of the catalog: categories, exercises, questions and attempts.
//!
//! Parent/child links between categories are never stored; they follow from
//! `route` (see `crate::uri`). An exercise points at exactly one category id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::uri::join_category;

pub type CategoryId = Uuid;
pub type ExerciseId = Uuid;
pub type QuestionId = Uuid;
pub type AttemptId = Uuid;
/// Opaque identity of the acting user, as handed over by authentication.
pub type UserId = String;

/// Listing kinds, as the frontend tells categories and exercises apart.
pub const CATEGORY_KIND: u8 = 0;
pub const EXERCISE_KIND: u8 = 1;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: CategoryId,
  pub route: String,
  pub uri_name: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
}

impl Category {
  /// Composed identifier; derived on every call, never stored.
  pub fn uri(&self) -> String {
    join_category(&self.route, &self.uri_name)
  }

  pub fn key(&self) -> (String, String) {
    (self.route.clone(), self.uri_name.clone())
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
  pub id: ExerciseId,
  pub uri_name: String,
  pub name: String,
  pub description: String,
  pub category: CategoryId,
  /// Display order of the questions.
  #[serde(rename = "questionsIDs")]
  pub questions_ids: Vec<QuestionId>,
  pub last_modified: DateTime<Utc>,
  pub last_modified_by: UserId,
}

impl Exercise {
  /// Composed identifier under the given parent, which must be `self.category`.
  pub fn uri_in(&self, category: &Category) -> String {
    crate::uri::join_exercise(&category.uri(), &self.uri_name)
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceFormat {
  Radio,
  #[default]
  Checkbox,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Choice {
  pub name: String,
  pub label: String,
  pub answer: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Choices {
  pub format: ChoiceFormat,
  pub list: Vec<Choice>,
}

/// Language tag of a question's code snippet.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  #[default]
  #[serde(rename = "")]
  None,
  Cpp,
  C,
  Java,
  Bta,
  Javascript,
  Python,
}

impl Language {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "" => Some(Language::None),
      "cpp" => Some(Language::Cpp),
      "c" => Some(Language::C),
      "java" => Some(Language::Java),
      "bta" => Some(Language::Bta),
      "javascript" => Some(Language::Javascript),
      "python" => Some(Language::Python),
      _ => None,
    }
  }
}

/// Validated question content, before it gets an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionDraft {
  pub title: String,
  pub statement: String,
  pub explanation: String,
  pub language: Language,
  pub language_snippet: String,
  pub choices: Choices,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  #[serde(rename = "_id")]
  pub id: QuestionId,
  pub title: String,
  pub statement: String,
  pub explanation: String,
  pub language: Language,
  pub language_snippet: String,
  pub choices: Choices,
}

impl Question {
  pub fn from_draft(draft: QuestionDraft) -> Self {
    Self {
      id: Uuid::new_v4(),
      title: draft.title,
      statement: draft.statement,
      explanation: draft.explanation,
      language: draft.language,
      language_snippet: draft.language_snippet,
      choices: draft.choices,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
  pub name: String,
  pub value: String,
}

/// A user's submission on an exercise. Produced by an external grader.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
  pub id: AttemptId,
  pub exercise: ExerciseId,
  pub by: UserId,
  pub answers: Vec<Answer>,
  pub solved: bool,
  pub submission_date: DateTime<Utc>,
}
