//! Public protocol structs for the HTTP API (serde ready).
//! Field names follow the camelCase wire format the frontend already speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Answer, Attempt, Category, CategoryId, Exercise, Question, QuestionId, UserId};

//
// Request bodies
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryIn {
    pub name: Option<String>,
    pub ui_route: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindCategoryIn {
    #[serde(rename = "uiURI")]
    pub ui_uri: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCategoryIn {
    pub name: Option<String>,
    pub route: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExerciseIn {
    pub name: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<QuestionIn>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateExerciseIn {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "categoryURI")]
    pub category_uri: Option<String>,
}

/// Raw question as posted; every field is checked by `QuestionValidator`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuestionIn {
    pub title: Option<String>,
    pub statement: Option<String>,
    pub explanation: Option<String>,
    pub language: Option<String>,
    pub language_snippet: Option<String>,
    pub choices: Option<ChoicesIn>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChoicesIn {
    pub format: Option<String>,
    #[serde(default)]
    pub list: Vec<ChoiceIn>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChoiceIn {
    pub name: Option<String>,
    pub label: Option<String>,
    pub answer: Option<bool>,
}

/// `?full` (with or without a value) inlines question bodies.
#[derive(Debug, Deserialize, Default)]
pub struct ExerciseQuery {
    pub full: Option<String>,
}

//
// Responses
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize, Debug)]
pub struct CreatedCategoryOut {
    pub name: String,
    pub uri: String,
    pub route: String,
}

/// Short form used by `@find`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub uri: String,
    pub name: String,
    pub uri_name: String,
    pub route: String,
}

impl From<&Category> for CategoryRef {
    fn from(c: &Category) -> Self {
        Self { uri: c.uri(), name: c.name.clone(), uri_name: c.uri_name.clone(), route: c.route.clone() }
    }
}

/// Full category document, as listed by `/subcategories`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOut {
    pub id: CategoryId,
    pub name: String,
    pub uri_name: String,
    pub uri: String,
    pub route: String,
    pub kind: u8,
    pub description: Option<String>,
}

impl From<&Category> for CategoryOut {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            uri_name: c.uri_name.clone(),
            uri: c.uri(),
            route: c.route.clone(),
            kind: crate::domain::CATEGORY_KIND,
            description: c.description.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    pub uri: String,
    pub uri_name: String,
    pub name: String,
    pub kind: u8,
    pub solved: bool,
    pub route: String,
}

#[derive(Serialize, Debug)]
pub struct Section {
    pub title: &'static str,
    pub name: &'static str,
    pub listing: Vec<ListingItem>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetailOut {
    pub name: String,
    pub uri_name: String,
    pub uri: String,
    pub route: String,
    pub kind: u8,
    pub solved: bool,
    pub description: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IndexOut {
    pub route: &'static str,
    pub uri: &'static str,
    pub name: &'static str,
    pub uri_name: &'static str,
    pub description: &'static str,
    pub sections: Vec<Section>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedCategoryOut {
    pub name: String,
    pub uri_name: String,
    pub route: String,
    pub uri: String,
    pub description: Option<String>,
    pub rerouted: usize,
}

/// Question ids, or the questions themselves with `?full`.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum QuestionsField {
    Ids(Vec<QuestionId>),
    Full(Vec<Question>),
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
    pub id: uuid::Uuid,
    pub answers: Vec<Answer>,
    pub submission_date: DateTime<Utc>,
}

impl From<Attempt> for AttemptOut {
    fn from(a: Attempt) -> Self {
        Self { id: a.id, answers: a.answers, submission_date: a.submission_date }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOut {
    pub category: CategoryId,
    #[serde(rename = "categoryURI")]
    pub category_uri: String,
    pub description: String,
    pub kind: u8,
    pub last_modified: DateTime<Utc>,
    pub last_modified_by: UserId,
    pub name: String,
    #[serde(rename = "questionsIDs")]
    pub questions_ids: QuestionsField,
    pub uri_name: String,
    pub uri: String,
    pub solved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AttemptOut>,
}

impl ExerciseOut {
    pub fn new(category: &Category, e: Exercise) -> Self {
        Self {
            category: category.id,
            category_uri: category.uri(),
            description: e.description.clone(),
            kind: crate::domain::EXERCISE_KIND,
            last_modified: e.last_modified,
            last_modified_by: e.last_modified_by.clone(),
            name: e.name.clone(),
            uri: e.uri_in(category),
            uri_name: e.uri_name,
            questions_ids: QuestionsField::Ids(e.questions_ids),
            solved: false,
            answer: None,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedExerciseOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub last_modified_by: UserId,
    pub category: CategoryId,
    #[serde(rename = "categoryURI")]
    pub category_uri: String,
    pub uri: String,
}

#[derive(Serialize, Debug)]
pub struct QuestionCreatedOut {
    pub qid: QuestionId,
}
