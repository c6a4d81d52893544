//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - turning raw request bodies into validated store inputs
//!   - assembling the read views (category page, root index, exercise detail)
//!
//! Handlers stay thin: extract, call one function here or one store method,
//! wrap the result in `Json`.

use tracing::{debug, instrument};

use crate::auth::Actor;
use crate::domain::{Category, Exercise, QuestionDraft, CATEGORY_KIND, EXERCISE_KIND};
use crate::error::{CatalogError, FieldError, Location, Result};
use crate::protocol::*;
use crate::relocate::CategoryPatch;
use crate::store::{Catalog, ExerciseDraft, ExercisePatch};
use crate::uri::encode_route;
use crate::validate::{
  Collector, NameValidator, QuestionValidator, RouteValidator, TextValidator, UriNameValidator, Validate,
};

const DESCRIPTION_MAX_LENGTH: usize = 255;

//
// Path parameters
//

/// `:uri` path parameter; may be empty only where the caller allows it.
pub fn category_uri_param(uri: &str) -> Result<String> {
  Ok(RouteValidator::params("uri").validate(uri)?)
}

pub fn uri_name_param(uri_name: &str) -> Result<String> {
  Ok(UriNameValidator { field: "uriName" }.validate(uri_name)?)
}

//
// Request bodies
//

pub struct NewCategory {
  pub route: String,
  pub name: String,
  pub description: Option<String>,
}

pub fn new_category(body: CreateCategoryIn) -> Result<NewCategory> {
  let mut c = Collector::default();
  let name = c.check(NameValidator::body("name").validate(body.name.as_deref().unwrap_or("")));
  let route = c.check(RouteValidator::body("uiRoute").validate(&encode_route(body.ui_route.as_deref().unwrap_or(""))));
  let description = match body.description.as_deref() {
    Some(d) => c.check(optional_text("description", d)).map(Some),
    None => Some(None),
  };
  c.finish()?;
  match (name, route, description) {
    (Some(name), Some(route), Some(description)) => Ok(NewCategory { route, name, description }),
    _ => Err(CatalogError::Internal("validation collector lost a field".into())),
  }
}

pub fn category_patch(body: UpdateCategoryIn) -> Result<CategoryPatch> {
  let mut c = Collector::default();
  let name = body.name.as_deref().and_then(|n| c.check(NameValidator::body("name").validate(n)));
  let route = body
    .route
    .as_deref()
    .and_then(|r| c.check(RouteValidator::body("route").validate(&encode_route(r))));
  let description = body.description.as_deref().and_then(|d| c.check(optional_text("description", d)));
  c.finish()?;
  Ok(CategoryPatch { name, route, description })
}

pub fn exercise_draft(body: CreateExerciseIn) -> Result<ExerciseDraft> {
  let mut c = Collector::default();
  let name = c.check(NameValidator::body("name").validate(body.name.as_deref().unwrap_or("")));
  let description = c.check(required_text("description", body.description.as_deref().unwrap_or("")));
  let questions = match body.questions {
    Some(list) => {
      let mut drafts = Vec::with_capacity(list.len());
      for q in &list {
        match c.check(question_in_list(q)) {
          Some(d) => drafts.push(d),
          None => break,
        }
      }
      Some(drafts)
    }
    None => c.check(Err(FieldError::body("questions", "questions must be an array"))),
  };
  c.finish()?;
  match (name, description, questions) {
    (Some(name), Some(description), Some(questions)) => Ok(ExerciseDraft { name, description, questions }),
    _ => Err(CatalogError::Internal("validation collector lost a field".into())),
  }
}

pub fn exercise_patch(body: UpdateExerciseIn) -> Result<ExercisePatch> {
  let mut c = Collector::default();
  let name = body.name.as_deref().and_then(|n| c.check(NameValidator::body("name").validate(n)));
  let description = body
    .description
    .as_deref()
    .and_then(|d| c.check(required_text("description", d)));
  let category_uri = match body.category_uri.as_deref() {
    Some("") => c.check(Err(FieldError::body("categoryURI", "invalid characters"))),
    Some(uri) => c.check(RouteValidator::body("categoryURI").validate(uri)),
    None => None,
  };
  c.finish()?;
  Ok(ExercisePatch { name, description, category_uri })
}

pub fn question_draft(body: &QuestionIn) -> Result<QuestionDraft> {
  Ok(QuestionValidator.validate(body)?)
}

// Errors inside the `questions` array are reported on that field.
fn question_in_list(q: &QuestionIn) -> std::result::Result<QuestionDraft, FieldError> {
  QuestionValidator.validate(q).map_err(|e| {
    FieldError::new("questions", format!("{}: {}", e.field, e.message), Location::Body)
  })
}

fn optional_text(field: &'static str, v: &str) -> std::result::Result<String, FieldError> {
  TextValidator { field, max: DESCRIPTION_MAX_LENGTH, required: false }.validate(v)
}

fn required_text(field: &'static str, v: &str) -> std::result::Result<String, FieldError> {
  TextValidator { field, max: DESCRIPTION_MAX_LENGTH, required: true }.validate(v)
}

//
// Read views
//

async fn exercise_solved(catalog: &Catalog, exercise: &Exercise, actor: Option<&Actor>) -> Result<bool> {
  let Some(actor) = actor else { return Ok(false) };
  Ok(catalog.latest_attempt(exercise, &actor.id).await?.is_some_and(|a| a.solved))
}

// Progress is tracked per exercise only; categories always list as solved.
const CATEGORY_SOLVED: bool = true;

async fn subcategories_section(catalog: &Catalog, parent_uri: &str) -> Result<Section> {
  let mut listing = Vec::new();
  for sub in catalog.list_children(parent_uri).await? {
    listing.push(ListingItem {
      uri: sub.uri(),
      uri_name: sub.uri_name.clone(),
      name: sub.name.clone(),
      kind: CATEGORY_KIND,
      solved: CATEGORY_SOLVED,
      route: sub.route.clone(),
    });
  }
  Ok(Section { title: "Subcategories", name: "subcategories", listing })
}

async fn exercises_section(catalog: &Catalog, category: &Category, actor: Option<&Actor>) -> Result<Section> {
  let mut listing = Vec::new();
  for e in catalog.list_exercises(category).await? {
    listing.push(ListingItem {
      uri: e.uri_in(category),
      uri_name: e.uri_name.clone(),
      name: e.name.clone(),
      kind: EXERCISE_KIND,
      solved: exercise_solved(catalog, &e, actor).await?,
      route: category.uri(),
    });
  }
  Ok(Section { title: "Exercises", name: "exercises", listing })
}

#[instrument(level = "debug", skip(catalog))]
pub async fn root_index(catalog: &Catalog) -> Result<IndexOut> {
  let subs = subcategories_section(catalog, "").await?;
  Ok(IndexOut {
    route: "",
    uri: "",
    name: "Categories Index",
    uri_name: "",
    description: "Index of all categories",
    sections: vec![subs],
  })
}

/// Category page with its non-empty sections, subcategories first.
#[instrument(level = "debug", skip(catalog, actor))]
pub async fn category_detail(catalog: &Catalog, uri: &str, actor: Option<&Actor>) -> Result<CategoryDetailOut> {
  let category = catalog.find_category(uri).await?;
  let mut sections = Vec::with_capacity(2);
  let subs = subcategories_section(catalog, &category.uri()).await?;
  if !subs.listing.is_empty() {
    sections.push(subs);
  }
  let exos = exercises_section(catalog, &category, actor).await?;
  if !exos.listing.is_empty() {
    sections.push(exos);
  }
  Ok(CategoryDetailOut {
    name: category.name.clone(),
    uri_name: category.uri_name.clone(),
    uri: category.uri(),
    route: category.route.clone(),
    kind: CATEGORY_KIND,
    solved: CATEGORY_SOLVED,
    description: category.description,
    sections,
  })
}

pub async fn exercise_listing(catalog: &Catalog, uri: &str, actor: Option<&Actor>) -> Result<Vec<ExerciseOut>> {
  let category = catalog.find_category(uri).await?;
  let mut out = Vec::new();
  for e in catalog.list_exercises(&category).await? {
    let solved = exercise_solved(catalog, &e, actor).await?;
    let mut item = ExerciseOut::new(&category, e);
    item.solved = solved;
    out.push(item);
  }
  Ok(out)
}

/// Exercise detail. `full` inlines the questions; an authenticated caller also
/// gets their latest attempt.
#[instrument(level = "debug", skip(catalog, actor), fields(user = ?actor.map(|a| &a.id)))]
pub async fn exercise_detail(
  catalog: &Catalog,
  category_uri: &str,
  uri_name: &str,
  full: bool,
  actor: Option<&Actor>,
) -> Result<ExerciseOut> {
  let (category, exercise) = catalog.find_exercise(category_uri, uri_name).await?;
  let attempt = match actor {
    Some(a) => catalog.latest_attempt(&exercise, &a.id).await?,
    None => None,
  };
  let questions = if full { Some(catalog.questions_of(&exercise).await?) } else { None };

  let mut out = ExerciseOut::new(&category, exercise);
  if let Some(questions) = questions {
    out.questions_ids = QuestionsField::Full(questions);
  }
  out.solved = attempt.as_ref().is_some_and(|a| a.solved);
  out.answer = attempt.map(AttemptOut::from);
  debug!(target: "catalog", uri = %out.uri, solved = out.solved, "Exercise fetched");
  Ok(out)
}
