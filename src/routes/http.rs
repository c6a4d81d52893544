//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and basic result info.
//!
//! Mutating handlers take [`Actor`] as their first extractor so that a missing
//! or unknown token is rejected before the target is looked up. Bodies come in
//! through [`JsonBody`], which reports decoding failures per field.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Actor;
use crate::cascade::DeletionReport;
use crate::domain::Question;
use crate::error::{CatalogError, FieldError, Location, Result};
use crate::logic::*;
use crate::protocol::*;
use crate::routes::extract::JsonBody;
use crate::state::AppState;
use crate::store::ExerciseRemoval;
use crate::util::trunc_for_log;

type ApiResult<T> = Result<Json<T>>;

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

//
// Categories
//

#[instrument(level = "info", skip_all)]
pub async fn http_category_index(State(state): State<Arc<AppState>>) -> ApiResult<IndexOut> {
  Ok(Json(root_index(&state.catalog).await?))
}

#[instrument(level = "info", skip(state, body), fields(user = %actor.id))]
pub async fn http_create_category(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  JsonBody(body): JsonBody<CreateCategoryIn>,
) -> ApiResult<CreatedCategoryOut> {
  let new = new_category(body)?;
  let category = state.catalog.create_category(&new.route, &new.name, new.description).await?;
  Ok(Json(CreatedCategoryOut { name: category.name.clone(), uri: category.uri(), route: category.route }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_find_categories(
  State(state): State<Arc<AppState>>,
  JsonBody(body): JsonBody<FindCategoryIn>,
) -> ApiResult<Vec<CategoryRef>> {
  let ui_uri = body.ui_uri.unwrap_or_default();
  let found = state.catalog.match_categories(&ui_uri, crate::store::category::MATCH_LIMIT).await?;
  info!(target: "catalog", ui_uri = %trunc_for_log(&ui_uri, 64), hits = found.len(), "Category matches served");
  Ok(Json(found.iter().map(CategoryRef::from).collect()))
}

#[instrument(level = "info", skip(state, actor))]
pub async fn http_get_category(
  State(state): State<Arc<AppState>>,
  actor: Option<Actor>,
  Path(uri): Path<String>,
) -> ApiResult<CategoryDetailOut> {
  let uri = category_uri_param(&uri)?;
  Ok(Json(category_detail(&state.catalog, &uri, actor.as_ref()).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_subcategories(
  State(state): State<Arc<AppState>>,
  Path(uri): Path<String>,
) -> ApiResult<Vec<CategoryOut>> {
  let uri = category_uri_param(&uri)?;
  let category = state.catalog.find_category(&uri).await?;
  let children = state.catalog.list_children(&category.uri()).await?;
  Ok(Json(children.iter().map(CategoryOut::from).collect()))
}

#[instrument(level = "info", skip(state, actor))]
pub async fn http_category_exercises(
  State(state): State<Arc<AppState>>,
  actor: Option<Actor>,
  Path(uri): Path<String>,
) -> ApiResult<Vec<ExerciseOut>> {
  let uri = category_uri_param(&uri)?;
  Ok(Json(exercise_listing(&state.catalog, &uri, actor.as_ref()).await?))
}

#[instrument(level = "info", skip(state, body), fields(user = %actor.id))]
pub async fn http_update_category(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  Path(uri): Path<String>,
  JsonBody(body): JsonBody<UpdateCategoryIn>,
) -> ApiResult<UpdatedCategoryOut> {
  let uri = category_uri_param(&uri)?;
  let patch = category_patch(body)?;
  let moved = state.catalog.update_category(&uri, patch).await?;
  let c = moved.category;
  Ok(Json(UpdatedCategoryOut {
    uri: c.uri(),
    name: c.name,
    uri_name: c.uri_name,
    route: c.route,
    description: c.description,
    rerouted: moved.rerouted,
  }))
}

#[instrument(level = "info", skip(state), fields(user = %actor.id))]
pub async fn http_delete_category(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  Path(uri): Path<String>,
) -> ApiResult<DeletionReport> {
  let uri = category_uri_param(&uri)?;
  Ok(Json(state.catalog.delete_category(&uri).await?))
}

/// `DELETE /category/`: the root cannot go.
#[instrument(level = "info", skip(state), fields(user = %actor.id))]
pub async fn http_delete_root(actor: Actor, State(state): State<Arc<AppState>>) -> ApiResult<DeletionReport> {
  Ok(Json(state.catalog.delete_category("").await?))
}

//
// Exercises
//

#[instrument(level = "info", skip(state, body), fields(user = %actor.id))]
pub async fn http_create_exercise(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  Path(uri): Path<String>,
  JsonBody(body): JsonBody<CreateExerciseIn>,
) -> ApiResult<ExerciseOut> {
  let uri = category_uri_param(&uri)?;
  let draft = exercise_draft(body)?;
  let (category, exercise) = state.catalog.create_exercise(&uri, draft, &actor.id).await?;
  Ok(Json(ExerciseOut::new(&category, exercise)))
}

#[instrument(level = "info", skip(state, actor, q))]
pub async fn http_get_exercise(
  State(state): State<Arc<AppState>>,
  actor: Option<Actor>,
  Path((uri, uri_name)): Path<(String, String)>,
  Query(q): Query<ExerciseQuery>,
) -> ApiResult<ExerciseOut> {
  let uri = category_uri_param(&uri)?;
  let uri_name = uri_name_param(&uri_name)?;
  let full = q.full.is_some();
  Ok(Json(exercise_detail(&state.catalog, &uri, &uri_name, full, actor.as_ref()).await?))
}

#[instrument(level = "info", skip(state, body), fields(user = %actor.id))]
pub async fn http_update_exercise(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  Path((uri, uri_name)): Path<(String, String)>,
  JsonBody(body): JsonBody<UpdateExerciseIn>,
) -> ApiResult<UpdatedExerciseOut> {
  let uri = category_uri_param(&uri)?;
  let uri_name = uri_name_param(&uri_name)?;
  let patch = exercise_patch(body)?;
  let (name, description) = (patch.name.clone(), patch.description.clone());
  let (category, exercise) = state.catalog.update_exercise(&uri, &uri_name, patch, &actor.id).await?;
  Ok(Json(UpdatedExerciseOut {
    uri_name: name.as_ref().map(|_| exercise.uri_name.clone()),
    name,
    description,
    uri: exercise.uri_in(&category),
    last_modified: exercise.last_modified,
    last_modified_by: exercise.last_modified_by,
    category: category.id,
    category_uri: category.uri(),
  }))
}

#[instrument(level = "info", skip(state), fields(user = %actor.id))]
pub async fn http_delete_exercise(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  Path((uri, uri_name)): Path<(String, String)>,
) -> ApiResult<ExerciseRemoval> {
  let uri = category_uri_param(&uri)?;
  let uri_name = uri_name_param(&uri_name)?;
  Ok(Json(state.catalog.delete_exercise(&uri, &uri_name).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_exercise_questions(
  State(state): State<Arc<AppState>>,
  Path((uri, uri_name)): Path<(String, String)>,
) -> ApiResult<Vec<Question>> {
  let uri = category_uri_param(&uri)?;
  let uri_name = uri_name_param(&uri_name)?;
  let (_, exercise) = state.catalog.find_exercise(&uri, &uri_name).await?;
  Ok(Json(state.catalog.questions_of(&exercise).await?))
}

#[instrument(level = "info", skip(state, body), fields(user = %actor.id))]
pub async fn http_add_question(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  Path((uri, uri_name)): Path<(String, String)>,
  JsonBody(body): JsonBody<QuestionIn>,
) -> ApiResult<QuestionCreatedOut> {
  let uri = category_uri_param(&uri)?;
  let uri_name = uri_name_param(&uri_name)?;
  let draft = question_draft(&body)?;
  let question = state.catalog.add_question(&uri, &uri_name, draft, &actor.id).await?;
  Ok(Json(QuestionCreatedOut { qid: question.id }))
}

#[instrument(level = "info", skip(state), fields(user = %actor.id))]
pub async fn http_remove_question(
  actor: Actor,
  State(state): State<Arc<AppState>>,
  Path((uri, uri_name, qid)): Path<(String, String, String)>,
) -> Result<StatusCode> {
  let uri = category_uri_param(&uri)?;
  let uri_name = uri_name_param(&uri_name)?;
  let qid = Uuid::parse_str(&qid)
    .map_err(|_| CatalogError::from(FieldError::new("qid", "invalid question id", Location::Params)))?;
  state.catalog.remove_question(&uri, &uri_name, qid, &actor.id).await?;
  Ok(StatusCode::OK)
}
