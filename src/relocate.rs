//! Rename and move.
//!
//! A category's identity is its `(route, uri_name)` key, so renaming and moving
//! are the same operation: compute the target key, then let the backend check
//! and write it in one step. Descendants follow the new uri in that same step.
//! Exercises only reference their category id and need no rewriting.

use tracing::{info, instrument};

use crate::domain::{Category, Exercise};
use crate::error::{CatalogError, Location, Result};
use crate::storage::{CategoryChange, Relocated};
use crate::store::{Catalog, ExercisePatch};
use crate::uri::{encode_name, encode_route};
use crate::validate::{ExerciseUriValidator, RouteValidator, Validate};

/// Requested changes; `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
  pub name: Option<String>,
  /// User path or encoded route of the new parent; empty moves to the root.
  pub route: Option<String>,
  pub description: Option<String>,
}

impl Catalog {
  #[instrument(level = "info", skip(self, patch), fields(renaming = patch.name.is_some(), moving = patch.route.is_some()))]
  pub async fn update_category(&self, uri: &str, patch: CategoryPatch) -> Result<Relocated> {
    let current = self.find_category(uri).await?;

    let route = match &patch.route {
      Some(raw) => RouteValidator::body("route").validate(&encode_route(raw))?,
      None => current.route.clone(),
    };
    let (name, uri_name) = match patch.name {
      Some(name) => {
        let uri_name = encode_name(&name)?;
        (name, uri_name)
      }
      None => (current.name.clone(), current.uri_name.clone()),
    };
    let change = CategoryChange {
      route,
      uri_name,
      name,
      description: patch.description.or(current.description),
    };

    let relocated = self.storage().relocate_category(current.id, change).await?;
    info!(
      target: "catalog",
      from = %relocated.previous_uri,
      to = %relocated.category.uri(),
      rerouted = relocated.rerouted,
      "Category updated"
    );
    Ok(relocated)
  }

  /// Re-anchor the exercise at `exercise_uri` to another category.
  pub async fn move_exercise(&self, exercise_uri: &str, category_uri: &str, author: &str) -> Result<(Category, Exercise)> {
    let parts = ExerciseUriValidator { field: "exerciseURI", location: Location::Params }
      .validate(exercise_uri)
      .map_err(CatalogError::from)?;
    let patch = ExercisePatch { category_uri: Some(category_uri.to_string()), ..Default::default() };
    self.update_exercise(&parts.route, &parts.uri_name, patch, author).await
  }
}
