//! Category store: creation and lookups.
//!
//! Children are found by an exact `route` match against the parent uri and
//! descendants by a prefix match. Nothing keeps a tree in memory; every call
//! asks the backend again.

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::Category;
use crate::error::{CatalogError, Result};
use crate::uri::{decode, encode_name, encode_route, join_category, CATEGORY_SEP};
use crate::validate::{RouteValidator, Validate};

use super::Catalog;

/// Upper bound of [`Catalog::match_categories`].
pub const MATCH_LIMIT: usize = 10;

impl Catalog {
  /// Create a category under the parent whose uri is `route` (empty for root).
  /// The parent itself does not have to exist.
  #[instrument(level = "info", skip(self, description), fields(%route, %name))]
  pub async fn create_category(&self, route: &str, name: &str, description: Option<String>) -> Result<Category> {
    let route = RouteValidator::body("route").validate(route)?;
    let uri_name = encode_name(name)?;

    // Lookup first for a clean error; the backend insert is the real guard.
    if self.storage().category_by_key(&route, &uri_name).await?.is_some() {
      debug!(target: "catalog", %route, %uri_name, "Category exists already");
      return Err(CatalogError::AlreadyExists { what: "category" });
    }
    let category = self
      .storage()
      .insert_category(Category {
        id: Uuid::new_v4(),
        route,
        uri_name,
        name: name.to_string(),
        description,
      })
      .await?;
    info!(target: "catalog", uri = %category.uri(), id = %category.id, "Category created");
    Ok(category)
  }

  /// Resolve a composed category uri.
  #[instrument(level = "debug", skip(self))]
  pub async fn find_category(&self, uri: &str) -> Result<Category> {
    if uri.is_empty() {
      return Err(CatalogError::not_found("category"));
    }
    let parts = decode(uri, CATEGORY_SEP);
    self
      .storage()
      .category_by_key(&parts.route, &parts.uri_name)
      .await?
      .ok_or_else(|| CatalogError::not_found("category"))
  }

  /// Direct children of `parent_uri` (empty for the root level).
  pub async fn list_children(&self, parent_uri: &str) -> Result<Vec<Category>> {
    self.storage().categories_with_route(parent_uri).await
  }

  /// Every category below `uri`, at any depth. Used by deletion only.
  pub async fn list_descendants(&self, uri: &str) -> Result<Vec<Category>> {
    self.storage().categories_under(uri).await
  }

  /// Up to `limit` categories close to a user-typed path: first siblings on the
  /// same route whose name starts with the last segment, then anything whose
  /// route starts with the whole path.
  #[instrument(level = "debug", skip(self))]
  pub async fn match_categories(&self, ui_uri: &str, limit: usize) -> Result<Vec<Category>> {
    let limit = limit.min(MATCH_LIMIT);
    let encoded = encode_route(ui_uri);
    let parts = decode(&encoded, CATEGORY_SEP);

    let mut found = self
      .storage()
      .categories_matching(&parts.route, &parts.uri_name, limit)
      .await?;
    if found.len() < limit && !encoded.is_empty() {
      let prefix = join_category(&parts.route, &parts.uri_name);
      let more = self
        .storage()
        .categories_with_route_prefix(&prefix, limit)
        .await?;
      for c in more {
        if found.len() >= limit {
          break;
        }
        if !found.iter().any(|f| f.id == c.id) {
          found.push(c);
        }
      }
    }
    Ok(found)
  }
}
