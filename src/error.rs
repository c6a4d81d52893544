//! Error taxonomy of the catalog and its HTTP mapping.
//!
//! Handlers return `Result<_, CatalogError>`; the `IntoResponse` impl below picks
//! the status code and the JSON body shape clients already rely on:
//! `{"errors": "<message>"}` for lookups and collisions, and a per-field map for
//! validation failures.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::uri::InvalidName;

/// Where the offending value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
  Body,
  Params,
  Query,
}

/// One message for one offending field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
  pub field: String,
  pub message: String,
  pub location: Location,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
    Self { field: field.into(), message: message.into(), location }
  }

  pub fn body(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::new(field, message, Location::Body)
  }
}

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("invalid fields")]
  Validation(Vec<FieldError>),

  #[error("{what} not found")]
  NotFound { what: &'static str },

  #[error("{what} exists already")]
  AlreadyExists { what: &'static str },

  #[error("cannot override {what}")]
  Conflict { what: &'static str },

  #[error("{reason}")]
  Forbidden { reason: &'static str },

  #[error("authentication required")]
  Unauthenticated,

  /// A multi-step deletion stopped part way. Steps already taken are not undone.
  #[error("deletion interrupted with {} categories removed and {} left: {cause}", .deleted.len(), .remaining.len())]
  CascadeInterrupted {
    deleted: Vec<Uuid>,
    remaining: Vec<Uuid>,
    #[source]
    cause: Box<CatalogError>,
  },

  #[error("storage failure: {0}")]
  Internal(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
  pub fn not_found(what: &'static str) -> Self {
    CatalogError::NotFound { what }
  }

  pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
    CatalogError::Validation(vec![FieldError::body(field, message)])
  }

  /// True when the failing request already changed some documents.
  pub fn is_partial(&self) -> bool {
    matches!(self, CatalogError::CascadeInterrupted { .. })
  }

  pub fn status(&self) -> StatusCode {
    match self {
      CatalogError::Validation(_) | CatalogError::AlreadyExists { .. } | CatalogError::Conflict { .. } => {
        StatusCode::BAD_REQUEST
      }
      // Root deletion answers like an absent category.
      CatalogError::NotFound { .. } | CatalogError::Forbidden { .. } => StatusCode::NOT_FOUND,
      CatalogError::Unauthenticated => StatusCode::UNAUTHORIZED,
      CatalogError::CascadeInterrupted { .. } | CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn body(&self) -> Value {
    match self {
      CatalogError::Validation(fields) => {
        let mut errors = Map::new();
        for f in fields {
          errors.insert(
            f.field.clone(),
            json!({ "msg": f.message.to_lowercase(), "location": f.location }),
          );
        }
        json!({ "errors": errors, "message": "invalid fields", "status": 400 })
      }
      CatalogError::CascadeInterrupted { deleted, remaining, .. } => json!({
        "errors": self.to_string(),
        "partial": true,
        "deleted": deleted,
        "remaining": remaining,
      }),
      CatalogError::Internal(_) => json!({ "errors": "internal error" }),
      other => json!({ "errors": other.to_string() }),
    }
  }
}

impl From<FieldError> for CatalogError {
  fn from(err: FieldError) -> Self {
    CatalogError::Validation(vec![err])
  }
}

impl From<InvalidName> for CatalogError {
  fn from(_: InvalidName) -> Self {
    CatalogError::field("name", "invalid characters")
  }
}

impl IntoResponse for CatalogError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "catalog", error = %self, partial = self.is_partial(), "Request failed");
    }
    (status, Json(self.body())).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_messages_match_the_wire_format() {
    assert_eq!(CatalogError::not_found("category").to_string(), "category not found");
    assert_eq!(CatalogError::AlreadyExists { what: "category" }.to_string(), "category exists already");
    assert_eq!(CatalogError::Conflict { what: "category" }.to_string(), "cannot override category");
  }

  #[test]
  fn statuses() {
    assert_eq!(CatalogError::field("name", "x").status(), StatusCode::BAD_REQUEST);
    assert_eq!(CatalogError::Forbidden { reason: "cannot delete root" }.status(), StatusCode::NOT_FOUND);
    assert_eq!(CatalogError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(CatalogError::Internal("disk".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn validation_body_is_keyed_by_field() {
    let err = CatalogError::Validation(vec![
      FieldError::body("name", "Name Too Short"),
      FieldError::new("uri", "invalid characters", Location::Params),
    ]);
    let body = err.body();
    assert_eq!(body["errors"]["name"]["msg"], "name too short");
    assert_eq!(body["errors"]["uri"]["location"], "params");
    assert_eq!(body["status"], 400);
  }

  #[test]
  fn interrupted_cascade_is_partial_and_lists_what_is_left() {
    let left = Uuid::new_v4();
    let err = CatalogError::CascadeInterrupted {
      deleted: vec![Uuid::new_v4()],
      remaining: vec![left],
      cause: Box::new(CatalogError::Internal("boom".into())),
    };
    assert!(err.is_partial());
    assert!(!CatalogError::not_found("category").is_partial());
    let body = err.body();
    assert_eq!(body["remaining"][0], left.to_string());
    assert_eq!(body["partial"], true);
  }
}
