//! JSON request bodies.
//!
//! `axum::Json` answers a mistyped field with a plain-text 422 before any
//! validator runs. [`JsonBody`] parses the same bytes itself and reports the
//! failure as a field-keyed validation error instead, so every bad body gets
//! the same 400 shape.

use axum::{
  async_trait,
  body::Bytes,
  extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CatalogError, FieldError, Result};

/// Field name used when the failure cannot be pinned to one key.
const WHOLE_BODY: &str = "body";

pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
  S: Send + Sync,
  T: DeserializeOwned,
{
  type Rejection = CatalogError;

  async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
    let bytes = Bytes::from_request(req, state)
      .await
      .map_err(|e| CatalogError::from(FieldError::body(WHOLE_BODY, e.body_text())))?;
    Ok(JsonBody(decode_body(&bytes)?))
  }
}

/// Decode a request body. An empty body reads as `{}` so that missing fields
/// reach the validators.
pub fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
  let value: Value = if bytes.iter().all(u8::is_ascii_whitespace) {
    Value::Object(Map::new())
  } else {
    serde_json::from_slice(bytes).map_err(|e| FieldError::body(WHOLE_BODY, format!("malformed json: {e}")))?
  };

  match serde_json::from_value::<T>(value.clone()) {
    Ok(parsed) => Ok(parsed),
    Err(e) => {
      let field = offending_key::<T>(&value).unwrap_or_else(|| WHOLE_BODY.to_string());
      debug!(target: "catalog", field = %field, error = %e, "Rejected request body");
      Err(FieldError::body(field, e.to_string()).into())
    }
  }
}

// Request DTOs are all-optional, so a single key decodes on its own unless that
// key holds the bad value.
fn offending_key<T: DeserializeOwned>(value: &Value) -> Option<String> {
  let Value::Object(map) = value else { return None };
  map.iter().find_map(|(key, v)| {
    let mut alone = Map::new();
    alone.insert(key.clone(), v.clone());
    serde_json::from_value::<T>(Value::Object(alone)).is_err().then(|| key.clone())
  })
}
