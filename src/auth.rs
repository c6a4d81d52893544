//! Caller identity.
//!
//! Mutations take an [`Actor`] extractor, which resolves the bearer token of the
//! request against the configured [`UserDirectory`] and rejects with 401 before
//! the handler body runs. Reads take `Option<Actor>`.

use std::{collections::HashMap, sync::Arc};

use axum::{
  async_trait,
  extract::FromRequestParts,
  http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use crate::domain::UserId;
use crate::error::CatalogError;
use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
  pub id: UserId,
}

/// Token to user lookup.
#[derive(Clone, Debug, Default)]
pub struct UserDirectory {
  by_token: HashMap<String, UserId>,
}

impl UserDirectory {
  /// Build from `(user id, token)` pairs. A repeated token keeps the last user.
  pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
    let mut by_token = HashMap::new();
    for (id, token) in users {
      if token.is_empty() {
        warn!(target: "practice_catalog", user = %id, "Ignoring user with an empty token");
        continue;
      }
      by_token.insert(token, id);
    }
    Self { by_token }
  }

  pub fn resolve(&self, token: &str) -> Option<Actor> {
    self.by_token.get(token).map(|id| Actor { id: id.clone() })
  }

  pub fn len(&self) -> usize {
    self.by_token.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_token.is_empty()
  }
}

/// Parse `id:token,id:token`; malformed entries are skipped.
pub fn parse_tokens(raw: &str) -> Vec<(String, String)> {
  raw
    .split(',')
    .filter_map(|entry| {
      let (id, token) = entry.trim().split_once(':')?;
      let (id, token) = (id.trim(), token.trim());
      (!id.is_empty() && !token.is_empty()).then(|| (id.to_string(), token.to_string()))
    })
    .collect()
}

fn bearer(parts: &Parts) -> Option<&str> {
  let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ")?.trim();
  (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
  type Rejection = CatalogError;

  async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
    let Some(token) = bearer(parts) else {
      debug!(target: "practice_catalog", path = %parts.uri.path(), "No bearer token");
      return Err(CatalogError::Unauthenticated);
    };
    state.users.resolve(token).ok_or_else(|| {
      debug!(target: "practice_catalog", path = %parts.uri.path(), "Unknown bearer token");
      CatalogError::Unauthenticated
    })
  }
}
