//! Flat identifiers for the catalog tree.
//!
//! A Category is stored under the pair `(route, uri_name)`, where `route` is the
//! composed uri of its parent (empty at the root). Category uris join both
//! halves with `_`; Exercise uris always append `/<uri_name>` to the uri of
//! their Category. Spaces in user-facing names become `+`.
//!
//! Nothing in this module touches storage.

use thiserror::Error;

use crate::validate::NAME_RE;

/// Joins a Category route to its own `uri_name`.
pub const CATEGORY_SEP: char = '_';
/// Joins a Category uri to an Exercise `uri_name`.
pub const EXERCISE_SEP: char = '/';
/// Stands in for a space inside identifiers.
pub const SPACE_PLACEHOLDER: char = '+';

/// The user-facing name does not satisfy the name rules and has no uri form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid name '{0}' cannot be cast to a uri name")]
pub struct InvalidName(pub String);

/// Storage key of a Category (or of an Exercise relative to its Category uri).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UriParts {
  pub route: String,
  pub uri_name: String,
}

/// Human-readable form of a uri, for display only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayParts {
  pub display_route: String,
  pub display_name: String,
}

/// Turn a user-facing name into a single-token `uri_name`.
///
/// Only ASCII alphanumerics and spaces survive; `_`, `-` and `+` are dropped so
/// the result can never contain a separator, then each space becomes `+`.
pub fn encode_name(user_name: &str) -> Result<String, InvalidName> {
  if !NAME_RE.is_match(user_name) {
    return Err(InvalidName(user_name.to_string()));
  }
  let uri_name: String = user_name
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
    .map(|c| if c == ' ' { SPACE_PLACEHOLDER } else { c })
    .collect();
  if uri_name.is_empty() {
    return Err(InvalidName(user_name.to_string()));
  }
  Ok(uri_name)
}

/// Turn a `/`-delimited user path into a Category route.
///
/// Already-encoded routes pass through unchanged, so `_` inside a segment is
/// read as a separator and `+` as a space. A path only reaches a category
/// whose display name has no `_` or `+`: `encode_name` drops both, so the
/// category named `C++` lives at `C`, not at `C++`.
pub fn encode_route(user_path: &str) -> String {
  let trimmed = user_path.strip_prefix('/').unwrap_or(user_path);
  let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

  let mut out = String::with_capacity(trimmed.len());
  for segment in trimmed.split('/') {
    let segment = crate::util::collapse_spaces(segment.trim_matches(' '));
    push_separator(&mut out);
    for ch in segment.chars() {
      match ch {
        CATEGORY_SEP => push_separator(&mut out),
        ' ' | SPACE_PLACEHOLDER => out.push(SPACE_PLACEHOLDER),
        c if c.is_ascii_alphanumeric() => out.push(c),
        _ => {}
      }
    }
  }
  while out.ends_with(CATEGORY_SEP) {
    out.pop();
  }
  out
}

// Never leading, never doubled.
fn push_separator(out: &mut String) {
  if !out.is_empty() && !out.ends_with(CATEGORY_SEP) {
    out.push(CATEGORY_SEP);
  }
}

/// Split a composed uri at the last `sep`.
pub fn decode(uri: &str, sep: char) -> UriParts {
  match uri.rfind(sep) {
    Some(pos) => UriParts {
      route: uri[..pos].to_string(),
      uri_name: uri[pos + sep.len_utf8()..].to_string(),
    },
    None => UriParts { route: String::new(), uri_name: uri.to_string() },
  }
}

/// Inverse of the encoders, for display: separators back to `/`, `+` back to space.
pub fn revert(uri: &str, sep: char) -> DisplayParts {
  let parts = decode(uri, sep);
  DisplayParts {
    display_route: parts
      .route
      .replace([CATEGORY_SEP, EXERCISE_SEP], "/")
      .replace(SPACE_PLACEHOLDER, " "),
    display_name: parts.uri_name.replace(SPACE_PLACEHOLDER, " "),
  }
}

pub fn join_category(route: &str, uri_name: &str) -> String {
  if route.is_empty() {
    uri_name.to_string()
  } else {
    format!("{route}{CATEGORY_SEP}{uri_name}")
  }
}

pub fn join_exercise(category_uri: &str, uri_name: &str) -> String {
  format!("{category_uri}{EXERCISE_SEP}{uri_name}")
}

/// True when a Category stored under `route` lives somewhere below `uri`.
/// Matches whole segments: `Pointers2` is not below `Pointers`.
pub fn is_within(route: &str, uri: &str) -> bool {
  if uri.is_empty() {
    return !route.is_empty();
  }
  match route.strip_prefix(uri) {
    Some("") => true,
    Some(rest) => rest.starts_with(CATEGORY_SEP),
    None => false,
  }
}

/// Rewrite the `old_uri` prefix of `route` to `new_uri`, or `None` when the
/// route is not below `old_uri`.
pub fn rebase_route(route: &str, old_uri: &str, new_uri: &str) -> Option<String> {
  if !is_within(route, old_uri) || old_uri.is_empty() {
    return None;
  }
  let rest = &route[old_uri.len()..];
  Some(format!("{new_uri}{rest}"))
}
