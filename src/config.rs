//! Loading catalog configuration (users + optional starting content) from TOML.
//!
//! Example:
//!
//! ```toml
//! seed_demo = false
//!
//! [[users]]
//! id = "alice"
//! token = "s3cret"
//!
//! [[categories]]
//! route = ""
//! name = "Pointers"
//!
//! [[exercises]]
//! category = "Pointers"
//! name = "Basics"
//! description = "Warm up"
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::auth::parse_tokens;
use crate::protocol::QuestionIn;

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogConfig {
  #[serde(default)]
  pub users: Vec<UserCfg>,
  /// Load the built-in demo tree on startup.
  #[serde(default = "default_seed_demo")]
  pub seed_demo: bool,
  #[serde(default)]
  pub categories: Vec<CategoryCfg>,
  #[serde(default)]
  pub exercises: Vec<ExerciseCfg>,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self { users: Vec::new(), seed_demo: default_seed_demo(), categories: Vec::new(), exercises: Vec::new() }
  }
}

fn default_seed_demo() -> bool {
  true
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserCfg {
  pub id: String,
  pub token: String,
}

/// Category entry. `route` is a user path ("Memory/Stack") or an encoded route.
#[derive(Clone, Debug, Deserialize)]
pub struct CategoryCfg {
  #[serde(default)] pub route: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
}

/// Exercise entry, placed under the category whose uri is `category`.
#[derive(Clone, Debug, Deserialize)]
pub struct ExerciseCfg {
  pub category: String,
  pub name: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub questions: Vec<QuestionIn>,
}

impl CatalogConfig {
  /// Configured users plus those from `CATALOG_TOKENS` (`id:token,...`).
  pub fn user_pairs(&self) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = self.users.iter().map(|u| (u.id.clone(), u.token.clone())).collect();
    if let Ok(raw) = std::env::var("CATALOG_TOKENS") {
      pairs.extend(parse_tokens(&raw));
    }
    pairs
  }
}

/// Read and parse a config file. On any IO/parsing error, logs and returns None.
pub fn load_catalog_config(path: &str) -> Option<CatalogConfig> {
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<CatalogConfig>(&s) {
      Ok(cfg) => {
        info!(target: "practice_catalog", %path, users = cfg.users.len(), categories = cfg.categories.len(), exercises = cfg.exercises.len(), "Loaded catalog config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "practice_catalog", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "practice_catalog", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Attempt to load `CatalogConfig` from CATALOG_CONFIG_PATH.
pub fn load_catalog_config_from_env() -> Option<CatalogConfig> {
  let path = std::env::var("CATALOG_CONFIG_PATH").ok()?;
  load_catalog_config(&path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn parses_a_full_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"
seed_demo = false

[[users]]
id = "alice"
token = "s3cret"

[[categories]]
name = "Pointers"

[[categories]]
route = "Pointers"
name = "Exo 1"
description = "first steps"

[[exercises]]
category = "Pointers_Exo+1"
name = "Test A"
description = "warm up"

[[exercises.questions]]
title = "Binary"
statement = "How many kinds of people?"
explanation = "10"
language = "cpp"
languageSnippet = "int x = 0b10;"
choices = {{ format = "radio", list = [{{ name = "a", label = "two", answer = true }}] }}
"#
    )
    .unwrap();

    let cfg = load_catalog_config(file.path().to_str().unwrap()).unwrap();
    assert!(!cfg.seed_demo);
    assert_eq!(cfg.users[0].id, "alice");
    assert_eq!(cfg.categories.len(), 2);
    assert_eq!(cfg.categories[0].route, "");
    assert_eq!(cfg.exercises[0].questions[0].language_snippet.as_deref(), Some("int x = 0b10;"));
    assert_eq!(cfg.exercises[0].questions[0].choices.as_ref().unwrap().list.len(), 1);
  }

  #[test]
  fn empty_file_keeps_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let cfg = load_catalog_config(file.path().to_str().unwrap()).unwrap();
    assert!(cfg.seed_demo);
    assert!(cfg.users.is_empty());
  }

  #[test]
  fn broken_files_are_ignored() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "users = 3").unwrap();
    assert!(load_catalog_config(file.path().to_str().unwrap()).is_none());
    assert!(load_catalog_config("/definitely/not/here.toml").is_none());
  }
}
