//! Application state: the catalog handle and the user directory.
//!
//! Startup reads the TOML config (if any), registers users, then loads the
//! configured categories/exercises and, unless disabled, the built-in demo
//! content. Loading goes through the same store operations as the API, so a
//! bad entry is logged and skipped instead of aborting startup.

use tracing::{error, info, instrument, warn};

use crate::auth::UserDirectory;
use crate::config::{load_catalog_config_from_env, CatalogConfig, CategoryCfg, ExerciseCfg};
use crate::error::{CatalogError, Result};
use crate::logic::question_draft;
use crate::seeds::{demo_categories, demo_exercises};
use crate::store::{Catalog, ExerciseDraft};
use crate::uri::encode_route;

/// Author recorded on content loaded at startup.
pub const SYSTEM_USER: &str = "system";

pub struct AppState {
    pub catalog: Catalog,
    pub users: UserDirectory,
}

impl AppState {
    pub fn with_parts(catalog: Catalog, users: UserDirectory) -> Self {
        Self { catalog, users }
    }

    /// Build state from env: load config, register users, seed content.
    #[instrument(level = "info", skip_all)]
    pub async fn new() -> Self {
        let cfg = load_catalog_config_from_env().unwrap_or_default();
        Self::from_config(Catalog::in_memory(), cfg).await
    }

    pub async fn from_config(catalog: Catalog, cfg: CatalogConfig) -> Self {
        let users = UserDirectory::new(cfg.user_pairs());
        if users.is_empty() {
            warn!(target: "practice_catalog", "No users configured; every mutation will answer 401");
        }

        let state = Self { catalog, users };
        let mut categories = cfg.categories;
        let mut exercises = cfg.exercises;
        if cfg.seed_demo {
            categories.extend(demo_categories());
            exercises.extend(demo_exercises());
        }
        for c in &categories {
            state.load_category(c).await;
        }
        for e in exercises {
            state.load_exercise(e).await;
        }

        match state.catalog.storage().inventory().await {
            Ok(inv) => info!(
                target: "practice_catalog",
                users = state.users.len(),
                categories = inv.categories,
                exercises = inv.exercises,
                questions = inv.questions,
                attempts = inv.attempts,
                "Startup catalog inventory"
            ),
            Err(e) => error!(target: "practice_catalog", error = %e, "Inventory unavailable"),
        }
        state
    }

    async fn load_category(&self, c: &CategoryCfg) {
        let route = encode_route(&c.route);
        match self.catalog.create_category(&route, &c.name, c.description.clone()).await {
            Ok(_) | Err(CatalogError::AlreadyExists { .. }) => {}
            Err(e) => warn!(target: "practice_catalog", %route, name = %c.name, error = %e, "Skipping configured category"),
        }
    }

    async fn load_exercise(&self, e: ExerciseCfg) {
        let category = e.category.clone();
        let name = e.name.clone();
        let result: Result<()> = async {
            let questions = e.questions.iter().map(question_draft).collect::<Result<Vec<_>>>()?;
            let draft = ExerciseDraft { name: e.name, description: e.description, questions };
            self.catalog.create_exercise(&category, draft, SYSTEM_USER).await?;
            Ok(())
        }
        .await;
        match result {
            Ok(()) | Err(CatalogError::AlreadyExists { .. }) => {}
            Err(err) => warn!(target: "practice_catalog", %category, %name, error = %err, "Skipping configured exercise"),
        }
    }
}
