//! Subtree deletion.
//!
//! Deleting a category takes every category below it, every exercise anchored
//! to any of them, their questions and their attempts. The work is split into
//! a plan, computed once from a single enumeration, and its execution. The
//! backend offers no transaction spanning the steps: when a step fails the
//! steps already taken stay done and the error says so.

use std::cmp::Reverse;

use tracing::{debug, info, instrument, warn};

use crate::domain::{Category, CategoryId};
use crate::error::{CatalogError, Result};
use crate::store::{Catalog, ExerciseRemoval};
use crate::uri::CATEGORY_SEP;

/// Categories to remove, deepest first; the requested category comes last.
#[derive(Clone, Debug)]
pub struct DeletionPlan {
  pub root: Category,
  pub nodes: Vec<Category>,
}

impl DeletionPlan {
  pub fn ids(&self) -> Vec<CategoryId> {
    self.nodes.iter().map(|c| c.id).collect()
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeletionReport {
  pub categories: usize,
  pub exercises: usize,
  pub questions: usize,
  pub attempts: usize,
  /// Categories that were gone by the time their turn came.
  pub skipped: usize,
}

impl DeletionReport {
  fn absorb(&mut self, removal: ExerciseRemoval) {
    self.exercises += removal.exercises;
    self.questions += removal.questions;
    self.attempts += removal.attempts;
  }
}

fn depth(category: &Category) -> usize {
  if category.route.is_empty() {
    0
  } else {
    category.route.split(CATEGORY_SEP).count()
  }
}

impl Catalog {
  /// Resolve `uri` and enumerate its subtree. Fails before anything changes.
  #[instrument(level = "debug", skip(self))]
  pub async fn plan_deletion(&self, uri: &str) -> Result<DeletionPlan> {
    if uri.is_empty() {
      return Err(CatalogError::Forbidden { reason: "cannot delete root" });
    }
    let root = self.find_category(uri).await?;
    let mut nodes = self.list_descendants(&root.uri()).await?;
    nodes.sort_by_key(|c| (Reverse(depth(c)), c.uri()));
    nodes.push(root.clone());
    debug!(target: "catalog", uri = %root.uri(), nodes = nodes.len(), "Deletion planned");
    Ok(DeletionPlan { root, nodes })
  }

  /// Run a plan to the end, or stop at the first failing step.
  pub async fn execute_deletion(&self, plan: DeletionPlan) -> Result<DeletionReport> {
    let mut report = DeletionReport::default();
    let mut deleted = Vec::with_capacity(plan.nodes.len());

    for (i, node) in plan.nodes.iter().enumerate() {
      if let Err(cause) = self.delete_node(node, &mut report).await {
        let remaining: Vec<CategoryId> = plan.nodes[i..].iter().map(|c| c.id).collect();
        warn!(
          target: "catalog",
          uri = %plan.root.uri(),
          failed_at = %node.uri(),
          deleted = deleted.len(),
          remaining = remaining.len(),
          error = %cause,
          "Deletion interrupted"
        );
        return Err(CatalogError::CascadeInterrupted { deleted, remaining, cause: Box::new(cause) });
      }
      deleted.push(node.id);
    }
    Ok(report)
  }

  async fn delete_node(&self, node: &Category, report: &mut DeletionReport) -> Result<()> {
    for exercise in self.list_exercises(node).await? {
      let removal = self.purge_exercise(exercise.id).await?;
      report.absorb(removal);
    }
    if self.storage().remove_category(node.id).await? {
      report.categories += 1;
    } else {
      debug!(target: "catalog", uri = %node.uri(), "Category already gone");
      report.skipped += 1;
    }
    Ok(())
  }

  /// Delete the category at `uri` together with everything below it.
  #[instrument(level = "info", skip(self))]
  pub async fn delete_category(&self, uri: &str) -> Result<DeletionReport> {
    let plan = self.plan_deletion(uri).await?;
    let root_uri = plan.root.uri();
    let report = self.execute_deletion(plan).await?;
    info!(
      target: "catalog",
      uri = %root_uri,
      categories = report.categories,
      exercises = report.exercises,
      questions = report.questions,
      attempts = report.attempts,
      skipped = report.skipped,
      "Category deleted"
    );
    Ok(report)
  }
}
