//! Storage failures part way through composite operations
//!
//! A backend that starts failing part way through a cascade must leave a
//! partial, reported state that a second run finishes. A failed exercise
//! create must not leave its questions behind.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use practice_catalog::{
    domain::{
        Attempt, Category, CategoryId, Choice, ChoiceFormat, Choices, Exercise, ExerciseId, Language, Question,
        QuestionDraft, QuestionId,
    },
    storage::{CategoryChange, ExerciseChange, Inventory, MemoryStorage, Relocated, Storage},
    store::ExerciseDraft,
    Catalog, CatalogError, Result,
};

/// Delegates to memory; `remove_category` and `insert_question` fail once
/// their budgets are spent.
struct FlakyStorage {
    inner: MemoryStorage,
    removals_left: AtomicUsize,
    question_inserts_left: AtomicUsize,
    question_removals_fail: AtomicBool,
}

impl FlakyStorage {
    fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            removals_left: AtomicUsize::new(usize::MAX),
            question_inserts_left: AtomicUsize::new(usize::MAX),
            question_removals_fail: AtomicBool::new(false),
        }
    }

    fn fail_questions_after(&self, inserts: usize) {
        self.question_inserts_left.store(inserts, Ordering::SeqCst);
    }

    fn fail_after(&self, removals: usize) {
        self.removals_left.store(removals, Ordering::SeqCst);
    }

    fn heal(&self) {
        self.removals_left.store(usize::MAX, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn insert_category(&self, category: Category) -> Result<Category> {
        self.inner.insert_category(category).await
    }
    async fn category_by_key(&self, route: &str, uri_name: &str) -> Result<Option<Category>> {
        self.inner.category_by_key(route, uri_name).await
    }
    async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>> {
        self.inner.category_by_id(id).await
    }
    async fn categories_with_route(&self, route: &str) -> Result<Vec<Category>> {
        self.inner.categories_with_route(route).await
    }
    async fn categories_under(&self, uri: &str) -> Result<Vec<Category>> {
        self.inner.categories_under(uri).await
    }
    async fn categories_matching(&self, route: &str, prefix: &str, limit: usize) -> Result<Vec<Category>> {
        self.inner.categories_matching(route, prefix, limit).await
    }
    async fn categories_with_route_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<Category>> {
        self.inner.categories_with_route_prefix(prefix, limit).await
    }
    async fn relocate_category(&self, id: CategoryId, change: CategoryChange) -> Result<Relocated> {
        self.inner.relocate_category(id, change).await
    }
    async fn remove_category(&self, id: CategoryId) -> Result<bool> {
        let left = self.removals_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(CatalogError::Internal("disk unplugged".into()));
        }
        self.removals_left.store(left.saturating_sub(1), Ordering::SeqCst);
        self.inner.remove_category(id).await
    }

    async fn insert_exercise(&self, exercise: Exercise) -> Result<Exercise> {
        self.inner.insert_exercise(exercise).await
    }
    async fn exercise_by_key(&self, category: CategoryId, uri_name: &str) -> Result<Option<Exercise>> {
        self.inner.exercise_by_key(category, uri_name).await
    }
    async fn exercises_in(&self, category: CategoryId) -> Result<Vec<Exercise>> {
        self.inner.exercises_in(category).await
    }
    async fn update_exercise(&self, id: ExerciseId, change: ExerciseChange) -> Result<Exercise> {
        self.inner.update_exercise(id, change).await
    }
    async fn remove_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>> {
        self.inner.remove_exercise(id).await
    }

    async fn insert_question(&self, question: Question) -> Result<QuestionId> {
        let left = self.question_inserts_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(CatalogError::Internal("disk full".into()));
        }
        self.question_inserts_left.store(left.saturating_sub(1), Ordering::SeqCst);
        self.inner.insert_question(question).await
    }
    async fn questions_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>> {
        self.inner.questions_by_ids(ids).await
    }
    async fn remove_question(&self, id: QuestionId) -> Result<bool> {
        if self.question_removals_fail.load(Ordering::SeqCst) {
            return Err(CatalogError::Internal("read-only".into()));
        }
        self.inner.remove_question(id).await
    }

    async fn insert_attempt(&self, attempt: Attempt) -> Result<Attempt> {
        self.inner.insert_attempt(attempt).await
    }
    async fn latest_attempt(&self, exercise: ExerciseId, by: &str) -> Result<Option<Attempt>> {
        self.inner.latest_attempt(exercise, by).await
    }
    async fn remove_attempts_for(&self, exercise: ExerciseId) -> Result<usize> {
        self.inner.remove_attempts_for(exercise).await
    }

    async fn inventory(&self) -> Result<Inventory> {
        self.inner.inventory().await
    }
}

/// Helper to build `Pointers > Exo 1 > Deep` plus an unrelated `Pointers2`
async fn setup() -> (Arc<FlakyStorage>, Catalog) {
    let storage = Arc::new(FlakyStorage::new());
    let catalog = Catalog::new(storage.clone());
    for (route, name) in [("", "Pointers"), ("Pointers", "Exo 1"), ("Pointers_Exo+1", "Deep"), ("", "Pointers2")] {
        catalog.create_category(route, name, None).await.expect("seed category");
    }
    (storage, catalog)
}

#[tokio::test]
async fn test_interrupted_cascade_reports_what_is_left() {
    let (storage, catalog) = setup().await;
    let plan = catalog.plan_deletion("Pointers").await.unwrap();
    let ids = plan.ids();

    storage.fail_after(1);
    let err = catalog.delete_category("Pointers").await.unwrap_err();
    assert!(err.is_partial());
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    match err {
        CatalogError::CascadeInterrupted { deleted, remaining, cause } => {
            // Deepest node went first; its parent and the root are still there.
            assert_eq!(deleted, vec![ids[0]]);
            assert_eq!(remaining, vec![ids[1], ids[2]]);
            assert!(matches!(*cause, CatalogError::Internal(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Survivors are still a consistent tree: no child outlived its parent.
    assert!(catalog.find_category("Pointers").await.is_ok());
    assert!(catalog.find_category("Pointers_Exo+1").await.is_ok());
    assert!(catalog.find_category("Pointers_Exo+1_Deep").await.is_err());
}

#[tokio::test]
async fn test_rerun_finishes_the_job() {
    let (storage, catalog) = setup().await;
    storage.fail_after(2);
    assert!(catalog.delete_category("Pointers").await.is_err());

    storage.heal();
    let report = catalog.delete_category("Pointers").await.unwrap();
    assert_eq!(report.categories, 1);
    assert!(catalog.find_category("Pointers").await.is_err());
    assert!(catalog.find_category("Pointers2").await.is_ok());
    assert_eq!(catalog.storage().inventory().await.unwrap().categories, 1);
}

#[tokio::test]
async fn test_preflight_failures_are_not_partial() {
    let (storage, catalog) = setup().await;
    storage.fail_after(0);
    let err = catalog.delete_category("Nope").await.unwrap_err();
    assert!(!err.is_partial());
    assert!(matches!(err, CatalogError::NotFound { .. }));
    let err = catalog.delete_category("").await.unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden { .. }));
}

fn draft_with(titles: &[&str]) -> ExerciseDraft {
    let questions = titles
        .iter()
        .map(|title| QuestionDraft {
            title: title.to_string(),
            statement: "There are 10 kinds of people.".into(),
            explanation: "binary".into(),
            language: Language::Cpp,
            language_snippet: String::new(),
            choices: Choices {
                format: ChoiceFormat::Radio,
                list: vec![Choice { name: "a".into(), label: "A".into(), answer: true }],
            },
        })
        .collect();
    ExerciseDraft { name: "e".into(), description: "d".into(), questions }
}

#[tokio::test]
async fn test_failed_question_insert_leaves_no_orphans() {
    let (storage, catalog) = setup().await;
    storage.fail_questions_after(2);
    let err = catalog.create_exercise("Pointers", draft_with(&["q1", "q2", "q3"]), "alice").await.unwrap_err();
    assert_eq!(err.to_string(), "storage failure: disk full");

    let inv = catalog.storage().inventory().await.unwrap();
    assert_eq!((inv.exercises, inv.questions), (0, 0));
}

#[tokio::test]
async fn test_cleanup_failure_keeps_the_original_error() {
    let (storage, catalog) = setup().await;
    storage.fail_questions_after(1);
    storage.question_removals_fail.store(true, Ordering::SeqCst);
    let err = catalog.create_exercise("Pointers", draft_with(&["q1", "q2"]), "alice").await.unwrap_err();
    // The insert failure is reported, not the failed cleanup.
    assert!(matches!(err, CatalogError::Internal(ref m) if m == "disk full"));
    assert_eq!(catalog.storage().inventory().await.unwrap().exercises, 0);
}
