//! Integration tests for the practice API
//!
//! Drives the full router (auth, validation, stores, lifecycle engines) with
//! in-process requests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use practice_catalog::{auth::UserDirectory, build_router, AppState, Catalog};
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN: &str = "alice-token";

/// Helper to build a router over an empty catalog with one user
fn setup() -> (Catalog, Router) {
    let catalog = Catalog::in_memory();
    let users = UserDirectory::new(vec![("alice".to_string(), TOKEN.to_string())]);
    let state = Arc::new(AppState::with_parts(catalog.clone(), users));
    (catalog, build_router(state))
}

/// Helper to send one request and decode the JSON answer (Null when empty)
async fn call(app: &Router, method: Method, path: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(format!("/api/practice{path}"));
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, value)
}

async fn create_category(app: &Router, ui_route: &str, name: &str) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        "/category",
        Some(json!({ "name": name, "uiRoute": ui_route, "description": format!("about {name}") })),
        Some(TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create {name}: {body}");
    body
}

fn question(title: &str) -> Value {
    json!({
        "title": title,
        "statement": "There are 10 kinds of people.",
        "explanation": "binary",
        "language": "cpp",
        "languageSnippet": "int x = 0b10;",
        "choices": { "format": "radio", "list": [
            { "name": "a", "label": "two", "answer": true },
            { "name": "b", "label": "ten", "answer": false }
        ]}
    })
}

async fn create_exercise(app: &Router, category_uri: &str, name: &str, questions: Vec<Value>) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        &format!("/category/{category_uri}/ex"),
        Some(json!({ "name": name, "description": "desc", "questions": questions })),
        Some(TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create exercise {name}: {body}");
    body
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (_, app) = setup();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_worked_example_identifiers() {
    let (_, app) = setup();
    let pointers = create_category(&app, "", "Pointers").await;
    assert_eq!(pointers, json!({ "name": "Pointers", "uri": "Pointers", "route": "" }));

    let exo = create_category(&app, "/Pointers/", "Exo 1").await;
    assert_eq!(exo["uri"], "Pointers_Exo+1");
    assert_eq!(exo["route"], "Pointers");

    let ex = create_exercise(&app, "Pointers_Exo+1", "Test A", vec![question("q1")]).await;
    assert_eq!(ex["uri"], "Pointers_Exo+1/Test+A");
    assert_eq!(ex["categoryURI"], "Pointers_Exo+1");
    assert_eq!(ex["kind"], 1);
    assert_eq!(ex["questionsIDs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_category_is_rejected() {
    let (_, app) = setup();
    create_category(&app, "", "Memory").await;
    let (status, body) = call(&app, Method::POST, "/category", Some(json!({ "name": "Memory" })), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "category exists already");
}

#[tokio::test]
async fn test_validation_errors_are_keyed_by_field() {
    let (_, app) = setup();
    let (status, body) = call(&app, Method::POST, "/category", Some(json!({ "name": "" })), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid fields");
    assert_eq!(body["errors"]["name"]["msg"], "name too short");
    assert_eq!(body["errors"]["name"]["location"], "body");
}

#[tokio::test]
async fn test_mistyped_fields_are_validation_errors() {
    let (catalog, app) = setup();
    create_category(&app, "", "A").await;
    create_exercise(&app, "A", "e", vec![]).await;

    let (status, body) = call(&app, Method::POST, "/category", Some(json!({ "name": 5 })), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["errors"]["name"]["location"], "body");

    let exercise = json!({ "name": "f", "description": "d", "questions": "x" });
    let (status, body) = call(&app, Method::POST, "/category/A/ex", Some(exercise), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["questions"]["msg"].as_str().unwrap().contains("expected a sequence"));

    let mut q = question("typed");
    q["choices"]["list"][0]["answer"] = json!("yes");
    let (status, body) = call(&app, Method::POST, "/category/A/ex/e/q", Some(q), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid fields");
    assert!(body["errors"]["choices"]["msg"].as_str().unwrap().contains("expected a boolean"));

    let inv = catalog.storage().inventory().await.unwrap();
    assert_eq!((inv.categories, inv.exercises, inv.questions), (1, 1, 0));
}

#[tokio::test]
async fn test_category_page_and_index() {
    let (_, app) = setup();
    create_category(&app, "", "Pointers").await;
    create_category(&app, "Pointers", "Exo 1").await;
    create_exercise(&app, "Pointers", "Basics", vec![]).await;

    let (status, page) = call(&app, Method::GET, "/category/Pointers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["kind"], 0);
    assert_eq!(page["uriName"], "Pointers");
    let titles: Vec<_> = page["sections"].as_array().unwrap().iter().map(|s| s["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Subcategories"), json!("Exercises")]);
    assert_eq!(page["sections"][0]["listing"][0]["uri"], "Pointers_Exo+1");
    assert_eq!(page["sections"][1]["listing"][0]["uri"], "Pointers/Basics");
    // Categories always list as solved; exercises carry the caller's progress.
    assert_eq!(page["solved"], true);
    assert_eq!(page["sections"][0]["listing"][0]["solved"], true);
    assert_eq!(page["sections"][1]["listing"][0]["solved"], false);
    let (_, mine) = call(&app, Method::GET, "/category/Pointers", None, Some(TOKEN)).await;
    assert_eq!(mine["solved"], true);

    // A leaf category has no sections at all.
    let (_, leaf) = call(&app, Method::GET, "/category/Pointers_Exo+1", None, None).await;
    assert_eq!(leaf["sections"], json!([]));

    for path in ["/category", "/category/"] {
        let (status, index) = call(&app, Method::GET, path, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(index["name"], "Categories Index");
        assert_eq!(index["sections"][0]["listing"].as_array().unwrap().len(), 1);
    }

    let (_, subs) = call(&app, Method::GET, "/category/Pointers/subcategories", None, None).await;
    assert_eq!(subs[0]["uri"], "Pointers_Exo+1");
    let (_, exos) = call(&app, Method::GET, "/category/Pointers/exercises", None, None).await;
    assert_eq!(exos[0]["name"], "Basics");

    let (status, body) = call(&app, Method::GET, "/category/Nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"], "category not found");
}

#[tokio::test]
async fn test_find_categories() {
    let (_, app) = setup();
    for (route, name) in [("", "Memory"), ("", "Memoization"), ("", "Oop"), ("Memory", "Stack")] {
        create_category(&app, route, name).await;
    }
    let (status, hits) = call(&app, Method::POST, "/category/@find", Some(json!({ "uiURI": "Memo" })), None).await;
    assert_eq!(status, StatusCode::OK);
    let uris: Vec<_> = hits.as_array().unwrap().iter().map(|h| h["uri"].as_str().unwrap().to_string()).collect();
    assert_eq!(uris, vec!["Memoization", "Memory", "Memory_Stack"]);
}

#[tokio::test]
async fn test_rename_reroutes_descendants() {
    let (_, app) = setup();
    create_category(&app, "", "Pointers").await;
    create_category(&app, "Pointers", "Exo 1").await;
    create_exercise(&app, "Pointers_Exo+1", "Test A", vec![]).await;

    let (status, body) = call(&app, Method::PUT, "/category/Pointers", Some(json!({ "name": "Refs" })), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["uri"], "Refs");
    assert_eq!(body["rerouted"], 1);

    let (status, _) = call(&app, Method::GET, "/category/Refs_Exo+1/ex/Test+A", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, "/category/Pointers_Exo+1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_onto_occupied_target_changes_nothing() {
    let (_, app) = setup();
    create_category(&app, "", "A").await;
    create_category(&app, "", "B").await;
    let (status, body) = call(&app, Method::PUT, "/category/A", Some(json!({ "name": "B" })), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "cannot override category");
    let (status, _) = call(&app, Method::GET, "/category/A", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_is_segment_aware() {
    let (catalog, app) = setup();
    create_category(&app, "", "Pointers").await;
    create_category(&app, "Pointers", "Exo 1").await;
    create_category(&app, "", "Pointers2").await;
    create_exercise(&app, "Pointers_Exo+1", "Test A", vec![question("q1"), question("q2")]).await;
    create_exercise(&app, "Pointers2", "Keep", vec![question("q3")]).await;

    let (status, report) = call(&app, Method::DELETE, "/category/Pointers", None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["categories"], 2);
    assert_eq!(report["exercises"], 1);
    assert_eq!(report["questions"], 2);

    let (status, _) = call(&app, Method::GET, "/category/Pointers2/ex/Keep", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let inv = catalog.storage().inventory().await.unwrap();
    assert_eq!((inv.categories, inv.exercises, inv.questions), (1, 1, 1));

    let (status, body) = call(&app, Method::DELETE, "/category/Pointers", None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"], "category not found");
}

#[tokio::test]
async fn test_root_cannot_be_deleted() {
    let (_, app) = setup();
    let (status, body) = call(&app, Method::DELETE, "/category/", None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"], "cannot delete root");
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_mutations_need_a_known_token() {
    let (catalog, app) = setup();
    create_category(&app, "", "A").await;

    let attempts = [
        (Method::POST, "/category".to_string(), Some(json!({ "name": "B" }))),
        (Method::PUT, "/category/A".to_string(), Some(json!({ "name": "C" }))),
        (Method::DELETE, "/category/A".to_string(), None),
        // Unknown targets still answer 401, not 404.
        (Method::DELETE, "/category/Nope".to_string(), None),
        (Method::DELETE, "/category/".to_string(), None),
        (Method::POST, "/category/A/ex".to_string(), Some(json!({ "name": "e", "description": "d", "questions": [] }))),
    ];
    for (method, path, body) in attempts {
        for token in [None, Some("wrong")] {
            let (status, res) = call(&app, method.clone(), &path, body.clone(), token).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {path} with {token:?}");
            assert_eq!(res["errors"], "authentication required");
        }
    }
    let inv = catalog.storage().inventory().await.unwrap();
    assert_eq!((inv.categories, inv.exercises), (1, 0));
    assert!(catalog.find_category("A").await.is_ok());
}

// =============================================================================
// Exercises and questions
// =============================================================================

#[tokio::test]
async fn test_exercise_detail_full_and_attempts() {
    let (catalog, app) = setup();
    create_category(&app, "", "A").await;
    create_exercise(&app, "A", "e", vec![question("first"), question("second")]).await;

    let (_, light) = call(&app, Method::GET, "/category/A/ex/e", None, None).await;
    assert!(light["questionsIDs"][0].is_string());
    assert_eq!(light["solved"], false);
    assert!(light.get("answer").is_none());

    let (_, full) = call(&app, Method::GET, "/category/A/ex/e?full", None, None).await;
    assert_eq!(full["questionsIDs"][0]["title"], "first");
    assert_eq!(full["questionsIDs"][1]["title"], "second");

    catalog.record_attempt("A/e", "alice", vec![], true).await.unwrap();
    let (_, mine) = call(&app, Method::GET, "/category/A/ex/e", None, Some(TOKEN)).await;
    assert_eq!(mine["solved"], true);
    assert!(mine["answer"]["submissionDate"].is_string());
}

#[tokio::test]
async fn test_exercise_move_and_conflicts() {
    let (_, app) = setup();
    create_category(&app, "", "A").await;
    create_category(&app, "", "B").await;
    create_exercise(&app, "A", "one", vec![]).await;
    create_exercise(&app, "B", "two", vec![]).await;

    let (status, body) = call(&app, Method::PUT, "/category/A/ex/one", Some(json!({ "categoryURI": "Gone" })), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"], "destination category not found");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/category/A/ex/one",
        Some(json!({ "categoryURI": "B", "name": "two" })),
        Some(TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "cannot override exercise");

    let (status, body) = call(&app, Method::PUT, "/category/A/ex/one", Some(json!({ "categoryURI": "B" })), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["categoryURI"], "B");
    assert_eq!(body["uri"], "B/one");
    assert_eq!(body["lastModifiedBy"], "alice");

    let (status, _) = call(&app, Method::GET, "/category/B/ex/one", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::GET, "/category/A/ex/one", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"], "exercise not found");
}

#[tokio::test]
async fn test_question_membership() {
    let (catalog, app) = setup();
    create_category(&app, "", "A").await;
    create_exercise(&app, "A", "e", vec![question("first")]).await;

    let (status, added) = call(&app, Method::POST, "/category/A/ex/e/q", Some(question("second")), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    let qid = added["qid"].as_str().unwrap().to_string();

    let (_, questions) = call(&app, Method::GET, "/category/A/ex/e/questions", None, None).await;
    let titles: Vec<_> = questions.as_array().unwrap().iter().map(|q| q["title"].clone()).collect();
    assert_eq!(titles, vec![json!("first"), json!("second")]);

    let stranger = uuid::Uuid::new_v4();
    let (status, body) = call(&app, Method::DELETE, &format!("/category/A/ex/e/q/{stranger}"), None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"], "question not found");

    let (status, _) = call(&app, Method::DELETE, &format!("/category/A/ex/e/q/{qid}"), None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.storage().inventory().await.unwrap().questions, 1);
}

#[tokio::test]
async fn test_radio_question_needs_one_answer() {
    let (_, app) = setup();
    create_category(&app, "", "A").await;
    create_exercise(&app, "A", "e", vec![]).await;
    let mut q = question("bad");
    q["choices"]["list"][1]["answer"] = json!(true);
    let (status, body) = call(&app, Method::POST, "/category/A/ex/e/q", Some(q), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["choices"]["msg"], "radio choices need exactly one answer");
}

#[tokio::test]
async fn test_exercise_delete_takes_questions_and_attempts() {
    let (catalog, app) = setup();
    create_category(&app, "", "A").await;
    create_exercise(&app, "A", "e", vec![question("q")]).await;
    catalog.record_attempt("A/e", "alice", vec![], false).await.unwrap();

    let (status, removal) = call(&app, Method::DELETE, "/category/A/ex/e", None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removal, json!({ "exercises": 1, "questions": 1, "attempts": 1 }));
    let inv = catalog.storage().inventory().await.unwrap();
    assert_eq!((inv.exercises, inv.questions, inv.attempts), (0, 0, 0));
}
