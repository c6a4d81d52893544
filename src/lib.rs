//! Practice catalog: a tree of categories holding exercises and their
//! questions, addressed by flat string identifiers.
//!
//! The library holds the addressing and lifecycle engine (`uri`, `store`,
//! `cascade`, `relocate`) and the HTTP API built on it (`routes`). The binary in
//! `main.rs` only wires telemetry, state and the listener.

pub mod auth;
pub mod cascade;
pub mod config;
pub mod domain;
pub mod error;
pub mod logic;
pub mod protocol;
pub mod relocate;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod uri;
pub mod util;
pub mod validate;

pub use error::{CatalogError, Result};
pub use routes::build_router;
pub use state::AppState;
pub use store::Catalog;
