//! Saved queries: a Postgres-backed memo of API calls that succeeded, keyed by (path, method).
//!
//! Consult [`SavedQueryStore::lookup_and_touch`] before proxying a call and record the call with
//! [`SavedQueryStore::save`] after it succeeds.

pub mod config;
pub mod error;
pub mod migrate;
pub mod store;

pub use config::SavedQueriesConfig;
pub use error::{Result, SavedQueryError};
pub use store::{SavedQuery, SavedQueryStore, canonical_key};
