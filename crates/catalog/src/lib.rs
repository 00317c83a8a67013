//! Read-side access to an imported REST API catalog.
//!
//! Two entry points sit on top of one [`CatalogStore`]:
//! - [`Resolver`] maps a concrete request path (`/service/tickets/123`) and method onto the
//!   documented endpoint (`/service/tickets/{id}`), hydrated with parameters and bodies.
//! - [`SearchEngine`] answers free-text queries through a cascade of search tiers, from
//!   Postgres full-text ranking down to plain substring scans.

pub mod config;
pub mod error;
pub mod literals;
pub mod migrate;
pub mod model;
pub mod paths;
pub mod render;
pub mod resolver;
pub mod search;
pub mod store;

pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use literals::LiteralSegmentCache;
pub use model::{
    EndpointDetail, EndpointHit, EndpointRow, Parameter, Payload, RequestBody, ResponseBody,
};
pub use render::render_endpoint;
pub use resolver::Resolver;
pub use search::{SearchEngine, SearchRequest, SearchTier, TierCascade, Trigger};
pub use store::CatalogStore;
