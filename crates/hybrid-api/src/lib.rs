//! hybrid-api - HTTP API for hybrid search
//!
//! This crate exposes the search orchestrator over HTTP.
//!
//! # Endpoints
//!
//! - `GET /api/search/{index}` - Search (`q`, `type=bm25|elser`, `rrf`, `k`, `dataset`)
//! - `GET /api/datasets` - List the registered datasets
//!
//! Every other path answers `404` with a JSON error body.

mod error;
mod server;

pub use error::ApiError;
pub use server::{router, ApiServer, SearchQuery, SearchResponse};
