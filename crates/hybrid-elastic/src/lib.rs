//! hybrid-elastic - Elasticsearch retrieval gateway
//!
//! This crate executes structured search requests against an
//! Elasticsearch-compatible `_search` endpoint over HTTP and returns the
//! scored hits, for use by the hybrid search orchestrator.

mod cloud;
mod gateway;

pub use cloud::{decode_cloud_id, resolve_endpoint};
pub use gateway::ElasticsearchGateway;
