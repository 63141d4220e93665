//! hybrid-query - Query construction, rank fusion and search orchestration
//!
//! This crate turns a free-text query into lexical (BM25) and semantic
//! (ELSER text expansion) retrieval requests, executes them through a
//! [`RetrievalGateway`](hybrid_core::RetrievalGateway), and optionally fuses
//! the two ranked lists using Reciprocal Rank Fusion (RRF).
//!
//! # Features
//!
//! - Lexical multi-field and boosted semantic query construction
//! - Reciprocal Rank Fusion keyed on backend hit ids
//! - Concurrent retrieval for fused searches
//! - Projection of backend fields onto per-dataset logical keys
//!
//! # Example
//!
//! ```rust,ignore
//! use hybrid_query::SearchOrchestrator;
//! use hybrid_core::{SearchParams, Strategy};
//! use std::sync::Arc;
//!
//! let engine = SearchOrchestrator::new(Arc::new(gateway), Arc::new(registry), config.search);
//! let params = SearchParams::new("space horror").with_strategy(Strategy::Elser).with_fusion(60);
//! let results = engine.search(params).await?;
//! ```

mod builder;
mod engine;
mod fusion;
mod projector;

pub use builder::{lexical_request, semantic_request, validate_index, validate_query};
pub use engine::SearchOrchestrator;
pub use fusion::{fuse, reciprocal_rank_fusion, FusedHit, FUSION_OUTPUT_SIZE};
pub use projector::{project_hit, project_hits};

// Re-export for convenience
pub use hybrid_core::{ProjectedHit, SearchParams, SearchResults, Strategy};
