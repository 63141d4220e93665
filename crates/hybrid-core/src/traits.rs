//! Core traits defining the interfaces between components.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Hit, SearchRequest};

/// Retrieval backend.
///
/// Executes one structured request against `request.index` and returns at
/// most `request.size` hits, ordered by the backend's own relevance score
/// (descending), with backend ids and scores preserved.
#[async_trait]
pub trait RetrievalGateway: Send + Sync {
    async fn execute(&self, request: &SearchRequest) -> Result<Vec<Hit>>;

    /// Short backend name for logs.
    fn name(&self) -> &str {
        "retrieval"
    }
}
