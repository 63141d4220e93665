//! Search orchestrator for hybrid search.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use hybrid_core::{
    DatasetConfig, DatasetRegistry, Hit, Result, RetrievalGateway, SearchConfig, SearchParams,
    SearchRequest, SearchResults, Strategy,
};

use crate::builder::{lexical_request, semantic_request, validate_index, validate_query};
use crate::fusion::reciprocal_rank_fusion;
use crate::projector::project_hits;

/// Hybrid search orchestrator.
///
/// Runs a lexical or semantic search against the retrieval gateway and,
/// when fusion is requested on a semantic search, fuses the semantic hits
/// with a wider lexical candidate list using Reciprocal Rank Fusion (RRF).
pub struct SearchOrchestrator<G> {
    /// Retrieval backend.
    gateway: Arc<G>,

    /// Read-only dataset registry.
    registry: Arc<DatasetRegistry>,

    /// Sizing and fusion settings.
    config: SearchConfig,
}

impl<G> SearchOrchestrator<G>
where
    G: RetrievalGateway,
{
    /// Create a new orchestrator.
    pub fn new(gateway: Arc<G>, registry: Arc<DatasetRegistry>, config: SearchConfig) -> Self {
        Self {
            gateway,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Registered datasets, keyed by id.
    pub fn datasets(&self) -> &BTreeMap<String, DatasetConfig> {
        self.registry.datasets()
    }

    /// Perform a search.
    ///
    /// The query and dataset are validated before any retrieval call is
    /// made. Any retrieval failure fails the whole search.
    pub async fn search(&self, params: SearchParams) -> Result<SearchResults> {
        let start = Instant::now();

        let query = validate_query(&params.query)?;
        let dataset = self.registry.get(params.dataset.as_deref())?;
        let index = validate_index(params.index.as_deref().unwrap_or(&dataset.index))?;
        let fused = params.strategy.is_semantic() && params.rrf;

        info!(
            "Searching {:?} on dataset '{}' (index '{}', {}{})",
            query,
            dataset.id,
            index,
            params.strategy,
            if fused { " + rrf" } else { "" }
        );

        let hits = match params.strategy {
            Strategy::Bm25 => {
                let request = lexical_request(query, dataset, index, self.config.default_size)?;
                self.retrieve(&request).await?
            }
            Strategy::Elser if fused => self.fused_search(query, dataset, index, params.k).await?,
            Strategy::Elser => {
                let request = semantic_request(query, dataset, index, self.config.default_size)?;
                self.retrieve(&request).await?
            }
        };

        let results = project_hits(hits, &dataset.mapping_fields)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            "Search completed in {}ms, returned {} results",
            latency_ms,
            results.len()
        );

        Ok(SearchResults {
            query: query.to_string(),
            dataset: dataset.id.clone(),
            index: index.to_string(),
            strategy: params.strategy,
            fused,
            total_results: results.len(),
            latency_ms,
            results,
        })
    }

    /// Semantic search fused with a wider lexical candidate list.
    async fn fused_search(
        &self,
        query: &str,
        dataset: &DatasetConfig,
        index: &str,
        k: u32,
    ) -> Result<Vec<Hit>> {
        let semantic = semantic_request(query, dataset, index, self.config.default_size)?;
        let lexical = lexical_request(query, dataset, index, self.config.fusion_candidates)?;

        // Both retrievals run concurrently; the first error wins.
        let (primary, secondary) =
            tokio::try_join!(self.retrieve(&semantic), self.retrieve(&lexical))?;

        let fused = reciprocal_rank_fusion(
            primary,
            &secondary,
            k,
            self.config.fusion_output_size,
        );

        debug!("Fused to {} results with k={}", fused.len(), k);

        Ok(fused)
    }

    /// Execute one request, enforcing the size cap.
    async fn retrieve(&self, request: &SearchRequest) -> Result<Vec<Hit>> {
        let mut hits = self.gateway.execute(request).await.map_err(|e| {
            warn!(
                "{} {} search on '{}' failed: {}",
                self.gateway.name(),
                request.strategy,
                request.index,
                e
            );
            e
        })?;

        hits.truncate(request.size);

        debug!(
            "{} search returned {} hits (size {})",
            request.strategy,
            hits.len(),
            request.size
        );

        Ok(hits)
    }
}
