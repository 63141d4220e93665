//! Elasticsearch `_search` gateway.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use hybrid_core::{
    is_valid_index_name, ElasticsearchConfig, Hit, Result, RetrievalGateway, SearchError,
    SearchRequest,
};
use reqwest::Url;

use crate::cloud::resolve_endpoint;

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Clone)]
enum Auth {
    None,
    Basic {
        username: String,
        password: Option<String>,
    },
    ApiKey(String),
}

/// Retrieval gateway backed by an Elasticsearch-compatible HTTP API.
pub struct ElasticsearchGateway {
    client: reqwest::Client,
    endpoint: Url,
    auth: Auth,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl From<RawHit> for Hit {
    fn from(raw: RawHit) -> Self {
        Hit {
            id: raw.id,
            score: raw.score,
            fields: raw.fields,
            explanation: None,
        }
    }
}

impl ElasticsearchGateway {
    /// Create a gateway from connection settings.
    ///
    /// An API key takes precedence over basic auth.
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let endpoint = resolve_endpoint(config)?;
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            SearchError::config(format!("invalid elasticsearch url '{}': {}", endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(SearchError::config(format!(
                "elasticsearch url '{}' cannot carry a path",
                endpoint
            )));
        }

        let auth = match (&config.api_key, &config.username) {
            (Some(key), _) => Auth::ApiKey(key.clone()),
            (None, Some(username)) => Auth::Basic {
                username: username.clone(),
                password: config.password.clone(),
            },
            (None, None) => Auth::None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::config(format!("failed to build HTTP client: {}", e)))?;

        debug!("Elasticsearch gateway targeting {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            auth,
        })
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// `{endpoint}/{index}/_search`, with the index encoded as one path segment.
    fn search_url(&self, index: &str) -> Result<Url> {
        if !is_valid_index_name(index) {
            return Err(SearchError::retrieval(format!("invalid index name '{}'", index)));
        }
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::retrieval(format!("cannot build a search url for '{}'", index)))?
            .pop_if_empty()
            .push(index)
            .push("_search");
        Ok(url)
    }
}

#[async_trait]
impl RetrievalGateway for ElasticsearchGateway {
    async fn execute(&self, request: &SearchRequest) -> Result<Vec<Hit>> {
        let url = self.search_url(&request.index)?;
        let body = request.body();

        trace!(url = %url, body = %body, "Elasticsearch search");

        let builder = self.client.post(url.clone()).json(&body);
        let builder = match &self.auth {
            Auth::None => builder,
            Auth::Basic { username, password } => builder.basic_auth(username, password.as_ref()),
            Auth::ApiKey(key) => builder.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", key)),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| SearchError::retrieval(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(SearchError::retrieval(format!(
                "search on '{}' returned {}: {}",
                request.index, status, snippet
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::retrieval(format!("malformed search response: {}", e)))?;

        let mut hits: Vec<Hit> = parsed.hits.hits.into_iter().map(Hit::from).collect();
        hits.truncate(request.size);

        debug!(
            "Elasticsearch returned {} hits from '{}'",
            hits.len(),
            request.index
        );

        Ok(hits)
    }

    fn name(&self) -> &str {
        "elasticsearch"
    }
}
