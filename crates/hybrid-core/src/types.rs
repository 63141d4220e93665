//! Core domain types for hybrid search.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

use crate::error::SearchError;

/// Retrieval strategy, named the way the HTTP API spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lexical full-text matching (BM25).
    #[default]
    Bm25,
    /// Semantic text-expansion matching (ELSER).
    Elser,
}

impl Strategy {
    /// Wire name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bm25 => "bm25",
            Self::Elser => "elser",
        }
    }

    /// Check if this is the semantic strategy.
    pub fn is_semantic(&self) -> bool {
        matches!(self, Self::Elser)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bm25" => Ok(Self::Bm25),
            "elser" => Ok(Self::Elser),
            other => Err(SearchError::invalid_query(format!(
                "unknown search type '{}', expected 'bm25' or 'elser'",
                other
            ))),
        }
    }
}

/// A semantic search field with its relative boost.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoost {
    /// Backend field name.
    pub field: String,

    /// Relative boost weight (1.0 when not given).
    pub boost: f64,
}

impl FieldBoost {
    /// Parse a `field` or `field^boost` descriptor.
    pub fn parse(descriptor: &str) -> crate::error::Result<Self> {
        let (field, boost) = match descriptor.split_once('^') {
            Some((_, raw)) if raw.contains('^') => {
                return Err(SearchError::config(format!(
                    "more than one '^' in field '{}'",
                    descriptor
                )));
            }
            Some((field, raw)) => {
                let boost: f64 = raw.trim().parse().map_err(|_| {
                    SearchError::config(format!("invalid boost '{}' in field '{}'", raw, descriptor))
                })?;
                (field.trim(), boost)
            }
            None => (descriptor.trim(), 1.0),
        };

        if field.is_empty() {
            return Err(SearchError::config(format!(
                "empty field name in '{}'",
                descriptor
            )));
        }
        if !boost.is_finite() || boost < 0.0 {
            return Err(SearchError::config(format!(
                "boost must be a non-negative number in '{}'",
                descriptor
            )));
        }

        Ok(Self {
            field: field.to_string(),
            boost,
        })
    }
}

/// One text-expansion clause against a single expanded field.
#[derive(Debug, Clone, PartialEq)]
pub struct TextExpansionClause {
    /// Field holding the precomputed expansion.
    pub field: String,

    /// Expansion model used to expand the query text.
    pub model_id: String,

    /// Free-text query to expand.
    pub model_text: String,

    /// Relative boost weight.
    pub boost: f64,
}

/// Structured query expression understood by the retrieval backend.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredQuery {
    /// Match the query text across several lexical fields.
    MultiMatch { query: String, fields: Vec<String> },

    /// Any-of combination of text-expansion clauses.
    TextExpansion { clauses: Vec<TextExpansionClause> },
}

impl StructuredQuery {
    /// Render the query in the backend's JSON query DSL.
    pub fn to_json(&self) -> Value {
        match self {
            Self::MultiMatch { query, fields } => json!({
                "multi_match": {
                    "query": query,
                    "fields": fields,
                }
            }),
            Self::TextExpansion { clauses } => {
                let should: Vec<Value> = clauses
                    .iter()
                    .map(|clause| {
                        let mut inner = Map::new();
                        inner.insert(
                            clause.field.clone(),
                            json!({
                                "model_text": clause.model_text,
                                "model_id": clause.model_id,
                                "boost": clause.boost,
                            }),
                        );
                        json!({ "text_expansion": inner })
                    })
                    .collect();
                json!({ "bool": { "should": should } })
            }
        }
    }
}

/// A structured retrieval request, built per call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Strategy that produced this request.
    pub strategy: Strategy,

    /// Target index.
    pub index: String,

    /// Maximum number of hits to return.
    pub size: usize,

    /// Stored fields to return with each hit.
    pub fields: Vec<String>,

    /// Query expression.
    pub query: StructuredQuery,
}

impl SearchRequest {
    /// Render the full request body. Only the requested fields come back,
    /// never the stored document.
    pub fn body(&self) -> Value {
        json!({
            "_source": false,
            "fields": self.fields,
            "size": self.size,
            "query": self.query.to_json(),
        })
    }
}

/// Whether `index` can be used as a single index name in a backend path.
///
/// Names that are blank, are `.` or `..`, or contain a path, query or
/// fragment separator are rejected.
pub fn is_valid_index_name(index: &str) -> bool {
    let index = index.trim();
    !index.is_empty()
        && index != "."
        && index != ".."
        && !index.contains(['/', '\\', '?', '#'])
}

/// One retrieved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Backend-assigned identifier.
    pub id: String,

    /// Relevance score (backend score, or fusion score after reranking).
    pub score: Option<f64>,

    /// Returned field name to value(s).
    #[serde(default)]
    pub fields: Map<String, Value>,

    /// Human-readable score breakdown, set by fusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Hit {
    /// Create a hit with no fields.
    pub fn new(id: impl Into<String>, score: Option<f64>) -> Self {
        Self {
            id: id.into(),
            score,
            fields: Map::new(),
            explanation: None,
        }
    }

    /// Add a returned field.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// A hit reshaped onto the dataset's logical output keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedHit {
    /// Backend-assigned identifier.
    pub id: String,

    /// Relevance or fusion score.
    pub score: Option<f64>,

    /// Score breakdown when the hit went through fusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Logical key (e.g. `text`, `title`) to value.
    pub fields: Map<String, Value>,
}

/// Parameters of one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text query.
    pub query: String,

    /// Dataset identifier (registry default when absent).
    #[serde(default)]
    pub dataset: Option<String>,

    /// Primary retrieval strategy.
    #[serde(default)]
    pub strategy: Strategy,

    /// Fuse semantic hits with lexical hits (semantic strategy only).
    #[serde(default)]
    pub rrf: bool,

    /// RRF rank constant.
    #[serde(default = "default_rrf_k")]
    pub k: u32,

    /// Index override (dataset index when absent).
    #[serde(default)]
    pub index: Option<String>,
}

fn default_rrf_k() -> u32 {
    crate::config::DEFAULT_RRF_K
}

impl SearchParams {
    /// Lexical search on the default dataset.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            dataset: None,
            strategy: Strategy::Bm25,
            rrf: false,
            k: default_rrf_k(),
            index: None,
        }
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable rank fusion with the given rank constant.
    pub fn with_fusion(mut self, k: u32) -> Self {
        self.rrf = true;
        self.k = k;
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// Search results container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The query as searched.
    pub query: String,

    /// Dataset that was searched.
    pub dataset: String,

    /// Index that was searched.
    pub index: String,

    /// Primary strategy.
    pub strategy: Strategy,

    /// Whether lexical hits were fused in.
    pub fused: bool,

    /// Total results returned.
    pub total_results: usize,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Individual results.
    pub results: Vec<ProjectedHit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("bm25".parse::<Strategy>().unwrap(), Strategy::Bm25);
        assert_eq!("ELSER".parse::<Strategy>().unwrap(), Strategy::Elser);
        assert!(matches!(
            "knn".parse::<Strategy>(),
            Err(SearchError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_field_boost_parse() {
        let plain = FieldBoost::parse("ml.overview_expanded").unwrap();
        assert_eq!(plain.field, "ml.overview_expanded");
        assert_eq!(plain.boost, 1.0);

        let boosted = FieldBoost::parse("ml.title_expanded^0.5").unwrap();
        assert_eq!(boosted.field, "ml.title_expanded");
        assert_eq!(boosted.boost, 0.5);

        assert!(FieldBoost::parse("title^abc").is_err());
        assert!(FieldBoost::parse("^2").is_err());
        assert!(FieldBoost::parse("title^-1").is_err());
        assert!(FieldBoost::parse("ml.title^x^2").is_err());
    }

    #[test]
    fn test_index_names() {
        assert!(is_valid_index_name("search-movies-ml"));
        assert!(is_valid_index_name(".hidden-index"));

        for bad in ["", "  ", ".", "..", "victim/_doc/1", "idx?refresh", "idx#x", "a\\b"] {
            assert!(!is_valid_index_name(bad), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_multi_match_body() {
        let request = SearchRequest {
            strategy: Strategy::Bm25,
            index: "search-movies".to_string(),
            size: 10,
            fields: vec!["title".to_string(), "overview".to_string()],
            query: StructuredQuery::MultiMatch {
                query: "space opera".to_string(),
                fields: vec!["title".to_string(), "keywords".to_string()],
            },
        };

        let body = request.body();
        assert_eq!(body["_source"], json!(false));
        assert_eq!(body["size"], json!(10));
        assert_eq!(body["fields"], json!(["title", "overview"]));
        assert_eq!(body["query"]["multi_match"]["query"], json!("space opera"));
        assert_eq!(
            body["query"]["multi_match"]["fields"],
            json!(["title", "keywords"])
        );
    }

    #[test]
    fn test_text_expansion_json() {
        let query = StructuredQuery::TextExpansion {
            clauses: vec![
                TextExpansionClause {
                    field: "ml.overview".to_string(),
                    model_id: ".elser_model_1".to_string(),
                    model_text: "robots".to_string(),
                    boost: 1.0,
                },
                TextExpansionClause {
                    field: "ml.title".to_string(),
                    model_id: ".elser_model_1".to_string(),
                    model_text: "robots".to_string(),
                    boost: 0.5,
                },
            ],
        };

        let value = query.to_json();
        let should = value["bool"]["should"].as_array().unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(
            should[1]["text_expansion"]["ml.title"]["boost"],
            json!(0.5)
        );
        assert_eq!(
            should[0]["text_expansion"]["ml.overview"]["model_text"],
            json!("robots")
        );
    }

    #[test]
    fn test_search_params_builder() {
        let params = SearchParams::new("heist")
            .with_dataset("movies")
            .with_strategy(Strategy::Elser)
            .with_fusion(1);
        assert!(params.rrf);
        assert_eq!(params.k, 1);
        assert_eq!(params.dataset.as_deref(), Some("movies"));
        assert!(params.index.is_none());
    }

    #[test]
    fn test_projected_hit_skips_missing_explanation() {
        let hit = ProjectedHit {
            id: "1".to_string(),
            score: Some(2.5),
            explanation: None,
            fields: Map::new(),
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert!(value.get("explanation").is_none());
        assert_eq!(value["score"], json!(2.5));
    }
}
