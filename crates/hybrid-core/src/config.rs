//! Configuration types and the dataset registry.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::types::{is_valid_index_name, FieldBoost};

/// Default RRF rank constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// Default expansion model for semantic search.
pub const DEFAULT_ELSER_MODEL_ID: &str = ".elser_model_1";

/// Main configuration for the hybrid search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Search backend connection.
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Search sizing and fusion defaults.
    #[serde(default)]
    pub search: SearchConfig,

    /// Dataset used when a request names none.
    #[serde(default = "default_dataset_id")]
    pub default_dataset: String,

    /// Registered datasets.
    #[serde(default = "default_datasets")]
    pub datasets: Vec<DatasetConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            elasticsearch: ElasticsearchConfig::default(),
            search: SearchConfig::default(),
            default_dataset: default_dataset_id(),
            datasets: default_datasets(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP API.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Connection settings for an Elasticsearch-compatible backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL, e.g. `https://localhost:9200`. Takes precedence over `cloud_id`.
    #[serde(default)]
    pub url: Option<String>,

    /// Elastic Cloud deployment id.
    #[serde(default)]
    pub cloud_id: Option<String>,

    /// Basic auth user.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// API key, used instead of basic auth when set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: None,
            cloud_id: None,
            username: None,
            password: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl ElasticsearchConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("ELASTICSEARCH_URL") {
            self.url = Some(url);
        }
        if let Some(cloud_id) = get("CLOUD_ID") {
            self.cloud_id = Some(cloud_id);
        }
        if let Some(username) = get("ELASTICSEARCH_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = get("ELASTICSEARCH_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(api_key) = get("ELASTICSEARCH_API_KEY") {
            self.api_key = Some(api_key);
        }
    }
}

/// Search sizing and fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of hits for a single-strategy search.
    #[serde(default = "default_size")]
    pub default_size: usize,

    /// Number of lexical candidates fetched for fusion.
    #[serde(default = "default_fusion_candidates")]
    pub fusion_candidates: usize,

    /// Number of hits kept after fusion.
    #[serde(default = "default_fusion_output_size")]
    pub fusion_output_size: usize,

    /// RRF constant k used when a request gives none.
    #[serde(default = "default_rrf_k")]
    pub default_rrf_k: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_size: 10,
            fusion_candidates: 50,
            fusion_output_size: 10,
            default_rrf_k: DEFAULT_RRF_K,
        }
    }
}

/// A searchable dataset and how its fields map onto the output shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset identifier.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Backing index name.
    pub index: String,

    /// Lexical search fields.
    pub search_fields: Vec<String>,

    /// Semantic search fields, each optionally `name^boost`.
    #[serde(default)]
    pub elser_search_fields: Vec<String>,

    /// Fields returned with each hit.
    pub result_fields: Vec<String>,

    /// Logical output key to backend field name.
    pub mapping_fields: BTreeMap<String, String>,

    /// Expansion model for semantic search.
    #[serde(default = "default_elser_model_id")]
    pub elser_model_id: String,
}

impl DatasetConfig {
    /// Parsed semantic fields with their boosts.
    pub fn semantic_fields(&self) -> Result<Vec<FieldBoost>> {
        self.elser_search_fields
            .iter()
            .map(|descriptor| FieldBoost::parse(descriptor))
            .collect()
    }

    /// Check the dataset is internally consistent.
    ///
    /// Field names are a contract with the backend and are not checked
    /// against its schema.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(SearchError::config("dataset id must not be empty"));
        }
        if !is_valid_index_name(&self.index) {
            return Err(SearchError::config(format!(
                "dataset '{}' has an invalid index '{}'",
                self.id, self.index
            )));
        }
        if self.search_fields.is_empty() {
            return Err(SearchError::config(format!(
                "dataset '{}' has no search_fields",
                self.id
            )));
        }
        self.semantic_fields().map_err(|e| {
            SearchError::config(format!("dataset '{}': {}", self.id, e))
        })?;
        Ok(())
    }
}

/// Read-only lookup of datasets by identifier.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    default_id: String,
    datasets: BTreeMap<String, DatasetConfig>,
}

impl DatasetRegistry {
    /// Build a registry, validating every dataset and the default id.
    pub fn new(datasets: Vec<DatasetConfig>, default_id: impl Into<String>) -> Result<Self> {
        let default_id = default_id.into();
        let mut seen = HashSet::new();
        let mut map = BTreeMap::new();

        for dataset in datasets {
            dataset.validate()?;
            if !seen.insert(dataset.id.clone()) {
                return Err(SearchError::config(format!(
                    "duplicate dataset id '{}'",
                    dataset.id
                )));
            }
            map.insert(dataset.id.clone(), dataset);
        }

        if !map.contains_key(&default_id) {
            return Err(SearchError::config(format!(
                "default dataset '{}' is not configured",
                default_id
            )));
        }

        debug!("Registered {} dataset(s), default '{}'", map.len(), default_id);

        Ok(Self {
            default_id,
            datasets: map,
        })
    }

    /// Look up a dataset, falling back to the default when `id` is `None`.
    pub fn get(&self, id: Option<&str>) -> Result<&DatasetConfig> {
        let id = id.unwrap_or(&self.default_id);
        self.datasets
            .get(id)
            .ok_or_else(|| SearchError::unknown_dataset(id))
    }

    /// The default dataset id.
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// All datasets, ordered by id.
    pub fn datasets(&self) -> &BTreeMap<String, DatasetConfig> {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

// Default value functions

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_size() -> usize {
    10
}

fn default_fusion_candidates() -> usize {
    50
}

fn default_fusion_output_size() -> usize {
    10
}

fn default_rrf_k() -> u32 {
    DEFAULT_RRF_K
}

fn default_elser_model_id() -> String {
    DEFAULT_ELSER_MODEL_ID.to_string()
}

fn default_dataset_id() -> String {
    "movies".to_string()
}

fn default_datasets() -> Vec<DatasetConfig> {
    vec![DatasetConfig {
        id: "movies".to_string(),
        label: "Movies".to_string(),
        index: "search-movies-ml".to_string(),
        search_fields: vec![
            "title".to_string(),
            "overview".to_string(),
            "keywords".to_string(),
        ],
        elser_search_fields: vec![
            "ml.inference.overview_expanded.predicted_value".to_string(),
            "ml.inference.title_expanded.predicted_value^0.5".to_string(),
        ],
        result_fields: vec!["title".to_string(), "overview".to_string()],
        mapping_fields: BTreeMap::from([
            ("text".to_string(), "overview".to_string()),
            ("title".to_string(), "title".to_string()),
        ]),
        elser_model_id: default_elser_model_id(),
    }]
}

impl AppConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SearchError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("hybrid-search").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("hybrid-search.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }

    /// Build the dataset registry described by this configuration.
    pub fn registry(&self) -> Result<DatasetRegistry> {
        DatasetRegistry::new(self.datasets.clone(), self.default_dataset.clone())
    }
}
