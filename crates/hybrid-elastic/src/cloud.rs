//! Endpoint resolution from a URL or an Elastic Cloud id.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;

use hybrid_core::{ElasticsearchConfig, Result, SearchError};

/// Pick the backend base URL: an explicit `url` wins over `cloud_id`.
pub fn resolve_endpoint(config: &ElasticsearchConfig) -> Result<String> {
    if let Some(url) = config.url.as_deref() {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(SearchError::config("elasticsearch url is empty"));
        }
        return Ok(url.to_string());
    }

    match config.cloud_id.as_deref() {
        Some(cloud_id) => decode_cloud_id(cloud_id),
        None => Err(SearchError::config(
            "no elasticsearch endpoint: set elasticsearch.url or elasticsearch.cloud_id \
             (or ELASTICSEARCH_URL / CLOUD_ID)",
        )),
    }
}

/// Decode `name:base64(host$es_uuid$kibana_uuid)` into the Elasticsearch URL.
pub fn decode_cloud_id(cloud_id: &str) -> Result<String> {
    let invalid = |reason: &str| SearchError::config(format!("invalid cloud id: {}", reason));

    let (_, encoded) = cloud_id
        .trim()
        .split_once(':')
        .ok_or_else(|| invalid("missing ':' separator"))?;

    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .map_err(|e| invalid(&e.to_string()))?;
    let decoded = String::from_utf8(bytes).map_err(|_| invalid("not UTF-8"))?;

    let mut parts = decoded.split('$');
    let host = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| invalid("missing host"))?;
    let es_uuid = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("missing elasticsearch id"))?;

    let (host, host_port) = split_port(host);
    let (es_uuid, es_port) = split_port(es_uuid);
    let port = es_port.or(host_port).unwrap_or("443");

    Ok(format!("https://{}.{}:{}", es_uuid, host, port))
}

fn split_port(value: &str) -> (&str, Option<&str>) {
    match value.split_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (value, None),
    }
}
