//! Builds structured retrieval requests from a free-text query.

use hybrid_core::{
    is_valid_index_name, DatasetConfig, Result, SearchError, SearchRequest, Strategy,
    StructuredQuery, TextExpansionClause,
};

/// Trim the query and reject blank input.
pub fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(SearchError::invalid_query("Query cannot be empty"));
    }
    Ok(trimmed)
}

/// Reject index names that would not map onto a single backend path segment.
pub fn validate_index(index: &str) -> Result<&str> {
    if !is_valid_index_name(index) {
        return Err(SearchError::invalid_query(format!(
            "'{}' is not a valid index name",
            index
        )));
    }
    Ok(index)
}

/// Build a lexical request: one multi-field match over `search_fields`.
pub fn lexical_request(
    query: &str,
    dataset: &DatasetConfig,
    index: &str,
    size: usize,
) -> Result<SearchRequest> {
    let query = validate_query(query)?;

    Ok(SearchRequest {
        strategy: Strategy::Bm25,
        index: index.to_string(),
        size,
        fields: dataset.result_fields.clone(),
        query: StructuredQuery::MultiMatch {
            query: query.to_string(),
            fields: dataset.search_fields.clone(),
        },
    })
}

/// Build a semantic request: one text-expansion clause per
/// `elser_search_fields` entry, any of which may match.
pub fn semantic_request(
    query: &str,
    dataset: &DatasetConfig,
    index: &str,
    size: usize,
) -> Result<SearchRequest> {
    let query = validate_query(query)?;

    let clauses = dataset
        .semantic_fields()?
        .into_iter()
        .map(|field| TextExpansionClause {
            field: field.field,
            model_id: dataset.elser_model_id.clone(),
            model_text: query.to_string(),
            boost: field.boost,
        })
        .collect::<Vec<_>>();

    if clauses.is_empty() {
        return Err(SearchError::config(format!(
            "dataset '{}' has no elser_search_fields",
            dataset.id
        )));
    }

    Ok(SearchRequest {
        strategy: Strategy::Elser,
        index: index.to_string(),
        size,
        fields: dataset.result_fields.clone(),
        query: StructuredQuery::TextExpansion { clauses },
    })
}
