//! Translation of search errors into JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use hybrid_core::SearchError;

/// A search error on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub SearchError);

impl ApiError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match self.0 {
            SearchError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            SearchError::UnknownDataset { .. } => StatusCode::NOT_FOUND,
            SearchError::RetrievalFailure { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Search failed: {}", self.0);
        }
        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.error_code(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SearchError::invalid_query("empty"), StatusCode::BAD_REQUEST),
            (SearchError::unknown_dataset("books"), StatusCode::NOT_FOUND),
            (SearchError::retrieval("timeout"), StatusCode::BAD_GATEWAY),
            (
                SearchError::missing_field("title", "1"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (SearchError::config("bad"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError(SearchError::invalid_query("empty")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
