/// Errors from the Flowdapt HTTP client layer.
use reqwest::StatusCode;
use thiserror::Error;

/// Typed errors from the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached (DNS, refused connection, timeout).
    #[error("Could not connect to the Flowdapt server at {url}: {source}")]
    Connection {
        /// URL of the failed request.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered 404 for the requested path.
    #[error("Resource not found: {path}")]
    NotFound {
        /// Request path that was not found.
        path: String,
    },

    /// Any other non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, or the canonical reason.
        message: String,
    },

    /// The response body was not valid JSON.
    #[error("Invalid response from {url}: {source}")]
    Decode {
        /// URL of the request.
        url: String,
        /// JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured server URL cannot be used as a base for API paths.
    #[error("Invalid server URL '{0}'")]
    InvalidBaseUrl(String),

    /// Building the underlying HTTP client failed.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// Build an error for a non-success response, preferring the body's
    /// `detail` or `message` field over the canonical reason phrase.
    #[must_use]
    pub fn from_status(status: StatusCode, path: &str, body: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            return Self::NotFound {
                path: path.to_owned(),
            };
        }

        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["detail", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(|m| m.as_str().map(str::to_owned)))
            })
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_owned())
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned());

        Self::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// Whether this error means the requested resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
