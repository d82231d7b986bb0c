use thiserror::Error;

/// Failures talking to the wallabag server.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request to {url} failed")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("Unexpected response from {url}")]
    Json {
        url: String,
        source: serde_json::Error,
    },
}
