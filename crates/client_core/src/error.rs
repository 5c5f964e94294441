use reqwest::StatusCode;
use thiserror::Error;

use crate::draft::DraftError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status} for {method} {url}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
    },
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{resource} entity has no id; it must be created before it can be updated")]
    MissingId { resource: &'static str },
    #[error("no {resource} entry at list index {index}")]
    NoSuchEntry { resource: &'static str, index: usize },
    #[error("no active draft")]
    NoActiveDraft,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("failed to read config file '{path}': {message}")]
    Config { path: String, message: String },
}

impl ClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

/// Text shown to the user when an operation against the backend fails.
pub fn user_facing_message(err: &ClientError) -> String {
    match err {
        ClientError::Transport { source, .. } if source.is_connect() || source.is_timeout() => {
            "Server unreachable; check the API URL/network and retry.".to_string()
        }
        ClientError::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
            "An error occurred: the entry no longer exists on the server.".to_string()
        }
        other => format!("An error occurred: {other}"),
    }
}
