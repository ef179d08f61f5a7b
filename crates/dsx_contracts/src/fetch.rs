#![forbid(unsafe_code)]

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Json,
    Text,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Text => "text",
        }
    }
}

/// Body of a successful data-plane fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedContent {
    Json(Value),
    Text(String),
}

impl FetchedContent {
    /// Structured parse first; anything that is not JSON is text.
    pub fn classify(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(v) => FetchedContent::Json(v),
            Err(_) => FetchedContent::Text(body.to_string()),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            FetchedContent::Json(_) => ContentKind::Json,
            FetchedContent::Text(_) => ContentKind::Text,
        }
    }
}

/// Non-success data-plane responses, classified for operator guidance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    CredentialExpired,
    NotFound,
    Http { status: u16, body: String },
}

impl FetchFailure {
    pub fn guidance(&self) -> String {
        match self {
            FetchFailure::CredentialExpired => {
                "authorization failed: the access token may have expired; negotiate a new contract (`dsx negotiate`) to obtain a fresh token".to_string()
            }
            FetchFailure::NotFound => {
                "data not found: the asset or its backing resource may not exist".to_string()
            }
            FetchFailure::Http { status, body } => {
                format!("failed to fetch data: HTTP {status}: {body}")
            }
        }
    }
}
