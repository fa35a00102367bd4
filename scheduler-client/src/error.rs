use thiserror::Error;

use crate::config::Locale;
use crate::store::Operation;

/// Failure talking to the scheduling service.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("API error: {status}{}", detail_suffix(.detail))]
    Api { status: u16, detail: Option<String> },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Failures worth retrying: transport errors, timeouts, throttling and
    /// server-side errors. Not-found and other client errors are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::Api { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            GatewayError::Decode(_) | GatewayError::InvalidUrl(_) => false,
        }
    }

    /// Human-readable message supplied by the server, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn api(status: u16, body: &str) -> Self {
        GatewayError::Api {
            status,
            detail: extract_detail(body),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(e: url::ParseError) -> Self {
        GatewayError::InvalidUrl(e.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" - {}", d))
        .unwrap_or_default()
}

/// Pull a user-facing message out of an error body. Understands
/// `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}`,
/// `{"error": {"message": "..."}}`, `{"error": "..."}` and `{"message": "..."}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let detail = value.get("detail").and_then(|d| match d {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    });

    detail
        .or_else(|| {
            value.get("error").and_then(|e| match e {
                serde_json::Value::String(s) => Some(s.clone()),
                other => other
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|s| !s.trim().is_empty())
}

/// Generic message shown when the server did not explain a failure.
pub fn fallback_message(operation: Operation, locale: Locale) -> &'static str {
    match (operation, locale) {
        (Operation::CreateMeeting, Locale::En) => "Failed to create the meeting",
        (Operation::CreateMeeting, Locale::Ja) => "会議の作成に失敗しました",
        (Operation::FetchMeeting, Locale::En) => "Failed to load the meeting",
        (Operation::FetchMeeting, Locale::Ja) => "会議情報の取得に失敗しました",
        (Operation::AddParticipant, Locale::En) => "Failed to register the participant",
        (Operation::AddParticipant, Locale::Ja) => "参加登録に失敗しました",
        (Operation::ListParticipants, Locale::En) => "Failed to load participants",
        (Operation::ListParticipants, Locale::Ja) => "参加者一覧の取得に失敗しました",
    }
}

/// A failed store operation. `message` is what the user should see.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub operation: Operation,
    pub message: String,
    #[source]
    pub source: Option<GatewayError>,
}

impl StoreError {
    pub fn from_gateway(operation: Operation, error: GatewayError, locale: Locale) -> Self {
        let message = error
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| fallback_message(operation, locale).to_string());
        Self {
            operation,
            message,
            source: Some(error),
        }
    }

    /// Rejected before any request was sent.
    pub fn validation(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
            source: None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.source.is_none()
    }
}
