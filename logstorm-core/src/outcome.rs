use std::sync::Arc;
use std::time::Duration;

use logstorm_http::HttpTransportErrorKind;

/// Why a request produced no HTTP response.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Connection,
    Other,
}

impl From<&logstorm_http::Error> for ErrorKind {
    fn from(err: &logstorm_http::Error) -> Self {
        match err.transport_error_kind() {
            HttpTransportErrorKind::Timeout => Self::Timeout,
            HttpTransportErrorKind::Connect
            | HttpTransportErrorKind::Request
            | HttpTransportErrorKind::BodyRead => Self::Connection,
            HttpTransportErrorKind::InvalidUrl
            | HttpTransportErrorKind::UnsupportedScheme
            | HttpTransportErrorKind::RequestBuild
            | HttpTransportErrorKind::HeaderName
            | HttpTransportErrorKind::HeaderValue => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The target answered. Any status counts, 4xx and 5xx included.
    Received { status: u16 },
    Failed { kind: ErrorKind, message: String },
}

/// Result of one executed request.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub scenario: Arc<str>,
    pub method: http::Method,
    pub url: String,
    pub elapsed: Duration,
    pub kind: OutcomeKind,
}

impl RequestOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Received { .. })
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            OutcomeKind::Received { status } => Some(status),
            OutcomeKind::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.kind {
            OutcomeKind::Received { .. } => None,
            OutcomeKind::Failed { kind, .. } => Some(kind),
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Received { .. } => None,
            OutcomeKind::Failed { message, .. } => Some(message),
        }
    }
}
