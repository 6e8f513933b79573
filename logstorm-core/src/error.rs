use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("scenario catalog must contain at least one scenario")]
    EmptyCatalog,

    #[error("scenario `{name}` has invalid weight {weight} (expected a finite number > 0)")]
    InvalidWeight { name: String, weight: f64 },

    #[error("scenario weights overflow (sum is not finite)")]
    WeightOverflow,

    #[error("invalid url template `{template}`: {reason}")]
    InvalidUrlTemplate {
        template: String,
        reason: &'static str,
    },

    #[error("`users` must be a positive integer")]
    InvalidUsers,

    #[error("think time min ({min:?}) must not exceed max ({max:?})")]
    InvalidThinkTime { min: Duration, max: Duration },

    #[error("`timeout` must be a positive duration")]
    InvalidTimeout,

    #[error("invalid base url `{0}` (expected http:// or https://)")]
    InvalidBaseUrl(String),

    #[error("target is unreachable ({url}): {source}")]
    UnreachableTarget {
        url: String,
        #[source]
        source: logstorm_http::Error,
    },
}

impl Error {
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::UnreachableTarget { .. })
    }
}
