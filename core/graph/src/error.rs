use thiserror::Error;

/// Failure reported by (or while talking to) the graph service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("graph service rejected the request as invalid: {0}")]
    Validation(String),

    #[error("graph service unreachable: {0}")]
    Connectivity(String),

    #[error("graph service rate limit hit (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("graph service error: HTTP {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected graph service response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Whether a later attempt could succeed without changing the request.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Connectivity(_) | ServiceError::RateLimited { .. } => true,
            ServiceError::Rejected { status, .. } => *status >= 500,
            ServiceError::Validation(_) | ServiceError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_display_mentions_retry() {
        let e = ServiceError::RateLimited {
            retry_after_secs: Some(20),
        };
        assert!(e.to_string().contains("rate limit"));
        assert!(e.to_string().contains("20"));
    }

    #[test]
    fn transient_classification() {
        assert!(ServiceError::Connectivity("refused".into()).is_transient());
        assert!(ServiceError::Rejected {
            status: 503,
            message: "busy".into()
        }
        .is_transient());
        assert!(!ServiceError::Rejected {
            status: 404,
            message: "missing".into()
        }
        .is_transient());
        assert!(!ServiceError::Validation("bad episode".into()).is_transient());
    }
}
