// ABOUTME: Errors returned across the provider seam.
// ABOUTME: Classifies SDK failures so callers never see provider exception types.

/// Error codes AWS uses to signal request throttling.
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "PriorRequestNotComplete",
];

/// Errors from a cloud provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The named resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provider asked us to slow down.
    #[error("throttled by provider: {0}")]
    Throttled(String),

    /// The request never got a response (network, dispatch, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with an error response.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// A request could not be built from local input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Build an API error, classifying throttling codes on the way.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        if THROTTLING_CODES.contains(&code.as_str()) {
            ProviderError::Throttled(message)
        } else {
            ProviderError::Api { code, message }
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Throttled(_) | ProviderError::Transport(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_codes_are_transient() {
        let err = ProviderError::api("Throttling", "Rate exceeded");
        assert_eq!(err, ProviderError::Throttled("Rate exceeded".to_string()));
        assert!(err.is_transient());
    }

    #[test]
    fn access_denied_is_not_transient() {
        let err = ProviderError::api("AccessDenied", "not authorized");
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "AccessDenied: not authorized");
    }
}
