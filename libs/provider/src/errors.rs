/// Failure reported by a provider implementation.
///
/// Providers pick the variant; the connection core only distinguishes security failures from
/// everything else when classifying.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("authentication rejected for user `{user}`")]
    AuthenticationRejected { user: String },
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("broker refused request: {0}")]
    Refused(String),
    #[error("invalid property `{key}`: {reason}")]
    InvalidProperty { key: String, reason: String },
    #[error("connection is closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the failure stems from authentication or authorization.
    pub fn is_security(&self) -> bool {
        matches!(
            self,
            TransportError::AuthenticationRejected { .. } | TransportError::AccessDenied(_)
        )
    }
}
