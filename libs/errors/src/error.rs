use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::catalog::CatalogError;
use crate::translate::{translate_code, translate_with_cause};

/// Classification assigned once, at the point of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Authentication or authorization failed while connecting.
    Security,
    /// The configured provider could not be located or constructed.
    ProviderResolution,
    /// Any other failure reported by the transport.
    Provider,
    /// An error code has no catalog entry.
    NotFound,
    /// The operation does not apply to the context's lifecycle state.
    InvalidState,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Security => "security",
            ErrorKind::ProviderResolution => "provider_resolution",
            ErrorKind::Provider => "provider",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced by the connection core.
#[derive(Debug)]
pub struct ClientError {
    kind: ErrorKind,
    code: String,
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ClientError {
    /// Builds an error whose message is the catalog line for `code` plus the described cause.
    ///
    /// If `code` is missing from the catalog the result is a [`ErrorKind::NotFound`] error for
    /// that code instead; a broken catalog is never hidden behind the original failure.
    pub fn translated<E>(kind: ErrorKind, code: &str, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        match translate_with_cause(Some(&cause), code) {
            Ok(message) => Self {
                kind,
                code: code.to_string(),
                message,
                source: Some(Box::new(cause)),
            },
            Err(err) => err.into(),
        }
    }

    /// Builds an error carrying only the catalog line for `code`.
    pub fn coded(kind: ErrorKind, code: &str) -> Self {
        match translate_code(code) {
            Ok(message) => Self {
                kind,
                code: code.to_string(),
                message,
                source: None,
            },
            Err(err) => err.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the stable catalog code.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn Error + 'static))
    }
}

impl From<CatalogError> for ClientError {
    fn from(err: CatalogError) -> Self {
        let code = match &err {
            CatalogError::NotFound(code) => code.clone(),
        };
        ClientError {
            kind: ErrorKind::NotFound,
            code,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::type_name;

    use super::*;
    use crate::catalog::codes;

    #[derive(Debug, thiserror::Error)]
    #[error("bad credentials for {0}")]
    struct Rejected(&'static str);

    #[test]
    fn translated_error_keeps_code_message_and_source() {
        let err = ClientError::translated(ErrorKind::Security, codes::AUTHENTICATION, Rejected("bob"));
        assert_eq!(err.kind(), ErrorKind::Security);
        assert_eq!(err.code(), "C4084");
        assert_eq!(
            err.message(),
            format!(
                "[C4084]: User authentication failed. - cause: {}: bad credentials for bob",
                type_name::<Rejected>()
            )
        );
        let source = err.source().expect("source attached");
        assert_eq!(source.to_string(), "bad credentials for bob");
    }

    #[test]
    fn unknown_code_surfaces_as_not_found() {
        let err = ClientError::translated(ErrorKind::Provider, "C0000", Rejected("x"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), "C0000");
        assert_eq!(err.to_string(), "no catalog entry for error code `C0000`");
    }

    #[test]
    fn coded_error_has_no_source() {
        let err = ClientError::coded(ErrorKind::InvalidState, codes::NOT_TRANSACTIONAL);
        assert_eq!(
            err.to_string(),
            "[C4062]: Operation requires a transacted XA context."
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ProviderResolution).unwrap();
        assert_eq!(json, "\"provider_resolution\"");
    }
}
