//! Process-wide error-code catalog.
//!
//! The table is built on first access and is read-only afterwards, so concurrent lookups need no
//! synchronisation. A missing code is a deployment defect: [`lookup`] reports it instead of
//! falling back to a default entry.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use once_cell::sync::Lazy;
use serde::Serialize;

/// Codes referenced directly by the connection core.
pub mod codes {
    /// Read packet failed.
    pub const READ_PACKET: &str = "C4002";
    /// Connection creation failed for a non-security reason.
    pub const CONNECTION_CREATE: &str = "C4003";
    pub const SERIALIZE: &str = "C4014";
    /// Uncategorized internal error. Translation bypasses the template for this code.
    pub const UNCATEGORIZED: &str = "C4038";
    pub const DELETE_DESTINATION: &str = "C4039";
    /// Session creation failed after the connection was opened.
    pub const SESSION_CREATE: &str = "C4052";
    /// Operation requires a transactional (XA) context.
    pub const NOT_TRANSACTIONAL: &str = "C4062";
    /// Closing a connection or session failed.
    pub const CLOSE_FAILED: &str = "C4073";
    /// Authentication or authorization rejected while connecting.
    pub const AUTHENTICATION: &str = "C4084";
    /// The configured provider could not be resolved or constructed.
    pub const PROVIDER_RESOLUTION: &str = "C4100";
    /// The provider construction properties are malformed.
    pub const PROVIDER_PROPERTIES: &str = "C4101";
}

/// One catalog row: a code and its message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub code: &'static str,
    pub template: &'static str,
}

impl Display for ErrorEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.code, self.template)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no catalog entry for error code `{0}`")]
    NotFound(String),
}

const ENTRIES: &[(&str, &str)] = &[
    ("C4000", "Packet acknowledge failed."),
    ("C4001", "Write packet failed."),
    (codes::READ_PACKET, "Read packet failed."),
    (codes::CONNECTION_CREATE, "Error occurred on connection creation."),
    ("C4013", "Received unexpected packet type."),
    (codes::SERIALIZE, "Serialize message failed."),
    ("C4015", "Deserialize message failed."),
    ("C4016", "Error occurred while writing message body."),
    ("C4017", "Invalid message format."),
    (codes::UNCATEGORIZED, "Caught exception."),
    (codes::DELETE_DESTINATION, "Cannot delete destination"),
    (codes::SESSION_CREATE, "Session creation failed."),
    ("C4059", "Cannot perform operation, session is closed."),
    (codes::NOT_TRANSACTIONAL, "Operation requires a transacted XA context."),
    ("C4064", "Cannot perform operation, connection is closed."),
    (codes::CLOSE_FAILED, "Close failed."),
    (codes::AUTHENTICATION, "User authentication failed."),
    (codes::PROVIDER_RESOLUTION, "Cannot resolve connection provider."),
    (codes::PROVIDER_PROPERTIES, "Invalid connection provider properties."),
];

static CATALOG: Lazy<HashMap<&'static str, ErrorEntry>> = Lazy::new(|| {
    ENTRIES
        .iter()
        .map(|&(code, template)| (code, ErrorEntry { code, template }))
        .collect()
});

/// Looks up `code` by value.
pub fn lookup(code: &str) -> Result<&'static ErrorEntry, CatalogError> {
    CATALOG
        .get(code)
        .ok_or_else(|| CatalogError::NotFound(code.to_string()))
}

pub fn contains(code: &str) -> bool {
    CATALOG.contains_key(code)
}

/// All catalog rows ordered by code.
pub fn entries() -> Vec<&'static ErrorEntry> {
    let mut entries: Vec<_> = CATALOG.values().collect();
    entries.sort_by(|a, b| a.code.cmp(b.code));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_compares_codes_by_value() {
        let owned = String::from("C4039");
        let entry = lookup(&owned).expect("entry present");
        assert_eq!(entry.template, "Cannot delete destination");
        assert!(std::ptr::eq(entry, lookup("C4039").unwrap()));
    }

    #[test]
    fn missing_code_is_reported() {
        assert_eq!(
            lookup("XXX").unwrap_err(),
            CatalogError::NotFound("XXX".into())
        );
        assert!(!contains(""));
    }

    #[test]
    fn entries_are_sorted_and_unique() {
        let all = entries();
        assert_eq!(all.len(), ENTRIES.len());
        assert!(all.windows(2).all(|pair| pair[0].code < pair[1].code));
    }

    #[test]
    fn entry_displays_as_headline() {
        let entry = lookup(codes::SERIALIZE).unwrap();
        assert_eq!(entry.to_string(), "[C4014]: Serialize message failed.");
    }
}
