//! Error catalog, translation helpers, and the uniform error type surfaced by the
//! mq-client connection core.
//!
//! Every failure a caller observes carries a stable catalog code plus a templated message, so
//! callers can match on [`ClientError::code`] or [`ClientError::kind`] instead of parsing text.

pub mod catalog;
pub mod error;
pub mod translate;

pub use catalog::{CatalogError, ErrorEntry, codes, lookup};
pub use error::{ClientError, ErrorKind};
pub use translate::{describe, translate_code, translate_message, translate_with_cause};
