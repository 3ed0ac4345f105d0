//! Builds catalog-backed messages from a failure and an optional error code.

use std::any::type_name;
use std::error::Error;

use crate::catalog::{self, CatalogError, codes};

/// Renders a cause as its fully-qualified type name, followed by `": " + message` when the
/// cause displays non-empty text.
///
/// The cause must be a concrete type. A trait object has no name of its own to report, so
/// `&dyn Error` is rejected at compile time:
///
/// ```compile_fail
/// let cause: &dyn std::error::Error = &std::io::Error::other("disk gone");
/// mqc_errors::describe(cause);
/// ```
pub fn describe<E: Error>(cause: &E) -> String {
    let name = type_name::<E>();
    let message = cause.to_string();
    if message.is_empty() {
        name.to_string()
    } else {
        format!("{name}: {message}")
    }
}

/// Translates `cause` under `code`.
///
/// An absent or empty code resolves to [`codes::UNCATEGORIZED`], which yields [`describe`]
/// output without a code prefix. Any other known code yields `"[code]: template"` and ignores
/// the cause. An explicit code missing from the catalog is an error.
pub fn translate_message<E: Error>(
    cause: &E,
    code: Option<&str>,
) -> Result<String, CatalogError> {
    let code = match code {
        Some(code) if !code.is_empty() => code,
        _ => codes::UNCATEGORIZED,
    };
    let entry = catalog::lookup(code)?;
    if entry.code == codes::UNCATEGORIZED {
        return Ok(describe(cause));
    }
    Ok(entry.to_string())
}

/// Formats `"[code]: template"`, appending `" - cause: "` and the described cause when present.
pub fn translate_with_cause<E: Error>(
    cause: Option<&E>,
    code: &str,
) -> Result<String, CatalogError> {
    let headline = translate_code(code)?;
    Ok(match cause {
        Some(cause) => format!("{headline} - cause: {}", describe(cause)),
        None => headline,
    })
}

/// Formats the catalog line for `code` without a cause.
pub fn translate_code(code: &str) -> Result<String, CatalogError> {
    Ok(catalog::lookup(code)?.to_string())
}
