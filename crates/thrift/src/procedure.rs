//! Procedure names.
//!
//! Thrift procedures are named `Service::Method`.

/// Separator between service and method.
pub const SEPARATOR: &str = "::";

/// Build a procedure name.
#[must_use]
pub fn to_name(service: &str, method: &str) -> String {
    format!("{service}{SEPARATOR}{method}")
}

/// Split a procedure name into service and method.
///
/// A name without separator is treated as a bare method name.
#[must_use]
pub fn from_name(name: &str) -> (&str, &str) {
    name.split_once(SEPARATOR).unwrap_or(("", name))
}
