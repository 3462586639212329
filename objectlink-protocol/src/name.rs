//! Member identifier utilities.
//!
//! Every addressable member is named `objectId` or `objectId.member`. The
//! separator is a single dot; beyond that identifiers are opaque to the
//! runtime.

/// Separator between the object part and the member part of an identifier.
pub const SEPARATOR: char = '.';

/// Joins an object id and a member name into a member id.
pub fn member_id(object_id: &str, member: &str) -> String {
    format!("{object_id}{SEPARATOR}{member}")
}

/// Returns the object part of an identifier: everything before the first
/// dot, or the whole string if there is none.
pub fn object_id(id: &str) -> &str {
    split(id).0
}

/// Returns the member part of an identifier: everything after the first
/// dot, or the empty string if there is none.
pub fn member(id: &str) -> &str {
    split(id).1
}

/// Splits an identifier into its object and member parts.
pub fn split(id: &str) -> (&str, &str) {
    match id.split_once(SEPARATOR) {
        Some((object, member)) => (object, member),
        None => (id, ""),
    }
}
