//! Path normalization.
//!
//! Registered patterns and incoming event paths pass through the exact
//! same normalization, so `a/b/` and `/a/b` always meet at the same
//! tree node:
//!
//! - exactly one leading `/`
//! - no trailing `/`
//! - no repeated `/`

/// The wildcard segment marker.
///
/// Mid-pattern it matches exactly one segment; as the final pattern
/// segment it matches any non-empty remaining suffix.
pub const WILDCARD: &str = "*";

/// Normalizes a path or pattern string.
///
/// # Example
///
/// ```
/// use axon_router::normalize;
///
/// assert_eq!(normalize("a/b/"), "/a/b");
/// assert_eq!(normalize("//a///b"), "/a/b");
/// assert_eq!(normalize("/a/b"), "/a/b");
/// assert_eq!(normalize("/"), "/");
/// ```
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for seg in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(seg);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Splits a normalized path into its segments.
pub(crate) fn segments(normalized: &str) -> Vec<&str> {
    normalized.split('/').filter(|s| !s.is_empty()).collect()
}
