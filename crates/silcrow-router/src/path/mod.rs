//! Path utilities shared by route lookup and the page manager
//!
//! All functions are pure. Canonical form: starts with `/`, no empty
//! segments, no backslashes, no trailing `/` except for the root.

use std::borrow::Cow;

/// Checks whether a path is already in canonical form
///
/// # Examples
///
/// ```
/// use silcrow_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/user/42"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("user/42"));
/// assert!(!is_valid_path("/user/42/"));
/// assert!(!is_valid_path("/user//42"));
/// assert!(!is_valid_path("/user\\42"));
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalizes a path to canonical form
///
/// Returns `Cow::Borrowed` when the input is already canonical.
///
/// # Examples
///
/// ```
/// use silcrow_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/user/42"), Cow::Borrowed("/user/42")));
/// assert_eq!(normalize_path("user/42/"), "/user/42");
/// assert_eq!(normalize_path("\\user\\42"), "/user/42");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Joins a base path and a page path into one canonical path
///
/// # Examples
///
/// ```
/// use silcrow_router::path::join_path;
///
/// assert_eq!(join_path("/", "/user/42"), "/user/42");
/// assert_eq!(join_path("/app", "/user/42"), "/app/user/42");
/// assert_eq!(join_path("/app/", "/"), "/app");
/// ```
pub fn join_path(base: &str, path: &str) -> String {
    normalize_path(&format!("{}/{}", base, path)).into_owned()
}

/// Removes `base` from the front of `path` if present
///
/// A root base (`/`) strips only the leading slash, mirroring how an app
/// mounted at the root sees its own paths.
pub fn strip_base<'a>(path: &'a str, base: &str) -> &'a str {
    path.strip_prefix(base).unwrap_or(path)
}

/// Splits a path into its non-empty segments
pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
