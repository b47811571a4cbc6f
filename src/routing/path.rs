//! Path normalization helpers shared by the compiler and the matcher.

/// Strip trailing slashes; an empty result collapses to the root `/`.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Join a child path onto an already normalized base path.
pub fn join_paths(base: &str, child: &str) -> String {
    let base = if base == "/" { "" } else { base };
    normalize(&format!("{}/{}", base, child))
}

/// Split a pathname into its segments, ignoring the leading slash.
///
/// The root `/` has no segments. A trailing slash yields a trailing empty
/// segment, which is how `/users/` stays distinguishable from `/users`.
pub fn segments(path: &str) -> Vec<&str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.is_empty() {
        Vec::new()
    } else {
        rest.split('/').collect()
    }
}

/// Lowercase a path unless matching is case-sensitive.
pub fn fold_case(path: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        path.to_string()
    } else {
        path.to_lowercase()
    }
}

/// Whether `target` is active for the `current` pathname.
///
/// With `end` set only an exact match counts; otherwise descendants on a
/// segment boundary are active too.
pub fn is_active(current: &str, target: &str, end: bool) -> bool {
    let current = normalize(current);
    let target = normalize(target);
    if end {
        return current == target;
    }
    current == target
        || target == "/"
        || current.starts_with(&format!("{}/", target))
}
