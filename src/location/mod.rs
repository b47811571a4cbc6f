//! Current-location state.
//!
//! # Responsibilities
//! - Define the `Location` value (pathname, search, hash, state, key)
//! - Hold the single current location and notify subscribers on change
//!
//! # Design Decisions
//! - Reads are lock-free (`ArcSwap`); writers are serialized by the caller
//! - Keys come from a per-store counter, unique for the store's lifetime

pub mod store;

use serde::Serialize;
use serde_json::Value;
use url::Url;

pub use store::{LocationStore, SubscriptionId};

/// Opaque per-entry identity. The initial location always carries
/// [`INITIAL_KEY`].
pub const INITIAL_KEY: &str = "default";

/// A point in the application's URL space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    /// Always starts with `/`.
    pub pathname: String,
    /// Empty, or starts with `?`.
    pub search: String,
    /// Empty, or starts with `#`.
    pub hash: String,
    pub state: Value,
    pub key: String,
}

impl Location {
    /// Build a location from a URL, with an explicit state and key.
    pub fn from_url(url: &Url, state: Value, key: impl Into<String>) -> Self {
        Self {
            pathname: url.path().to_string(),
            search: search_of(url),
            hash: hash_of(url),
            state,
            key: key.into(),
        }
    }

    /// `pathname + search + hash`.
    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }

    /// Decoded query pairs, in order.
    pub fn search_params(&self) -> Vec<(String, String)> {
        let query = self.search.strip_prefix('?').unwrap_or(&self.search);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Compare URL parts, ignoring state and key.
    pub fn same_url(&self, other: &Location) -> bool {
        self.pathname == other.pathname && self.search == other.search && self.hash == other.hash
    }
}

/// `?query` when the URL has a non-empty query, otherwise empty.
pub fn search_of(url: &Url) -> String {
    match url.query() {
        Some(q) if !q.is_empty() => format!("?{q}"),
        _ => String::new(),
    }
}

/// `#fragment` when the URL has a non-empty fragment, otherwise empty.
pub fn hash_of(url: &Url) -> String {
    match url.fragment() {
        Some(f) if !f.is_empty() => format!("#{f}"),
        _ => String::new(),
    }
}

/// Render query pairs as a `?`-prefixed search string (empty for none).
pub fn encode_search(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish();
    format!("?{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_parts() {
        let url = Url::parse("http://app.test/users/7?tab=posts#top").unwrap();
        let loc = Location::from_url(&url, Value::Null, "k1");
        assert_eq!(loc.pathname, "/users/7");
        assert_eq!(loc.search, "?tab=posts");
        assert_eq!(loc.hash, "#top");
        assert_eq!(loc.href(), "/users/7?tab=posts#top");
    }

    #[test]
    fn test_empty_query_and_fragment_dropped() {
        let url = Url::parse("http://app.test/a?#").unwrap();
        let loc = Location::from_url(&url, Value::Null, "k1");
        assert_eq!(loc.search, "");
        assert_eq!(loc.hash, "");
    }

    #[test]
    fn test_search_params_round_trip() {
        let pairs = vec![
            ("q".to_string(), "rust lang".to_string()),
            ("page".to_string(), "2".to_string()),
        ];
        let search = encode_search(&pairs);
        assert_eq!(search, "?q=rust+lang&page=2");
        let loc = Location {
            pathname: "/".into(),
            search,
            hash: String::new(),
            state: Value::Null,
            key: INITIAL_KEY.into(),
        };
        assert_eq!(loc.search_params(), pairs);
        assert_eq!(encode_search(&[]), "");
    }
}
