//! Path templates and the pattern adapter seam.
//!
//! # Responsibilities
//! - Parse route templates (`/users/:id`, `/files/*`) into segments
//! - Match a pathname against a template, extracting named captures
//! - Hide the "precise matcher available or not" decision behind
//!   [`PathPatternAdapter`]
//!
//! # Design Decisions
//! - `:name` captures exactly one non-empty segment
//! - `*` as the final segment captures the remainder under [`SPLAT_KEY`];
//!   anywhere else it skips zero or more segments without capturing
//! - Literal comparison honours case sensitivity; captured values keep
//!   their original case
//! - No regex: segment walk with bounded backtracking on non-final splats

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::routing::path;

/// Parameter key under which a wildcard capture is surfaced.
pub const SPLAT_KEY: &str = "*";

/// Extracted path parameters, keyed by name.
pub type Params = BTreeMap<String, String>;

/// Errors raised while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `:` segment without a name.
    #[error("empty parameter name in `{0}`")]
    EmptyParam(String),

    /// The same capture name appears twice in one template.
    #[error("parameter `{name}` is bound more than once in `{template}`")]
    DuplicateParam { name: String, template: String },
}

/// One parsed template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Splat,
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template. Duplicate capture names are rejected.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        for raw in path::segments(template) {
            let segment = if raw == "*" {
                Segment::Splat
            } else if let Some(name) = raw.strip_prefix(':') {
                if name.is_empty() {
                    return Err(TemplateError::EmptyParam(template.to_string()));
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Literal(raw.to_string())
            };
            segments.push(segment);
        }

        let parsed = Self {
            source: template.to_string(),
            segments,
        };

        let mut seen: Vec<&str> = Vec::new();
        for name in parsed.capture_names() {
            if seen.contains(&name) {
                return Err(TemplateError::DuplicateParam {
                    name: name.to_string(),
                    template: template.to_string(),
                });
            }
            seen.push(name);
        }

        Ok(parsed)
    }

    /// The template text this was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the final segment is a capture-all splat.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Splat))
    }

    /// Names this template binds, in declaration order.
    pub fn capture_names(&self) -> Vec<&str> {
        let last = self.segments.len().saturating_sub(1);
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, segment)| match segment {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Splat if i == last => Some(SPLAT_KEY),
                _ => None,
            })
            .collect()
    }

    /// Match `pathname` completely, returning the captures on success.
    pub fn captures(&self, pathname: &str, case_sensitive: bool) -> Option<Params> {
        let parts = path::segments(pathname);
        let mut params = Params::new();
        if walk(&self.segments, &parts, case_sensitive, &mut params) {
            Some(params)
        } else {
            None
        }
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn walk(template: &[Segment], parts: &[&str], case_sensitive: bool, params: &mut Params) -> bool {
    let Some((head, rest)) = template.split_first() else {
        return parts.is_empty();
    };

    match head {
        Segment::Literal(literal) => match parts.split_first() {
            Some((part, tail)) if literal_eq(literal, part, case_sensitive) => {
                walk(rest, tail, case_sensitive, params)
            }
            _ => false,
        },
        Segment::Param(name) => match parts.split_first() {
            Some((part, tail)) if !part.is_empty() => {
                params.insert(name.clone(), (*part).to_string());
                if walk(rest, tail, case_sensitive, params) {
                    true
                } else {
                    params.remove(name);
                    false
                }
            }
            _ => false,
        },
        Segment::Splat if rest.is_empty() => {
            params.insert(SPLAT_KEY.to_string(), parts.join("/"));
            true
        }
        Segment::Splat => {
            (0..=parts.len()).any(|skip| walk(rest, &parts[skip..], case_sensitive, params))
        }
    }
}

fn literal_eq(literal: &str, part: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        literal == part
    } else {
        literal.to_lowercase() == part.to_lowercase()
    }
}

/// A compiled matcher produced by a [`PathPatternAdapter`].
pub trait PathMatcher: Send + Sync + fmt::Debug {
    /// Returns the captures if `pathname` matches.
    fn exec(&self, pathname: &str) -> Option<Params>;
}

/// Optional precise pattern capability.
///
/// Returning `None` from [`compile`](PathPatternAdapter::compile) is not an
/// error: callers fall back to string comparison.
pub trait PathPatternAdapter: Send + Sync + fmt::Debug {
    /// Compile `template` into a matcher, or `None` when unavailable.
    fn compile(&self, template: &str, case_sensitive: bool) -> Option<Box<dyn PathMatcher>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Matcher backed by a parsed [`PathTemplate`].
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    template: PathTemplate,
    case_sensitive: bool,
}

impl TemplateMatcher {
    pub fn new(template: PathTemplate, case_sensitive: bool) -> Self {
        Self {
            template,
            case_sensitive,
        }
    }
}

impl PathMatcher for TemplateMatcher {
    fn exec(&self, pathname: &str) -> Option<Params> {
        self.template.captures(pathname, self.case_sensitive)
    }
}

/// The precise adapter: segment-aware template matching.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentPatterns;

impl PathPatternAdapter for SegmentPatterns {
    fn compile(&self, template: &str, case_sensitive: bool) -> Option<Box<dyn PathMatcher>> {
        match PathTemplate::parse(template) {
            Ok(parsed) => Some(Box::new(TemplateMatcher::new(parsed, case_sensitive))),
            Err(e) => {
                tracing::debug!(template = %template, error = %e, "Template rejected, using string fallback");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "segment"
    }
}

/// The null adapter: never compiles, forcing the string fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringFallback;

impl PathPatternAdapter for StringFallback {
    fn compile(&self, _template: &str, _case_sensitive: bool) -> Option<Box<dyn PathMatcher>> {
        None
    }

    fn name(&self) -> &'static str {
        "string-fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_param_capture() {
        let t = PathTemplate::parse("/users/:id").unwrap();
        assert_eq!(t.captures("/users/42", true), Some(params(&[("id", "42")])));
        assert_eq!(t.captures("/users", true), None);
        assert_eq!(t.captures("/users/", true), None);
        assert_eq!(t.captures("/users/42/edit", true), None);
    }

    #[test]
    fn test_splat_capture() {
        let t = PathTemplate::parse("/files/*").unwrap();
        assert!(t.is_wildcard());
        assert_eq!(t.captures("/files/a/b.txt", true), Some(params(&[("*", "a/b.txt")])));
        assert_eq!(t.captures("/files", true), Some(params(&[("*", "")])));
        assert_eq!(t.captures("/other", true), None);

        let root = PathTemplate::parse("/*").unwrap();
        assert_eq!(root.captures("/", true), Some(params(&[("*", "")])));
        assert_eq!(root.captures("/x/y", true), Some(params(&[("*", "x/y")])));
    }

    #[test]
    fn test_non_final_splat_is_not_captured() {
        let t = PathTemplate::parse("/a/*/b").unwrap();
        assert_eq!(t.captures("/a/x/y/b", true), Some(Params::new()));
        assert_eq!(t.captures("/a/b", true), Some(Params::new()));
        assert_eq!(t.captures("/a/x", true), None);
    }

    #[test]
    fn test_case_sensitivity() {
        let t = PathTemplate::parse("/Users/:id").unwrap();
        assert_eq!(t.captures("/users/AbC", false), Some(params(&[("id", "AbC")])));
        assert_eq!(t.captures("/users/AbC", true), None);
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let err = PathTemplate::parse("/users/:id/posts/:id").unwrap_err();
        assert_eq!(
            err,
            TemplateError::DuplicateParam {
                name: "id".into(),
                template: "/users/:id/posts/:id".into(),
            }
        );
        assert!(matches!(PathTemplate::parse("/a/:"), Err(TemplateError::EmptyParam(_))));
    }

    #[test]
    fn test_adapters() {
        let precise = SegmentPatterns.compile("/users/:id", false).unwrap();
        assert_eq!(precise.exec("/users/7"), Some(params(&[("id", "7")])));
        assert!(SegmentPatterns.compile("/bad/:", false).is_none());
        assert!(StringFallback.compile("/users/:id", false).is_none());
    }
}
