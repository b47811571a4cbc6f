//! Route matching logic.
//!
//! # Responsibilities
//! - Resolve a pathname to a root-to-leaf stack of compiled routes
//! - Extract path parameters per matched node
//! - Degrade to segment-wise string comparison when no precise pattern
//!   was compiled for a node
//!
//! # Design Decisions
//! - Strict depth-first descent, siblings tried in declaration order
//! - A node whose descendants all fail counts as failed; the next sibling
//!   is tried (local-level retry, no global backtracking)
//! - Splats produced only to test descendance are never surfaced
//! - The matcher never asks whether a capability exists: a missing
//!   pattern simply routes the node to the fallback comparison

use std::sync::Arc;

use serde::ser::{Serialize, Serializer};

use crate::observability::metrics;
use crate::routing::compiler::{CompiledRoute, CompiledRouteTree, RouteId};
use crate::routing::path::fold_case;
use crate::routing::pattern::{Params, PathPatternAdapter, PathTemplate, SPLAT_KEY};

/// One resolved node and the parameters it captured.
#[derive(Debug, Clone)]
pub struct Match {
    route: Arc<CompiledRoute>,
    params: Params,
}

impl Match {
    pub fn route(&self) -> &Arc<CompiledRoute> {
        &self.route
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Ordered matches from the root to the deepest matched node.
#[derive(Debug, Clone)]
pub struct MatchStack {
    matches: Vec<Match>,
}

impl MatchStack {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Match> {
        self.matches.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter()
    }

    /// The deepest match.
    pub fn leaf(&self) -> Option<&Match> {
        self.matches.last()
    }

    pub fn route_ids(&self) -> Vec<RouteId> {
        self.matches.iter().map(|m| m.route.id()).collect()
    }

    /// All parameters merged root to leaf.
    pub fn params(&self) -> Params {
        self.matches.iter().fold(Params::new(), |mut acc, m| {
            acc.extend(m.params.iter().map(|(k, v)| (k.clone(), v.clone())));
            acc
        })
    }

    /// Cursor positioned at the root, for nested rendering.
    pub fn cursor(&self) -> RenderCursor<'_> {
        RenderCursor {
            stack: self,
            index: 0,
        }
    }
}

impl Serialize for MatchStack {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct MatchView<'a> {
            id: RouteId,
            full_path: &'a str,
            index: bool,
            element: Option<&'a str>,
            params: &'a Params,
        }

        serializer.collect_seq(self.matches.iter().map(|m| MatchView {
            id: m.route.id(),
            full_path: m.route.full_path(),
            index: m.route.is_index(),
            element: m.route.element(),
            params: &m.params,
        }))
    }
}

/// An immutable `(stack, index)` pair threaded through nested outlets.
#[derive(Debug, Clone, Copy)]
pub struct RenderCursor<'a> {
    stack: &'a MatchStack,
    index: usize,
}

impl<'a> RenderCursor<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&'a Match> {
        self.stack.get(self.index)
    }

    /// The cursor the current node's outlet renders with.
    pub fn outlet(&self) -> RenderCursor<'a> {
        RenderCursor {
            stack: self.stack,
            index: self.index + 1,
        }
    }

    /// First match at or below this cursor that carries an element.
    ///
    /// Element-less matches are layout-transparent: their outlet renders
    /// in their place.
    pub fn element(&self) -> Option<(RenderCursor<'a>, &'a str)> {
        let mut cursor = *self;
        while let Some(current) = cursor.current() {
            if let Some(element) = current.route.element() {
                return Some((cursor, element));
            }
            cursor = cursor.outlet();
        }
        None
    }
}

/// Result of probing the current pathname against an ad-hoc pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub params: Params,
    pub pathname: String,
    pub pattern: String,
}

impl CompiledRouteTree {
    /// Match `pathname` against this tree.
    pub fn match_path(&self, pathname: &str) -> Option<MatchStack> {
        match_routes(self, pathname)
    }
}

/// Resolve `pathname` to a [`MatchStack`], or `None` when nothing matches.
pub fn match_routes(tree: &CompiledRouteTree, pathname: &str) -> Option<MatchStack> {
    let pathname = if pathname.is_empty() { "/" } else { pathname };
    let found = attempt(tree, tree.roots(), pathname, Vec::new());

    metrics::record_match(found.is_some());
    match &found {
        Some(matches) => tracing::debug!(
            pathname = %pathname,
            depth = matches.len(),
            "Route matched"
        ),
        None => tracing::debug!(pathname = %pathname, "No route matched"),
    }

    found.map(|matches| MatchStack { matches })
}

fn attempt(
    tree: &CompiledRouteTree,
    nodes: &[Arc<CompiledRoute>],
    pathname: &str,
    stack: Vec<Match>,
) -> Option<Vec<Match>> {
    for node in nodes {
        let Some(params) = match_node(tree, node, pathname) else {
            continue;
        };

        tracing::trace!(
            full_path = %node.full_path(),
            depth = stack.len() + 1,
            params = ?params,
            "Node matched"
        );

        let mut next = stack.clone();
        next.push(Match {
            route: node.clone(),
            params,
        });

        if !node.has_children() {
            return Some(next);
        }
        if let Some(found) = attempt(tree, node.children(), pathname, next) {
            return Some(found);
        }
    }
    None
}

fn match_node(tree: &CompiledRouteTree, node: &CompiledRoute, pathname: &str) -> Option<Params> {
    let case_sensitive = node.is_case_sensitive();

    if node.is_index() {
        let expected = fold_case(node.full_path(), case_sensitive);
        return (fold_case(pathname, case_sensitive) == expected).then(Params::new);
    }

    if let Some(pattern) = node.pattern() {
        if let Some(params) = pattern.exec(pathname) {
            return Some(params);
        }
        if !node.has_children() {
            return fallback_exact(node, pathname);
        }
        let deep = node
            .deep_pattern(tree.adapter())
            .and_then(|deep| deep.exec(pathname));
        if let Some(mut params) = deep {
            params.remove(SPLAT_KEY);
            return Some(params);
        }
        return fallback_descendant(node, pathname);
    }

    if node.has_children() {
        fallback_exact(node, pathname).or_else(|| fallback_descendant(node, pathname))
    } else {
        fallback_exact(node, pathname)
    }
}

/// `pathname == full_path`, compared segment-wise so dynamic segments bind.
fn fallback_exact(node: &CompiledRoute, pathname: &str) -> Option<Params> {
    let case_sensitive = node.is_case_sensitive();
    match PathTemplate::parse(node.full_path()) {
        Ok(template) => template.captures(pathname, case_sensitive),
        Err(_) => {
            let full = fold_case(node.full_path(), case_sensitive);
            (fold_case(pathname, case_sensitive) == full).then(Params::new)
        }
    }
}

/// `pathname == full_path || pathname.starts_with(full_path + "/")`,
/// compared segment-wise.
fn fallback_descendant(node: &CompiledRoute, pathname: &str) -> Option<Params> {
    let case_sensitive = node.is_case_sensitive();
    let full_path = node.full_path();
    let prefix = if full_path == "/" {
        "/*".to_string()
    } else {
        format!("{}/*", full_path)
    };

    match PathTemplate::parse(&prefix) {
        Ok(template) => template.captures(pathname, case_sensitive).map(|mut params| {
            params.remove(SPLAT_KEY);
            params
        }),
        Err(_) => {
            let path = fold_case(pathname, case_sensitive);
            let full = fold_case(full_path, case_sensitive);
            let boundary = if full == "/" { full.clone() } else { format!("{}/", full) };
            (path == full || path.starts_with(&boundary)).then(Params::new)
        }
    }
}

/// Test `pathname` against a standalone pattern.
///
/// The adapter is tried first; without it only exact paths and trailing
/// `/*` prefixes are recognized, and no parameters are extracted. Literal
/// segments compare case-sensitively on both paths.
pub fn match_pattern(adapter: &dyn PathPatternAdapter, pattern: &str, pathname: &str) -> Option<PathMatch> {
    if let Some(params) = adapter.compile(pattern, true).and_then(|m| m.exec(pathname)) {
        return Some(PathMatch {
            params,
            pathname: pathname.to_string(),
            pattern: pattern.to_string(),
        });
    }

    let wildcard = pattern.ends_with("/*");
    let target = pattern.strip_suffix("/*").unwrap_or(pattern);
    let matched = pathname == target || (wildcard && pathname.starts_with(&format!("{}/", target)));
    matched.then(|| PathMatch {
        params: Params::new(),
        pathname: pathname.to_string(),
        pattern: pattern.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::compiler::{RouteCompiler, RouteDefinition};
    use crate::routing::pattern::{SegmentPatterns, StringFallback};

    fn trees(routes: &[RouteDefinition]) -> Vec<CompiledRouteTree> {
        vec![
            RouteCompiler::new(Arc::new(SegmentPatterns)).compile(routes).unwrap(),
            RouteCompiler::new(Arc::new(StringFallback)).compile(routes).unwrap(),
        ]
    }

    fn paths(stack: &MatchStack) -> Vec<&str> {
        stack.iter().map(|m| m.route().full_path()).collect()
    }

    #[test]
    fn test_nested_param_match() {
        let routes = vec![RouteDefinition::new("users").children(vec![
            RouteDefinition::index(),
            RouteDefinition::new(":id"),
        ])];
        for tree in trees(&routes) {
            let stack = tree.match_path("/users/42").unwrap();
            assert_eq!(stack.len(), 2);
            assert_eq!(paths(&stack), vec!["/users", "/users/:id"]);
            assert_eq!(stack.leaf().unwrap().params().get("id").map(String::as_str), Some("42"));
            assert!(stack.get(0).unwrap().params().is_empty());

            let index = tree.match_path("/users").unwrap();
            assert!(index.leaf().unwrap().route().is_index());
        }
    }

    #[test]
    fn test_sibling_order_governs_precedence() {
        let param_first = vec![RouteDefinition::new("users/:id"), RouteDefinition::new("users/new")];
        for tree in trees(&param_first) {
            let stack = tree.match_path("/users/new").unwrap();
            assert_eq!(paths(&stack), vec!["/users/:id"]);
            assert_eq!(stack.params().get("id").map(String::as_str), Some("new"));
        }

        let literal_first = vec![RouteDefinition::new("users/new"), RouteDefinition::new("users/:id")];
        for tree in trees(&literal_first) {
            let stack = tree.match_path("/users/new").unwrap();
            assert_eq!(paths(&stack), vec!["/users/new"]);
            assert!(stack.params().is_empty());
        }
    }

    #[test]
    fn test_wildcard_catches_remainder() {
        let routes = vec![
            RouteDefinition::new("about"),
            RouteDefinition::new("*").element("not-found"),
        ];
        for tree in trees(&routes) {
            assert_eq!(paths(&tree.match_path("/about").unwrap()), vec!["/about"]);
            let stack = tree.match_path("/no/such/page").unwrap();
            assert_eq!(stack.leaf().unwrap().params().get(SPLAT_KEY).map(String::as_str), Some("no/such/page"));
        }
    }

    #[test]
    fn test_failed_descent_tries_next_sibling() {
        let routes = vec![
            RouteDefinition::new("users").children(vec![RouteDefinition::new(":id")]),
            RouteDefinition::new("users/*").element("users-fallback"),
        ];
        for tree in trees(&routes) {
            let stack = tree.match_path("/users/42/edit").unwrap();
            assert_eq!(paths(&stack), vec!["/users/*"]);
            assert_eq!(stack.params().get(SPLAT_KEY).map(String::as_str), Some("42/edit"));
        }
    }

    #[test]
    fn test_deep_splat_is_stripped() {
        let routes = vec![RouteDefinition::new("teams/:team").children(vec![
            RouteDefinition::new("members/:member"),
        ])];
        for tree in trees(&routes) {
            let stack = tree.match_path("/teams/core/members/ada").unwrap();
            let parent = stack.get(0).unwrap().params();
            assert_eq!(parent.get("team").map(String::as_str), Some("core"));
            assert!(!parent.contains_key(SPLAT_KEY));
            assert_eq!(
                stack.params().get("member").map(String::as_str),
                Some("ada")
            );
        }
    }

    #[test]
    fn test_case_sensitivity() {
        let routes = vec![
            RouteDefinition::new("Strict").case_sensitive(true),
            RouteDefinition::new("Loose"),
        ];
        for tree in trees(&routes) {
            assert!(tree.match_path("/strict").is_none());
            assert!(tree.match_path("/Strict").is_some());
            assert!(tree.match_path("/LOOSE").is_some());
        }
    }

    #[test]
    fn test_no_match() {
        let routes = vec![RouteDefinition::new("a"), RouteDefinition::new("b")];
        for tree in trees(&routes) {
            assert!(tree.match_path("/c").is_none());
        }
    }

    #[test]
    fn test_render_cursor_skips_layoutless_nodes() {
        let routes = vec![RouteDefinition::new("/").children(vec![
            RouteDefinition::new("docs").element("docs"),
        ])];
        let tree = RouteCompiler::new(Arc::new(SegmentPatterns)).compile(&routes).unwrap();
        let stack = tree.match_path("/docs").unwrap();
        let (cursor, element) = stack.cursor().element().unwrap();
        assert_eq!(element, "docs");
        assert_eq!(cursor.index(), 1);
        assert!(cursor.outlet().current().is_none());
    }

    #[test]
    fn test_match_pattern_standalone() {
        let found = match_pattern(&SegmentPatterns, "/users/:id", "/users/9").unwrap();
        assert_eq!(found.params.get("id").map(String::as_str), Some("9"));

        let fallback = match_pattern(&StringFallback, "/users/*", "/users/9").unwrap();
        assert!(fallback.params.is_empty());
        assert!(match_pattern(&StringFallback, "/users", "/users/9").is_none());
    }

    #[test]
    fn test_match_pattern_case_sensitive() {
        assert!(match_pattern(&SegmentPatterns, "/users/:id", "/Users/9").is_none());
        let found = match_pattern(&SegmentPatterns, "/Users/:id", "/Users/AbC").unwrap();
        assert_eq!(found.params.get("id").map(String::as_str), Some("AbC"));
        assert!(match_pattern(&StringFallback, "/users/*", "/Users/9").is_none());
    }

    #[test]
    fn test_serialized_stack() {
        let routes = vec![RouteDefinition::new("users/:id").element("user")];
        let tree = RouteCompiler::new(Arc::new(SegmentPatterns)).compile(&routes).unwrap();
        let json = serde_json::to_value(tree.match_path("/users/3").unwrap()).unwrap();
        assert_eq!(json[0]["full_path"], "/users/:id");
        assert_eq!(json[0]["params"]["id"], "3");
        assert_eq!(json[0]["element"], "user");
    }
}
