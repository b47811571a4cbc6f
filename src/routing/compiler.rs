//! Route tree compilation.
//!
//! # Responsibilities
//! - Resolve every node's absolute, normalized path
//! - Attach adapter-backed patterns to non-index nodes
//! - Link children to parents (weak back-references)
//! - Reject malformed trees before any matching happens
//!
//! # Design Decisions
//! - Compiled trees are immutable; the only interior state is the lazily
//!   built deep pattern of intermediate nodes
//! - Route ids come from a generator owned by the compiler, so two
//!   compilers never share id space
//! - A parameter bound twice along one branch is a compile error, not a
//!   silent shadow

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::path::{self, join_paths, normalize};
use crate::routing::pattern::{PathMatcher, PathPatternAdapter, PathTemplate, TemplateError};

/// Author-supplied route node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDefinition {
    /// Path relative to the parent, or absolute when it starts with `/`.
    pub path: Option<String>,

    /// Matches the parent's path exactly. Must not carry a path or children.
    pub index: bool,

    /// Compare literals case-sensitively.
    pub case_sensitive: bool,

    /// Opaque view identifier handed to the rendering layer.
    pub element: Option<String>,

    /// Redirect target applied when this node is the deepest match.
    pub redirect_to: Option<String>,

    /// Nested routes, in precedence order.
    pub children: Vec<RouteDefinition>,
}

impl RouteDefinition {
    /// A route at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// An index route.
    pub fn index() -> Self {
        Self {
            index: true,
            ..Self::default()
        }
    }

    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect_to = Some(target.into());
        self
    }

    pub fn children(mut self, children: Vec<RouteDefinition>) -> Self {
        self.children = children;
        self
    }
}

/// Identifier of a compiled route, unique per compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteId(pub u64);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Monotonic route id source.
#[derive(Debug)]
pub struct RouteIdGenerator {
    next: AtomicU64,
}

impl RouteIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> RouteId {
        RouteId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RouteIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that make a route tree uncompilable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Index routes inherit their parent's path and cannot declare one.
    #[error("index route under `{parent}` declares path `{path}`")]
    IndexWithPath { parent: String, path: String },

    /// Index routes are leaves.
    #[error("index route at `{full_path}` has children")]
    IndexWithChildren { full_path: String },

    /// The resolved path is not a valid template.
    #[error("invalid route path `{full_path}`: {source}")]
    InvalidTemplate {
        full_path: String,
        #[source]
        source: TemplateError,
    },

    /// A descendant rebinds a parameter an ancestor already binds.
    #[error("parameter `{name}` is redefined at `{full_path}`")]
    ParamCollision { name: String, full_path: String },
}

/// A route after compilation.
#[derive(Debug)]
pub struct CompiledRoute {
    id: RouteId,
    full_path: String,
    index: bool,
    case_sensitive: bool,
    wildcard: bool,
    element: Option<String>,
    redirect_to: Option<String>,
    pattern: Option<Box<dyn PathMatcher>>,
    deep_pattern: OnceLock<Option<Box<dyn PathMatcher>>>,
    parent: Weak<CompiledRoute>,
    children: Vec<Arc<CompiledRoute>>,
}

impl CompiledRoute {
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Absolute, normalized path.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn is_index(&self) -> bool {
        self.index
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// True for nodes whose own path ends in a capture-all splat.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    pub fn pattern(&self) -> Option<&dyn PathMatcher> {
        self.pattern.as_deref()
    }

    /// The parent route, if this is not a root and the tree is still alive.
    pub fn parent(&self) -> Option<Arc<CompiledRoute>> {
        self.parent.upgrade()
    }

    pub fn children(&self) -> &[Arc<CompiledRoute>] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Deep variant of the pattern (`full_path` + `/*`), compiled on first use.
    pub(crate) fn deep_pattern(&self, adapter: &dyn PathPatternAdapter) -> Option<&dyn PathMatcher> {
        self.deep_pattern
            .get_or_init(|| {
                let source = if self.full_path == "/" {
                    "/*".to_string()
                } else {
                    format!("{}/*", self.full_path)
                };
                adapter.compile(&source, self.case_sensitive)
            })
            .as_deref()
    }
}

/// The immutable output of [`RouteCompiler::compile`].
#[derive(Debug)]
pub struct CompiledRouteTree {
    roots: Vec<Arc<CompiledRoute>>,
    adapter: Arc<dyn PathPatternAdapter>,
}

impl CompiledRouteTree {
    /// Top-level routes in declaration order.
    pub fn roots(&self) -> &[Arc<CompiledRoute>] {
        &self.roots
    }

    /// The adapter the tree was compiled with.
    pub fn adapter(&self) -> &dyn PathPatternAdapter {
        self.adapter.as_ref()
    }

    /// All routes in depth-first pre-order.
    pub fn routes(&self) -> Vec<Arc<CompiledRoute>> {
        fn visit(nodes: &[Arc<CompiledRoute>], out: &mut Vec<Arc<CompiledRoute>>) {
            for node in nodes {
                out.push(node.clone());
                visit(node.children(), out);
            }
        }
        let mut out = Vec::new();
        visit(&self.roots, &mut out);
        out
    }

    pub fn find(&self, id: RouteId) -> Option<Arc<CompiledRoute>> {
        self.routes().into_iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.routes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Compiles route definitions into a [`CompiledRouteTree`].
#[derive(Debug)]
pub struct RouteCompiler {
    adapter: Arc<dyn PathPatternAdapter>,
    ids: RouteIdGenerator,
}

impl RouteCompiler {
    pub fn new(adapter: Arc<dyn PathPatternAdapter>) -> Self {
        Self {
            adapter,
            ids: RouteIdGenerator::new(),
        }
    }

    pub fn adapter(&self) -> &Arc<dyn PathPatternAdapter> {
        &self.adapter
    }

    /// Compile a route tree. Fails on the first definition error.
    pub fn compile(&self, routes: &[RouteDefinition]) -> Result<CompiledRouteTree, CompileError> {
        if let Some(err) = check_definitions(routes).into_iter().next() {
            return Err(err);
        }

        let roots: Vec<_> = routes
            .iter()
            .map(|def| self.build_node(def, Weak::new(), "/"))
            .collect();

        let tree = CompiledRouteTree {
            roots,
            adapter: self.adapter.clone(),
        };

        metrics::record_compilation(tree.len());
        tracing::debug!(
            routes = tree.len(),
            adapter = self.adapter.name(),
            "Compiled route tree"
        );
        Ok(tree)
    }

    fn build_node(&self, def: &RouteDefinition, parent: Weak<CompiledRoute>, parent_path: &str) -> Arc<CompiledRoute> {
        let full_path = resolve_full_path(def, parent_path);
        let pattern = if def.index {
            None
        } else {
            self.adapter.compile(&full_path, def.case_sensitive)
        };
        let wildcard = !def.index && full_path.ends_with("/*");
        let id = self.ids.next_id();

        Arc::new_cyclic(|me| CompiledRoute {
            children: def
                .children
                .iter()
                .map(|child| self.build_node(child, me.clone(), &full_path))
                .collect(),
            id,
            full_path: full_path.clone(),
            index: def.index,
            case_sensitive: def.case_sensitive,
            wildcard,
            element: def.element.clone(),
            redirect_to: def.redirect_to.clone(),
            pattern,
            deep_pattern: OnceLock::new(),
            parent,
        })
    }
}

/// Absolute path of `def` given its parent's normalized path.
fn resolve_full_path(def: &RouteDefinition, parent_path: &str) -> String {
    if def.index {
        return normalize(parent_path);
    }
    let own = def.path.as_deref().unwrap_or("");
    if own.starts_with('/') {
        normalize(own)
    } else {
        join_paths(parent_path, own)
    }
}

/// Parameter names a node binds itself. Segments the node repeats verbatim
/// from its parent's path are inherited, not rebound.
fn own_param_names(full_path: &str, parent_path: &str) -> Vec<String> {
    let full = path::segments(full_path);
    let parent = path::segments(parent_path);
    let own = if full.starts_with(&parent) {
        &full[parent.len()..]
    } else {
        &full[..]
    };
    own.iter()
        .filter_map(|segment| segment.strip_prefix(':'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collect every definition error in the tree.
pub fn check_definitions(routes: &[RouteDefinition]) -> Vec<CompileError> {
    fn visit(
        routes: &[RouteDefinition],
        parent_path: &str,
        bound: &BTreeSet<String>,
        errors: &mut Vec<CompileError>,
    ) {
        for def in routes {
            let full_path = resolve_full_path(def, parent_path);
            let mut scope = bound.clone();
            if def.index {
                if let Some(path) = &def.path {
                    errors.push(CompileError::IndexWithPath {
                        parent: full_path.clone(),
                        path: path.clone(),
                    });
                }
                if !def.children.is_empty() {
                    errors.push(CompileError::IndexWithChildren {
                        full_path: full_path.clone(),
                    });
                }
            } else {
                let own = own_param_names(&full_path, parent_path);
                match PathTemplate::parse(&full_path) {
                    Ok(_) => {
                        // Absolute children restate their whole path, so a
                        // rebinding there never shows up as a duplicate
                        // inside one template.
                        if let Some(name) = own.iter().find(|name| bound.contains(*name)) {
                            errors.push(CompileError::ParamCollision {
                                name: name.clone(),
                                full_path: full_path.clone(),
                            });
                        }
                    }
                    Err(TemplateError::DuplicateParam { name, .. }) => {
                        errors.push(CompileError::ParamCollision {
                            name,
                            full_path: full_path.clone(),
                        });
                    }
                    Err(source) => {
                        errors.push(CompileError::InvalidTemplate {
                            full_path: full_path.clone(),
                            source,
                        });
                    }
                }
                scope.extend(own);
            }
            visit(&def.children, &full_path, &scope, errors);
        }
    }

    let mut errors = Vec::new();
    visit(routes, "/", &BTreeSet::new(), &mut errors);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern::{SegmentPatterns, StringFallback};

    fn compiler() -> RouteCompiler {
        RouteCompiler::new(Arc::new(SegmentPatterns))
    }

    fn sample() -> Vec<RouteDefinition> {
        vec![
            RouteDefinition::new("/").element("layout").children(vec![
                RouteDefinition::index().element("home"),
                RouteDefinition::new("users/").element("users").children(vec![
                    RouteDefinition::index().element("user-list"),
                    RouteDefinition::new(":id").element("user-detail"),
                ]),
                RouteDefinition::new("/about").element("about"),
            ]),
            RouteDefinition::new("*").element("not-found"),
        ]
    }

    #[test]
    fn test_full_paths() {
        let tree = compiler().compile(&sample()).unwrap();
        let paths: Vec<String> = tree.routes().iter().map(|r| r.full_path().to_string()).collect();
        assert_eq!(
            paths,
            vec!["/", "/", "/users", "/users", "/users/:id", "/about", "/*"]
        );
    }

    #[test]
    fn test_index_routes_have_no_pattern() {
        let tree = compiler().compile(&sample()).unwrap();
        for route in tree.routes() {
            assert_eq!(route.pattern().is_none(), route.is_index());
        }
    }

    #[test]
    fn test_ids_unique_and_parents_linked() {
        let tree = compiler().compile(&sample()).unwrap();
        let routes = tree.routes();
        let mut ids: Vec<RouteId> = routes.iter().map(|r| r.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), routes.len());

        let users = &tree.roots()[0].children()[1];
        let detail = &users.children()[1];
        assert_eq!(detail.parent().unwrap().id(), users.id());
        assert!(tree.roots()[0].parent().is_none());
        assert_eq!(tree.find(detail.id()).unwrap().full_path(), "/users/:id");
    }

    #[test]
    fn test_separate_compilers_do_not_share_ids() {
        let a = compiler().compile(&sample()).unwrap();
        let b = compiler().compile(&sample()).unwrap();
        assert_eq!(a.roots()[0].id(), b.roots()[0].id());

        let shared = compiler();
        let first = shared.compile(&sample()).unwrap();
        let second = shared.compile(&sample()).unwrap();
        assert_ne!(first.roots()[0].id(), second.roots()[0].id());
    }

    #[test]
    fn test_wildcard_flag() {
        let tree = compiler().compile(&sample()).unwrap();
        assert!(tree.roots()[1].is_wildcard());
        assert!(!tree.roots()[0].is_wildcard());
    }

    #[test]
    fn test_fallback_adapter_compiles_without_patterns() {
        let tree = RouteCompiler::new(Arc::new(StringFallback)).compile(&sample()).unwrap();
        assert!(tree.routes().iter().all(|r| r.pattern().is_none()));
    }

    #[test]
    fn test_index_errors() {
        let mut bad = RouteDefinition::index();
        bad.path = Some("x".into());
        let err = compiler().compile(&[bad]).unwrap_err();
        assert!(matches!(err, CompileError::IndexWithPath { .. }));

        let nested = RouteDefinition::index().children(vec![RouteDefinition::new("a")]);
        let err = compiler().compile(&[nested]).unwrap_err();
        assert!(matches!(err, CompileError::IndexWithChildren { .. }));
    }

    #[test]
    fn test_param_collision_rejected() {
        let routes = vec![RouteDefinition::new("users/:id").children(vec![RouteDefinition::new(":id")])];
        let err = compiler().compile(&routes).unwrap_err();
        assert_eq!(
            err,
            CompileError::ParamCollision {
                name: "id".into(),
                full_path: "/users/:id/:id".into(),
            }
        );
    }

    #[test]
    fn test_absolute_child_rebinding_ancestor_param_rejected() {
        let routes = vec![RouteDefinition::new("teams/:id")
            .children(vec![RouteDefinition::new("/teams/:team/members/:id")])];
        let err = compiler().compile(&routes).unwrap_err();
        assert_eq!(
            err,
            CompileError::ParamCollision {
                name: "id".into(),
                full_path: "/teams/:team/members/:id".into(),
            }
        );
    }

    #[test]
    fn test_absolute_child_restating_parent_prefix_compiles() {
        let routes = vec![RouteDefinition::new("teams/:id").children(vec![
            RouteDefinition::new("/teams/:id/members/:member"),
            RouteDefinition::new("settings").children(vec![RouteDefinition::new("/profile/:section")]),
        ])];
        assert!(check_definitions(&routes).is_empty());
        assert!(compiler().compile(&routes).is_ok());
    }

    #[test]
    fn test_check_definitions_collects_all() {
        let mut bad = RouteDefinition::index();
        bad.path = Some("x".into());
        let routes = vec![bad, RouteDefinition::new("a/:")];
        assert_eq!(check_definitions(&routes).len(), 2);
    }
}
