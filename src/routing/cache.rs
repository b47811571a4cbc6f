//! Identity cache for compiled route trees.
//!
//! A route table is shared as an `Arc`; as long as the caller keeps handing
//! back the same `Arc`, the compiled tree is reused. Any new table, even one
//! with identical content, is compiled afresh.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::routing::compiler::{CompileError, CompiledRouteTree, RouteCompiler, RouteDefinition};

/// Shared, immutable route table.
pub type RouteTable = Arc<Vec<RouteDefinition>>;

#[derive(Debug)]
struct CacheEntry {
    source: RouteTable,
    tree: Arc<CompiledRouteTree>,
}

/// Compiles route tables once per identity.
#[derive(Debug)]
pub struct RouteTreeCache {
    compiler: RouteCompiler,
    entry: ArcSwapOption<CacheEntry>,
}

impl RouteTreeCache {
    pub fn new(compiler: RouteCompiler) -> Self {
        Self {
            compiler,
            entry: ArcSwapOption::empty(),
        }
    }

    pub fn compiler(&self) -> &RouteCompiler {
        &self.compiler
    }

    /// Return the cached tree for `routes`, compiling on identity change.
    pub fn get_or_compile(&self, routes: &RouteTable) -> Result<Arc<CompiledRouteTree>, CompileError> {
        if let Some(entry) = self.entry.load_full() {
            if Arc::ptr_eq(&entry.source, routes) {
                return Ok(entry.tree.clone());
            }
        }

        let tree = Arc::new(self.compiler.compile(routes)?);
        self.entry.store(Some(Arc::new(CacheEntry {
            source: routes.clone(),
            tree: tree.clone(),
        })));
        Ok(tree)
    }
}
