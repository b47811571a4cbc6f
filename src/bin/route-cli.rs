use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use vt_router::config::{load_config, RouteFileWatcher, RouterConfig};
use vt_router::host::memory::{MemoryDocument, MemoryHistory};
use vt_router::host::HostCapabilities;
use vt_router::navigation::NavigationTarget;
use vt_router::observability::logging::init_logging;
use vt_router::routing::CompiledRouteTree;
use vt_router::{NavigationOutcome, NavigationRequest, Router};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect and exercise route tables offline", long_about = None)]
struct Cli {
    /// Route file (TOML).
    #[arg(short, long, default_value = "routes.toml")]
    routes: PathBuf,

    /// Origin the in-memory host starts at.
    #[arg(short, long, default_value = "http://localhost/")]
    origin: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiled route tree
    Tree,
    /// Print the match stack for a pathname
    Match { pathname: String },
    /// Navigate through targets (paths or signed deltas) and print each step
    Simulate {
        #[arg(allow_hyphen_values = true)]
        targets: Vec<String>,
    },
    /// Recompile and print the tree whenever the route file changes
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.routes)?;
    init_logging(&config.observability);

    match cli.command {
        Commands::Tree => {
            let router = memory_router(config, &cli.origin)?;
            let tree = router.tree()?;
            print_json(&tree_json(&tree))?;
        }
        Commands::Match { pathname } => {
            let router = memory_router(config, &cli.origin)?;
            let tree = router.tree()?;
            let stack = vt_router::routing::match_routes(&tree, &pathname);
            print_json(&json!({ "pathname": pathname, "matches": stack }))?;
        }
        Commands::Simulate { targets } => {
            let (router, history) = memory_router_with_history(config, &cli.origin)?;
            for target in targets {
                let request = NavigationRequest::new(parse_target(&target));
                let outcome = router.navigate(request)?;
                // Relative motion reports back through pop-state events.
                for event in history.take_events() {
                    if let Some(handle) = router.handle_event(event) {
                        handle.finished().await;
                    }
                }
                let label = outcome.label();
                if let NavigationOutcome::Committed(handle) = outcome {
                    handle.finished().await;
                }
                let location = router.location();
                let matches = router.matches()?;
                print_json(&json!({
                    "target": target,
                    "outcome": label,
                    "location": location.as_ref(),
                    "matches": matches,
                }))?;
            }
        }
        Commands::Watch => {
            let router = memory_router(config, &cli.origin)?;
            let tree = router.tree()?;
            print_json(&tree_json(&tree))?;

            let (watcher, mut updates) = RouteFileWatcher::new(&cli.routes);
            let _watcher = watcher.with_current(router.routes().to_vec()).run()?;
            loop {
                tokio::select! {
                    Some(next) = updates.recv() => {
                        match router.set_routes(next.routes) {
                            Ok(()) => {
                                let tree = router.tree()?;
                                print_json(&tree_json(&tree))?;
                            }
                            Err(e) => eprintln!("Error: {}", e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }

    Ok(())
}

fn parse_target(raw: &str) -> NavigationTarget {
    match raw.parse::<i64>() {
        Ok(delta) => NavigationTarget::Delta(delta),
        Err(_) => NavigationTarget::Path(raw.to_string()),
    }
}

fn memory_router(config: RouterConfig, origin: &str) -> Result<Router, Box<dyn std::error::Error>> {
    Ok(memory_router_with_history(config, origin)?.0)
}

fn memory_router_with_history(
    config: RouterConfig,
    origin: &str,
) -> Result<(Router, Arc<MemoryHistory>), Box<dyn std::error::Error>> {
    let history = Arc::new(MemoryHistory::parse(origin)?);
    let host = HostCapabilities::new(history.clone(), Arc::new(MemoryDocument::new()));
    Ok((Router::new(config, host)?, history))
}

fn tree_json(tree: &CompiledRouteTree) -> Value {
    Value::Array(
        tree.routes()
            .iter()
            .map(|route| {
                json!({
                    "id": route.id(),
                    "full_path": route.full_path(),
                    "index": route.is_index(),
                    "element": route.element(),
                    "redirect_to": route.redirect_to(),
                    "parent": route.parent().map(|p| p.id()),
                })
            })
            .collect(),
    )
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
