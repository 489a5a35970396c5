//! Puts the registry into dispatch order using `succeeds` / `precedes`.

use tracing::debug;

use crate::dependency::DependencyKind;
use crate::error::{PluginError, PluginResult};
use crate::graph::{Edge, tsort};
use crate::registry::PluginRegistry;

/// Precedence edges between loaded plugins.
///
/// Relations naming a plugin that is not loaded produce no edge.
pub fn edges(registry: &PluginRegistry) -> Vec<Edge<String>> {
    let mut edges = Vec::new();

    for plugin in registry.plugins() {
        let name = plugin.name();
        let deps = plugin.dependencies();

        for target in deps.get(DependencyKind::Succeeds) {
            if registry.contains(target) {
                edges.push(Edge::new(target.clone(), name.to_string()));
            }
        }

        for target in deps.get(DependencyKind::Precedes) {
            if registry.contains(target) {
                edges.push(Edge::new(name.to_string(), target.clone()));
            }
        }
    }

    edges
}

/// Sorts the registry. A cycle leaves the registry untouched and reports
/// every constraint that could not be satisfied.
pub fn sort(registry: &mut PluginRegistry) -> PluginResult<()> {
    let names = registry.names();
    let edges = edges(registry);

    match tsort(&names, &edges) {
        Ok(order) => {
            debug!(order = ?order, "Plugins sorted");
            registry.reorder(&order);
            Ok(())
        }
        Err(residual) => {
            let details: String = residual.iter().map(|edge| format!("\n\t{edge}")).collect();
            Err(PluginError::Dependency(format!(
                "circular dependencies detected:{details}"
            )))
        }
    }
}
