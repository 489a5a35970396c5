//! Dependency resolution over the loaded plugin set.
//!
//! Passes run in a fixed order: `requires` (loading more plugins),
//! `needs`, `depends` (dropping plugins) and finally `conflicts`.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::dependency::DependencyKind;
use crate::error::{PluginError, PluginResult};
use crate::registry::PluginRegistry;

/// Validates and completes the registry.
///
/// On error the registry may contain plugins loaded along the way; the
/// caller is expected to unload it.
pub async fn resolve(registry: &mut PluginRegistry) -> PluginResult<()> {
    let mut required = load_requirements(registry).await?;
    check_needs(registry, &mut required)?;
    drop_unmet_depends(registry, &required).await?;
    check_conflicts(registry)?;

    debug!(plugins = ?registry.names(), "Plugin dependencies resolved");
    Ok(())
}

/// Loads every required plugin, including those required by plugins
/// loaded in this pass. Returns the names that something requires.
async fn load_requirements(registry: &mut PluginRegistry) -> PluginResult<HashSet<String>> {
    let mut required = HashSet::new();
    let mut index = 0;

    // The registry grows while it is walked.
    while index < registry.len() {
        let plugin = &registry.plugins()[index];
        let requirer = plugin.name().to_string();
        let targets = plugin.dependencies().get(DependencyKind::Requires).to_vec();

        for target in targets {
            match registry.load(&target).await {
                Ok(position) => {
                    let loaded = registry.plugins()[position].name().to_string();
                    debug!(plugin = %requirer, requires = %loaded, "Requirement satisfied");
                    required.insert(loaded);
                }
                Err(e) => {
                    warn!(plugin = %requirer, requires = %target, error = %e, "Requirement could not be loaded");
                    return Err(PluginError::Dependency(format!(
                        "'{requirer}' requires '{target}' which could not be loaded"
                    )));
                }
            }
        }

        index += 1;
    }

    Ok(required)
}

/// Every needed plugin must already be present. Needed plugins count as
/// required for the `depends` pass.
fn check_needs(registry: &PluginRegistry, required: &mut HashSet<String>) -> PluginResult<()> {
    for plugin in registry.plugins() {
        for target in plugin.dependencies().get(DependencyKind::Needs) {
            if !registry.contains(target) {
                return Err(PluginError::Dependency(format!(
                    "'{}' needs '{}' which is not loaded",
                    plugin.name(),
                    target
                )));
            }
            required.insert(target.clone());
        }
    }

    Ok(())
}

/// Drops plugins whose `depends` targets are missing.
///
/// The walk is single-pass: a plugin dropped here also fails the check of
/// any later plugin depending on it, but plugins already checked are not
/// revisited.
async fn drop_unmet_depends(
    registry: &mut PluginRegistry,
    required: &HashSet<String>,
) -> PluginResult<()> {
    let mut index = 0;

    while index < registry.len() {
        let plugin = &registry.plugins()[index];
        let missing = plugin
            .dependencies()
            .get(DependencyKind::Depends)
            .iter()
            .find(|target| !registry.contains(target))
            .cloned();

        let Some(target) = missing else {
            index += 1;
            continue;
        };

        if required.contains(plugin.name()) {
            return Err(PluginError::Dependency(format!(
                "'{}' is required by some other plugin but depends on '{}' which is not loaded",
                plugin.name(),
                target
            )));
        }

        info!(plugin = %plugin.name(), depends = %target, "Dropping plugin with unmet dependency");
        registry.remove(index).close().await;
    }

    Ok(())
}

/// No two loaded plugins may conflict. A plugin listing itself is ignored.
fn check_conflicts(registry: &PluginRegistry) -> PluginResult<()> {
    for plugin in registry.plugins() {
        for target in plugin.dependencies().get(DependencyKind::Conflicts) {
            if target != plugin.name() && registry.contains(target) {
                return Err(PluginError::Dependency(format!(
                    "'{}' and '{}' cannot be loaded at the same time",
                    plugin.name(),
                    target
                )));
            }
        }
    }

    Ok(())
}
