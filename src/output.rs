//! Table and JSON output for `--check`.

use serde::Serialize;
use tabled::{Table, Tabled};

use vlock_plugin::{DependencyKind, Plugin};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One plugin in dispatch order.
#[derive(Debug, Serialize, Tabled)]
pub struct PluginRow {
    /// Position in `vlock_start` order, from 1.
    #[tabled(rename = "#")]
    pub position: usize,
    /// Plugin name.
    #[tabled(rename = "Plugin")]
    pub name: String,
    /// Module or script.
    #[tabled(rename = "Kind")]
    pub variant: String,
    /// Declared relations, e.g. `requires: all`.
    #[tabled(rename = "Dependencies")]
    pub dependencies: String,
}

impl PluginRow {
    /// Describes the plugin at `index`.
    pub fn new(index: usize, plugin: &Plugin) -> Self {
        let dependencies = DependencyKind::ALL
            .iter()
            .filter_map(|kind| {
                let names = plugin.dependencies().get(*kind);
                (!names.is_empty()).then(|| format!("{kind}: {}", names.join(", ")))
            })
            .collect::<Vec<_>>();

        Self {
            position: index + 1,
            name: plugin.name().to_string(),
            variant: plugin.variant().to_string(),
            dependencies: if dependencies.is_empty() {
                "-".to_string()
            } else {
                dependencies.join("; ")
            },
        }
    }
}

/// Rows for `plugins` in the order given.
pub fn plugin_rows(plugins: &[Plugin]) -> Vec<PluginRow> {
    plugins
        .iter()
        .enumerate()
        .map(|(index, plugin)| PluginRow::new(index, plugin))
        .collect()
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No plugins loaded.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}
