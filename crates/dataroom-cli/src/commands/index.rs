//! Hierarchical index commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::types::id::DataroomId;
use dataroom_entity::folder::{NodeKind, TreeNode};

use super::Services;

/// Arguments for the reindex command
#[derive(Debug, Args)]
pub struct ReindexArgs {
    /// Dataroom ID
    pub dataroom: DataroomId,
}

/// Arguments for the tree command
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Dataroom ID
    pub dataroom: DataroomId,
}

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Dataroom ID
    pub dataroom: DataroomId,
}

/// Tree display row
#[derive(Debug, Serialize, Tabled)]
struct TreeRow {
    /// Hierarchical index
    index: String,
    /// Indented name
    name: String,
    /// Folder or document
    kind: String,
    /// Folder path
    path: String,
    /// Manual order
    order: String,
    /// Row ID
    id: String,
}

/// Path problem display row
#[derive(Debug, Serialize, Tabled)]
struct ProblemRow {
    /// Row ID
    id: String,
    /// Problem
    problem: String,
    /// Stored value
    stored: String,
    /// Expected value
    expected: String,
}

/// Recompute and store indexes
pub async fn reindex(
    args: &ReindexArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = Services::connect(config).await?;
    let summary = services
        .hierarchy
        .recompute_hierarchical_indexes(args.dataroom)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Table => {
            output::print_success("Hierarchical indexes recomputed.");
            output::print_kv("Folders updated", &summary.folders_updated.to_string());
            output::print_kv("Documents updated", &summary.documents_updated.to_string());
        }
    }
    Ok(())
}

/// Print the tree with fresh indexes
pub async fn tree(args: &TreeArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let services = Services::connect(config).await?;
    let nodes = services.hierarchy.tree(args.dataroom).await?;

    match format {
        OutputFormat::Json => output::print_json(&nodes),
        OutputFormat::Table => output::print_list(&rows(&nodes), format),
    }
    Ok(())
}

/// Report integrity problems
pub async fn check(args: &CheckArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let services = Services::connect(config).await?;
    let report = services.hierarchy.check_integrity(args.dataroom).await?;

    if format == OutputFormat::Json {
        output::print_json(&report);
        return Ok(());
    }

    if report.is_clean() {
        output::print_success("Dataroom tree is consistent.");
        return Ok(());
    }

    output::print_kv("Path problems", &report.path_mismatches.len().to_string());
    output::print_kv("Unreachable rows", &report.unreachable.len().to_string());
    output::print_kv("Stale indexes", &report.stale_indexes.to_string());

    let mut rows: Vec<ProblemRow> = report
        .path_mismatches
        .iter()
        .map(|m| ProblemRow {
            id: m.folder_id.to_string(),
            problem: format!("{:?}", m.problem),
            stored: m.stored.clone(),
            expected: m.expected.clone().unwrap_or_default(),
        })
        .collect();
    rows.extend(report.unreachable.iter().map(|u| ProblemRow {
        id: u.id.to_string(),
        problem: format!("Unreachable {} ({:?})", u.kind, u.reason),
        stored: u.name.clone(),
        expected: String::new(),
    }));
    if !rows.is_empty() {
        output::print_list(&rows, format);
    }
    if report.stale_indexes > 0 {
        output::print_warning("Run `dataroom-cli reindex` to refresh stale indexes.");
    }
    Ok(())
}

/// Indent tree rows by depth.
fn rows(nodes: &[TreeNode]) -> Vec<TreeRow> {
    nodes
        .iter()
        .map(|node| {
            let suffix = if node.kind == NodeKind::Folder { "/" } else { "" };
            TreeRow {
                index: node.hierarchical_index.clone(),
                name: format!("{}{}{suffix}", "  ".repeat(node.depth.saturating_sub(1)), node.name),
                kind: node.kind.to_string(),
                path: node.path.clone().unwrap_or_default(),
                order: node.order_index.map(|o| o.to_string()).unwrap_or_default(),
                id: node.id.to_string(),
            }
        })
        .collect()
}
