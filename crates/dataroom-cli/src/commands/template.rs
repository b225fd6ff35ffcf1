//! Dataroom template commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::types::id::{DataroomId, TeamId};
use dataroom_entity::template::{TemplateFolder, builtin_template, builtin_templates};

use super::Services;

/// Arguments for template commands
#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Template subcommand
    #[command(subcommand)]
    pub command: TemplateCommand,
}

/// Template subcommands
#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// List built-in templates
    List,
    /// Add a template's folders to an existing dataroom
    Apply {
        /// Dataroom ID
        dataroom: DataroomId,
        /// Template key
        key: String,
    },
    /// Create a new dataroom from a template
    Create {
        /// Owning team
        #[arg(long)]
        team: TeamId,
        /// Dataroom name
        #[arg(long)]
        name: String,
        /// Template key
        key: String,
    },
}

/// Template display row
#[derive(Debug, Serialize, Tabled)]
struct TemplateRow {
    /// Lookup key
    key: String,
    /// Display name
    name: String,
    /// Root folders
    root_folders: usize,
    /// All folders
    total_folders: usize,
}

/// Execute template commands
pub async fn execute(
    args: &TemplateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        TemplateCommand::List => {
            let rows: Vec<TemplateRow> = builtin_templates()
                .into_iter()
                .map(|t| TemplateRow {
                    key: t.key.to_string(),
                    name: t.name.to_string(),
                    root_folders: t.folders.len(),
                    total_folders: t.folders.iter().map(TemplateFolder::folder_count).sum(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        TemplateCommand::Apply { dataroom, key } => {
            let template = builtin_template(key)
                .ok_or_else(|| AppError::validation(format!("Unknown template '{key}'")))?;
            let services = Services::connect(config).await?;
            let ids = services
                .copies
                .apply_template(*dataroom, &template.folders)
                .await?;
            output::print_success(&format!(
                "Template '{}' applied, {} folder(s) created",
                template.key,
                ids.len()
            ));
        }
        TemplateCommand::Create { team, name, key } => {
            let services = Services::connect(config).await?;
            let id = services.copies.create_from_template(*team, name, key).await?;
            output::print_success(&format!("Dataroom created from template (id: {id})"));
        }
    }

    Ok(())
}
