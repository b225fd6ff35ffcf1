//! Document placement command.

use clap::Args;

use crate::output::{self, OutputFormat};
use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::types::id::{DataroomFolderId, DataroomId, DocumentId, UserId};
use dataroom_service::RequestContext;

use super::Services;

/// Arguments for the add-document command
#[derive(Debug, Args)]
pub struct AddDocumentArgs {
    /// Dataroom ID
    pub dataroom: DataroomId,
    /// Team document ID
    pub document: DocumentId,
    /// Dataroom folder (omit for the root)
    #[arg(long)]
    pub folder: Option<DataroomFolderId>,
    /// User to attribute the change to
    #[arg(long)]
    pub user: Option<UserId>,
}

/// Execute the add-document command
pub async fn execute(
    args: &AddDocumentArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = Services::connect(config).await?;
    let actor = match args.user {
        Some(user) => RequestContext::user(user),
        None => RequestContext::system(),
    };

    let placement = services
        .placements
        .add_document(args.dataroom, args.document, args.folder, &actor)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&placement),
        OutputFormat::Table => output::print_success(&format!(
            "Document '{}' placed (id: {})",
            placement.document_name, placement.id
        )),
    }
    Ok(())
}
