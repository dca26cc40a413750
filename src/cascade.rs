//! Server-side removal of a contact and everything that references it.
//!
//! Stages run strictly in [`DeleteStage::ORDER`]; each starts only after the
//! previous one succeeded, and the first failure ends the cascade. Completed
//! stages are not rolled back.

use crate::error::{ApiError, DeleteError, DeleteStage};
use crate::remote::{Method, RemoteClient, RestRequest, Session};

pub const RELATIONSHIP_TABLE: &str = "contact_group_relationship";
pub const CONTACT_INFO_TABLE: &str = "contact_info";
pub const CONTACT_TABLE: &str = "contact";

/// Build the authorized request for one stage of the cascade.
pub fn stage_request(
    session: &Session,
    stage: DeleteStage,
    contact_id: i64,
) -> Result<RestRequest, ApiError> {
    let request = match stage {
        DeleteStage::Relationships => {
            RestRequest::new(Method::Delete, session.table_url(RELATIONSHIP_TABLE))
                .query("filter", format!("contact_id={contact_id}"))
        }
        DeleteStage::ContactInfo => {
            RestRequest::new(Method::Delete, session.table_url(CONTACT_INFO_TABLE))
                .query("filter", format!("contact_id={contact_id}"))
        }
        DeleteStage::ImageFolder => {
            // force removes the folder together with its files
            RestRequest::new(Method::Delete, session.folder_url(contact_id)).query("force", "true")
        }
        DeleteStage::Contact => RestRequest::new(Method::Delete, session.table_url(CONTACT_TABLE))
            .query("ids", contact_id.to_string()),
    };
    session.authorize(request)
}

/// Delete all server-side state of a contact.
pub async fn delete_contact<R: RemoteClient>(
    remote: &R,
    session: &Session,
    contact_id: i64,
) -> Result<(), DeleteError> {
    for stage in DeleteStage::ORDER {
        run_stage(remote, session, stage, contact_id)
            .await
            .map_err(|source| {
                log::warn!("deleting contact {contact_id}: {stage} failed: {source}");
                DeleteError {
                    contact_id,
                    stage,
                    source,
                }
            })?;
    }

    log::info!("contact {contact_id} deleted");
    Ok(())
}

async fn run_stage<R: RemoteClient>(
    remote: &R,
    session: &Session,
    stage: DeleteStage,
    contact_id: i64,
) -> Result<(), ApiError> {
    let request = stage_request(session, stage, contact_id)?;
    log::debug!("contact {contact_id}: {stage} -> {}", request.url);
    remote.request(&request).await?;
    Ok(())
}
