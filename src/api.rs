use crate::cascade::RELATIONSHIP_TABLE;
use crate::error::ApiError;
use crate::model::{parse_relationship_rows, ContactRecord, CONTACT_RELATION};
use crate::remote::{Method, RemoteClient, RestRequest, Session};

/// Relationship rows of one group with the referenced contacts expanded.
pub fn group_contacts_request(session: &Session, group_id: i64) -> Result<RestRequest, ApiError> {
    let request = RestRequest::new(Method::Get, session.table_url(RELATIONSHIP_TABLE))
        .query("filter", format!("contact_group_id={group_id}"))
        .query("related", CONTACT_RELATION);
    session.authorize(request)
}

/// Fetch every contact in a group, one record per contact id.
pub async fn fetch_group_contacts<R: RemoteClient>(
    remote: &R,
    session: &Session,
    group_id: i64,
) -> Result<Vec<ContactRecord>, ApiError> {
    let request = group_contacts_request(session, group_id)?;

    let payload = remote.request(&request).await.map_err(|e| {
        match &e {
            ApiError::InvalidRelationship { message } => log::error!(
                "table names in relational calls are case sensitive: {message}"
            ),
            other => log::error!("error getting contacts for group {group_id}: {other}"),
        }
        e
    })?;

    let contacts = parse_relationship_rows(&payload)?;
    log::debug!("group {group_id}: {} contacts", contacts.len());
    Ok(contacts)
}
