use std::collections::HashSet;

use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Name of the relation that embeds the contact in each relationship row.
pub const CONTACT_RELATION: &str = "contact_by_contact_id";

/// A contact as returned by the server. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub skype: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContactRecord {
    pub fn new(id: i64, first_name: &str, last_name: &str) -> Self {
        Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            image_url: None,
            twitter: None,
            skype: None,
            notes: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// The contact group being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: i64,
}

impl GroupRecord {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a `contact_group_relationship` listing with the contact relation
/// expanded, keeping the first row seen for every contact id.
///
/// Any row that cannot be read fails the whole batch.
pub fn parse_relationship_rows(payload: &Value) -> Result<Vec<ContactRecord>, ApiError> {
    let rows = payload
        .get("resource")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::malformed("response has no `resource` array"))?;

    let mut seen = HashSet::new();
    let mut contacts = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let nested = row
            .get(CONTACT_RELATION)
            .filter(|value| value.is_object())
            .ok_or_else(|| {
                ApiError::malformed(format!("row {index} has no `{CONTACT_RELATION}` object"))
            })?;

        let contact = ContactRecord::deserialize(nested)
            .map_err(|e| ApiError::malformed(format!("row {index}: {e}")))?;

        // several relationship rows may point at the same contact
        if !seen.insert(contact.id) {
            continue;
        }
        contacts.push(contact);
    }

    Ok(contacts)
}
