//! Alphabetic sections of a contact list.
//!
//! Contacts are bucketed by the uppercased first character of their last
//! name. The map never holds an empty bucket, and the alphabet index is the
//! map's own key order, so the two cannot drift apart.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::ContactRecord;

/// Bucket key for a last name, or `None` when the name is empty.
pub fn section_key(last_name: &str) -> Option<String> {
    last_name
        .chars()
        .next()
        .map(|first| first.to_uppercase().collect())
}

/// Order within a section: last name ignoring case, then first name with
/// case (codepoint order).
pub fn compare_contacts(a: &ContactRecord, b: &ContactRecord) -> Ordering {
    a.last_name
        .to_lowercase()
        .cmp(&b.last_name.to_lowercase())
        .then_with(|| a.first_name.cmp(&b.first_name))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSections {
    buckets: BTreeMap<String, Vec<ContactRecord>>,
}

impl ContactSections {
    /// Group already deduplicated contacts. Contacts with an empty last name
    /// are left out.
    pub fn build(contacts: impl IntoIterator<Item = ContactRecord>) -> Self {
        let mut buckets: BTreeMap<String, Vec<ContactRecord>> = BTreeMap::new();
        for contact in contacts {
            let Some(key) = section_key(&contact.last_name) else {
                continue;
            };
            buckets.entry(key).or_default().push(contact);
        }

        for bucket in buckets.values_mut() {
            // stable, so equal names keep their input order
            bucket.sort_by(compare_contacts);
        }

        Self { buckets }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of contacts across all sections
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn section_count(&self) -> usize {
        self.buckets.len()
    }

    /// Section keys in display order.
    pub fn alphabet(&self) -> Vec<&str> {
        self.buckets.keys().map(String::as_str).collect()
    }

    pub fn get(&self, key: &str) -> Option<&[ContactRecord]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Key and contacts of the section at `index` in display order.
    pub fn section(&self, index: usize) -> Option<(&str, &[ContactRecord])> {
        self.buckets
            .iter()
            .nth(index)
            .map(|(key, contacts)| (key.as_str(), contacts.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ContactRecord])> {
        self.buckets
            .iter()
            .map(|(key, contacts)| (key.as_str(), contacts.as_slice()))
    }

    /// Position of a contact as (section index, row).
    pub fn position_of(&self, contact_id: i64) -> Option<(usize, usize)> {
        self.buckets.values().enumerate().find_map(|(section, contacts)| {
            contacts
                .iter()
                .position(|c| c.id == contact_id)
                .map(|row| (section, row))
        })
    }

    /// Remove the contact at (section, row). The section disappears with its
    /// last contact.
    pub fn remove_at(&mut self, section: usize, row: usize) -> Option<ContactRecord> {
        let key = self.buckets.keys().nth(section)?.clone();
        self.remove_from(&key, |contacts| (row < contacts.len()).then_some(row))
    }

    /// Remove a contact by id from the section its last name belongs to.
    pub fn remove(&mut self, contact: &ContactRecord) -> Option<ContactRecord> {
        let key = section_key(&contact.last_name)?;
        self.remove_from(&key, |contacts| {
            contacts.iter().position(|c| c.id == contact.id)
        })
    }

    fn remove_from<F>(&mut self, key: &str, locate: F) -> Option<ContactRecord>
    where
        F: FnOnce(&[ContactRecord]) -> Option<usize>,
    {
        let contacts = self.buckets.get_mut(key)?;
        let row = locate(contacts)?;
        let removed = contacts.remove(row);
        if contacts.is_empty() {
            self.buckets.remove(key);
        }
        Some(removed)
    }

    /// Contacts whose last name starts with `query`, ignoring case. Only the
    /// section of the query's first character is searched.
    pub fn search(&self, query: &str) -> Vec<ContactRecord> {
        let Some(key) = section_key(query) else {
            return Vec::new();
        };
        let Some(contacts) = self.buckets.get(&key) else {
            return Vec::new();
        };

        let wanted = query.chars().count();
        let query_lower = query.to_lowercase();
        contacts
            .iter()
            .filter(|contact| {
                if contact.last_name.chars().count() < wanted {
                    return false;
                }
                let prefix: String = contact.last_name.chars().take(wanted).collect();
                prefix.to_lowercase() == query_lower
            })
            .cloned()
            .collect()
    }
}
