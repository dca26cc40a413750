//! What the contact list shows: all sections, or the results of a search.

use crate::model::ContactRecord;
use crate::sections::{section_key, ContactSections};

/// Address of a visible row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRef {
    pub section: usize,
    pub row: usize,
}

impl RowRef {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

#[derive(Debug, Clone)]
struct SearchState {
    query: String,
    results: Vec<ContactRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactList {
    sections: ContactSections,
    search: Option<SearchState>,
}

impl ContactList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &ContactSections {
        &self.sections
    }

    /// Swap in a freshly loaded set of sections. Search results from the
    /// previous load are dropped.
    pub fn replace(&mut self, sections: ContactSections) {
        self.sections = sections;
        if let Some(search) = self.search.as_mut() {
            search.results.clear();
        }
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Update the search text. An empty query shows everything again.
    pub fn set_query(&mut self, query: &str) {
        if query.is_empty() {
            self.search = None;
            return;
        }
        self.search = Some(SearchState {
            query: query.to_string(),
            results: self.sections.search(query),
        });
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    pub fn section_count(&self) -> usize {
        if self.search.is_some() {
            return 1;
        }
        self.sections.section_count()
    }

    pub fn row_count(&self, section: usize) -> usize {
        match &self.search {
            Some(search) => search.results.len(),
            None => self.sections.section(section).map_or(0, |(_, rows)| rows.len()),
        }
    }

    /// Header for a section. While searching this is the query's first
    /// character, uppercased.
    pub fn title(&self, section: usize) -> Option<String> {
        match &self.search {
            Some(search) => section_key(&search.query),
            None => self.sections.section(section).map(|(key, _)| key.to_string()),
        }
    }

    pub fn record(&self, at: RowRef) -> Option<&ContactRecord> {
        match &self.search {
            Some(search) => search.results.get(at.row),
            None => self
                .sections
                .section(at.section)
                .and_then(|(_, rows)| rows.get(at.row)),
        }
    }

    /// Visible rows: the single search section, or every alphabet section.
    pub fn rows(&self) -> Vec<(String, Vec<&ContactRecord>)> {
        match &self.search {
            Some(search) => vec![(
                section_key(&search.query).unwrap_or_default(),
                search.results.iter().collect(),
            )],
            None => self
                .sections
                .iter()
                .map(|(key, contacts)| (key.to_string(), contacts.iter().collect()))
                .collect(),
        }
    }

    /// Locate a contact among the visible rows.
    pub fn find(&self, contact_id: i64) -> Option<RowRef> {
        match &self.search {
            Some(search) => search
                .results
                .iter()
                .position(|c| c.id == contact_id)
                .map(|row| RowRef::new(0, row)),
            None => self
                .sections
                .position_of(contact_id)
                .map(|(section, row)| RowRef::new(section, row)),
        }
    }

    /// Remove a visible row from the local list. Removing a search result
    /// also removes it from its section.
    pub fn remove(&mut self, at: RowRef) -> Option<ContactRecord> {
        match self.search.as_mut() {
            Some(search) => {
                if at.row >= search.results.len() {
                    return None;
                }
                let record = search.results.remove(at.row);
                self.sections.remove(&record);
                Some(record)
            }
            None => self.sections.remove_at(at.section, at.row),
        }
    }
}
