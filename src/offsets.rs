//! Starting page of each input within the merged document

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::input::InputRecord;

/// Starting page (0-based) of every input record, indexed by `InputRecord::order`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<usize>,
    page_counts: Vec<usize>,
}

impl OffsetTable {
    /// Build the table by walking `records` in argument order.
    ///
    /// `page_count` is called once per distinct path; a path listed twice
    /// reuses the cached count but still gets its own offset.
    pub fn build<F>(records: &[InputRecord], mut page_count: F) -> Result<Self>
    where
        F: FnMut(&Path) -> Result<usize>,
    {
        let mut cache: HashMap<PathBuf, usize> = HashMap::new();
        let mut offsets = Vec::with_capacity(records.len());
        let mut page_counts = Vec::with_capacity(records.len());
        let mut next_page = 0;

        for record in records {
            let count = match cache.get(&record.path) {
                Some(count) => *count,
                None => {
                    let count = page_count(&record.path)?;
                    cache.insert(record.path.clone(), count);
                    count
                }
            };

            offsets.push(next_page);
            page_counts.push(count);
            next_page += count;
        }

        Ok(Self { offsets, page_counts })
    }

    /// Offset of the record with the given order index
    pub fn offset(&self, order: usize) -> Option<usize> {
        self.offsets.get(order).copied()
    }

    /// Offset of a record from the same input list
    pub fn offset_of(&self, record: &InputRecord) -> Option<usize> {
        self.offset(record.order)
    }

    /// Page count of the record with the given order index
    pub fn page_count(&self, order: usize) -> Option<usize> {
        self.page_counts.get(order).copied()
    }

    /// Total pages of the merged document
    pub fn total_pages(&self) -> usize {
        self.page_counts.iter().sum()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
