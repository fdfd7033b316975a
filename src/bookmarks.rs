//! Two-level bookmark tree derived from the input records
//!
//! Parents are synthesized from distinct `parent_title` values and point at
//! the first input that names them. Children map 1:1 to inputs with a
//! bookmark title. The tree is an arena: entries refer to their parent by
//! index, and parents are always inserted before their first child.

use crate::input::InputRecord;
use crate::offsets::OffsetTable;

/// Index of an entry inside a [`BookmarkTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookmarkId(pub usize);

/// One outline entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkEntry {
    pub title: String,
    /// 0-based page index in the merged document
    pub target_page: usize,
    /// `None` for top-level entries
    pub parent: Option<BookmarkId>,
}

/// Outline entries in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkTree {
    entries: Vec<BookmarkEntry>,
}

impl BookmarkTree {
    /// Derive the outline from records walked in argument order
    pub fn build(records: &[InputRecord], offsets: &OffsetTable) -> Self {
        let mut tree = BookmarkTree::default();
        // (title, id) pairs; parent groups are few so a linear scan is fine
        let mut parents: Vec<(&str, BookmarkId)> = Vec::new();

        for record in records {
            let Some(target_page) = offsets.offset_of(record) else {
                continue;
            };

            let parent = record.parent_title.as_deref().map(|title| {
                match parents.iter().find(|(t, _)| *t == title) {
                    Some((_, id)) => *id,
                    None => {
                        let id = tree.push(title.to_string(), target_page, None);
                        parents.push((title, id));
                        id
                    }
                }
            });

            if let Some(title) = &record.bookmark_title {
                tree.push(title.clone(), target_page, parent);
            }
        }

        tree
    }

    fn push(&mut self, title: String, target_page: usize, parent: Option<BookmarkId>) -> BookmarkId {
        let id = BookmarkId(self.entries.len());
        self.entries.push(BookmarkEntry { title, target_page, parent });
        id
    }

    pub fn get(&self, id: BookmarkId) -> Option<&BookmarkEntry> {
        self.entries.get(id.0)
    }

    pub fn entries(&self) -> &[BookmarkEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (BookmarkId, &BookmarkEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (BookmarkId(i), e))
    }

    /// Top-level entries in creation order
    pub fn roots(&self) -> impl Iterator<Item = (BookmarkId, &BookmarkEntry)> {
        self.iter().filter(|(_, e)| e.parent.is_none())
    }

    /// Direct children of `parent` in creation order
    pub fn children(&self, parent: BookmarkId) -> impl Iterator<Item = (BookmarkId, &BookmarkEntry)> {
        self.iter().filter(move |(_, e)| e.parent == Some(parent))
    }

    /// Title of the entry's parent, if it has one
    pub fn parent_title(&self, id: BookmarkId) -> Option<&str> {
        self.get(id)
            .and_then(|e| e.parent)
            .and_then(|p| self.get(p))
            .map(|p| p.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
