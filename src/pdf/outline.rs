//! Bookmark (outline) writing and reading
//!
//! Writes a [`BookmarkTree`] as the document's `/Outlines`, with top-level
//! entries linked through `/First`/`/Last`/`/Prev`/`/Next` and children hung
//! off their parent the same way.

use std::collections::HashMap;
use std::path::Path;
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use crate::bookmarks::BookmarkTree;
use crate::error::{Error, Result};
use super::metadata::load_document;
use super::save::save_document;

/// Outline item as read back from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub title: String,
    /// 0-based page index, `None` if the destination could not be resolved
    pub page: Option<usize>,
    /// 0 for top-level items
    pub depth: usize,
}

/// Add `tree` as the outline of `input_path` and write `output_path`
///
/// Returns the number of outline entries written.
pub fn add_bookmarks(input_path: &Path, output_path: &Path, tree: &BookmarkTree) -> Result<usize> {
    let mut doc = load_document(input_path)?;
    tracing::info!(input = %input_path.display(), entries = tree.len(), "Adding bookmarks");

    write_outline(&mut doc, tree)?;
    save_document(&mut doc, output_path)?;

    Ok(tree.len())
}

/// Replace the document's outline with `tree`
pub fn write_outline(doc: &mut Document, tree: &BookmarkTree) -> Result<()> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    // Validate every target before touching the document
    for entry in tree.entries() {
        if entry.target_page >= pages.len() {
            return Err(Error::BookmarkTarget {
                title: entry.title.clone(),
                page: entry.target_page,
                page_count: pages.len(),
            });
        }
    }

    if tree.is_empty() {
        doc.catalog_mut()?.remove(b"Outlines");
        return Ok(());
    }

    let outline_id = doc.new_object_id();
    // One object ID per entry, indexed like the tree
    let item_ids: Vec<ObjectId> = tree.entries().iter().map(|_| doc.new_object_id()).collect();

    for (id, entry) in tree.iter() {
        let parent_id = entry.parent.map(|p| item_ids[p.0]).unwrap_or(outline_id);

        let mut item = Dictionary::new();
        item.set("Title", text_string(&entry.title));
        item.set("Parent", Object::Reference(parent_id));
        item.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(pages[entry.target_page]),
                Object::Name(b"Fit".to_vec()),
            ]),
        );

        let children: Vec<ObjectId> = tree.children(id).map(|(child, _)| item_ids[child.0]).collect();
        link_children(&mut item, &children);

        doc.objects.insert(item_ids[id.0], Object::Dictionary(item));
    }

    let roots: Vec<ObjectId> = tree.roots().map(|(id, _)| item_ids[id.0]).collect();
    link_siblings(doc, &roots);
    for (id, _) in tree.roots() {
        let children: Vec<ObjectId> = tree.children(id).map(|(child, _)| item_ids[child.0]).collect();
        link_siblings(doc, &children);
    }

    let mut outline = Dictionary::new();
    outline.set("Type", Object::Name(b"Outlines".to_vec()));
    link_children(&mut outline, &roots);
    // Visible descendants when every item is open
    outline.set("Count", Object::Integer(tree.len() as i64));
    doc.objects.insert(outline_id, Object::Dictionary(outline));

    let catalog = doc.catalog_mut()?;
    catalog.set("Outlines", Object::Reference(outline_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    Ok(())
}

/// Set `/First`, `/Last` and `/Count` on an outline node
fn link_children(node: &mut Dictionary, children: &[ObjectId]) {
    if let (Some(first), Some(last)) = (children.first(), children.last()) {
        node.set("First", Object::Reference(*first));
        node.set("Last", Object::Reference(*last));
        node.set("Count", Object::Integer(children.len() as i64));
    }
}

/// Chain siblings together with `/Prev` and `/Next`
fn link_siblings(doc: &mut Document, siblings: &[ObjectId]) {
    for (i, &item_id) in siblings.iter().enumerate() {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(item_id) {
            if i > 0 {
                dict.set("Prev", Object::Reference(siblings[i - 1]));
            }
            if let Some(next) = siblings.get(i + 1) {
                dict.set("Next", Object::Reference(*next));
            }
        }
    }
}

/// Encode a PDF text string: literal bytes for ASCII, UTF-16BE with a BOM otherwise
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Flatten the document outline into items in display order
pub fn read_outline(doc: &Document) -> Vec<OutlineItem> {
    let page_index: HashMap<ObjectId, usize> = doc
        .get_pages()
        .into_values()
        .enumerate()
        .map(|(index, id)| (id, index))
        .collect();

    let first = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .and_then(|outlines| outlines.get(b"First"))
        .and_then(Object::as_reference)
        .ok();

    let mut items = Vec::new();
    if let Some(first) = first {
        collect_items(doc, first, 0, &page_index, &mut items);
    }
    items
}

fn collect_items(
    doc: &Document,
    first: ObjectId,
    depth: usize,
    page_index: &HashMap<ObjectId, usize>,
    items: &mut Vec<OutlineItem>,
) {
    let mut current = Some(first);
    // Guard against malformed sibling cycles
    let mut remaining = doc.objects.len();

    while let (Some(id), true) = (current, remaining > 0) {
        remaining -= 1;
        let Ok(item) = doc.get_dictionary(id) else {
            break;
        };

        let title = item
            .get(b"Title")
            .and_then(Object::as_str)
            .map(decode_text_string)
            .unwrap_or_default();
        let page = item
            .get(b"Dest")
            .and_then(Object::as_array)
            .ok()
            .and_then(|dest| dest.first())
            .and_then(|target| target.as_reference().ok())
            .and_then(|page_id| page_index.get(&page_id).copied());

        items.push(OutlineItem { title, page, depth });

        if let Ok(child) = item.get(b"First").and_then(Object::as_reference) {
            collect_items(doc, child, depth + 1, page_index, items);
        }

        current = item.get(b"Next").and_then(Object::as_reference).ok();
    }
}
