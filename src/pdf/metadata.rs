//! PDF loading, page counts and per-page geometry

use std::path::Path;
use lopdf::{Document, Object, ObjectId};
use crate::error::{Error, Result};
use crate::layout::{normalize_rotation, PageBox};

/// Load a PDF, mapping failures onto the library's error taxonomy
///
/// The whole file is read and closed before parsing, so no handle outlives
/// this call.
pub fn load_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    Document::load_mem(&bytes).map_err(|source| Error::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })
}

/// Look up a page attribute, following `/Parent` links for inherited values
/// (MediaBox, Rotate, Resources, CropBox).
pub fn resolve_inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current_id = page_id;
    // Bounded walk in case of a cyclic page tree
    for _ in 0..64 {
        let dict = doc.get_dictionary(current_id).ok()?;

        if let Ok(value) = dict.get(key) {
            return Some(value);
        }

        current_id = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Like [`resolve_inherited`], but follows an indirect value to its object
fn inherited_value<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    match resolve_inherited(doc, page_id, key)? {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// MediaBox of a page; US Letter when missing or unreadable
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let values: Option<Vec<f32>> = inherited_value(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .map(|arr| arr.iter().filter_map(number).collect());

    match values.as_deref() {
        Some([llx, lly, urx, ury]) => PageBox::new(*llx, *lly, *urx, *ury),
        _ => PageBox::letter(),
    }
}

/// `/Rotate` of a page in `[0, 360)`, 0 when absent
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_value(doc, page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .map(normalize_rotation)
        .unwrap_or(0)
}

/// Rotation of every page, in page order
pub fn page_rotations(doc: &Document) -> Vec<i64> {
    doc.get_pages()
        .values()
        .map(|&page_id| page_rotation(doc, page_id))
        .collect()
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

/// Summarise a loaded document for logging
pub fn document_metadata(doc: &Document) -> PdfMetadata {
    let info = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .ok();

    let text = |key: &[u8]| {
        info.and_then(|dict| dict.get(key).ok())
            .and_then(|obj| obj.as_str().ok())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    };

    PdfMetadata {
        page_count: doc.get_pages().len(),
        title: text(b"Title"),
        author: text(b"Author"),
    }
}

/// Count the number of pages in a PDF file
///
/// Walks the page tree the same way the merge does, so counts always line up
/// with merged offsets.
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load_document(path)?;
    let page_count = doc.get_pages().len();

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}
