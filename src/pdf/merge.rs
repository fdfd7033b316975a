//! PDF merging functionality using lopdf

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::{Error, Result};
use super::metadata::{load_document, resolve_inherited};
use super::save::save_document;

/// Page attributes a page may inherit from its `/Pages` ancestors. They are
/// copied onto each page before it is re-parented under the merged tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Merge multiple PDF files into a single PDF
///
/// Inputs are concatenated in the given order; a path listed twice is
/// included twice. Returns the page count of the merged document.
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use pdf_pager::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_path: PathBuf::from("merged.pdf"),
/// };
///
/// merge_pdfs(&options).expect("Failed to merge");
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<usize> {
    if options.input_paths.is_empty() {
        return Err(Error::NoInputs);
    }

    // Load all documents
    let mut documents: Vec<Document> = Vec::new();
    for path in &options.input_paths {
        let doc = load_document(path)?;

        // Validate document has pages
        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf(path.clone()));
        }

        tracing::info!(path = %path.display(), pages = doc.get_pages().len(), "Appending PDF");
        documents.push(doc);
    }

    let mut merged = merge_documents(documents)?;
    let page_count = merged.get_pages().len();

    save_document(&mut merged, &options.output_path)?;
    tracing::debug!(output = %options.output_path.display(), page_count, "PDFs merged successfully");

    Ok(page_count)
}

/// Concatenate already loaded documents into a new one
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        flatten_inherited_attributes(&mut doc)?;

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);

        // Update max_id for next document
        max_id = doc.max_id + 1;

        // Collect page IDs from this document, in page order
        page_ids.extend(doc.get_pages().into_values());

        // Collect all objects from this document
        objects.extend(doc.objects);
    }

    let mut merged_doc = Document::with_version("1.5");

    // Add all collected objects FIRST
    merged_doc.objects.extend(objects);

    // Keep new_object_id() above every imported ID
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();

    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&id| Object::Reference(id))
        .collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged_doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    // Update parent references for all pages
    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(merged_doc)
}

/// Copy inherited page attributes onto every page of `doc`
fn flatten_inherited_attributes(doc: &mut Document) -> Result<()> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in pages {
        let inherited: Vec<(&[u8], Object)> = INHERITABLE_KEYS
            .iter()
            .filter(|&&key| !doc.get_dictionary(page_id).map(|d| d.has(key)).unwrap_or(false))
            .filter_map(|&key| resolve_inherited(doc, page_id, key).map(|obj| (key, obj.clone())))
            .collect();

        if inherited.is_empty() {
            continue;
        }

        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key.to_vec(), value);
        }
    }

    Ok(())
}

/// Copy every object of `source` into `target` under fresh IDs.
///
/// Returns the old → new ID map so callers can locate imported objects.
pub fn import_objects(target: &mut Document, source: &Document) -> HashMap<ObjectId, ObjectId> {
    let id_offset = target.max_id;

    // Build complete ID map first
    let id_map: HashMap<ObjectId, ObjectId> = source
        .objects
        .keys()
        .map(|&old_id| (old_id, (old_id.0 + id_offset, old_id.1)))
        .collect();

    // Now copy all objects, renumbering references
    for (old_id, object) in source.objects.iter() {
        target.objects.insert(id_map[old_id], renumber_object_references(object, &id_map));
    }

    target.max_id = target.max_id.max(source.max_id + id_offset);
    id_map
}

/// Renumber all object references in an object
pub fn renumber_object_references(object: &Object, id_map: &HashMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(old_id) => {
            Object::Reference(id_map.get(old_id).copied().unwrap_or(*old_id))
        }
        Object::Array(arr) => {
            Object::Array(arr.iter().map(|obj| renumber_object_references(obj, id_map)).collect())
        }
        Object::Dictionary(dict) => Object::Dictionary(renumber_dictionary(dict, id_map)),
        Object::Stream(stream) => {
            let mut stream = stream.clone();
            stream.dict = renumber_dictionary(&stream.dict, id_map);
            Object::Stream(stream)
        }
        _ => object.clone(),
    }
}

fn renumber_dictionary(dict: &Dictionary, id_map: &HashMap<ObjectId, ObjectId>) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), renumber_object_references(value, id_map));
    }
    new_dict
}
