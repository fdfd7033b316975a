//! Page-number stamping
//!
//! For every page a small label canvas is rendered into its own one-page PDF,
//! re-imported as a Form XObject and drawn on top of the page. The overlay is
//! rotated with the page's own `/Rotate` so the label reads upright in a
//! viewer, and the page is scaled back to its original size if the rotated
//! overlay pushed the page box outward.

use std::path::Path;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use crate::error::{Error, Result};
use crate::layout::{fmt_num, OverlayPlacement, PageBox, TransformMatrix};
use super::merge::import_objects;
use super::metadata::{document_metadata, load_document, page_box, resolve_inherited};
use super::save::save_document;

/// Resource name under which the label XObject is registered on each page
const LABEL_XOBJECT: &str = "PagerLabel";

/// Canvas size handed to the text renderer; (0, 0) means "no page area",
/// only the drawn text matters.
const CANVAS_SIZE: (f32, f32) = (0.0, 0.0);

/// The text stamped on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLabel {
    pub text: String,
}

impl PageLabel {
    /// `[mask ]<page>[ of <total>]`, with `page` 1-based
    pub fn compose(page: usize, total: usize, mask: &str, show_total: bool) -> Self {
        let mut text = String::new();
        if !mask.is_empty() {
            text.push_str(mask);
            text.push(' ');
        }
        text.push_str(&page.to_string());
        if show_total {
            text.push_str(&format!(" of {}", total));
        }
        Self { text }
    }
}

impl std::fmt::Display for PageLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Options for stamping page numbers
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Literal prefix before the number, e.g. "Page"
    pub mask: String,
    /// Append " of N"
    pub show_total: bool,
    /// Distance in points from the bottom of the page
    pub bottom_margin: f32,
    /// Label font size in points
    pub font_size: f32,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            mask: String::new(),
            show_total: true,
            bottom_margin: 10.0,
            font_size: 12.0,
        }
    }
}

/// Stamp every page of `input_path` and write the result to `output_path`
///
/// `rotations` holds the `/Rotate` of every page as read from the source
/// documents before they were merged, in merged page order. Pages without an
/// entry are treated as unrotated. Returns the page count.
pub fn stamp_page_numbers(
    input_path: &Path,
    output_path: &Path,
    options: &StampOptions,
    rotations: &[i64],
) -> Result<usize> {
    let mut doc = load_document(input_path)?;
    let meta = document_metadata(&doc);
    tracing::info!(
        input = %input_path.display(),
        pages = meta.page_count,
        title = ?meta.title,
        author = ?meta.author,
        "Adding page numbers"
    );

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let page_count = pages.len();
    if page_count == 0 {
        return Err(Error::EmptyPdf(input_path.to_path_buf()));
    }
    if rotations.len() != page_count {
        tracing::warn!(
            rotations = rotations.len(),
            pages = page_count,
            "Rotation table does not match page count; missing pages count as unrotated"
        );
    }

    for (index, page_id) in pages.into_iter().enumerate() {
        let rotation = rotations.get(index).copied().unwrap_or(0);
        let label = PageLabel::compose(index + 1, page_count, &options.mask, options.show_total);
        stamp_page(&mut doc, page_id, &label, rotation, options)?;
    }

    save_document(&mut doc, output_path)?;
    tracing::debug!(output = %output_path.display(), "Successfully added page numbers");

    Ok(page_count)
}

/// Stamp a single page of a loaded document
pub fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    label: &PageLabel,
    rotation: i64,
    options: &StampOptions,
) -> Result<()> {
    let media_box = page_box(doc, page_id);
    let placement = OverlayPlacement::compute(media_box, rotation, CANVAS_SIZE.0, CANVAS_SIZE.1);
    tracing::debug!(
        page = ?page_id,
        media_box = ?media_box,
        rotation,
        label = %label,
        expanded = placement.page_scale.is_some(),
        "Stamping page"
    );

    let canvas_bytes = render_label_canvas(
        &label.text,
        media_box.width() / 2.0,
        options.bottom_margin,
        options.font_size,
    )?;
    let canvas = Document::load_mem(&canvas_bytes)?;

    let xobject_id = import_canvas_as_xobject(doc, &canvas, &media_box, &placement.overlay)?;
    add_xobject_to_page_resources(doc, page_id, xobject_id)?;
    wrap_page_content(doc, page_id, placement.page_scale.as_ref())?;

    if placement.page_scale.is_some() {
        let b = placement.media_box;
        let page = doc.get_dictionary_mut(page_id)?;
        page.set(
            "MediaBox",
            Object::Array(vec![Object::Real(b.llx), Object::Real(b.lly), Object::Real(b.urx), Object::Real(b.ury)]),
        );
        // A CropBox from the unscaled page would cut the scaled content
        page.remove(b"CropBox");
    }

    Ok(())
}

/// Render `text` at (x, y) on an empty canvas and serialize it to bytes
///
/// The canvas is a one-page PDF whose page box is `CANVAS_SIZE`; only the
/// drawn text is meaningful. Uses Helvetica (one of the 14 standard PDF fonts)
/// so nothing has to be embedded.
pub fn render_label_canvas(text: &str, x: f32, y: f32, font_size: f32) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut content = String::new();
    content.push_str("0 g\n"); // gray fill color (0 = black)
    content.push_str("BT\n");
    content.push_str(&format!("/F1 {} Tf\n", fmt_num(font_size)));
    content.push_str(&format!("{} {} Td\n", fmt_num(x), fmt_num(y)));
    content.push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
    content.push_str("ET\n");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(), 0.into(), Object::Real(CANVAS_SIZE.0), Object::Real(CANVAS_SIZE.1),
        ],
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(pages_id, Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    }));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Escape special characters in PDF strings
///
/// Labels are written as single-byte strings, so characters outside ASCII
/// become `?`.
fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect::<String>()
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Turn the canvas page into a Form XObject inside `doc`
fn import_canvas_as_xobject(
    doc: &mut Document,
    canvas: &Document,
    media_box: &PageBox,
    overlay: &TransformMatrix,
) -> Result<ObjectId> {
    let canvas_page = canvas
        .get_pages()
        .into_values()
        .next()
        .ok_or_else(|| Error::General("Label canvas has no page".to_string()))?;

    let content = canvas.get_page_content(canvas_page)?;

    let id_map = import_objects(doc, canvas);
    let imported_page = doc.get_dictionary(id_map[&canvas_page])?;
    let resources = imported_page
        .get(b"Resources")
        .cloned()
        .unwrap_or_else(|_| Object::Dictionary(Dictionary::new()));

    let m = overlay.to_array();
    let xobject_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "FormType" => 1,
        // BBox is in canvas space, which is the unrotated page space
        "BBox" => vec![
            0.into(), 0.into(), Object::Real(media_box.width()), Object::Real(media_box.height()),
        ],
        "Matrix" => m.iter().map(|&v| Object::Real(v)).collect::<Vec<Object>>(),
        "Resources" => resources,
    };

    Ok(doc.add_object(Stream::new(xobject_dict, content)))
}

/// Add XObject reference to page's Resources dictionary
///
/// The page gets its own copy of its Resources so a resource dictionary shared
/// between pages never ends up pointing at another page's label.
fn add_xobject_to_page_resources(doc: &mut Document, page_id: ObjectId, xobject_id: ObjectId) -> Result<()> {
    let mut resources = match resolve_inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(res_id)) => doc.get_dictionary(*res_id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };

    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(xo)) => xo.clone(),
        Ok(Object::Reference(xo_id)) => doc.get_dictionary(*xo_id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };
    xobjects.set(LABEL_XOBJECT, Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));

    Ok(())
}

/// Content stream IDs of a page, in drawing order
fn page_content_ids(doc: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>> {
    let page = doc.get_dictionary(page_id)?;

    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            // Contents may be an indirect array of streams
            Object::Array(arr) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => vec![],
    };

    Ok(contents.iter().filter_map(|obj| obj.as_reference().ok()).collect())
}

/// Isolate the page's own drawing in q/Q, draw the label after it, and apply
/// the page-level scale around everything.
fn wrap_page_content(doc: &mut Document, page_id: ObjectId, page_scale: Option<&TransformMatrix>) -> Result<()> {
    let original = page_content_ids(doc, page_id)?;

    let mut prefix = String::from("q\n");
    if let Some(scale) = page_scale {
        prefix.push_str(&scale.to_cm());
        prefix.push('\n');
    }
    prefix.push_str("q\n");
    // Leading newline keeps the last operator of the page apart from Q
    let suffix = format!("\nQ\nq\n/{} Do\nQ\nQ\n", LABEL_XOBJECT);

    let prefix_id = doc.add_object(Stream::new(Dictionary::new(), prefix.into_bytes()));
    let suffix_id = doc.add_object(Stream::new(Dictionary::new(), suffix.into_bytes()));

    let mut contents = vec![Object::Reference(prefix_id)];
    contents.extend(original.into_iter().map(Object::Reference));
    contents.push(Object::Reference(suffix_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));

    Ok(())
}
