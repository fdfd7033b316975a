//! PDF manipulation module

pub mod merge;
pub mod metadata;
pub mod outline;
pub mod save;
pub mod stamp;

// Re-export commonly used items
pub use merge::{merge_pdfs, MergeOptions};
pub use metadata::{count_pages, document_metadata, load_document, page_rotations, PdfMetadata};
pub use outline::{add_bookmarks, read_outline, OutlineItem};
pub use save::{copy_atomically, save_document};
pub use stamp::{stamp_page_numbers, PageLabel, StampOptions};
