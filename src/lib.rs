//! PDF Pager Library
//!
//! Merges several PDF files into one, stamps every page with a page-number
//! label and adds a two-level bookmark outline pointing at the first page of
//! each input. This library provides functionality to:
//! - Parse `path|bookmark|parent` input specs
//! - Compute where each input lands in the merged document
//! - Derive and write the bookmark outline
//! - Stamp rotation-aware page-number overlays
//! - Run the whole merge → number → bookmark pipeline
//!
//! # Example
//!
//! ```no_run
//! use pdf_pager::{parse_inputs, Pipeline, PipelineOptions};
//!
//! let records = parse_inputs(&["intro.pdf|Intro|Part 1", "details.pdf|Details|Part 1"])?;
//! let options = PipelineOptions {
//!     mask: "Page".to_string(),
//!     ..Default::default()
//! };
//!
//! let report = Pipeline::new(records, options, pdf_pager::date::today())?.run()?;
//! println!("{} pages written to {}", report.page_count, report.output_path.display());
//! # Ok::<(), pdf_pager::Error>(())
//! ```

pub mod bookmarks;
pub mod config;
pub mod date;
pub mod error;
pub mod input;
pub mod layout;
pub mod logging;
pub mod offsets;
pub mod pdf;
pub mod pipeline;

// Re-export commonly used items
pub use bookmarks::{BookmarkEntry, BookmarkId, BookmarkTree};
pub use config::{parse_yes_no, PipelineOptions};
pub use error::{Error, Result};
pub use input::{parse_inputs, InputRecord};
pub use offsets::OffsetTable;
pub use pipeline::{Operation, Pipeline, PipelineReport, PipelineStep};
