//! Pipeline options and command-line flag values

use std::path::PathBuf;
use crate::pdf::StampOptions;

/// Options controlling one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Requested output path (before any date suffix)
    pub output_path: PathBuf,
    /// Literal prefix before each page number
    pub mask: String,
    /// Append " of N" to page labels
    pub show_total: bool,
    /// Append the run date to the final filename
    pub append_date: bool,
    /// Distance of the label from the bottom of the page, in points
    pub bottom_margin: f32,
    /// Stamp page numbers
    pub number_pages: bool,
    /// Write the bookmark outline
    pub add_bookmarks: bool,
    /// Label font size in points
    pub font_size: f32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("output.pdf"),
            mask: String::new(),
            show_total: true,
            append_date: true,
            bottom_margin: 10.0,
            number_pages: true,
            add_bookmarks: true,
            font_size: 12.0,
        }
    }
}

impl PipelineOptions {
    /// Stamping options derived from these pipeline options
    pub fn stamp_options(&self) -> StampOptions {
        StampOptions {
            mask: self.mask.clone(),
            show_total: self.show_total,
            bottom_margin: self.bottom_margin,
            font_size: self.font_size,
        }
    }
}

/// Parse a Y/N flag value (`Y`, `N`, `yes`, `no`, `true`, `false`, any case)
pub fn parse_yes_no(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" => Ok(true),
        "n" | "no" | "false" => Ok(false),
        other => Err(format!("expected Y or N, got '{}'", other)),
    }
}
