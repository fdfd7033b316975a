//! Input spec parsing
//!
//! Each `-i` argument has the form `path`, `path|title` or `path|title|parent`.
//! Empty titles are allowed and mean "no bookmark" / "no parent".

use std::path::{Path, PathBuf};
use crate::error::{Error, Result};

const FIELD_SEPARATOR: char = '|';

/// One parsed `-i` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    /// Path to the source PDF, exactly as given
    pub path: PathBuf,
    /// Title of the bookmark pointing at this input's first page
    pub bookmark_title: Option<String>,
    /// Title of the parent bookmark this input is grouped under
    pub parent_title: Option<String>,
    /// Position among the `-i` arguments (0-based)
    pub order: usize,
}

impl InputRecord {
    /// Parse a single `path[|title[|parent]]` value
    pub fn parse(spec: &str, order: usize) -> Result<Self> {
        let fields: Vec<&str> = spec.split(FIELD_SEPARATOR).collect();

        if fields.len() > 3 {
            return Err(Error::invalid_spec(
                spec,
                format!("expected at most 3 '|'-separated fields, found {}", fields.len()),
            ));
        }

        let path = fields[0];
        if path.trim().is_empty() {
            return Err(Error::invalid_spec(spec, "path is empty"));
        }

        Ok(Self {
            path: PathBuf::from(path),
            bookmark_title: non_empty(fields.get(1).copied()),
            parent_title: non_empty(fields.get(2).copied()),
            order,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this record contributes anything to the outline
    pub fn has_bookmark(&self) -> bool {
        self.bookmark_title.is_some() || self.parent_title.is_some()
    }
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Parse all `-i` values, preserving argument order
pub fn parse_inputs<S: AsRef<str>>(specs: &[S]) -> Result<Vec<InputRecord>> {
    if specs.is_empty() {
        return Err(Error::NoInputs);
    }

    specs
        .iter()
        .enumerate()
        .map(|(order, spec)| InputRecord::parse(spec.as_ref(), order))
        .collect()
}
