//! Merge → number → bookmark pipeline
//!
//! Each enabled step reads the previous artifact and writes a new one next to
//! the requested output. The last artifact is copied to the final path and
//! every intermediate file is removed, on success and on failure alike.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use crate::bookmarks::BookmarkTree;
use crate::config::PipelineOptions;
use crate::date::{artifact_path, dated_path, iso_date};
use crate::error::{Error, Result};
use crate::input::InputRecord;
use crate::offsets::OffsetTable;
use crate::pdf::{
    add_bookmarks, copy_atomically, load_document, merge_pdfs, page_rotations, stamp_page_numbers,
    MergeOptions,
};

/// What a pipeline step does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Merge,
    Number,
    Bookmark,
}

impl Operation {
    /// Stage name used in intermediate file names
    pub fn stage(&self) -> &'static str {
        match self {
            Operation::Merge => "merged",
            Operation::Number => "numbered",
            Operation::Bookmark => "bookmarked",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Merge => "merge",
            Operation::Number => "number pages",
            Operation::Bookmark => "add bookmarks",
        };
        f.write_str(name)
    }
}

/// One step of the plan; `input` is `None` for the merge, which reads every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub operation: Operation,
}

/// Outcome of a successful run
#[derive(Debug)]
pub struct PipelineReport {
    pub output_path: PathBuf,
    pub steps: Vec<Operation>,
    pub page_count: usize,
    /// Starting page of every input, in argument order
    pub offsets: Vec<usize>,
    /// Intermediate files that could not be removed
    pub cleanup_failures: Vec<Error>,
}

/// A configured run over a list of input records
#[derive(Debug, Clone)]
pub struct Pipeline {
    records: Vec<InputRecord>,
    options: PipelineOptions,
    date: NaiveDate,
}

impl Pipeline {
    /// `date` is used for every file name produced by this run
    pub fn new(records: Vec<InputRecord>, options: PipelineOptions, date: NaiveDate) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::NoInputs);
        }
        Ok(Self { records, options, date })
    }

    pub fn records(&self) -> &[InputRecord] {
        &self.records
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Where the final document is written
    pub fn final_path(&self) -> PathBuf {
        if self.options.append_date {
            dated_path(&self.options.output_path, &self.date)
        } else {
            self.options.output_path.clone()
        }
    }

    /// The linear chain of steps this run will execute
    pub fn plan(&self) -> Vec<PipelineStep> {
        let mut steps = Vec::new();
        let mut current = match self.records.as_slice() {
            [single] => Some(single.path.clone()),
            _ => None,
        };

        let mut push = |operation: Operation, input: Option<PathBuf>| {
            let output = artifact_path(&self.options.output_path, operation.stage(), &self.date);
            steps.push(PipelineStep { input, output: output.clone(), operation });
            output
        };

        if current.is_none() {
            current = Some(push(Operation::Merge, None));
        }
        if self.options.number_pages {
            current = Some(push(Operation::Number, current.take()));
        }
        if self.options.add_bookmarks {
            push(Operation::Bookmark, current.take());
        }

        steps
    }

    /// Execute the plan and copy the last artifact to [`Pipeline::final_path`]
    pub fn run(&self) -> Result<PipelineReport> {
        let final_path = self.final_path();
        tracing::info!(
            inputs = self.records.len(),
            output = %final_path.display(),
            date = %iso_date(&self.date),
            "Starting pipeline"
        );
        for record in &self.records {
            tracing::debug!(
                order = record.order,
                path = %record.path.display(),
                bookmark = ?record.bookmark_title,
                parent = ?record.parent_title,
                "Input"
            );
        }

        // Page counts and rotations come from the sources, before any merge
        let mut source_rotations: HashMap<PathBuf, Vec<i64>> = HashMap::new();
        let offsets = OffsetTable::build(&self.records, |path| {
            let doc = load_document(path)?;
            let rotations = page_rotations(&doc);
            if rotations.is_empty() {
                return Err(Error::EmptyPdf(path.to_path_buf()));
            }
            let count = rotations.len();
            source_rotations.insert(path.to_path_buf(), rotations);
            Ok(count)
        })?;
        tracing::debug!(offsets = ?offsets.offsets(), total_pages = offsets.total_pages(), "Computed offsets");

        let rotations: Vec<i64> = self
            .records
            .iter()
            .flat_map(|record| source_rotations.get(&record.path).into_iter().flatten().copied())
            .collect();
        tracing::debug!(?rotations, "Collected page rotations");

        let tree = BookmarkTree::build(&self.records, &offsets);
        for (id, entry) in tree.iter() {
            tracing::debug!(
                title = %entry.title,
                page = entry.target_page,
                parent = ?tree.parent_title(id),
                "Bookmark"
            );
        }

        let mut protected: Vec<PathBuf> = self.records.iter().map(|r| r.path.clone()).collect();
        protected.push(final_path.clone());
        let mut intermediates = IntermediateFiles::new(protected);

        let plan = self.plan();
        let mut last = self.records[0].path.clone();

        for (index, step) in plan.iter().enumerate() {
            tracing::info!(step = index + 1, operation = %step.operation, output = %step.output.display(), "Running step");
            intermediates.track(&step.output);

            let input = step.input.clone().unwrap_or_else(|| last.clone());
            match step.operation {
                Operation::Merge => {
                    let options = MergeOptions {
                        input_paths: self.records.iter().map(|r| r.path.clone()).collect(),
                        output_path: step.output.clone(),
                    };
                    let merged_pages = merge_pdfs(&options)?;
                    if merged_pages != offsets.total_pages() {
                        tracing::warn!(merged_pages, expected = offsets.total_pages(), "Merged page count differs from offsets");
                    }
                }
                Operation::Number => {
                    stamp_page_numbers(&input, &step.output, &self.options.stamp_options(), &rotations)?;
                }
                Operation::Bookmark => {
                    add_bookmarks(&input, &step.output, &tree)?;
                }
            }

            last = step.output.clone();
        }

        if last != final_path {
            copy_atomically(&last, &final_path)?;
        }
        tracing::info!(output = %final_path.display(), pages = offsets.total_pages(), "Output written");

        let cleanup_failures = intermediates.cleanup();

        Ok(PipelineReport {
            output_path: final_path,
            steps: plan.iter().map(|step| step.operation).collect(),
            page_count: offsets.total_pages(),
            offsets: offsets.offsets().to_vec(),
            cleanup_failures,
        })
    }
}

/// Intermediate artifacts of one run, removed when dropped
struct IntermediateFiles {
    paths: Vec<PathBuf>,
    /// Inputs and the final output are never deleted
    protected: Vec<PathBuf>,
}

impl IntermediateFiles {
    fn new(protected: Vec<PathBuf>) -> Self {
        Self { paths: Vec::new(), protected }
    }

    fn track(&mut self, path: &Path) {
        if !self.protected.iter().any(|p| p == path) && !self.paths.iter().any(|p| p == path) {
            self.paths.push(path.to_path_buf());
        }
    }

    /// Remove every tracked file; failures are logged and returned, never raised
    fn cleanup(&mut self) -> Vec<Error> {
        let mut failures = Vec::new();

        for path in self.paths.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Deleted intermediate file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    let err = Error::Cleanup { path, source };
                    tracing::warn!("{}", err);
                    failures.push(err);
                }
            }
        }

        failures
    }
}

impl Drop for IntermediateFiles {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_inputs;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()
    }

    fn pipeline(specs: &[&str], options: PipelineOptions) -> Pipeline {
        Pipeline::new(parse_inputs(specs).unwrap(), options, date()).unwrap()
    }

    fn options(number_pages: bool, add_bookmarks: bool) -> PipelineOptions {
        PipelineOptions {
            output_path: PathBuf::from("out/report.pdf"),
            number_pages,
            add_bookmarks,
            ..Default::default()
        }
    }

    fn operations(steps: &[PipelineStep]) -> Vec<Operation> {
        steps.iter().map(|s| s.operation).collect()
    }

    #[test]
    fn test_full_plan_chains_artifacts() {
        let steps = pipeline(&["a.pdf", "b.pdf"], options(true, true)).plan();
        assert_eq!(operations(&steps), vec![Operation::Merge, Operation::Number, Operation::Bookmark]);

        assert_eq!(steps[0].input, None);
        assert_eq!(steps[0].output, PathBuf::from("out/report_merged_2024-11-20.pdf"));
        assert_eq!(steps[1].input.as_ref(), Some(&steps[0].output));
        assert_eq!(steps[2].input.as_ref(), Some(&steps[1].output));
        assert_eq!(steps[2].output, PathBuf::from("out/report_bookmarked_2024-11-20.pdf"));
    }

    #[test]
    fn test_single_input_skips_merge() {
        let steps = pipeline(&["a.pdf|Intro"], options(true, false)).plan();
        assert_eq!(operations(&steps), vec![Operation::Number]);
        assert_eq!(steps[0].input, Some(PathBuf::from("a.pdf")));
    }

    #[test]
    fn test_single_input_without_steps() {
        assert!(pipeline(&["a.pdf"], options(false, false)).plan().is_empty());
    }

    #[test]
    fn test_merge_only() {
        let steps = pipeline(&["a.pdf", "a.pdf"], options(false, false)).plan();
        assert_eq!(operations(&steps), vec![Operation::Merge]);
    }

    #[test]
    fn test_final_path_date_suffix() {
        let dated = pipeline(&["a.pdf"], options(true, true));
        assert_eq!(dated.final_path(), PathBuf::from("out/report_2024-11-20.pdf"));

        let plain = pipeline(
            &["a.pdf"],
            PipelineOptions { append_date: false, ..options(true, true) },
        );
        assert_eq!(plain.final_path(), PathBuf::from("out/report.pdf"));
    }

    #[test]
    fn test_no_records() {
        let result = Pipeline::new(Vec::new(), PipelineOptions::default(), date());
        assert!(matches!(result, Err(Error::NoInputs)));
    }

    #[test]
    fn test_intermediates_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pdf");
        let artifact = dir.path().join("artifact.pdf");
        fs::write(&input, b"input").unwrap();
        fs::write(&artifact, b"artifact").unwrap();

        {
            let mut files = IntermediateFiles::new(vec![input.clone()]);
            files.track(&input);
            files.track(&artifact);
            files.track(&dir.path().join("never-written.pdf"));
        }

        assert!(input.exists());
        assert!(!artifact.exists());
    }

    #[test]
    fn test_missing_input_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");
        let records = parse_inputs(&[missing.to_string_lossy().into_owned()]).unwrap();
        let options = PipelineOptions {
            output_path: dir.path().join("out.pdf"),
            ..Default::default()
        };

        let err = Pipeline::new(records, options, date()).unwrap().run().unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
