//! Integration tests for the pdf-pager library and binary

use lopdf::{dictionary, Document, Object, Stream};
use pdf_pager::pdf::{count_pages, page_rotations, read_outline, OutlineItem};
use pdf_pager::{parse_inputs, Error, Operation, Pipeline, PipelineOptions};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Write a Letter-sized PDF with `pages` pages, each rotated by `rotate`
fn write_fixture(dir: &Path, name: &str, pages: usize, rotate: i64) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|i| {
            let content = format!("BT /F1 24 Tf 72 700 Td ({} page {}) Tj ET", name, i + 1);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Rotate" => rotate,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(pages_id, Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages as i64,
    }));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("Failed to write fixture");
    path
}

fn spec(path: &Path, titles: &str) -> String {
    format!("{}{}", path.display(), titles)
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()
}

fn options(output: PathBuf) -> PipelineOptions {
    PipelineOptions {
        output_path: output,
        append_date: false,
        ..Default::default()
    }
}

fn run(specs: &[String], options: PipelineOptions) -> pdf_pager::Result<pdf_pager::PipelineReport> {
    Pipeline::new(parse_inputs(specs)?, options, run_date())?.run()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn load(path: &Path) -> Document {
    let mut doc = Document::load(path).expect("Failed to load output");
    doc.decompress();
    doc
}

fn item(title: &str, page: usize, depth: usize) -> OutlineItem {
    OutlineItem { title: title.to_string(), page: Some(page), depth }
}

#[test]
fn test_grouped_bookmarks_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 2, 0);
    let b = write_fixture(dir, "b.pdf", 3, 0);
    let c = write_fixture(dir, "c.pdf", 1, 0);
    let output = dir.join("book.pdf");

    let specs = vec![
        spec(&a, "|Intro|Section1"),
        spec(&b, "||"),
        spec(&c, "|Details|Section1"),
    ];
    let report = run(&specs, options(output.clone())).unwrap();

    assert_eq!(report.output_path, output);
    assert_eq!(report.offsets, vec![0, 2, 5]);
    assert_eq!(report.page_count, 6);
    assert_eq!(report.steps, vec![Operation::Merge, Operation::Number, Operation::Bookmark]);
    assert!(report.cleanup_failures.is_empty());

    let doc = load(&output);
    assert_eq!(doc.get_pages().len(), 6);
    assert_eq!(
        read_outline(&doc),
        vec![item("Section1", 0, 0), item("Intro", 0, 1), item("Details", 5, 1)]
    );

    // Only the inputs and the final document remain
    assert_eq!(file_names(dir), vec!["a.pdf", "b.pdf", "book.pdf", "c.pdf"]);
}

#[test]
fn test_page_labels_are_stamped() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 1, 0);
    let b = write_fixture(dir, "b.pdf", 2, 0);

    let options = PipelineOptions {
        mask: "Page".to_string(),
        ..options(dir.join("out.pdf"))
    };
    run(&[spec(&a, ""), spec(&b, "")], options).unwrap();

    let doc = load(&dir.join("out.pdf"));
    let streams: Vec<&[u8]> = doc
        .objects
        .values()
        .filter_map(|obj| obj.as_stream().ok())
        .map(|stream| stream.content.as_slice())
        .collect();

    for label in ["(Page 1 of 3) Tj", "(Page 2 of 3) Tj", "(Page 3 of 3) Tj"] {
        assert!(
            streams.iter().any(|s| s.windows(label.len()).any(|w| w == label.as_bytes())),
            "label {} not found",
            label
        );
    }
}

#[test]
fn test_merged_page_count_is_sum_regardless_of_flags() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 4, 0);
    let b = write_fixture(dir, "b.pdf", 3, 90);

    for (number_pages, add_bookmarks) in [(false, false), (true, false), (false, true), (true, true)] {
        let output = dir.join(format!("out_{}_{}.pdf", number_pages, add_bookmarks));
        let options = PipelineOptions {
            number_pages,
            add_bookmarks,
            ..options(output.clone())
        };
        run(&[spec(&a, "|A"), spec(&b, "|B")], options).unwrap();

        assert_eq!(count_pages(&output).unwrap(), 7);
    }
}

#[test]
fn test_same_input_twice() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 2, 0);
    let output = dir.join("twice.pdf");

    let report = run(&[spec(&a, "|First"), spec(&a, "|Second")], options(output.clone())).unwrap();
    assert_eq!(report.offsets, vec![0, 2]);

    let doc = load(&output);
    assert_eq!(doc.get_pages().len(), 4);
    assert_eq!(read_outline(&doc), vec![item("First", 0, 0), item("Second", 2, 0)]);
}

#[test]
fn test_single_input_skips_merge() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 3, 0);
    let output = dir.join("single.pdf");

    let report = run(&[spec(&a, "|Only")], options(output.clone())).unwrap();
    assert_eq!(report.steps, vec![Operation::Number, Operation::Bookmark]);
    assert_eq!(count_pages(&output).unwrap(), 3);
    assert!(file_names(dir).iter().all(|name| !name.contains("_merged_")));
}

#[test]
fn test_single_input_without_steps_is_copied() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 2, 0);
    let output = dir.join("copy.pdf");

    let options = PipelineOptions {
        number_pages: false,
        add_bookmarks: false,
        ..options(output.clone())
    };
    let report = run(&[spec(&a, "")], options).unwrap();

    assert!(report.steps.is_empty());
    assert_eq!(fs::read(&output).unwrap(), fs::read(&a).unwrap());
}

#[test]
fn test_runs_are_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 2, 0);
    let b = write_fixture(dir, "b.pdf", 1, 0);
    let output = dir.join("same.pdf");
    let specs = vec![spec(&a, "|A|Group"), spec(&b, "|B|Group")];

    run(&specs, options(output.clone())).unwrap();
    let first = load(&output);
    run(&specs, options(output.clone())).unwrap();
    let second = load(&output);

    assert_eq!(first.get_pages().len(), second.get_pages().len());
    assert_eq!(read_outline(&first), read_outline(&second));
}

#[test]
fn test_date_suffix_on_final_name() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 1, 0);

    let options = PipelineOptions {
        append_date: true,
        ..options(dir.join("report.pdf"))
    };
    let report = run(&[spec(&a, "")], options).unwrap();

    assert_eq!(report.output_path, dir.join("report_2024-11-20.pdf"));
    assert!(report.output_path.exists());
    assert!(!dir.join("report.pdf").exists());
}

#[test]
fn test_rotated_pages_keep_rotation_and_size() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let upright = write_fixture(dir, "upright.pdf", 1, 0);
    let rotated = write_fixture(dir, "rotated.pdf", 2, 90);
    let output = dir.join("rotated_out.pdf");

    run(&[spec(&upright, ""), spec(&rotated, "")], options(output.clone())).unwrap();

    let doc = load(&output);
    assert_eq!(page_rotations(&doc), vec![0, 90, 90]);

    for (index, page_id) in doc.get_pages().into_values().enumerate() {
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box: Vec<f32> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_float().unwrap())
            .collect();
        let width = media_box[2] - media_box[0];
        let height = media_box[3] - media_box[1];

        if index == 0 {
            assert_eq!((width, height), (612.0, 792.0));
        } else {
            // Scaled back to the original page size after the overlay expanded it
            assert!((width - 612.0).abs() < 0.5, "width {}", width);
            assert!((height - 792.0).abs() < 0.5, "height {}", height);
        }
    }
}

#[test]
fn test_failed_run_leaves_nothing_behind() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 2, 0);
    let broken = dir.join("broken.pdf");
    fs::write(&broken, b"%PDF-1.5\nthis is not a pdf").unwrap();

    let err = run(&[spec(&a, "|A"), spec(&broken, "|B")], options(dir.join("out.pdf"))).unwrap_err();
    assert!(matches!(err, Error::MalformedDocument { .. }));

    assert_eq!(file_names(dir), vec!["a.pdf", "broken.pdf"]);
}

#[test]
fn test_missing_input_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.pdf");

    let err = run(&[spec(&missing, "")], options(temp_dir.path().join("out.pdf"))).unwrap_err();
    match err {
        Error::FileNotFound(path) => assert_eq!(path, missing),
        other => panic!("unexpected error: {}", other),
    }
}

fn pdf_pager() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pdf-pager"))
}

#[test]
fn test_cli_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let a = write_fixture(dir, "a.pdf", 2, 0);
    let b = write_fixture(dir, "b.pdf", 2, 0);
    let output = dir.join("cli.pdf");
    let logs = dir.join("logs");

    let status = pdf_pager()
        .arg("-i").arg(spec(&a, "|Intro|Part"))
        .arg("-i").arg(spec(&b, "|Details|Part"))
        .arg("-o").arg(&output)
        .args(["-m", "Page", "-a", "n", "-t", "yes"])
        .arg("--log-dir").arg(&logs)
        .status()
        .expect("Failed to run pdf-pager");

    assert!(status.success());
    assert_eq!(count_pages(&output).unwrap(), 4);
    assert_eq!(
        read_outline(&load(&output)),
        vec![item("Part", 0, 0), item("Intro", 0, 1), item("Details", 2, 1)]
    );

    // One file, or two if the run crossed a minute boundary
    let log_files = file_names(&logs);
    assert!(!log_files.is_empty() && log_files.len() <= 2, "{:?}", log_files);
    assert!(log_files.iter().all(|name| name.starts_with("pdf-pager")));
}

#[test]
fn test_cli_invalid_spec_exits_with_error() {
    let temp_dir = TempDir::new().unwrap();

    let result = pdf_pager()
        .args(["-i", "|Title"])
        .arg("--log-dir").arg(temp_dir.path())
        .output()
        .expect("Failed to run pdf-pager");

    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
}

#[test]
fn test_cli_rejects_bad_flag_value() {
    let result = pdf_pager()
        .args(["-i", "a.pdf", "-p", "maybe"])
        .output()
        .expect("Failed to run pdf-pager");

    assert_eq!(result.status.code(), Some(1));
}
