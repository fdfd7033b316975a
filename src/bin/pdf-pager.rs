//! PDF Pager CLI tool
//!
//! Merges PDFs, stamps page numbers and adds a bookmark outline.

use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::process;

use pdf_pager::{date, logging, parse_inputs, parse_yes_no, Pipeline, PipelineOptions};

/// PDF Pager - Merge PDFs, number their pages and bookmark each input
#[derive(Parser)]
#[command(name = "pdf-pager")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge two chapters under one bookmark group, labels read \"Page 3 of 7\"
    pdf-pager -i \"intro.pdf|Intro|Part 1\" -i \"details.pdf|Details|Part 1\" -m Page -o book.pdf

    # Number a single file without a date suffix or bookmarks
    pdf-pager -i scan.pdf -o scan-numbered.pdf -a N -r N

    # Merge only
    pdf-pager -i a.pdf -i b.pdf -p N -r N --open")]
struct Cli {
    /// Input PDF with optional bookmark and parent titles (repeatable, in order)
    #[arg(short = 'i', value_name = "PATH[|TITLE[|PARENT]]", required = true)]
    inputs: Vec<String>,

    /// Output PDF file path
    #[arg(short = 'o', default_value = "output.pdf")]
    output: PathBuf,

    /// Text placed before each page number, e.g. "Page"
    #[arg(short = 'm')]
    mask: Option<String>,

    /// Append " of N" to page numbers
    #[arg(short = 't', value_name = "Y|N", default_value = "Y", value_parser = parse_yes_no, action = ArgAction::Set)]
    show_total: bool,

    /// Append today's date (YYYY-MM-DD) to the output file name
    #[arg(short = 'a', value_name = "Y|N", default_value = "Y", value_parser = parse_yes_no, action = ArgAction::Set)]
    append_date: bool,

    /// Distance of the page number from the bottom edge, in points
    #[arg(short = 'b', default_value_t = 10)]
    bottom_margin: u32,

    /// Add page numbers
    #[arg(short = 'p', value_name = "Y|N", default_value = "Y", value_parser = parse_yes_no, action = ArgAction::Set)]
    page_numbers: bool,

    /// Add bookmarks
    #[arg(short = 'r', value_name = "Y|N", default_value = "Y", value_parser = parse_yes_no, action = ArgAction::Set)]
    bookmarks: bool,

    /// Directory for the rotating log file
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Open the output file after creation
    #[arg(long)]
    open: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let _log = logging::init(&cli.log_dir)
        .with_context(|| format!("Cannot log to {}", cli.log_dir.display()))?;

    let result = build(&cli);
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

fn build(cli: &Cli) -> anyhow::Result<()> {
    let records = parse_inputs(&cli.inputs)?;

    let options = PipelineOptions {
        output_path: cli.output.clone(),
        mask: cli.mask.clone().unwrap_or_default(),
        show_total: cli.show_total,
        append_date: cli.append_date,
        bottom_margin: cli.bottom_margin as f32,
        number_pages: cli.page_numbers,
        add_bookmarks: cli.bookmarks,
        ..Default::default()
    };

    eprintln!("Processing {} PDF files...", records.len());

    let report = Pipeline::new(records, options, date::today())?.run()?;

    for failure in &report.cleanup_failures {
        eprintln!("Warning: {}", failure);
    }
    eprintln!("Output: {} ({} pages)", report.output_path.display(), report.page_count);

    if cli.open {
        open_file(&report.output_path)
            .with_context(|| format!("Cannot open {}", report.output_path.display()))?;
    }

    Ok(())
}

/// Open a file with the system default application
fn open_file(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}
