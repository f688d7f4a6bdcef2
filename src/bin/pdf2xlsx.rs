//! CLI tool for PDF to XLSX conversion

use pdf_xlsx::session::{format_file_size, PipelineEvent, PipelineObserver};
use pdf_xlsx::{DocumentInput, ExportOptions, Session};
use std::env;
use std::fs;
use std::process;

struct StderrObserver;

impl PipelineObserver for StderrObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::TablesReady { names } => {
                eprintln!("Found {} tables: {}", names.len(), names.join(", "));
            }
            PipelineEvent::Failed { message } => eprintln!("Error: {}", message),
            _ => {}
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <pdf_file> [output_file] [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --style NAME       style preset (modern, classic, minimal, colorful)");
    eprintln!("  --sheet NAME       base sheet name");
    eprintln!("  --no-auto-width    keep default column widths");
    eprintln!("  --no-freeze        do not freeze the header row");
    process::exit(1);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let pdf_path = &args[1];
    let mut output_file: Option<String> = None;
    let mut options = ExportOptions::default();

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--style" => match rest.next() {
                Some(name) => options.style_name = name.clone(),
                None => usage(&args[0]),
            },
            "--sheet" => match rest.next() {
                Some(name) => options.sheet_name_base = name.clone(),
                None => usage(&args[0]),
            },
            "--no-auto-width" => options.auto_width = false,
            "--no-freeze" => options.freeze_header = false,
            other if output_file.is_none() && !other.starts_with("--") => {
                output_file = Some(other.to_string());
            }
            _ => usage(&args[0]),
        }
    }

    let bytes = match fs::read(pdf_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: {}: {}", pdf_path, e);
            process::exit(1);
        }
    };

    let mut session = Session::new();
    session.subscribe(StderrObserver);

    let file_name = std::path::Path::new(pdf_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| pdf_path.clone());

    if session.load(DocumentInput::new(file_name, bytes)).is_err() {
        process::exit(2);
    }

    if let Some(preview) = session.preview() {
        println!("PDF to XLSX Conversion");
        println!("======================");
        println!("File: {}", pdf_path);
        if let Some(doc) = session.document() {
            println!("Size: {}", format_file_size(doc.size));
        }
        println!();
        println!("--- {} ---", preview.name);
        for row in preview.padded_rows() {
            println!("{}", row.join(" | "));
        }
        if let Some(note) = preview.note() {
            println!("({})", note);
        }
        println!();
    }

    let artifact = match session.export(&options) {
        Ok(artifact) => artifact,
        Err(_) => process::exit(1),
    };

    let output = output_file.unwrap_or_else(|| artifact.file_name.clone());
    if let Err(e) = fs::write(&output, &artifact.bytes) {
        eprintln!("Error: {}: {}", output, e);
        process::exit(1);
    }

    println!("Sheets: {}", artifact.sheet_names.join(", "));
    println!("Workbook written to: {}", output);
}
