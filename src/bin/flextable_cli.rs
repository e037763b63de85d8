//! CLI tool for flextable - runs a CSV file through the table pipeline
//!
//! Usage:
//!   flextable_cli <input.csv>                  # Rendered HTML to stdout
//!   flextable_cli <input.csv> --csv            # Visible rows as CSV
//!   flextable_cli <input.csv> --raw            # Parsed dataset as CSV
//!   flextable_cli <input.csv> --html -o out.html

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use flextable::logging;
use flextable::preferences::MemoryPreferences;
use flextable::source::CsvDataSource;
use flextable::{AppController, AppState, FetchOutcome};

enum Output {
    Html,
    VisibleCsv,
    RawCsv,
}

fn usage() -> ! {
    eprintln!("Usage: flextable_cli <input.csv> [--html|--csv|--raw] [-o output]");
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    logging::init_from_env("FLEXTABLE_LOG", "warn");

    let input_path = &args[1];
    let mut output = Output::Html;
    let mut output_path = None;
    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--html" => output = Output::Html,
            "--csv" => output = Output::VisibleCsv,
            "--raw" => output = Output::RawCsv,
            "-o" => output_path = Some(rest.next().unwrap_or_else(|| usage())),
            _ => usage(),
        }
    }

    // Read input file
    let data = match fs::read(input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let name = std::path::Path::new(input_path)
        .file_stem()
        .map_or_else(|| "Sheet".to_string(), |s| s.to_string_lossy().into_owned());
    let mut source = CsvDataSource::new(name, data);
    let mut app = AppController::new(MemoryPreferences::new());
    if app.load(&mut source) != FetchOutcome::Applied {
        if let AppState::Error(message) = app.state() {
            eprintln!("Error loading {}: {}", input_path, message);
        }
        std::process::exit(1);
    }

    let text = match output {
        Output::Html => app.html(),
        Output::VisibleCsv => app.export_visible_csv().unwrap_or_default(),
        Output::RawCsv => app.export_raw_csv().unwrap_or_default(),
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &text) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
            {
                eprintln!("Error writing output: {}", e);
                std::process::exit(1);
            }
        }
    }
}
