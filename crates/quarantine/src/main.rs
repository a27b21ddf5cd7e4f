//! Build-time enforcement of the governed/ungoverned namespace boundary.
//!
//! Invariant: code outside `ungoverned/` must not import from it. Martial-law
//! artifacts are liability-isolated precisely because nothing governed
//! depends on that namespace; this scanner makes the isolation mechanical
//! rather than a convention someone can forget.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use regex::Regex;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "quarantine-check", about = "Scan a source tree for forbidden imports of the ungoverned namespace")]
struct Args {
    /// Root of the source tree to scan.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Directory name that marks the ungoverned namespace.
    #[arg(long, default_value = "ungoverned")]
    namespace: String,

    /// Exit non-zero on any violation (the default); pass to make that explicit in CI.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug)]
struct Violation {
    file: PathBuf,
    line: usize,
    text: String,
}

fn is_under_namespace(path: &Path, root: &Path, namespace: &str) -> bool {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.components().any(|c| c.as_os_str() == namespace))
        .unwrap_or(false)
}

fn scan_file(path: &Path, namespace: &str, import_pattern: &Regex) -> Vec<Violation> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Vec::new();
    };

    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            import_pattern.captures(line).and_then(|caps| {
                let referenced = caps.get(1)?.as_str();
                if referenced.contains(namespace) {
                    Some(Violation { file: path.to_path_buf(), line: idx + 1, text: line.trim().to_string() })
                } else {
                    None
                }
            })
        })
        .collect()
}

fn run(args: &Args) -> Vec<Violation> {
    let import_pattern = Regex::new(r"(?:use|mod)\s+([a-zA-Z0-9_:]+)").expect("static import pattern");

    WalkDir::new(&args.root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("rs"))
        .filter(|entry| !is_under_namespace(entry.path(), &args.root, &args.namespace))
        .flat_map(|entry| scan_file(entry.path(), &args.namespace, &import_pattern))
        .collect()
}

fn main() -> ExitCode {
    let args = Args::parse();
    let violations = run(&args);

    if violations.is_empty() {
        println!("quarantine-check: no violations found");
        return ExitCode::SUCCESS;
    }

    eprintln!("quarantine-check: {} violation(s) found", violations.len());
    for v in &violations {
        eprintln!("  {}:{}: {}", v.file.display(), v.line, v.text);
    }
    ExitCode::FAILURE
}
