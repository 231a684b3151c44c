//! Main entry point for the zipfs CLI application.
//!
//! This binary browses a ZIP archive through the virtual filesystem:
//! listing the synthesized directory tree and printing file contents,
//! from a local file, a remote URL, or an archive appended to the
//! executable itself.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use zipfs::{Cli, HttpRangeReader, Metadata, ReadAt, ZipFs, ZipParser};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate source
/// based on whether the input is a local file or HTTP URL.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.is_http_url() {
        // Remote ZIP file via HTTP Range requests
        let reader = Arc::new(HttpRangeReader::new(cli.file.clone())?);
        let fs = ZipFs::with_random_access(ZipParser::new(reader.clone()))?;
        run(&fs, &cli)?;

        // Display network transfer statistics for HTTP sources
        if !cli.quiet {
            eprintln!(
                "\nTotal bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
        Ok(())
    } else {
        // Local ZIP file, falling back to an archive appended to this
        // executable when the path does not exist
        let fs = ZipFs::init(Path::new(&cli.file))?;
        run(&fs, &cli)
    }
}

/// Execute the requested operation against the virtual filesystem.
fn run<R: ReadAt + 'static>(fs: &ZipFs<R>, cli: &Cli) -> Result<()> {
    // Explicit paths: stat or print each one
    if !cli.paths.is_empty() {
        let separators = cli.paths.len() > 1 && !cli.quiet && !cli.stat;
        for path in &cli.paths {
            if cli.stat {
                let handle = fs.open(path)?;
                print_entry(path, handle.metadata());
            } else {
                if separators {
                    println!("--- {} ---", path);
                }
                let mut handle = fs.open(path)?;
                let mut stdout = std::io::stdout().lock();
                std::io::copy(&mut handle, &mut stdout)?;
                stdout.flush()?;
            }
        }
        return Ok(());
    }

    // No paths: list the root, or walk the whole tree with -l
    if cli.list || cli.verbose {
        walk(fs, "/", cli.verbose)
    } else {
        let mut root = fs.open("/")?;
        for child in root.read_dir(0)? {
            println!("{}", child.name());
        }
        Ok(())
    }
}

/// Recursively list every path under `path`.
///
/// Recursion follows directory listings, so files whose parent directory
/// was never recorded in the archive do not appear in the walk.
fn walk<R: ReadAt + 'static>(fs: &ZipFs<R>, path: &str, verbose: bool) -> Result<()> {
    let mut handle = fs.open(path)?;
    for child in handle.read_dir(0)? {
        let child_path = if path == "/" {
            format!("/{}", child.name())
        } else {
            format!("{}/{}", path, child.name())
        };

        if verbose {
            print_entry(&child_path, &child);
        } else {
            println!("{}", child_path);
        }

        if child.is_dir() {
            walk(fs, &child_path, verbose)?;
        }
    }
    Ok(())
}

/// Print one verbose listing line: mode, size, date, path.
fn print_entry(path: &str, meta: &Metadata) {
    let kind = if meta.is_dir() { 'd' } else { '-' };
    println!(
        "{}{:04o}  {:>10}  {}  {}",
        kind,
        meta.mode(),
        meta.size(),
        format_time(meta.modified()),
        path
    );
}

/// Format a [`SystemTime`] as `YYYY-MM-DD HH:MM` UTC.
fn format_time(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let days = (secs / 86_400) as i64;
    let (year, month, day) = civil_from_days(days);
    let rem = secs % 86_400;
    let hour = rem / 3_600;
    let minute = (rem % 3_600) / 60;
    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}")
}

/// Proleptic Gregorian civil date for a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
