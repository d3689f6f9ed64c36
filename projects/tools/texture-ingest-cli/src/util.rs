use crate::error::CliError;
use bytesize::ByteSize;
use core::fmt;
use std::fs;
use std::path::*;
use std::time::Duration;
use tracing::error;

/// Recursively visits directories and collects entries.
///
/// Directories or entries that cannot be read are skipped; traversal continues with the
/// remaining entries.
pub fn find_all_files(dir: &Path, entries: &mut Vec<fs::DirEntry>) -> std::io::Result<()> {
    // Gracefully handle cases where the directory cannot be read
    let dir_entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };

    for entry in dir_entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue, // Skip problematic entries, e.g. those without access.
        };

        let path = entry.path();
        if path.is_dir() {
            find_all_files(&path, entries)?;
        } else {
            entries.push(entry);
        }
    }

    // Stable output regardless of directory order.
    entries.sort_by_key(|entry| entry.path());
    Ok(())
}

/// Canonicalizes an input path argument, which must already exist.
pub fn existing_cli_path(value: &str) -> Result<PathBuf, String> {
    fs::canonicalize(value).map_err(|e| format!("Invalid path: {e}"))
}

/// Canonicalizes an output path argument, creating the directory if it doesn't exist.
pub fn canonicalize_cli_path(value: &str) -> Result<PathBuf, String> {
    let path = Path::new(value);
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| format!("Failed to create directory: {e}"))?;
    }

    fs::canonicalize(path).map_err(|e| format!("Invalid path: {e}"))
}

/// The cache key for `path`: its location relative to `root`, with `/` separators.
pub fn relative_key(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Logs a failed entry. Processing of the remaining entries continues.
pub fn handle_process_entry_error(result: Result<(), CliError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("{e}");
            false
        }
    }
}

/// Runs `process` on every entry, in parallel when built with `multithreaded`.
///
/// Returns how many entries succeeded.
pub fn for_each_entry<F>(entries: &[fs::DirEntry], process: F) -> usize
where
    F: Fn(&fs::DirEntry) -> Result<(), CliError> + Sync + Send,
{
    #[cfg(feature = "multithreaded")]
    {
        use rayon::prelude::*;
        entries
            .par_iter()
            .map(|entry| handle_process_entry_error(process(entry)))
            .filter(|succeeded| *succeeded)
            .count()
    }

    #[cfg(not(feature = "multithreaded"))]
    {
        entries
            .iter()
            .map(|entry| handle_process_entry_error(process(entry)))
            .filter(|succeeded| *succeeded)
            .count()
    }
}

/// Bytes per second, printed in human-readable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput(u64);

impl Throughput {
    pub fn from_bytes_per_sec(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn measure(bytes: u64, elapsed: Duration) -> Self {
        let seconds = elapsed.as_secs_f64();
        if seconds > 0.0 {
            Self::from_bytes_per_sec((bytes as f64 / seconds) as u64)
        } else {
            Self::from_bytes_per_sec(0)
        }
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/s", ByteSize(self.0))
    }
}
