use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// `<prefix>_YYYYMMDD_HHMM.zip`
pub fn archive_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.zip", prefix, at.format("%Y%m%d_%H%M"))
}

/// Zip every regular file directly inside `source_dir` into `archive_path`.
///
/// Entries are stored flat, sorted by name. An empty directory produces a
/// valid archive with no entries. Returns the entry names.
pub fn write_archive(source_dir: &Path, archive_path: &Path) -> Result<Vec<String>> {
    let files = list_files(source_dir)?;

    let mut zip = ZipWriter::new(File::create(archive_path)?);
    let mut entries = Vec::with_capacity(files.len());

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = fs::metadata(&path)?.len();
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(size >= u64::from(u32::MAX));

        debug!("Adding {} ({} bytes) to {}", name, size, archive_path.display());
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut File::open(&path)?, &mut zip)?;
        entries.push(name);
    }

    zip.finish()?;
    Ok(entries)
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
