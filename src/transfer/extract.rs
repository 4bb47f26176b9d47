use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use log::{debug, info};
use zip::read::ZipArchive;

use crate::transfer::{ExtractError, ProgressSender, TransferTask};
use crate::util::progress_percent;

/// Unpack `archive` into `destination` on a blocking worker thread.
pub fn start_extract(
    archive: PathBuf,
    destination: PathBuf,
    reserved_prefix: String,
) -> TransferTask<usize, ExtractError> {
    TransferTask::spawn_blocking(move |mut progress| {
        extract_archive(&archive, &destination, &reserved_prefix, &mut progress)
    })
}

/// Extract every non-reserved entry and return the number of files written.
///
/// Files are overwritten without prompting. A failure part-way leaves the
/// files already written on disk.
pub fn extract_archive(
    archive_path: &Path,
    destination: &Path,
    reserved_prefix: &str,
    progress: &mut ProgressSender,
) -> Result<usize, ExtractError> {
    info!(
        "extract: unpacking {} into {}",
        archive_path.display(),
        destination.display()
    );
    let file = File::open(archive_path).map_err(|e| {
        ExtractError::BadArchive(format!("unable to open {}: {e}", archive_path.display()))
    })?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ExtractError::BadArchive(format!("zip parse error: {e}")))?;

    let total = count_eligible(&mut archive, reserved_prefix)?;
    debug!("extract: {} files to write", total);

    let mut written = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_owned();
        if name.starts_with(reserved_prefix) {
            debug!("extract: skipping internal entry {}", name);
            continue;
        }
        let relative = entry.enclosed_name().ok_or_else(|| {
            ExtractError::BadArchive(format!("entry {name} escapes the destination"))
        })?;
        let out_path = destination.join(relative);

        if entry.is_dir() {
            if !out_path.is_dir() {
                fs::create_dir_all(&out_path)?;
            }
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;

        written += 1;
        progress.report(progress_percent(written as u64, total as u64));
    }

    progress.complete();
    info!("extract: wrote {} files", written);
    Ok(written)
}

// First pass: the progress denominator.
fn count_eligible<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    reserved_prefix: &str,
) -> Result<usize, ExtractError> {
    let mut count = 0;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if !entry.name().starts_with(reserved_prefix) && !entry.is_dir() {
            count += 1;
        }
    }
    Ok(count)
}
