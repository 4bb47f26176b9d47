use std::io;
use std::path::PathBuf;

use futures_util::{Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::networking::ResourceSource;
use crate::transfer::{DownloadError, ProgressSender, TransferTask};
use crate::util::progress_percent;

/// Start streaming the archive at `url` into `destination`.
///
/// Validation and the connection happen before this returns, so
/// `ZeroLength` and `ConnectFailed` are reported directly. Everything after
/// the connection runs on a background task.
pub async fn start_download<S>(
    source: &S,
    url: &str,
    destination: PathBuf,
    expected_size: u64,
) -> Result<TransferTask<u64, DownloadError>, DownloadError>
where
    S: ResourceSource,
{
    if expected_size == 0 {
        error!("download: remote descriptor declares a zero-length archive");
        return Err(DownloadError::ZeroLength);
    }

    let stream = source.open_stream(url).await?;
    info!(
        "download: streaming {} ({} bytes) to {}",
        url,
        expected_size,
        destination.display()
    );

    Ok(TransferTask::spawn(move |progress| {
        stream_to_file(stream, destination, expected_size, progress)
    }))
}

/// Append every chunk of `stream` to `destination`, overwriting it in place.
///
/// On error the partially written file is closed and left on disk.
pub async fn stream_to_file<S, B>(
    mut stream: S,
    destination: PathBuf,
    expected_size: u64,
    mut progress: ProgressSender,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = io::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = File::create(&destination).await?;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .inspect_err(|e| warn!("download: stream error after {downloaded} bytes: {e}"))?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await?;
        downloaded += bytes.len() as u64;
        progress.report(progress_percent(downloaded, expected_size));
    }

    file.flush().await?;

    if downloaded != expected_size {
        warn!(
            "download: received {} bytes but descriptor declared {}",
            downloaded, expected_size
        );
    }
    progress.complete();
    debug!("download: wrote {} bytes to {}", downloaded, destination.display());
    Ok(downloaded)
}
