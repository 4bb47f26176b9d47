//! Background transfer tasks (archive download and extraction).
//!
//! Each task runs on its own worker and exposes two things to the caller: a
//! stream of progress percentages and exactly one terminal result. The
//! worker owns the only progress sender, so the progress stream is closed
//! before the result can be observed.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod download;
pub mod error;
pub mod extract;

pub use download::start_download;
pub use error::{DownloadError, ExtractError};
pub use extract::start_extract;

/// Progress reporter handed to a worker.
///
/// Values are clamped to `[0, 100]` and never go backwards.
#[derive(Debug)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<f32>,
    last: f32,
}

impl ProgressSender {
    fn new(tx: mpsc::UnboundedSender<f32>) -> Self {
        Self { tx, last: 0.0 }
    }

    pub fn report(&mut self, percent: f32) {
        let value = percent.clamp(0.0, 100.0).max(self.last);
        self.last = value;
        // The receiver may be gone if the caller stopped watching; the work continues.
        let _ = self.tx.send(value);
    }

    pub fn complete(&mut self) {
        self.report(100.0);
    }
}

pub struct TransferTask<T, E> {
    progress: mpsc::UnboundedReceiver<f32>,
    worker: JoinHandle<Result<T, E>>,
}

impl<T, E> TransferTask<T, E>
where
    T: Send + 'static,
    E: From<std::io::Error> + Send + 'static,
{
    /// Run an async worker on the runtime.
    pub fn spawn<F, Fut>(work: F) -> Self
    where
        F: FnOnce(ProgressSender) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(work(ProgressSender::new(tx)));
        Self {
            progress: rx,
            worker,
        }
    }

    /// Run a synchronous worker on a dedicated blocking thread.
    pub fn spawn_blocking<F>(work: F) -> Self
    where
        F: FnOnce(ProgressSender) -> Result<T, E> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::task::spawn_blocking(move || work(ProgressSender::new(tx)));
        Self {
            progress: rx,
            worker,
        }
    }

    /// Next progress value, or `None` once the worker has finished.
    pub async fn next_progress(&mut self) -> Option<f32> {
        self.progress.recv().await
    }

    /// Wait for the terminal result. Undelivered progress is discarded.
    pub async fn finish(mut self) -> Result<T, E> {
        while self.progress.recv().await.is_some() {}
        match self.worker.await {
            Ok(result) => result,
            Err(err) => Err(E::from(std::io::Error::other(format!(
                "transfer worker stopped: {err}"
            )))),
        }
    }
}
