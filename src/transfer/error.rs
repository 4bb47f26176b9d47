use thiserror::Error;

/// Failures of the archive download stage.
///
/// All of them are recoverable by the bootstrap fallback policy.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    #[error("remote descriptor declares a zero-length archive")]
    ZeroLength,

    #[error("download I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

/// Failures of the archive extraction stage.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unusable archive: {0}")]
    BadArchive(String),

    #[error("extraction I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => ExtractError::IoFailure(io),
            other => ExtractError::BadArchive(other.to_string()),
        }
    }
}
