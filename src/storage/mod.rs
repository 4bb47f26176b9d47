use std::path::PathBuf;

use log::{debug, warn};
use tokio::fs;

use crate::engine::models::ResourceDescriptor;
use crate::env::BootstrapConfig;

/// Reads and writes the descriptor of the locally installed resource bundle.
#[derive(Clone, Debug)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(config: &BootstrapConfig) -> Self {
        Self {
            path: config.descriptor_path(),
        }
    }

    /// Absent or unreadable files are a normal first-run state, not an error.
    pub async fn read_local(&self) -> Option<ResourceDescriptor> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    "storage: local descriptor unavailable at {}: {}",
                    self.path.display(),
                    err
                );
                return None;
            }
        };
        let payload = String::from_utf8_lossy(&bytes);
        let descriptor = ResourceDescriptor::parse(&payload);
        debug!(
            "storage: local descriptor version {:?}",
            descriptor.as_ref().map(|d| d.version().to_owned())
        );
        descriptor
    }

    /// Overwrite the local descriptor with `descriptor`'s raw payload.
    pub async fn write_local(&self, descriptor: &ResourceDescriptor) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, descriptor.raw_payload().as_bytes()).await
    }
}
