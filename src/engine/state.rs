use crate::engine::models::ResourceDescriptor;

// Observable progress of a bootstrap run, published to the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub enum BootstrapState {
    Init,
    Deciding,
    Downloading { progress: f32 },
    Extracting { progress: f32 },
    Skipping,
    FallbackCheck { reason: String },
    Launch { mode: LaunchMode },
    Fatal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchMode {
    /// Resources are known to match the published bundle.
    Current,
    /// Resources could not be refreshed; whatever is on disk is used.
    Degraded,
}

impl LaunchMode {
    pub fn label(self) -> &'static str {
        match self {
            LaunchMode::Current => "current",
            LaunchMode::Degraded => "degraded",
        }
    }
}

/// Terminal result of a bootstrap run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Launched(LaunchMode),
    Fatal(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncDecision {
    UpToDate,
    NeedsDownload(ResourceDescriptor),
    OfflineFallback,
    Unresolvable,
}

impl SyncDecision {
    /// Compare the installed and published descriptors.
    ///
    /// Versions are compared as exact strings; a remote version that merely
    /// looks older still triggers a download.
    pub fn decide(
        local: Option<&ResourceDescriptor>,
        remote: Option<&ResourceDescriptor>,
    ) -> Self {
        match (local, remote) {
            (None, None) => SyncDecision::Unresolvable,
            (None, Some(remote)) => SyncDecision::NeedsDownload(remote.clone()),
            (Some(_), None) => SyncDecision::OfflineFallback,
            (Some(local), Some(remote)) if local.version() == remote.version() => {
                SyncDecision::UpToDate
            }
            (Some(_), Some(remote)) => SyncDecision::NeedsDownload(remote.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(version: &str, size: u64) -> ResourceDescriptor {
        ResourceDescriptor::parse(&format!(
            r#"<resources version="{version}" fileSize="{size}"/>"#
        ))
        .unwrap()
    }

    #[test]
    fn nothing_known_is_unresolvable() {
        assert_eq!(SyncDecision::decide(None, None), SyncDecision::Unresolvable);
    }

    #[test]
    fn first_run_downloads_remote() {
        let remote = descriptor("2.0", 1000);
        assert_eq!(
            SyncDecision::decide(None, Some(&remote)),
            SyncDecision::NeedsDownload(remote.clone())
        );
    }

    #[test]
    fn unreachable_remote_falls_back_offline() {
        let local = descriptor("1.0", 500);
        assert_eq!(
            SyncDecision::decide(Some(&local), None),
            SyncDecision::OfflineFallback
        );
    }

    #[test]
    fn equal_versions_are_up_to_date() {
        let local = descriptor("1.0", 500);
        let remote = descriptor("1.0", 999);
        assert_eq!(
            SyncDecision::decide(Some(&local), Some(&remote)),
            SyncDecision::UpToDate
        );
    }

    #[test]
    fn differing_versions_download_even_if_remote_is_older() {
        let local = descriptor("2.0", 500);
        let remote = descriptor("1.0", 500);
        assert_eq!(
            SyncDecision::decide(Some(&local), Some(&remote)),
            SyncDecision::NeedsDownload(remote.clone())
        );
    }

    #[test]
    fn version_comparison_is_case_sensitive() {
        let local = descriptor("1.0-beta", 500);
        let remote = descriptor("1.0-BETA", 500);
        assert_eq!(
            SyncDecision::decide(Some(&local), Some(&remote)),
            SyncDecision::NeedsDownload(remote.clone())
        );
    }
}
