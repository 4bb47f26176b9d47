use std::ffi::OsString;
use std::path::PathBuf;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::engine::models::ResourceDescriptor;
use crate::engine::state::{BootstrapOutcome, BootstrapState, LaunchMode, SyncDecision};
use crate::env::BootstrapConfig;
use crate::networking::ResourceSource;
use crate::storage::MetadataStore;
use crate::transfer::{start_download, start_extract};

pub mod models;
pub mod state;

const MISSING_RESOURCES: &str = "The application could not acquire the resources it needs to run. \
Please ensure you have a connection to the Internet and can reach the resource server, then try again.";
const MISSING_RESOURCES_TITLE: &str = "Missing Required Resources!";
const NO_HOME_TITLE: &str = "No Resource Home";
const LAUNCH_FAILED_TITLE: &str = "Application Failed to Start";

/// The application the resources are provisioned for.
pub trait Launcher: Send + Sync {
    /// Start the application. Called at most once per run.
    fn launch(&self, context: &LaunchContext) -> Result<(), String>;

    /// Show a blocking, user-facing error. The caller terminates afterwards.
    fn report_fatal(&self, title: &str, message: &str);
}

/// What the application is told about its resources when it starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchContext {
    pub resource_root: PathBuf,
    pub config_file: PathBuf,
    pub sessions_dir: PathBuf,
    pub courses_dir: PathBuf,
    pub mode: LaunchMode,
    pub args: Vec<String>,
}

impl LaunchContext {
    pub fn new(config: &BootstrapConfig, mode: LaunchMode) -> Self {
        Self {
            resource_root: config.resource_root.clone(),
            config_file: config.required_config_path(),
            sessions_dir: config.sessions_dir(),
            courses_dir: config.courses_dir(),
            mode,
            args: config.app_args.clone(),
        }
    }

    /// Command-line arguments handed to the application process.
    pub fn command_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--home".into(),
            self.resource_root.clone().into(),
            "--config".into(),
            self.config_file.clone().into(),
            "--sessions".into(),
            self.sessions_dir.clone().into(),
            "--courses".into(),
            self.courses_dir.clone().into(),
        ];
        if self.mode == LaunchMode::Degraded {
            args.push("--degraded".into());
        }
        args.extend(self.args.iter().map(OsString::from));
        args
    }
}

/// Brings the local resource bundle up to date, then hands over to the application.
pub struct Bootstrapper<S, L> {
    config: BootstrapConfig,
    source: S,
    store: MetadataStore,
    launcher: L,
}

impl<S, L> Bootstrapper<S, L>
where
    S: ResourceSource,
    L: Launcher,
{
    pub fn new(config: BootstrapConfig, source: S, launcher: L) -> Self {
        let store = MetadataStore::new(&config);
        Self {
            config,
            source,
            store,
            launcher,
        }
    }

    /// Run the pipeline to a terminal state.
    pub async fn run(&self, updates: &mpsc::UnboundedSender<BootstrapState>) -> BootstrapOutcome {
        if self.config.standalone {
            info!(
                "bootstrap: standalone mode, using resources in {}",
                self.config.resource_root.display()
            );
            return self.launch(LaunchMode::Current, updates);
        }

        if let Err(err) = self.config.ensure_resource_root() {
            error!(
                "bootstrap: unable to create {}: {}",
                self.config.resource_root.display(),
                err
            );
            return self.fatal(
                NO_HOME_TITLE,
                format!(
                    "The home directory {} does not exist and could not be created.",
                    self.config.resource_root.display()
                ),
                updates,
            );
        }

        updates.send(BootstrapState::Init).ok();
        let (local, remote) = tokio::join!(self.store.read_local(), self.fetch_remote());

        updates.send(BootstrapState::Deciding).ok();
        let decision = SyncDecision::decide(local.as_ref(), remote.as_ref());
        info!(
            "bootstrap: local version {:?}, remote version {:?}",
            local.as_ref().map(ResourceDescriptor::version),
            remote.as_ref().map(ResourceDescriptor::version)
        );

        match decision {
            SyncDecision::UpToDate => {
                info!("bootstrap: resources up to date");
                updates.send(BootstrapState::Skipping).ok();
                self.launch(LaunchMode::Current, updates)
            }
            SyncDecision::NeedsDownload(remote) => match self.synchronize(&remote, updates).await {
                Ok(()) => self.launch(LaunchMode::Current, updates),
                Err(reason) => self.fallback(reason, updates),
            },
            SyncDecision::OfflineFallback => {
                self.fallback("remote resources metadata unavailable".into(), updates)
            }
            SyncDecision::Unresolvable => self.fallback(
                "could not locate local or remote resources metadata".into(),
                updates,
            ),
        }
    }

    async fn fetch_remote(&self) -> Option<ResourceDescriptor> {
        let Some(url) = self.config.remote_descriptor_url() else {
            warn!("bootstrap: no remote base URL configured");
            return None;
        };
        self.source.fetch_descriptor(&url).await
    }

    /// Download and extract `remote`, then record it as installed.
    async fn synchronize(
        &self,
        remote: &ResourceDescriptor,
        updates: &mpsc::UnboundedSender<BootstrapState>,
    ) -> Result<(), String> {
        let url = self
            .config
            .remote_archive_url()
            .ok_or("no remote archive URL configured")?;
        let archive = self.config.archive_path();

        let mut download = start_download(
            &self.source,
            &url,
            archive.clone(),
            remote.expected_size(),
        )
        .await
        .map_err(|e| format!("download failed to start: {e}"))?;
        while let Some(progress) = download.next_progress().await {
            updates.send(BootstrapState::Downloading { progress }).ok();
        }
        let bytes = download
            .finish()
            .await
            .map_err(|e| format!("download failed: {e}"))?;
        info!("bootstrap: downloaded {} bytes", bytes);

        let mut extraction = start_extract(
            archive,
            self.config.resource_root.clone(),
            self.config.reserved_prefix.clone(),
        );
        while let Some(progress) = extraction.next_progress().await {
            updates.send(BootstrapState::Extracting { progress }).ok();
        }
        let files = extraction
            .finish()
            .await
            .map_err(|e| format!("extraction failed: {e}"))?;
        info!("bootstrap: extracted {} files", files);

        // Recorded only now so a failed extraction is retried on the next run.
        if let Err(err) = self.store.write_local(remote).await {
            error!("bootstrap: couldn't update metadata file: {}", err);
        }
        Ok(())
    }

    fn fallback(
        &self,
        reason: String,
        updates: &mpsc::UnboundedSender<BootstrapState>,
    ) -> BootstrapOutcome {
        warn!("bootstrap: {}; checking for usable local resources", reason);
        updates.send(BootstrapState::FallbackCheck { reason }).ok();

        let required = self.config.required_config_path();
        if required.exists() {
            debug!("bootstrap: found {}", required.display());
            self.launch(LaunchMode::Degraded, updates)
        } else {
            self.fatal(MISSING_RESOURCES_TITLE, MISSING_RESOURCES.into(), updates)
        }
    }

    fn launch(
        &self,
        mode: LaunchMode,
        updates: &mpsc::UnboundedSender<BootstrapState>,
    ) -> BootstrapOutcome {
        let context = LaunchContext::new(&self.config, mode);
        match self.launcher.launch(&context) {
            Ok(()) => {
                info!("bootstrap: launched in {} mode", mode.label());
                updates.send(BootstrapState::Launch { mode }).ok();
                BootstrapOutcome::Launched(mode)
            }
            Err(err) => self.fatal(
                LAUNCH_FAILED_TITLE,
                format!("The application failed to start: {err}"),
                updates,
            ),
        }
    }

    fn fatal(
        &self,
        title: &str,
        message: String,
        updates: &mpsc::UnboundedSender<BootstrapState>,
    ) -> BootstrapOutcome {
        error!("bootstrap: fatal: {}", message);
        updates.send(BootstrapState::Fatal(message.clone())).ok();
        self.launcher.report_fatal(title, &message);
        BootstrapOutcome::Fatal(message)
    }
}
