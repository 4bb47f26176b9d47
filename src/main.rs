use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use log::{error, warn};
use tokio::runtime::Builder;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::Bootstrapper;
use crate::engine::state::BootstrapOutcome;
use crate::env::BootstrapConfig;
use crate::networking::NetworkClient;
use crate::process::ProcessLauncher;

mod engine;
mod env;
mod networking;
mod process;
mod storage;
mod transfer;
mod ui;
mod util;

#[derive(Parser, Debug)]
#[command(
    name = "resource-launcher",
    author,
    version,
    about = "Keeps the application's writable resource bundle current, then launches it"
)]
struct Cli {
    /// Print launcher version and exit.
    #[arg(long)]
    version_only: bool,

    /// JSON file with launcher settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the resource bundle is installed into.
    #[arg(long)]
    home: Option<PathBuf>,

    /// Base URL serving the resource descriptor and archive.
    #[arg(long)]
    remote_url: Option<String>,

    /// Application executable to start once resources are ready.
    #[arg(long)]
    app_command: Option<PathBuf>,

    /// Skip provisioning and run from the working directory.
    #[arg(long)]
    standalone: bool,

    /// Connect/read timeout for HTTP requests, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log fatal errors instead of showing a dialog.
    #[arg(long)]
    headless: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Arguments passed through to the application.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    app_args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if cli.version_only {
        println!("resource-launcher {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("config: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            error!("failed to create Tokio runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut launcher = ProcessLauncher::new(config.app_command.clone());
    if cli.headless {
        launcher = launcher.headless();
    }
    let source = NetworkClient::new(Duration::from_secs(config.http_timeout_secs));
    let bootstrapper = Bootstrapper::new(config, source, launcher);

    let outcome = runtime.block_on(async {
        let (tx, rx) = mpsc::unbounded_channel();
        let view = tokio::spawn(ui::render_progress(rx));
        let outcome = bootstrapper.run(&tx).await;
        drop(tx);
        join_progress_view(view).await;
        outcome
    });

    match outcome {
        BootstrapOutcome::Launched(_) => ExitCode::SUCCESS,
        BootstrapOutcome::Fatal(_) => ExitCode::FAILURE,
    }
}

/// Wait for the progress view to drain; a crashed view is logged, not fatal.
async fn join_progress_view(view: JoinHandle<()>) -> bool {
    match view.await {
        Ok(()) => true,
        Err(err) => {
            warn!("progress view stopped abnormally: {}", err);
            false
        }
    }
}

fn build_config(cli: &Cli) -> Result<BootstrapConfig, String> {
    let mut config = match &cli.config {
        Some(path) => BootstrapConfig::load(path)?,
        None => BootstrapConfig::default(),
    };

    if let Some(home) = &cli.home {
        config.resource_root = home.clone();
    }
    if let Some(url) = &cli.remote_url {
        config.remote_base_url = Some(url.clone());
    }
    if let Some(command) = &cli.app_command {
        config.app_command = Some(command.clone());
    }
    if let Some(timeout) = cli.timeout_secs {
        config.http_timeout_secs = timeout;
    }
    if !cli.app_args.is_empty() {
        config.app_args = cli.app_args.clone();
    }
    if cli.standalone {
        config.standalone = true;
    }
    if config.standalone {
        config.resource_root = std::env::current_dir()
            .map_err(|e| format!("unable to determine working directory: {e}"))?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "resource-launcher",
            "--home",
            "/opt/res",
            "--remote-url",
            "http://example.org/jws/",
            "--timeout-secs",
            "5",
            "--",
            "--debug",
            "-x",
        ])
        .unwrap();

        let config = build_config(&cli).unwrap();

        assert_eq!(config.resource_root, PathBuf::from("/opt/res"));
        assert_eq!(config.remote_base_url.as_deref(), Some("http://example.org/jws/"));
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.app_args, vec!["--debug", "-x"]);
        assert!(!config.standalone);
    }

    #[test]
    fn config_file_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher.json");
        std::fs::write(
            &path,
            r#"{ "resource_root": "/from/file", "remote_base_url": "http://file.example/" }"#,
        )
        .unwrap();
        let path_arg = path.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "resource-launcher",
            "--config",
            path_arg.as_str(),
            "--home",
            "/from/cli",
        ])
        .unwrap();

        let config = build_config(&cli).unwrap();

        assert_eq!(config.resource_root, PathBuf::from("/from/cli"));
        assert_eq!(config.remote_base_url.as_deref(), Some("http://file.example/"));
    }

    #[test]
    fn standalone_runs_from_working_directory() {
        let cli = Cli::try_parse_from(["resource-launcher", "--standalone", "--home", "/ignored"])
            .unwrap();
        let config = build_config(&cli).unwrap();
        assert!(config.standalone);
        assert_eq!(config.resource_root, std::env::current_dir().unwrap());
    }

    #[tokio::test]
    async fn crashed_progress_view_is_reported() {
        let crashed: JoinHandle<()> = tokio::spawn(async { panic!("renderer failed") });
        assert!(!join_progress_view(crashed).await);

        let finished = tokio::spawn(async {});
        assert!(join_progress_view(finished).await);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["resource-launcher", "--config", "/nonexistent/launcher.json"])
            .unwrap();
        assert!(build_config(&cli).is_err());
    }
}
