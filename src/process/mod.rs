use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, error, info};

use crate::engine::{LaunchContext, Launcher};
use crate::ui;

/// Hands control to the application once its resources are in place.
#[derive(Clone, Debug, Default)]
pub struct ProcessLauncher {
    command: Option<PathBuf>,
    show_dialogs: bool,
}

impl ProcessLauncher {
    pub fn new(command: Option<PathBuf>) -> Self {
        Self {
            command,
            show_dialogs: true,
        }
    }

    /// Log fatal errors instead of opening a dialog.
    pub fn headless(mut self) -> Self {
        self.show_dialogs = false;
        self
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, context: &LaunchContext) -> Result<(), String> {
        let Some(command) = &self.command else {
            info!(
                "launch: resources ready in {} ({} mode); no application command configured",
                context.resource_root.display(),
                context.mode.label()
            );
            return Ok(());
        };

        let args = context.command_args();
        info!(
            "launch: starting {} in {} mode",
            command.display(),
            context.mode.label()
        );
        debug!("launch: args={:?}", args);

        let mut cmd = Command::new(command);
        cmd.args(&args);
        if context.resource_root.is_dir() {
            cmd.current_dir(&context.resource_root);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        cmd.spawn()
            .map_err(|e| format!("failed to start {}: {e}", command.display()))?;
        info!("launch: process started");
        Ok(())
    }

    fn report_fatal(&self, title: &str, message: &str) {
        error!("launch: {}: {}", title, message);
        if self.show_dialogs {
            ui::show_fatal_dialog(title, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::LaunchMode;
    use crate::env::BootstrapConfig;

    fn context(root: &std::path::Path) -> LaunchContext {
        LaunchContext::new(&BootstrapConfig::with_root(root), LaunchMode::Current)
    }

    #[test]
    fn without_command_launch_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new(None).headless();
        assert!(launcher.launch(&context(dir.path())).is_ok());
    }

    #[test]
    fn missing_executable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let launcher =
            ProcessLauncher::new(Some(dir.path().join("does-not-exist"))).headless();
        let err = launcher.launch(&context(dir.path())).unwrap_err();
        assert!(err.contains("failed to start"));
    }

    #[test]
    fn headless_fatal_report_only_logs() {
        ProcessLauncher::new(None)
            .headless()
            .report_fatal("No Resource Home", "The home directory could not be created.");
    }

    #[cfg(unix)]
    #[test]
    fn spawns_configured_command() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new(Some(PathBuf::from("true"))).headless();
        assert!(launcher.launch(&context(dir.path())).is_ok());
    }
}
