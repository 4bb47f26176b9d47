use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{info, warn};
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use tokio::sync::mpsc;

use crate::engine::state::BootstrapState;

const BAR_TEMPLATE: &str = "{msg}\n[{bar:40.cyan/blue}] {pos:>3}%";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Download,
    Extract,
}

impl Stage {
    fn message(self) -> &'static str {
        match self {
            Stage::Download => "Downloading required resources (targets, sounds, etc.)...",
            Stage::Extract => "Extracting required resources (targets, sounds, etc.)...",
        }
    }
}

/// Terminal rendering of bootstrap progress, one bar per transfer stage.
pub struct ProgressView {
    visible: bool,
    active: Option<(Stage, ProgressBar)>,
}

impl ProgressView {
    pub fn new() -> Self {
        Self {
            visible: true,
            active: None,
        }
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            visible: false,
            active: None,
        }
    }

    pub fn apply(&mut self, state: &BootstrapState) {
        match state {
            BootstrapState::Downloading { progress } => {
                self.bar(Stage::Download).set_position(to_position(*progress));
            }
            BootstrapState::Extracting { progress } => {
                self.bar(Stage::Extract).set_position(to_position(*progress));
            }
            BootstrapState::Init => info!("Checking resources..."),
            BootstrapState::Deciding => {}
            BootstrapState::Skipping => info!("Resources are up to date"),
            BootstrapState::FallbackCheck { reason } => {
                self.abandon_active();
                warn!("Could not refresh resources ({reason}); checking local copy");
            }
            BootstrapState::Launch { mode } => {
                self.finish_active();
                info!("Starting application ({} resources)", mode.label());
            }
            BootstrapState::Fatal(_) => self.abandon_active(),
        }
    }

    pub fn finish_active(&mut self) {
        if let Some((_, bar)) = self.active.take() {
            bar.finish();
        }
    }

    fn abandon_active(&mut self) {
        if let Some((_, bar)) = self.active.take() {
            bar.abandon();
        }
    }

    fn bar(&mut self, stage: Stage) -> ProgressBar {
        if let Some((current, bar)) = &self.active
            && *current == stage
        {
            return bar.clone();
        }
        self.finish_active();

        let target = if self.visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(100), target);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(stage.message());
        self.active = Some((stage, bar.clone()));
        bar
    }
}

impl Default for ProgressView {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw every state published by the bootstrapper until the channel closes.
pub async fn render_progress(mut updates: mpsc::UnboundedReceiver<BootstrapState>) {
    let mut view = ProgressView::new();
    while let Some(state) = updates.recv().await {
        view.apply(&state);
    }
    view.finish_active();
}

/// Blocking native error dialog.
pub fn show_fatal_dialog(title: &str, message: &str) {
    let _ = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn to_position(progress: f32) -> u64 {
    progress.clamp(0.0, 100.0).round() as u64
}
