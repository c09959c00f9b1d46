use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress reporter for batch analysis
pub struct ProgressReporter {
    show_progress: bool,
}

impl ProgressReporter {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Bar over `total` files, drawn on stderr
    pub fn create_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(total);
        let bar_style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(bar_style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Some(pb)
    }

    /// Finish progress bar with success message
    pub fn finish_bar(pb: &Option<ProgressBar>, message: &str) {
        if let Some(pb) = pb {
            pb.finish_with_message(format!("{} {}", style("✓").green(), message));
        }
    }

    /// Finish progress bar with error message
    pub fn finish_bar_error(pb: &Option<ProgressBar>, message: &str) {
        if let Some(pb) = pb {
            pb.finish_with_message(format!("{} {}", style("✗").red(), message));
        }
    }
}
