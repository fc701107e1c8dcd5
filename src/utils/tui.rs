//! Terminal progress while a pass talks to the providers.

use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

fn pass_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{msg} {spinner} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["-", "\\", "|", "/", "-"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Await `task` behind a spinner. The spinner is cleared before the
/// output is returned, so errors print on a clean line.
pub async fn while_spinning<F: Future>(message: impl Into<String>, task: F) -> F::Output {
    let spinner = pass_spinner(message.into());
    let output = task.await;
    spinner.finish_and_clear();
    output
}
