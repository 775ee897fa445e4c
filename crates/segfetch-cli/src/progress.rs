use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use segfetch::{FetchPhase, Progress};

const PB_STYLE: &str = "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

/// A progress bar fed by the transfer's progress callback.
#[derive(Clone)]
pub struct TransferBar {
    pb: ProgressBar,
}

impl TransferBar {
    pub fn new(file_name: &str) -> Self {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(PB_STYLE) {
            pb.set_style(style.tick_chars(TICK).progress_chars(PB_CHARS));
        }
        pb.set_prefix(file_name.to_string());
        Self { pb }
    }

    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, progress: &Progress) {
        if let Some(total) = progress.bytes_total {
            self.pb.set_length(total);
        }
        self.pb.set_position(progress.bytes_done);
        match progress.phase {
            FetchPhase::Fetching => self.pb.set_message(format!(
                "{}/{} segments",
                progress.segments_done, progress.segments_total
            )),
            phase => self.pb.set_message(phase.to_string()),
        }
    }

    /// Callback suitable for [`segfetch::FetchOptions::on_progress`].
    pub fn reporter(&self) -> Arc<dyn Fn(&Progress) + Send + Sync> {
        let bar = self.clone();
        Arc::new(move |progress| bar.update(progress))
    }

    pub fn finish(&self) { self.pb.finish_and_clear(); }
}
