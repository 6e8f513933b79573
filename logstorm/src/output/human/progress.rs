use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// One spinner on stderr; request lines are printed above it.
pub(crate) struct HumanProgress {
    inner: Mutex<Option<ProgressBar>>,
    enabled: bool,
}

impl HumanProgress {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            inner: Mutex::new(None),
            enabled,
        }
    }

    pub(crate) fn update(
        &self,
        total_duration_opt: Option<Duration>,
        elapsed: Duration,
        message: String,
    ) {
        if !self.enabled {
            return;
        }

        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let pb = inner.get_or_insert_with(|| new_bar(total_duration_opt));
        pb.set_message(message);

        match total_duration_opt {
            Some(total_d) => {
                let total_ms = total_d.as_millis() as u64;
                let elapsed_ms = elapsed.as_millis() as u64;
                pb.set_length(total_ms);
                pb.set_position(elapsed_ms.min(total_ms));
            }
            None => pb.tick(),
        }
    }

    /// Prints a line to stdout, hiding the progress display while it is written.
    pub(crate) fn println(&self, line: &str) {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match inner.as_ref() {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(pb) = inner.take() {
            pb.finish_and_clear();
        }
    }
}

fn new_bar(total_duration_opt: Option<Duration>) -> ProgressBar {
    let pb = match total_duration_opt {
        Some(_) => {
            let pb = ProgressBar::new(0);
            pb.set_style(bar_style());
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(spinner_style());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        }
    };
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));
    pb
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("[ {bar:20.cyan/blue} ] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
