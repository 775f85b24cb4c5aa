//! Progress bar utilities for displaying transform status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

use crate::queue::ProgressCallback;

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (operations keep arriving while the visit runs)
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " transforms"
    )))
}

/// Update the bar's total once the visit knows how many operations it queued.
pub fn set_bar_total(pb: &ProgressBar, total: usize) {
    if let Ok(mut bar) = pb.try_lock() {
        bar.total = total;
        let _ = bar.refresh();
    }
}

/// Update progress bar if available
/// Uses try_lock to avoid blocking queue workers; a skipped update is caught up by the next one.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Queue callback that advances `bar` for every finished operation.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<ProgressCallback> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as ProgressCallback
    })
}
