//! Terminal progress bar.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tilestitch::fetch::{ProgressObserver, ProgressSnapshot};

const TEMPLATE: &str = "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} tiles {msg}";

/// Creates a bar sized for `total` tiles.
pub fn tile_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

/// Observer that mirrors painted tiles and throttling onto `bar`.
pub fn bar_observer(bar: ProgressBar) -> ProgressObserver {
    Arc::new(move |snapshot: ProgressSnapshot| {
        bar.set_length(snapshot.total as u64);
        bar.set_position(snapshot.painted as u64);
        bar.set_message(status_message(&snapshot));
    })
}

fn status_message(snapshot: &ProgressSnapshot) -> String {
    let mut message = format!("({} fetched", snapshot.fetched);
    if snapshot.throttled > 0 {
        message.push_str(&format!(", {} throttled", snapshot.throttled));
    }
    message.push(')');
    message
}
