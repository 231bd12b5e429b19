#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `photo_regions` binary.
//!
//! [`spawn_state_bar`] renders a run's [`ProgressState`] stream (from
//! `ProgressReporter::subscribe`) as an `indicatif` bar, and
//! [`init_logger`] routes `log` output through the same [`MultiProgress`] so
//! log lines are printed above the bar instead of through it.

pub mod paths;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use photo_regions_pipeline::ProgressState;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use indicatif::MultiProgress;

/// Progress bar counting accounted-for photos, driven by [`ProgressState`].
///
/// Starts as a spinner while photos are enumerated and bucketed, and
/// switches to a bar with percentage/ETA once the run is `hashed`.
pub struct StateBar {
    bar: ProgressBar,
    bar_style: ProgressStyle,
}

impl StateBar {
    /// Adds a new spinner to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(ProgressState::Ready.to_string());

        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {pos}/{len} photos {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Self { bar, bar_style }
    }

    /// Applies one observed state to the bar.
    pub fn render(&self, state: &ProgressState) {
        match state {
            ProgressState::Ready | ProgressState::Started => {
                self.bar.set_message(state.to_string());
            }
            ProgressState::Loaded { total } => {
                self.bar.set_length(*total as u64);
                self.bar.set_message(state.to_string());
            }
            ProgressState::Hashed {
                bucket_count,
                total,
            } => {
                self.bar.set_length(*total as u64);
                self.bar.set_position(0);
                self.bar.set_style(self.bar_style.clone());
                self.bar.set_message(format!("Resolving {bucket_count} buckets"));
            }
            ProgressState::Processed {
                no_located,
                located,
                ..
            } => {
                self.bar.set_position((no_located + located) as u64);
            }
            ProgressState::Complete => {
                if let Some(len) = self.bar.length() {
                    self.bar.set_position(len);
                }
                self.bar.finish_with_message(state.to_string());
            }
            ProgressState::Failed { .. } => {
                self.bar.abandon_with_message(state.to_string());
            }
        }
    }
}

/// Renders every state `states` observes onto a new [`StateBar`] until the
/// run reaches a terminal state or its reporter is dropped.
///
/// Intermediate `processed` states may be coalesced; the bar always shows
/// the latest one.
#[must_use]
pub fn spawn_state_bar(
    multi: &MultiProgress,
    mut states: watch::Receiver<ProgressState>,
) -> JoinHandle<()> {
    let bar = StateBar::new(multi);

    tokio::spawn(async move {
        loop {
            let state = states.borrow_and_update().clone();
            bar.render(&state);
            if state.is_terminal() {
                break;
            }
            if states.changed().await.is_err() {
                bar.bar.abandon();
                break;
            }
        }
    })
}

/// Initializes the global logger wrapped in `indicatif-log-bridge`.
///
/// `default_filter` uses `RUST_LOG` syntax and applies unless `RUST_LOG`
/// overrides it. Returns the [`MultiProgress`] that all progress bars must be
/// added to.
#[must_use]
pub fn init_logger(default_filter: &str) -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_filters(default_filter)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already set when several tests initialize logging.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
