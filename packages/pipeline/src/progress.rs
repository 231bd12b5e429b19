//! Progress state machine.
//!
//! [`ProgressReporter`] owns the observable [`ProgressState`] of a run and
//! is the only place that decides whether a transition is allowed.
//! Observers either poll [`ProgressReporter::current`], wait on a
//! [`watch::Receiver`] from [`ProgressReporter::subscribe`], or receive
//! every accepted transition in order from [`ProgressReporter::with_events`].

use serde::Serialize;
use tokio::sync::{mpsc, watch};

/// Observable state of a resolution run.
///
/// Moves strictly forward:
///
/// ```text
/// ready -> started -> loaded -> hashed -> processed* -> complete
/// ```
///
/// `processed` may repeat with a non-decreasing `located` count. The total
/// recorded at `loaded` is carried forward, and every later observation must
/// agree with it. `failed` can be entered from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProgressState {
    /// Nothing has happened yet.
    Ready,
    /// A run was requested; photos are being enumerated.
    Started,
    /// Photos enumerated.
    Loaded {
        /// Number of photos.
        total: usize,
    },
    /// Photos partitioned into buckets.
    Hashed {
        /// Number of occupied buckets.
        bucket_count: usize,
        /// Number of photos, as recorded at `loaded`.
        total: usize,
    },
    /// At least one bucket resolved, more to go.
    Processed {
        /// Photos without a coordinate.
        no_located: usize,
        /// Photos resolved so far.
        located: usize,
        /// Number of photos.
        total: usize,
    },
    /// Every photo accounted for.
    Complete,
    /// The run failed.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl ProgressState {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed { .. })
    }

    /// Photo total recorded at `loaded`, if the run got that far.
    #[must_use]
    pub const fn total(&self) -> Option<usize> {
        match self {
            Self::Loaded { total }
            | Self::Hashed { total, .. }
            | Self::Processed { total, .. } => Some(*total),
            _ => None,
        }
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_advance_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Complete | Self::Failed { .. }, _) => false,
            (_, Self::Failed { .. })
            | (Self::Ready, Self::Started)
            | (Self::Started, Self::Loaded { .. })
            | (Self::Hashed { .. } | Self::Processed { .. }, Self::Complete) => true,
            (Self::Loaded { total }, Self::Hashed { total: next, .. }) => *total == *next,
            (
                Self::Hashed { .. } | Self::Processed { .. },
                Self::Processed {
                    no_located,
                    located,
                    total,
                },
            ) => {
                matches!(no_located.checked_add(*located), Some(sum) if sum < *total)
                    && self.accepts_counts(*no_located, *located, *total)
            }
            _ => false,
        }
    }

    /// Whether a `no_located + located` of `total` observation is consistent
    /// with `self`: same total and `no_located`, `located` not going
    /// backwards, and the sum not exceeding the total.
    #[must_use]
    pub const fn accepts_counts(&self, no_located: usize, located: usize, total: usize) -> bool {
        let within = matches!(no_located.checked_add(located), Some(sum) if sum <= total);

        match self {
            Self::Hashed { total: recorded, .. } => within && *recorded == total,
            Self::Processed {
                no_located: n,
                located: l,
                total: t,
            } => within && *n == no_located && *t == total && located >= *l,
            _ => false,
        }
    }
}

impl std::fmt::Display for ProgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::Started => f.write_str("started"),
            Self::Loaded { total } => write!(f, "loaded: {total}"),
            Self::Hashed { bucket_count, .. } => write!(f, "hashed: {bucket_count}"),
            Self::Processed {
                no_located,
                located,
                total,
            } => write!(
                f,
                "located: {located} - noLocated: {no_located} - total: {total}"
            ),
            Self::Complete => f.write_str("complete"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// A transition the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid progress transition: {from} -> {to}")]
pub struct TransitionError {
    /// State at the time of the attempt.
    pub from: ProgressState,
    /// Rejected target state.
    pub to: ProgressState,
}

/// Owner of a run's [`ProgressState`].
#[derive(Debug)]
pub struct ProgressReporter {
    state: watch::Sender<ProgressState>,
    events: Option<mpsc::UnboundedSender<ProgressState>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    /// Creates a reporter in [`ProgressState::Ready`].
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ProgressState::Ready);
        Self {
            state,
            events: None,
        }
    }

    /// Creates a reporter that also pushes every accepted transition, in
    /// order, to the returned receiver.
    #[must_use]
    pub fn with_events() -> (Self, mpsc::UnboundedReceiver<ProgressState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reporter = Self::new();
        reporter.events = Some(tx);
        (reporter, rx)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> ProgressState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes. The receiver always sees the latest
    /// state; intermediate `processed` observations may be coalesced.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state.subscribe()
    }

    /// `ready -> started`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the run was already started.
    pub fn start(&self) -> Result<(), TransitionError> {
        self.advance(ProgressState::Started)
    }

    /// `started -> loaded(total)`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the run is `started`.
    pub fn loaded(&self, total: usize) -> Result<(), TransitionError> {
        self.advance(ProgressState::Loaded { total })
    }

    /// `loaded -> hashed(bucket_count)`, carrying the loaded total forward.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the run is `loaded`.
    pub fn hashed(&self, bucket_count: usize) -> Result<(), TransitionError> {
        let total = self.current().total().unwrap_or(0);
        self.advance(ProgressState::Hashed {
            bucket_count,
            total,
        })
    }

    /// Records resolution progress.
    ///
    /// Moves to `complete` once `no_located + located == total`, otherwise
    /// to `processed`. Returns whether the run is now complete.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the run is not `hashed`/`processed`,
    /// if the counts disagree with the loaded total or an earlier
    /// observation, or if the run already completed.
    pub fn processed(
        &self,
        no_located: usize,
        located: usize,
        total: usize,
    ) -> Result<bool, TransitionError> {
        let complete = no_located.checked_add(located) == Some(total);
        let next = if complete {
            ProgressState::Complete
        } else {
            ProgressState::Processed {
                no_located,
                located,
                total,
            }
        };

        self.advance_if(next, |state| state.accepts_counts(no_located, located, total))?;
        Ok(complete)
    }

    /// Moves to `failed(reason)`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the run already reached a terminal
    /// state.
    pub fn fail(&self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(ProgressState::Failed {
            reason: reason.into(),
        })
    }

    fn advance(&self, next: ProgressState) -> Result<(), TransitionError> {
        self.advance_if(next, |_| true)
    }

    fn advance_if(
        &self,
        next: ProgressState,
        guard: impl FnOnce(&ProgressState) -> bool,
    ) -> Result<(), TransitionError> {
        let mut rejected = None;

        self.state.send_if_modified(|state| {
            if state.can_advance_to(&next) && guard(state) {
                log::trace!("Progress: {state} -> {next}");
                *state = next.clone();
                true
            } else {
                rejected = Some(state.clone());
                false
            }
        });

        if let Some(from) = rejected {
            return Err(TransitionError { from, to: next });
        }

        if let Some(events) = &self.events {
            // Receiver may have been dropped; the watch channel still holds
            // the state.
            let _ = events.send(next);
        }

        Ok(())
    }
}
