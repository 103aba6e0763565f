//! Caller-supplied time limit and cancellation signal for order placement.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Checked between placement steps. A step that already started is allowed to
/// finish so its outcome is known and can be compensated.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Trips every `Deadline` built from the same pair.
#[derive(Debug)]
pub struct Canceller(watch::Sender<bool>);

impl Canceller {
    pub fn cancel(&self) {
        // send_replace never fails even when every receiver is gone.
        self.0.send_replace(true);
    }
}

impl Deadline {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
            cancel: None,
        }
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::after).unwrap_or_default()
    }

    pub fn cancellable(self) -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                at: self.at,
                cancel: Some(rx),
            },
            Canceller(tx),
        )
    }

    /// Why the caller no longer wants the result, if it doesn't.
    pub fn interrupted(&self) -> Option<&'static str> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some("cancelled by caller");
        }
        if self.at.is_some_and(|at| Instant::now() >= at) {
            return Some("deadline exceeded");
        }
        None
    }
}
