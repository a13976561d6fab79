//! Delay-and-coalesce scheduling for bursts of input.
//!
//! Each call to [`Debouncer::settle`] supersedes the previous one. Only the
//! call still current after the quiet period gets a [`Ticket`], and the
//! ticket can be rechecked later to discard a response that arrived after
//! newer input.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Proof that a settled call was the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    seq: AtomicU64,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            seq: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the quiet period.
    ///
    /// Returns `None` if a newer `settle` or a `cancel` happened meanwhile.
    pub async fn settle(&self) -> Option<Ticket> {
        let mine = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        (self.seq.load(Ordering::SeqCst) == mine).then_some(Ticket(mine))
    }

    /// Whether `ticket` is still the latest issued.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.seq.load(Ordering::SeqCst) == ticket.0
    }

    /// Invalidate every pending and in-flight ticket.
    pub fn cancel(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
    }
}
