//! Randomized delays between outbound calls.
//!
//! Each call class has its own bounds so the request rhythm looks like a
//! person clicking around rather than a loop.

use std::time::Duration;

use rand::Rng;

use crate::config::PacingConfig;

/// The kind of outbound call about to be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Profile metadata JSON used to resolve the identifier.
    ProfileLookup,
    /// Profile page fetched as a fallback while resolving the identifier.
    ProfilePageLookup,
    FeedFirstPage,
    FeedNextPage,
    /// Profile page fetched for its embedded posts.
    EmbeddedProfilePage,
    PublicProfile,
    /// Feed query continuing after the public profile endpoint.
    Continuation,
}

impl CallKind {
    /// Delay bounds in seconds.
    pub fn delay_bounds(self) -> (f64, f64) {
        match self {
            CallKind::ProfileLookup => (1.0, 2.0),
            CallKind::ProfilePageLookup => (2.0, 3.0),
            CallKind::FeedFirstPage => (2.0, 4.0),
            CallKind::FeedNextPage => (3.0, 6.0),
            CallKind::EmbeddedProfilePage => (1.0, 3.0),
            CallKind::PublicProfile => (2.0, 4.0),
            CallKind::Continuation => (3.0, 5.0),
        }
    }

    /// Paginated follow-up calls get the longer timeout.
    pub fn is_continuation(self) -> bool {
        matches!(self, CallKind::FeedNextPage | CallKind::Continuation)
    }
}

/// Draws and sleeps the delay for each call.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// The delay to wait before a call of `kind`. Zero when pacing is off.
    pub fn delay_for<R: Rng + ?Sized>(&self, kind: CallKind, rng: &mut R) -> Duration {
        if !self.config.enabled || self.config.scale <= 0.0 {
            return Duration::ZERO;
        }
        let (lo, hi) = kind.delay_bounds();
        let secs = rng.gen_range(lo..=hi) * self.config.scale;
        Duration::from_secs_f64(secs)
    }

    pub async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tracing::debug!("Pacing: sleeping {:.2}s", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}
