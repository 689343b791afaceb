//! One-way progress channel from a running engine to whoever is watching.
//!
//! Engines write, observers read the latest value; nothing ever polls the
//! engine. Progress is a hint in the 0..=100 domain, not a guarantee of
//! monotonicity.

use tokio::sync::watch;

/// Receiving half: latest reported percentage.
pub type ProgressWatch = watch::Receiver<u8>;

/// Writing half handed to an engine for the duration of one job.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: watch::Sender<u8>,
}

impl ProgressSink {
    /// New sink starting at 0, plus its watch.
    pub fn channel() -> (Self, ProgressWatch) {
        let (tx, rx) = watch::channel(0);
        (Self { tx }, rx)
    }

    /// Sink nobody listens to.
    pub fn detached() -> Self {
        Self::channel().0
    }

    /// Report a percentage, clamped to 100.
    pub fn report(&self, percent: u8) {
        self.tx.send_replace(percent.min(100));
    }

    /// Report a 0.0..=1.0 fraction, scaled into the percent domain.
    pub fn report_fraction(&self, fraction: f32) {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        self.report((fraction * 100.0).round() as u8);
    }

    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ProgressWatch {
        self.tx.subscribe()
    }
}
