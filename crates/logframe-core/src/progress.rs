//! Progress reporting port.
//!
//! Long scans report coarse percentages through a [`ProgressSink`]. The
//! engine calls it inline and never waits on it, so every sink must be
//! cheap and must not fail back into the caller.
//!
//! ```text
//!   IndicatorExtractor ──► ProgressTracker ──► dyn ProgressSink
//!                           (monotone,          ├─ NoopProgress
//!                            clamped ≤ 100)     ├─ ProgressRecorder
//!                                               ├─ Fn(u8)
//!                                               └─ ChannelProgress ──► mpsc (drop on full)
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

/// Receives percentage updates, fire-and-forget.
pub trait ProgressSink: Send + Sync {
    /// Report `percent` (0..=100).
    fn report(&self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: u8) {}
}

/// Keeps every update in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct ProgressRecorder {
    values: Arc<Mutex<Vec<u8>>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the values reported so far.
    pub fn values(&self) -> Vec<u8> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ProgressSink for ProgressRecorder {
    fn report(&self, percent: u8) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(percent);
    }
}

/// Forwards updates into a bounded tokio channel.
///
/// Uses `try_send`, so a full or closed channel drops the update instead
/// of stalling the scan.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::Sender<u8>,
}

impl ChannelProgress {
    /// Create a sink and the receiving end of its channel.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<u8>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, percent: u8) {
        if self.tx.try_send(percent).is_err() {
            tracing::trace!(percent, "progress update dropped");
        }
    }
}

/// Wraps a sink and enforces the reporting contract: values never
/// decrease, never exceed 100, and repeats are suppressed.
pub struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    current: u8,
    emitted: bool,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            current: 0,
            emitted: false,
        }
    }

    /// Last value reported (0 before the first report).
    pub fn current(&self) -> u8 {
        self.current
    }

    /// Report `percent` if it moves progress forward.
    pub fn set(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent < self.current || (self.emitted && percent == self.current) {
            return;
        }
        self.current = percent;
        self.emitted = true;
        self.sink.report(percent);
    }

    /// Move forward by `delta` points.
    pub fn advance(&mut self, delta: u8) {
        self.set(self.current.saturating_add(delta));
    }

    /// Report 100.
    pub fn complete(&mut self) {
        self.set(100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_recorder_keeps_order() {
        let recorder = ProgressRecorder::new();
        recorder.report(5);
        recorder.report(10);
        assert_eq!(recorder.values(), vec![5, 10]);
    }

    #[test]
    fn test_recorder_survives_poisoned_lock() {
        let recorder = ProgressRecorder::new();
        recorder.report(5);
        let shared = recorder.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.values.lock().unwrap();
            panic!("poison the recorder");
        })
        .join();
        assert!(recorder.values.is_poisoned());

        recorder.report(10);
        assert_eq!(recorder.values(), vec![5, 10]);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |p: u8| seen.lock().unwrap().push(p)
        };
        let mut tracker = ProgressTracker::new(&sink);
        tracker.advance(5);
        tracker.advance(5);
        assert_eq!(*seen.lock().unwrap(), vec![5, 10]);
    }

    #[test]
    fn test_tracker_suppresses_regressions_and_repeats() {
        let recorder = ProgressRecorder::new();
        let mut tracker = ProgressTracker::new(&recorder);
        tracker.set(20);
        tracker.set(20);
        tracker.set(15);
        tracker.set(21);
        assert_eq!(recorder.values(), vec![20, 21]);
        assert_eq!(tracker.current(), 21);
    }

    #[test]
    fn test_tracker_clamps_to_100() {
        let recorder = ProgressRecorder::new();
        let mut tracker = ProgressTracker::new(&recorder);
        tracker.set(99);
        tracker.advance(10);
        tracker.set(250);
        tracker.complete();
        assert_eq!(recorder.values(), vec![99, 100]);
    }

    #[test]
    fn test_tracker_reports_initial_zero_once() {
        let recorder = ProgressRecorder::new();
        let mut tracker = ProgressTracker::new(&recorder);
        tracker.set(0);
        tracker.set(0);
        assert_eq!(recorder.values(), vec![0]);
    }

    #[tokio::test]
    async fn test_channel_drops_on_backpressure() {
        let (sink, mut rx) = ChannelProgress::channel(2);
        sink.report(1);
        sink.report(2);
        sink.report(3);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_closed_receiver_is_ignored() {
        let (sink, rx) = ChannelProgress::channel(4);
        drop(rx);
        sink.report(50);
    }

    proptest! {
        #[test]
        fn prop_tracker_output_is_monotone_and_bounded(inputs in proptest::collection::vec(any::<u8>(), 0..64)) {
            let recorder = ProgressRecorder::new();
            let mut tracker = ProgressTracker::new(&recorder);
            for value in inputs {
                tracker.set(value);
            }
            let values = recorder.values();
            prop_assert!(values.iter().all(|v| *v <= 100));
            prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
