use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

/// Progress sink for long-running analyses.
///
/// Analyses poll [`is_cancelled`](Monitor::is_cancelled) between oracle calls and return
/// a best-effort partial result once it reports `true`.
pub trait Monitor {
    fn report_timeout(&mut self);

    fn is_cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn report_timeout(&mut self) {}
}

/// Counts timeouts and can be cancelled through a [`CancelHandle`].
#[derive(Debug, Default, Clone)]
pub struct CountingMonitor {
    timeouts: usize,
    cancelled: Arc<AtomicBool>,
}

impl CountingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeouts(&self) -> usize {
        self.timeouts
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }
}

impl Monitor for CountingMonitor {
    fn report_timeout(&mut self) {
        self.timeouts += 1;
        warn!("Solver timed out ({} so far)", self.timeouts);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl<M> Monitor for &mut M
where
    M: Monitor + ?Sized,
{
    fn report_timeout(&mut self) {
        (**self).report_timeout()
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_monitor() {
        let mut monitor = CountingMonitor::new();
        monitor.report_timeout();
        monitor.report_timeout();
        assert_eq!(monitor.timeouts(), 2);
        assert!(!monitor.is_cancelled());
        monitor.cancel_handle().cancel();
        assert!(monitor.is_cancelled());
    }
}
