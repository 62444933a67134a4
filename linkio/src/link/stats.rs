use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

/// Statistics for a simulated link.
/// These are shared between the driver task and every handle on the link.
#[derive(Debug, Default)]
pub struct LinkStats {
    /// Total bytes whose transfer time has been simulated.
    bytes: AtomicUsize,
    /// Total number of transfer requests served.
    requests: AtomicUsize,
    /// Total nanoseconds spent simulating transfers.
    busy_nanos: AtomicU64,
}

impl LinkStats {
    #[inline]
    pub(crate) fn record_transfer(&self, bytes: usize, delay: Duration) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.busy_nanos.fetch_add(delay.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Total bytes whose transfer time has been simulated.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Total number of transfer requests served.
    #[inline]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Cumulative time the link spent simulating transfers.
    ///
    /// Comparing this against the link's lifetime gives its utilization.
    #[inline]
    pub fn busy_time(&self) -> Duration {
        Duration::from_nanos(self.busy_nanos.load(Ordering::Relaxed))
    }
}
