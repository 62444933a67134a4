use std::{
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::debug;

use crate::{rate::Rate, reader::LinkReader, writer::LinkWriter};

mod driver;
mod stats;

use driver::LinkDriver;
pub use stats::LinkStats;

/// Default maximum number of bytes a single underlying read or write may
/// move. 1500 is the Ethernet MTU, a likely maximum packet size.
pub const DEFAULT_SEGMENT_SIZE: usize = 1500;

/// Default number of transfer requests that may be outstanding on a link
/// before submitters start waiting for a slot.
pub const DEFAULT_CAPACITY: usize = 100;

/// Errors returned by [`Link`] construction and operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The rate was zero. A link must always have a positive speed.
    #[error("invalid rate: {0}")]
    InvalidRate(Rate),
    /// An option was set to a value the link cannot operate with.
    #[error("invalid link options: {0}")]
    InvalidOptions(&'static str),
    /// The link was shut down, or every handle to it was dropped.
    #[error("link closed")]
    Closed,
}

/// Options for constructing a [`Link`].
#[derive(Debug, Clone)]
pub struct LinkOptions {
    /// Maximum bytes a single underlying read or write may move.
    segment_size: usize,
    /// Number of requests that may be queued before submitters block.
    capacity: usize,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self { segment_size: DEFAULT_SEGMENT_SIZE, capacity: DEFAULT_CAPACITY }
    }
}

impl LinkOptions {
    /// Sets the maximum segment size in bytes. Reads and writes larger than
    /// this are split, bounding how long one stream can hold the link.
    pub fn segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size;
        self
    }

    /// Sets the request queue capacity. A full queue blocks submitters,
    /// bounding memory growth under overload.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    fn validate(&self) -> Result<(), LinkError> {
        if self.segment_size == 0 {
            return Err(LinkError::InvalidOptions("segment_size must be non-zero"));
        }
        if self.capacity == 0 {
            return Err(LinkError::InvalidOptions("capacity must be non-zero"));
        }
        Ok(())
    }
}

/// A transfer request asks the link to simulate moving `bytes` bytes and
/// acknowledge on `done` once it has. It carries no payload.
#[derive(Debug)]
pub(crate) struct TransferRequest {
    pub(crate) bytes: usize,
    pub(crate) done: oneshot::Sender<()>,
}

/// State shared between the driver task and every handle on the link.
#[derive(Debug)]
pub(crate) struct LinkShared {
    /// Current speed in bits per second. Written by [`Link::set_speed`],
    /// read by the driver when a request is dequeued.
    speed_bps: AtomicU64,
    /// Maximum bytes a single underlying read or write may move.
    segment_size: usize,
    /// Signals the driver to stop. Observed between requests, never during
    /// a transfer being simulated.
    shutdown: Notify,
    stats: LinkStats,
}

impl LinkShared {
    #[inline]
    pub(crate) fn rate(&self) -> Rate {
        Rate::bps(self.speed_bps.load(Ordering::Relaxed))
    }
}

/// A shared simulated transmission medium with a finite speed.
///
/// A link serializes requests to sleep, simulating the way data travels
/// across a medium running at a fixed rate. Multiple [`LinkReader`]s and
/// [`LinkWriter`]s can share one link (simulating multiple streams sharing a
/// connection); requests are served in submission order, so sharing is
/// approximately fair.
///
/// Handles are cheap to clone and all clones drive the same link. The
/// driver task stops when [`Link::shutdown`] is called or every handle,
/// reader and writer is gone.
#[derive(Debug, Clone)]
pub struct Link {
    requests: mpsc::Sender<TransferRequest>,
    shared: Arc<LinkShared>,
}

impl Link {
    /// Creates a link running at `rate` with default options and starts its
    /// driver task. Must be called from within a tokio runtime.
    pub fn new(rate: Rate) -> Result<Self, LinkError> {
        Self::with_options(rate, LinkOptions::default())
    }

    /// Creates a link running at `rate` with the given options.
    pub fn with_options(rate: Rate, options: LinkOptions) -> Result<Self, LinkError> {
        if rate.is_zero() {
            return Err(LinkError::InvalidRate(rate));
        }
        options.validate()?;

        let (tx, rx) = mpsc::channel(options.capacity);
        let shared = Arc::new(LinkShared {
            speed_bps: AtomicU64::new(rate.bits_per_sec()),
            segment_size: options.segment_size,
            shutdown: Notify::new(),
            stats: LinkStats::default(),
        });

        tokio::spawn(LinkDriver::new(rx, Arc::clone(&shared)).run());

        debug!(
            %rate,
            capacity = options.capacity,
            segment_size = options.segment_size,
            "link started"
        );

        Ok(Self { requests: tx, shared })
    }

    /// Submits a transfer of `bytes` bytes and waits until the link has
    /// simulated it.
    ///
    /// Requests are served one at a time in submission order. If the link's
    /// queue is full, the returned future first waits for a slot. A
    /// zero-byte transfer completes immediately without touching the queue.
    pub async fn transfer(&self, bytes: usize) -> Result<(), LinkError> {
        if bytes == 0 {
            return Ok(());
        }

        let (done, ack) = oneshot::channel();
        self.requests
            .send(TransferRequest { bytes, done })
            .await
            .map_err(|_| LinkError::Closed)?;

        ack.await.map_err(|_| LinkError::Closed)
    }

    /// Replaces the link speed, returning the previous one.
    ///
    /// A transfer already being simulated keeps the rate it was dequeued
    /// with; later requests are timed at the new rate.
    pub fn set_speed(&self, rate: Rate) -> Result<Rate, LinkError> {
        if rate.is_zero() {
            return Err(LinkError::InvalidRate(rate));
        }

        let old = self.shared.speed_bps.swap(rate.bits_per_sec(), Ordering::Relaxed);
        debug!(%rate, "link speed changed");

        Ok(Rate::bps(old))
    }

    /// The current link speed.
    pub fn speed(&self) -> Rate {
        self.shared.rate()
    }

    /// The maximum bytes a single underlying read or write may move.
    pub fn segment_size(&self) -> usize {
        self.shared.segment_size
    }

    /// Statistics for this link.
    pub fn stats(&self) -> &LinkStats {
        &self.shared.stats
    }

    /// Wraps `source`, simulating that its bytes arrive over this link.
    pub fn reader<R>(&self, source: R) -> LinkReader<R> {
        LinkReader::new(self.clone(), source)
    }

    /// Wraps `sink`, simulating that bytes written to it depart over this
    /// link.
    pub fn writer<W>(&self, sink: W) -> LinkWriter<W> {
        LinkWriter::new(self.clone(), sink)
    }

    /// Stops the link's driver task and waits for it to exit.
    ///
    /// The signal is observed between requests: a transfer already being
    /// simulated finishes first, then everything still queued is rejected.
    /// Submitters waiting on rejected requests, and any transfer submitted
    /// afterwards, observe [`LinkError::Closed`].
    pub async fn shutdown(&self) {
        self.shared.shutdown.notify_one();
        self.requests.closed().await;
    }

    pub(crate) fn request_sender(&self) -> mpsc::Sender<TransferRequest> {
        self.requests.clone()
    }
}

/// The io-flavored version of [`LinkError::Closed`], surfaced by the
/// wrappers.
pub(crate) fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, LinkError::Closed)
}
