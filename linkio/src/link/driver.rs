use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::{LinkShared, TransferRequest};

/// The worker behind a [`Link`](super::Link).
///
/// Requests are dequeued one at a time and their transfer time is slept out
/// in full before the next is looked at, so the link behaves as a
/// single-server queue rather than a rate limiter that admits bursts.
pub(crate) struct LinkDriver {
    requests: mpsc::Receiver<TransferRequest>,
    shared: Arc<LinkShared>,
}

impl LinkDriver {
    pub(crate) fn new(requests: mpsc::Receiver<TransferRequest>, shared: Arc<LinkShared>) -> Self {
        Self { requests, shared }
    }

    pub(crate) async fn run(mut self) {
        loop {
            let request = tokio::select! {
                biased;
                _ = self.shared.shutdown.notified() => break,
                request = self.requests.recv() => match request {
                    Some(request) => request,
                    // Every handle is gone; nothing can be queued anymore.
                    None => break,
                },
            };

            let rate = self.shared.rate();
            let delay = rate.delay_for(request.bytes);
            trace!(bytes = request.bytes, %rate, ?delay, "simulating transfer");

            tokio::time::sleep(delay).await;

            self.shared.stats.record_transfer(request.bytes, delay);

            // The submitter may have gone away while we slept; the link time
            // was spent either way.
            let _ = request.done.send(());
        }

        self.reject_pending();
        debug!("link driver stopped");
    }

    /// Closes the queue and rejects everything still in it. Dropping a
    /// request drops its `done` sender, which the submitter observes as
    /// [`LinkError::Closed`](super::LinkError::Closed).
    fn reject_pending(&mut self) {
        self.requests.close();

        let mut rejected = 0usize;
        while let Ok(request) = self.requests.try_recv() {
            drop(request);
            rejected += 1;
        }

        if rejected > 0 {
            debug!(rejected, "rejected queued transfers on shutdown");
        }
    }
}
