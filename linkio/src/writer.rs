use std::{
    io,
    pin::Pin,
    task::{ready, Context, Poll},
};

use futures::FutureExt;
use tokio::{io::AsyncWrite, sync::oneshot};
use tokio_util::sync::PollSender;

use crate::link::{closed, Link, TransferRequest};

/// Wraps an [`AsyncWrite`], simulating writing to a shared access link with
/// a fixed maximum speed.
///
/// Each call moves at most the link's segment size to the underlying sink,
/// then charges the bytes the sink actually accepted to the link and
/// completes only once their transfer time has passed. Writing a buffer
/// larger than the segment size therefore takes several calls;
/// [`write_all`](tokio::io::AsyncWriteExt::write_all) issues them. Errors
/// from the sink are returned immediately and cost no link time, and a
/// short write is reported as-is rather than retried.
pub struct LinkWriter<W> {
    sink: W,
    link: Link,
    requests: PollSender<TransferRequest>,
    state: State,
}

enum State {
    /// Ready to write to the sink.
    Write,
    /// Waiting for a slot in the link's request queue.
    Submit { written: usize },
    /// Waiting for the link to simulate the transfer.
    Transfer { written: usize, ack: oneshot::Receiver<()> },
}

impl<W> LinkWriter<W> {
    pub(crate) fn new(link: Link, sink: W) -> Self {
        let requests = PollSender::new(link.request_sender());
        Self { sink, link, requests, state: State::Write }
    }

    /// The link this writer charges its transfers to.
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for LinkWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkWriter")
            .field("sink", &self.sink)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for LinkWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        loop {
            match this.state {
                State::Write => {
                    if data.is_empty() {
                        return Poll::Ready(Ok(0));
                    }

                    let max = data.len().min(this.link.segment_size());
                    let written = ready!(Pin::new(&mut this.sink).poll_write(cx, &data[..max]))?;
                    if written == 0 {
                        return Poll::Ready(Ok(0));
                    }

                    this.state = State::Submit { written };
                }
                State::Submit { written } => {
                    if ready!(this.requests.poll_reserve(cx)).is_err() {
                        this.state = State::Write;
                        return Poll::Ready(Err(closed()));
                    }

                    let (done, ack) = oneshot::channel();
                    if this.requests.send_item(TransferRequest { bytes: written, done }).is_err() {
                        this.state = State::Write;
                        return Poll::Ready(Err(closed()));
                    }

                    this.state = State::Transfer { written, ack };
                }
                State::Transfer { written, ref mut ack } => {
                    let acked = ready!(ack.poll_unpin(cx));
                    this.state = State::Write;

                    if acked.is_err() {
                        return Poll::Ready(Err(closed()));
                    }

                    return Poll::Ready(Ok(written));
                }
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_flush(Pin::new(&mut self.get_mut().sink), cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncWrite::poll_shutdown(Pin::new(&mut self.get_mut().sink), cx)
    }
}
