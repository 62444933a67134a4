use std::{
    io,
    pin::Pin,
    task::{ready, Context, Poll},
};

use bytes::{Buf, BytesMut};
use futures::FutureExt;
use tokio::{
    io::{AsyncRead, ReadBuf},
    sync::oneshot,
};
use tokio_util::sync::PollSender;

use crate::link::{closed, Link, TransferRequest};

/// Wraps an [`AsyncRead`], simulating reading from a shared access link
/// with a fixed maximum speed.
///
/// Each call reads at most the link's segment size in one go, even if the
/// caller asks for more, preventing one reader from saturating the
/// simulated link. The bytes actually read are charged to the link and the
/// read completes only once their transfer time has passed. End-of-stream
/// and errors from the underlying source are returned immediately and cost
/// no link time.
pub struct LinkReader<R> {
    source: R,
    link: Link,
    requests: PollSender<TransferRequest>,
    /// Bytes read from the source but not yet handed to the caller.
    scratch: BytesMut,
    state: State,
}

enum State {
    /// Ready to read from the source.
    Read,
    /// Waiting for a slot in the link's request queue.
    Submit,
    /// Waiting for the link to simulate the transfer.
    Transfer(oneshot::Receiver<()>),
}

impl<R> LinkReader<R> {
    pub(crate) fn new(link: Link, source: R) -> Self {
        let requests = PollSender::new(link.request_sender());
        Self { source, link, requests, scratch: BytesMut::new(), state: State::Read }
    }

    /// The link this reader charges its transfers to.
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Gets a reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: std::fmt::Debug> std::fmt::Debug for LinkReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkReader")
            .field("source", &self.source)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for LinkReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            match this.state {
                State::Read => {
                    // Serve bytes whose transfer was already simulated
                    // before touching the source again.
                    if !this.scratch.is_empty() {
                        let n = this.scratch.len().min(buf.remaining());
                        buf.put_slice(&this.scratch[..n]);
                        this.scratch.advance(n);
                        return Poll::Ready(Ok(()));
                    }

                    if buf.remaining() == 0 {
                        return Poll::Ready(Ok(()));
                    }

                    let max = buf.remaining().min(this.link.segment_size());
                    this.scratch.resize(max, 0);

                    let mut chunk = ReadBuf::new(&mut this.scratch[..max]);
                    let poll = Pin::new(&mut this.source).poll_read(cx, &mut chunk);
                    let filled = chunk.filled().len();

                    match poll {
                        Poll::Pending => {
                            this.scratch.clear();
                            return Poll::Pending;
                        }
                        Poll::Ready(Err(e)) => {
                            this.scratch.clear();
                            return Poll::Ready(Err(e));
                        }
                        Poll::Ready(Ok(())) => {
                            this.scratch.truncate(filled);
                            if filled == 0 {
                                // End of stream: no link time to charge.
                                return Poll::Ready(Ok(()));
                            }
                            this.state = State::Submit;
                        }
                    }
                }
                State::Submit => {
                    if ready!(this.requests.poll_reserve(cx)).is_err() {
                        this.scratch.clear();
                        this.state = State::Read;
                        return Poll::Ready(Err(closed()));
                    }

                    let (done, ack) = oneshot::channel();
                    let request = TransferRequest { bytes: this.scratch.len(), done };
                    if this.requests.send_item(request).is_err() {
                        this.scratch.clear();
                        this.state = State::Read;
                        return Poll::Ready(Err(closed()));
                    }

                    this.state = State::Transfer(ack);
                }
                State::Transfer(ref mut ack) => {
                    let acked = ready!(ack.poll_unpin(cx));
                    this.state = State::Read;

                    if acked.is_err() {
                        this.scratch.clear();
                        return Poll::Ready(Err(closed()));
                    }
                    // Back to `State::Read`, which delivers the scratch
                    // bytes without charging them again.
                }
            }
        }
    }
}
