use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Counts the reads served by the wrapped source and the largest size
/// requested from it.
pub struct CountingReader<R> {
    inner: R,
    reads: usize,
    max_requested: usize,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, reads: 0, max_requested: 0 }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn max_requested(&self) -> usize {
        self.max_requested
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for CountingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.max_requested = this.max_requested.max(buf.remaining());

        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) {
            this.reads += 1;
        }

        poll
    }
}

/// Fails every read with the given error kind.
pub struct FailingReader(pub io::ErrorKind);

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(self.0, "injected read failure")))
    }
}

/// A sink that accepts at most `max_per_write` bytes per call, producing
/// short writes.
pub struct ShortSink {
    data: Vec<u8>,
    max_per_write: usize,
}

impl ShortSink {
    pub fn new(max_per_write: usize) -> Self {
        Self { data: Vec::new(), max_per_write }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl AsyncWrite for ShortSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = buf.len().min(this.max_per_write);
        this.data.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Fails every write with the given error kind.
pub struct FailingSink(pub io::ErrorKind);

impl AsyncWrite for FailingSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(self.0, "injected write failure")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
