//! Streaming a response body into a destination.
//!
//! A download is never buffered as a whole: chunks are handed to the
//! destination as they arrive. Two [`Drain`] strategies exist:
//!
//! - [`PipeDrain`] forwards the stream straight into the destination's native
//!   [`Sink`], which applies backpressure and closes the destination at the
//!   end of the stream.
//! - [`PumpDrain`] reads one chunk, awaits its write, and only then reads the
//!   next one. It works with any [`Destination`].
//!
//! [`select_drain`] picks the strategy by probing the destination.
//!
//! On any read or write failure the destination is aborted, so no half
//! written destination stays open.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use async_trait::async_trait;
use bytes::{Buf, Bytes};
use futures_util::stream::BoxStream;
use futures_util::{Sink, StreamExt, TryStreamExt};
use log::{debug, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// Response body as a stream of chunks.
pub type ChunkStream = BoxStream<'static, io::Result<Bytes>>;

/// Native pipe target exposed by a destination.
pub type PipeTarget<'a> = dyn Sink<Bytes, Error = io::Error> + Send + Unpin + 'a;

/// Where downloaded chunks end up.
#[async_trait]
pub trait Destination: Send {
    /// The destination as a [`Sink`], if it can be piped into directly.
    fn as_sink(&mut self) -> Option<&mut PipeTarget<'_>>;

    /// Write one chunk completely.
    async fn write(&mut self, chunk: Bytes) -> io::Result<()>;

    /// Flush and close after the last chunk.
    async fn close(&mut self) -> io::Result<()>;

    /// Release the destination after a failed download.
    async fn abort(&mut self);
}

/// Strategy for moving a [`ChunkStream`] into a [`Destination`].
#[async_trait]
pub trait Drain: Send + Sync {
    /// Drain `source` into `dest` and return the number of bytes written.
    async fn drain(&self, source: ChunkStream, dest: &mut dyn Destination) -> Result<u64>;
}

/// Pick [`PipeDrain`] when the destination has a native sink, [`PumpDrain`] otherwise.
pub fn select_drain(dest: &mut dyn Destination) -> Box<dyn Drain> {
    if dest.as_sink().is_some() {
        debug!("select_drain: destination supports piping");
        Box::new(PipeDrain)
    } else {
        debug!("select_drain: falling back to read/write pump");
        Box::new(PumpDrain)
    }
}

/// Forward the stream into the destination's native sink.
pub struct PipeDrain;

#[async_trait]
impl Drain for PipeDrain {
    async fn drain(&self, source: ChunkStream, dest: &mut dyn Destination) -> Result<u64> {
        let mut written = 0u64;
        let result = match dest.as_sink() {
            Some(sink) => {
                source
                    .map_ok(|chunk| {
                        written += chunk.len() as u64;
                        chunk
                    })
                    .forward(sink)
                    .await
            }
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "destination cannot be piped into",
            )),
        };

        match result {
            Ok(()) => {
                debug!("PipeDrain: {} bytes written", written);
                Ok(written)
            }
            Err(err) => {
                warn!("PipeDrain: aborting after {} bytes: {}", written, err);
                dest.abort().await;
                Err(err.into())
            }
        }
    }
}

/// Read a chunk, write it, repeat.
///
/// The next read is only issued once the previous write has completed.
pub struct PumpDrain;

impl PumpDrain {
    async fn pump(
        source: &mut ChunkStream,
        dest: &mut dyn Destination,
        written: &mut u64,
    ) -> io::Result<()> {
        while let Some(chunk) = source.next().await {
            let chunk = chunk?;
            let len = chunk.len() as u64;
            dest.write(chunk).await?;
            *written += len;
        }
        dest.close().await
    }
}

#[async_trait]
impl Drain for PumpDrain {
    async fn drain(&self, mut source: ChunkStream, dest: &mut dyn Destination) -> Result<u64> {
        let mut written = 0u64;
        match Self::pump(&mut source, dest, &mut written).await {
            Ok(()) => {
                debug!("PumpDrain: {} bytes written", written);
                Ok(written)
            }
            Err(err) => {
                warn!("PumpDrain: aborting after {} bytes: {}", written, err);
                dest.abort().await;
                Err(err.into())
            }
        }
    }
}

/// Destination backed by any tokio writer (a file, stdout, a buffer).
///
/// Implements [`Sink`] so it can be piped into.
pub struct WriterDestination<W> {
    writer: W,
    /// Chunk accepted by `start_send` but not yet fully written.
    pending: Option<Bytes>,
    closed: bool,
}

impl<W: AsyncWrite + Unpin + Send> WriterDestination<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending: None,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn poll_write_pending(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while let Some(chunk) = self.pending.as_mut() {
            if chunk.is_empty() {
                self.pending = None;
                continue;
            }
            let n = ready!(Pin::new(&mut self.writer).poll_write(cx, &chunk[..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            chunk.advance(n);
        }
        Poll::Ready(Ok(()))
    }
}

impl<W: AsyncWrite + Unpin + Send> Sink<Bytes> for WriterDestination<W> {
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().poll_write_pending(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> io::Result<()> {
        self.get_mut().pending = Some(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_write_pending(cx))?;
        Pin::new(&mut this.writer).poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_write_pending(cx))?;
        ready!(Pin::new(&mut this.writer).poll_shutdown(cx))?;
        this.closed = true;
        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Destination for WriterDestination<W> {
    fn as_sink(&mut self) -> Option<&mut PipeTarget<'_>> {
        let sink: &mut PipeTarget<'_> = self;
        Some(sink)
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        self.writer.write_all(&chunk).await
    }

    async fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.writer.shutdown().await?;
            self.closed = true;
        }
        Ok(())
    }

    async fn abort(&mut self) {
        self.pending = None;
        if !self.closed {
            if let Err(err) = self.writer.shutdown().await {
                debug!("abort: shutdown failed: {}", err);
            }
            self.closed = true;
        }
    }
}
