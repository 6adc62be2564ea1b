// ABOUTME: Frame-level I/O halves over any async byte stream
// ABOUTME: Pairs a framing reader with a buffered PDU writer for split ownership

//! Frame-level I/O over a byte stream.
//!
//! The session splits its stream into a [`FrameReader`] owned by the ingress
//! task and a [`FrameWriter`] owned by the dispatcher, so inbound framing
//! never contends with outbound sends. Both halves are generic over the
//! underlying stream; production runs on a `TcpStream`, tests on
//! `tokio::io::duplex`.

use crate::codec::Encodable;
use crate::frame::Framer;
use bytes::Bytes;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter, ReadHalf, WriteHalf};

/// Split a stream into framed read and write halves.
pub fn split<S>(stream: S) -> (FrameReader<ReadHalf<S>>, FrameWriter<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, writer) = tokio::io::split(stream);
    (FrameReader::new(reader), FrameWriter::new(writer))
}

/// Reads complete, length-delimited frames off the stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    io: R,
    framer: Framer,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(io: R) -> FrameReader<R> {
        FrameReader {
            io,
            framer: Framer::new(),
        }
    }

    /// Read the next complete frame.
    ///
    /// Returns `None` when the peer closes the stream on a frame boundary.
    /// EOF in the middle of a frame, and a corrupt length prefix, are both
    /// errors: neither leaves the stream in a resumable state.
    pub async fn read_frame(&mut self) -> crate::Result<Option<Bytes>> {
        loop {
            if let Some(frame) = self.framer.pop()? {
                return Ok(Some(frame));
            }

            if 0 == self.io.read_buf(self.framer.buffer_mut()).await? {
                return if self.framer.buffered() == 0 {
                    Ok(None)
                } else {
                    Err("connection reset by peer".into())
                };
            }
        }
    }
}

/// Writes encoded PDUs to the stream, one flush per PDU.
#[derive(Debug)]
pub struct FrameWriter<W> {
    io: BufWriter<W>,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(io: W) -> FrameWriter<W> {
        FrameWriter {
            io: BufWriter::new(io),
        }
    }

    pub async fn write_pdu<P: Encodable>(&mut self, pdu: &P) -> io::Result<()> {
        let bytes = pdu.to_bytes();
        tracing::trace!(len = bytes.len(), "outgoing frame");
        self.io.write_all(&bytes).await?;
        self.io.flush().await
    }

    #[cfg(test)]
    pub(crate) async fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.io.write_all(bytes).await?;
        self.io.flush().await
    }
}
