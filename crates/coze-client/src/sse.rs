//! Server-Sent Events framing.
//!
//! Chunks arrive at arbitrary TCP boundaries, so a delimiter, a line or even a
//! field name may be split across reads. [`FrameBuffer`] matches against the
//! cumulative buffer and only hands out complete frames.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Longest frame delimiter (`\r\n\r\n`), less one.
const DELIMITER_OVERLAP: usize = 3;

/// Accumulates body chunks and splits them into frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
    /// Offset below which no delimiter can start.
    scanned: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the next complete frame, without its delimiter.
    ///
    /// The delimiter is the earliest complete `\n\n` or `\r\n\r\n`.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        let start = self.scanned.saturating_sub(DELIMITER_OVERLAP);
        match find_delimiter(&self.buf, start) {
            Some((at, len)) => {
                let frame = self.buf.split_to(at).freeze();
                self.buf.advance(len);
                self.scanned = 0;
                Some(frame)
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    /// Take whatever is left once the body has ended.
    ///
    /// Returns `None` when the remainder is empty or only whitespace.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        let rest = self.buf.split().freeze();
        if rest.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(rest)
        }
    }
}

fn find_delimiter(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    (from..buf.len()).find_map(|i| {
        let rest = &buf[i..];
        if rest.starts_with(b"\n\n") {
            Some((i, 2))
        } else if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else {
            None
        }
    })
}

/// One parsed frame.
///
/// Only the first `id`, `event` and `data` line of a frame is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub id: Option<String>,
    pub event: Option<String>,
    pub data: Option<String>,
}

impl SseFrame {
    /// Parse a raw frame.
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut frame = SseFrame::default();

        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let Some((field, value)) = parse_line(line) else {
                continue;
            };

            match field {
                "id" if frame.id.is_none() => frame.id = Some(value.trim_end().to_string()),
                "event" if frame.event.is_none() => {
                    frame.event = Some(value.trim_end().to_string())
                }
                "data" if frame.data.is_none() => frame.data = Some(value.to_string()),
                _ => {}
            }
        }

        frame
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(':') {
        return None;
    }
    let (field, value) = line.split_once(':')?;
    Some((field, value.trim_start_matches(' ')))
}

/// A frame that carries an event name and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub id: Option<String>,
    pub event: String,
    pub data: String,
}

impl RawEvent {
    /// Accept a parsed frame, or `None` when it lacks an event name or a `data:` line.
    pub fn from_frame(frame: SseFrame) -> Option<Self> {
        let event = frame.event.filter(|e| !e.is_empty())?;
        let data = frame.data?;
        Some(Self {
            id: frame.id,
            event,
            data,
        })
    }
}

/// Turn a body chunk stream into named events.
///
/// Frames without an event name or data are dropped and counted in `dropped`. A body error
/// yields one `Err` item and ends the stream; so does cancellation, with
/// [`Error::Cancelled`].
pub(crate) fn raw_events(
    mut body: BoxStream<'static, Result<Bytes>>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
) -> BoxStream<'static, Result<RawEvent>> {
    Box::pin(async_stream::stream! {
        let mut buffer = FrameBuffer::new();
        let mut frames: u64 = 0;
        let mut ended = false;

        loop {
            let mut cancelled = false;
            while let Some(raw) = buffer.next_frame().or_else(|| if ended { buffer.finish() } else { None }) {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                frames += 1;
                tracing::trace!(frame = %String::from_utf8_lossy(&raw), "sse frame");
                match RawEvent::from_frame(SseFrame::parse(&raw)) {
                    Some(event) => yield Ok(event),
                    None => {
                        dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(frame = %String::from_utf8_lossy(&raw), "dropping frame without event or data");
                    }
                }
            }

            if cancelled || cancel.is_cancelled() {
                tracing::debug!(frames, "event stream cancelled");
                yield Err(Error::Cancelled);
                break;
            }
            if ended {
                break;
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                chunk = body.next() => Some(chunk),
            };

            match next {
                None => {
                    tracing::debug!(frames, "event stream cancelled");
                    yield Err(Error::Cancelled);
                    break;
                }
                Some(Some(Ok(chunk))) => buffer.push(&chunk),
                Some(Some(Err(err))) => {
                    tracing::debug!(frames, error = %err, "event stream broke");
                    yield Err(err);
                    break;
                }
                Some(None) => ended = true,
            }
        }

        tracing::debug!(
            frames,
            dropped = dropped.load(Ordering::Relaxed),
            "event stream ended"
        );
    })
}

/// A stream of decoded events from one open connection.
///
/// Dropping the stream closes the connection.
pub struct EventStream<T> {
    inner: BoxStream<'static, Result<T>>,
    logid: Option<String>,
    dropped: Arc<AtomicU64>,
}

impl<T> EventStream<T> {
    pub(crate) fn new(
        inner: BoxStream<'static, Result<T>>,
        logid: Option<String>,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            inner,
            logid,
            dropped,
        }
    }

    /// Value of the `x-tt-logid` header of the streaming response.
    pub fn logid(&self) -> Option<&str> {
        self.logid.as_deref()
    }

    /// Frames skipped so far because they carried no event name.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> Stream for EventStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<T> std::fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("logid", &self.logid)
            .field("dropped", &self.dropped_frames())
            .finish_non_exhaustive()
    }
}
