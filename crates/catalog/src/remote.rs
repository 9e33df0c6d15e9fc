//! Bounded reads of remote audio
//!
//! Container metadata sits near the start of a file, or at its end for
//! formats like Ogg that record the final granule position there. A probe
//! fetches at most [`WINDOW_BYTES`] from each end with HTTP range requests
//! and exposes them as one seekable source of the full length. Reads that
//! land between the two windows fail.

use crate::error::ProbeError;
use futures::{Stream, StreamExt};
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use std::io::{self, Read, Seek, SeekFrom};
use symphonia::core::io::MediaSource;

/// Most bytes read from either end of a remote resource
pub const WINDOW_BYTES: usize = 256 * 1024;

/// The fetched ends of a remote resource
#[derive(Debug)]
pub(crate) struct RemoteWindow {
    head: Vec<u8>,
    tail_start: u64,
    tail: Vec<u8>,
    len: u64,
    pos: u64,
}

impl RemoteWindow {
    /// A window over the first bytes of a resource `len` bytes long
    pub(crate) fn new(head: Vec<u8>, len: u64) -> Self {
        let len = len.max(head.len() as u64);
        Self {
            tail_start: len,
            tail: Vec::new(),
            head,
            len,
            pos: 0,
        }
    }

    /// Adds the bytes starting at `start`; ignored if they overlap the head
    pub(crate) fn with_tail(mut self, start: u64, tail: Vec<u8>) -> Self {
        if start >= self.head_len() && start + tail.len() as u64 <= self.len {
            self.tail_start = start;
            self.tail = tail;
        }
        self
    }

    pub(crate) fn head_len(&self) -> u64 {
        self.head.len() as u64
    }

    /// Bytes held in memory
    pub(crate) fn fetched(&self) -> usize {
        self.head.len() + self.tail.len()
    }
}

impl Read for RemoteWindow {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len || buf.is_empty() {
            return Ok(0);
        }

        let tail_end = self.tail_start + self.tail.len() as u64;
        let (bytes, offset) = if self.pos < self.head_len() {
            (&self.head, self.pos)
        } else if self.pos >= self.tail_start && self.pos < tail_end {
            (&self.tail, self.pos - self.tail_start)
        } else {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("byte {} is outside the fetched window", self.pos),
            ));
        };

        let available = &bytes[offset as usize..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for RemoteWindow {
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let target = match from {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        self.pos = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of resource")
        })?;
        Ok(self.pos)
    }
}

impl MediaSource for RemoteWindow {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.len)
    }
}

/// Fetches the head and, when the server honours ranges, the tail of `url`
pub(crate) async fn fetch_window(
    client: &reqwest::Client,
    url: &str,
) -> Result<RemoteWindow, ProbeError> {
    let response = client
        .get(url)
        .header(RANGE, format!("bytes=0-{}", WINDOW_BYTES - 1))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProbeError::Status(status.as_u16()));
    }

    let ranged = status == StatusCode::PARTIAL_CONTENT;
    let total = if ranged {
        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(content_range_total)
    } else {
        response.content_length()
    };

    let head = read_capped(response.bytes_stream(), WINDOW_BYTES).await?;
    let mut window = RemoteWindow::new(head, total.unwrap_or(0));

    if ranged && window.len > window.head_len() {
        let start = window
            .len
            .saturating_sub(WINDOW_BYTES as u64)
            .max(window.head_len());
        let response = client
            .get(url)
            .header(RANGE, format!("bytes={}-", start))
            .send()
            .await?;

        if response.status() == StatusCode::PARTIAL_CONTENT {
            let tail = read_capped(response.bytes_stream(), (window.len - start) as usize).await?;
            window = window.with_tail(start, tail);
        }
    }

    log::trace!(
        "Fetched {} of {} bytes from {}",
        window.fetched(),
        window.len,
        url
    );
    Ok(window)
}

/// Collects at most `cap` bytes from a chunk stream, then drops it
pub(crate) async fn read_capped<S, B, E>(stream: S, cap: usize) -> Result<Vec<u8>, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let mut out = Vec::new();

    while out.len() < cap {
        let Some(chunk) = stream.next().await else {
            break;
        };
        let chunk = chunk?;
        let chunk = chunk.as_ref();
        let take = chunk.len().min(cap - out.len());
        out.extend_from_slice(&chunk[..take]);
    }

    Ok(out)
}

/// Total length from a `Content-Range` value such as `bytes 0-99/1234`
fn content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}
