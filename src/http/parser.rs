//! Incremental, resumable HTTP/1.1 parsing
//!
//! One parser lives for the whole connection and is fed every read with
//! `parse_next`. A read may hold part of a message, exactly one message, or
//! several messages followed by the start of another. Whenever the buffered
//! bytes run out before the current step can finish, the parser yields: it
//! records when content went missing and returns `Ok(())`. The next read
//! resumes at the same step without re-reading consumed bytes.
//!
//! ```text
//! NotStarted -> StartLine -> Headers -> Body -> Completed -> NotStarted ...
//! ```
//!
//! State is split in two:
//! - [`Content`] is connection-scoped: buffered bytes, the read cursor and
//!   packets queued behind them survive every message boundary;
//! - [`MessageBuilder`] is message-scoped and replaced once a message has
//!   been moved onto the completed queue.
//!
//! Bytes are buffered as they arrive and decoded only once a line or a whole
//! body is available, so `Content-Length` is always a byte count and a UTF-8
//! character split across two reads is reassembled intact.

pub mod request;
pub mod response;

use crate::{
    errors::{Error, Result},
    http::{
        body::Body,
        header::{names, Header, Headers},
        types::slice_to_hex_usize,
    },
};
use memchr::memchr;
use std::{
    collections::VecDeque,
    mem,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    NotStarted,
    StartLine,
    Headers,
    Body,
    Completed,
}

impl Step {
    #[inline]
    pub(crate) const fn next(self) -> Self {
        match self {
            Step::NotStarted => Step::StartLine,
            Step::StartLine => Step::Headers,
            Step::Headers => Step::Body,
            Step::Body => Step::Completed,
            Step::Completed => Step::NotStarted,
        }
    }
}

/// Outcome of one step: either it finished, or the buffered bytes ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    Advanced,
    OutOfContent,
}

// CONTENT

#[derive(Debug, Default)]
pub(crate) struct Content {
    text: Vec<u8>,
    position: usize,
    pending: VecDeque<Vec<u8>>,
    missing_since: Option<Instant>,
}

impl Content {
    /// Buffers a read. With nothing left unread it becomes the live text;
    /// behind a suspended step it is queued as a packet and merged only when
    /// the unread tail cannot satisfy that step.
    pub(crate) fn include(&mut self, bytes: &[u8]) {
        self.missing_since = None;

        if bytes.is_empty() {
            return;
        }

        match self.is_drained() {
            true => {
                self.text.clear();
                self.position = 0;
                self.text.extend_from_slice(bytes);
            }
            false => {
                tracing::trace!(len = bytes.len(), queued = self.pending.len(), "content packet queued");
                self.pending.push_back(bytes.to_vec());
            }
        }
    }

    #[inline]
    pub(crate) fn is_drained(&self) -> bool {
        self.position >= self.text.len() && self.pending.is_empty()
    }

    /// Drops consumed bytes, keeping only the unread tail.
    pub(crate) fn compact(&mut self) {
        if self.position > 0 {
            self.text.drain(..self.position);
            self.position = 0;
        }
    }

    fn pull_packet(&mut self) -> bool {
        self.compact();

        match self.pending.pop_front() {
            Some(packet) => {
                self.text.extend_from_slice(&packet);
                true
            }
            None => false,
        }
    }

    /// The next line without its `\n` or `\r\n`, trimmed; `None` when no
    /// terminator has arrived yet.
    pub(crate) fn next_line(&mut self) -> Option<String> {
        loop {
            if let Some(index) = memchr(b'\n', &self.text[self.position..]) {
                let end = self.position + index;
                let raw = &self.text[self.position..end];
                let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

                let line = match simdutf8::basic::from_utf8(raw) {
                    Ok(text) => text.trim().to_string(),
                    Err(_) => String::from_utf8_lossy(raw).trim().to_string(),
                };

                self.position = end + 1;
                return Some(line);
            }

            if !self.pull_packet() {
                return None;
            }
        }
    }

    /// Skips blank lines sitting between two messages, such as the `\r\n`
    /// that closes a chunked body.
    pub(crate) fn skip_blank_lines(&mut self) {
        loop {
            match self.text.get(self.position) {
                Some(b'\r' | b'\n') => self.position += 1,
                Some(_) => return,
                None => {
                    if !self.pull_packet() {
                        return;
                    }
                }
            }
        }
    }

    /// Exactly `len` bytes, or `None` (consuming nothing) if fewer are buffered.
    pub(crate) fn take(&mut self, len: usize) -> Option<Vec<u8>> {
        loop {
            if self.text.len() - self.position >= len {
                let bytes = self.text[self.position..self.position + len].to_vec();
                self.position += len;
                return Some(bytes);
            }

            if !self.pull_packet() {
                return None;
            }
        }
    }

    /// Everything buffered or queued.
    pub(crate) fn take_remaining(&mut self) -> Vec<u8> {
        while self.pull_packet() {}

        let bytes = self.text.split_off(self.position);
        self.text.clear();
        self.position = 0;
        bytes
    }

    #[inline]
    pub(crate) fn out_of_content(&mut self) {
        self.missing_since = Some(Instant::now());
    }

    #[inline]
    pub(crate) fn is_missing_content(&self) -> bool {
        self.missing_since.is_some()
    }

    pub(crate) fn has_missing_content_time_expired(&self, limit: Duration) -> bool {
        self.missing_since
            .is_some_and(|since| since.elapsed() > limit)
    }
}

// MESSAGE BUILDER

#[derive(Debug)]
enum Framing {
    Empty,
    Length(usize),
    Chunked(ChunkDecoder),
    Remaining,
}

impl Framing {
    fn of(chunked: bool, content_length: Option<usize>) -> Self {
        match (chunked, content_length) {
            (true, _) => Framing::Chunked(ChunkDecoder::default()),
            (false, Some(length)) if length > 0 => Framing::Length(length),
            _ => Framing::Empty,
        }
    }
}

/// Everything collected for the message currently being parsed.
#[derive(Debug)]
pub(crate) struct MessageBuilder<S, K> {
    pub(crate) start: Option<S>,
    pub(crate) headers: Headers<K>,
    content_length: Option<usize>,
    chunked: bool,
    framing: Option<Framing>,
    pub(crate) body: Option<Body>,
}

impl<S, K> MessageBuilder<S, K> {
    pub(crate) fn new() -> Self {
        MessageBuilder {
            start: None,
            headers: Headers::with_capacity(8),
            content_length: None,
            chunked: false,
            framing: None,
            body: None,
        }
    }

    /// Reads header lines until the blank separator line.
    ///
    /// Headers read before running out of content are kept, so a later call
    /// continues where this one stopped. `inspect` sees every header.
    pub(crate) fn parse_headers(
        &mut self,
        content: &mut Content,
        mut inspect: impl FnMut(&Header),
    ) -> Result<Progress> {
        loop {
            let Some(line) = content.next_line() else {
                return Ok(Progress::OutOfContent);
            };

            if line.is_empty() {
                return Ok(Progress::Advanced);
            }

            let header = Header::from_line(&line)?;

            if header.is_named(names::CONTENT_LENGTH) {
                let length = header.if_content_length().ok_or_else(|| {
                    Error::bad_request(format!("Invalid Content-Length: {}", header.value))
                })?;
                // the first positive length wins
                if self.content_length.map_or(true, |current| current == 0) {
                    self.content_length = Some(length);
                }
            } else if header.is_transfer_encoding_chunked() {
                self.chunked = true;
            }

            inspect(&header);
            self.headers.add(header);
        }
    }

    /// The body is everything that arrives, however it is framed.
    pub(crate) fn frame_remaining(&mut self) {
        self.framing = Some(Framing::Remaining);
    }

    pub(crate) fn parse_body(&mut self, content: &mut Content) -> Result<Progress> {
        let framing = self
            .framing
            .get_or_insert_with(|| Framing::of(self.chunked, self.content_length));

        let bytes = match framing {
            Framing::Empty => Some(Vec::new()),
            Framing::Length(length) => content.take(*length),
            Framing::Chunked(decoder) => decoder.decode(content)?,
            Framing::Remaining => Some(content.take_remaining()),
        };

        match bytes {
            Some(bytes) => {
                self.body = Some(body_of(bytes));
                Ok(Progress::Advanced)
            }
            None => Ok(Progress::OutOfContent),
        }
    }
}

/// Text when the bytes are UTF-8, raw bytes otherwise.
fn body_of(bytes: Vec<u8>) -> Body {
    match String::from_utf8(bytes) {
        Ok(text) => Body::Plain(text),
        Err(err) => Body::Binary(err.into_bytes()),
    }
}

// CHUNKED

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ChunkStep {
    #[default]
    Size,
    Data(usize),
    DataEnd,
}

/// Reassembles `hex(len)\r\ndata\r\n ... 0\r\n` across reads.
#[derive(Debug, Default)]
struct ChunkDecoder {
    step: ChunkStep,
    bytes: Vec<u8>,
}

impl ChunkDecoder {
    /// `Some(body)` once the zero-length chunk has been read.
    fn decode(&mut self, content: &mut Content) -> Result<Option<Vec<u8>>> {
        loop {
            match self.step {
                ChunkStep::Size => {
                    let Some(line) = content.next_line() else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        continue;
                    }

                    // extensions after ';' are ignored
                    let size = line.split(';').next().unwrap_or_default().trim();
                    let size = slice_to_hex_usize(size.as_bytes()).ok_or_else(|| {
                        Error::bad_request(format!("Invalid chunk length: {line}"))
                    })?;

                    if size == 0 {
                        return Ok(Some(mem::take(&mut self.bytes)));
                    }
                    self.step = ChunkStep::Data(size);
                }
                ChunkStep::Data(size) => {
                    let Some(chunk) = content.take(size) else {
                        return Ok(None);
                    };
                    self.bytes.extend_from_slice(&chunk);
                    self.step = ChunkStep::DataEnd;
                }
                ChunkStep::DataEnd => {
                    let Some(line) = content.next_line() else {
                        return Ok(None);
                    };
                    if !line.is_empty() {
                        return Err(Error::bad_request("Chunk is longer than its length"));
                    }
                    self.step = ChunkStep::Size;
                }
            }
        }
    }
}
