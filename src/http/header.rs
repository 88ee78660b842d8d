//! Header name/value pairs and the ordered, upserting header collections

use crate::{
    errors::{Error, Result},
    http::types::slice_to_usize,
};
use std::{fmt, marker::PhantomData, slice};

/// Well-known header names in their canonical spelling.
pub mod names {
    pub const ACCEPT: &str = "Accept";
    pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CACHE_CONTROL: &str = "Cache-Control";
    pub const CONNECTION: &str = "Connection";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const DATE: &str = "Date";
    pub const ETAG: &str = "ETag";
    pub const HOST: &str = "Host";
    pub const KEEP_ALIVE: &str = "Keep-Alive";
    pub const LOCATION: &str = "Location";
    pub const SERVER: &str = "Server";
    pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
    pub const USER_AGENT: &str = "User-Agent";
    pub const X_CORRELATION_ID: &str = "X-Correlation-ID";
}

pub(crate) const VALUE_KEEP_ALIVE: &str = "keep-alive";
pub(crate) const VALUE_CLOSE: &str = "close";
pub(crate) const VALUE_CHUNKED: &str = "chunked";
pub(crate) const VALUE_EVENT_STREAM: &str = "text/event-stream";

// HEADER

/// A single `Name: value` pair.
///
/// Names compare case-insensitively, values compare exactly.
#[derive(Debug, Clone, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Splits a raw header line on its first `:`, trimming both sides.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] when the line has no colon or an empty name.
    ///
    /// # Examples
    /// ```
    /// use resource_http::Header;
    ///
    /// let header = Header::from_line("Host:  example.com ").unwrap();
    /// assert_eq!(header.name, "Host");
    /// assert_eq!(header.value, "example.com");
    ///
    /// assert!(Header::from_line("Host example.com").is_err());
    /// ```
    pub fn from_line(line: &str) -> Result<Self> {
        let Some(colon) = memchr::memchr(b':', line.as_bytes()) else {
            return Err(Error::bad_request(format!("Header is malformed: {line}")));
        };

        let name = line[..colon].trim();
        if name.is_empty() {
            return Err(Error::bad_request(format!("Header name is missing: {line}")));
        }

        Ok(Header::new(name, line[colon + 1..].trim()))
    }

    /// `true` when this header's name equals `name`, ignoring ASCII case.
    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The length when this is a `Content-Length` header with a numeric value.
    pub fn if_content_length(&self) -> Option<usize> {
        match self.is_named(names::CONTENT_LENGTH) {
            true => slice_to_usize(self.value.trim().as_bytes()),
            false => None,
        }
    }

    pub fn is_keep_alive_connection(&self) -> bool {
        self.is_named(names::CONNECTION) && self.value.eq_ignore_ascii_case(VALUE_KEEP_ALIVE)
    }

    pub fn is_close_connection(&self) -> bool {
        self.is_named(names::CONNECTION) && self.value.eq_ignore_ascii_case(VALUE_CLOSE)
    }

    pub fn is_stream_content_type(&self) -> bool {
        self.is_named(names::CONTENT_TYPE)
            && self.value.to_ascii_lowercase().starts_with(VALUE_EVENT_STREAM)
    }

    pub fn is_transfer_encoding_chunked(&self) -> bool {
        self.is_named(names::TRANSFER_ENCODING) && self.value.eq_ignore_ascii_case(VALUE_CHUNKED)
    }
}

// Factories
impl Header {
    pub fn host(value: impl Into<String>) -> Self {
        Header::new(names::HOST, value)
    }

    pub fn accept(value: impl Into<String>) -> Self {
        Header::new(names::ACCEPT, value)
    }

    pub fn connection(value: impl Into<String>) -> Self {
        Header::new(names::CONNECTION, value)
    }

    pub fn content_length(length: usize) -> Self {
        Header::new(names::CONTENT_LENGTH, length.to_string())
    }

    pub fn content_type(value: impl Into<String>) -> Self {
        Header::new(names::CONTENT_TYPE, value)
    }

    pub fn content_encoding(value: impl Into<String>) -> Self {
        Header::new(names::CONTENT_ENCODING, value)
    }

    pub fn correlation_id(value: impl Into<String>) -> Self {
        Header::new(names::X_CORRELATION_ID, value)
    }

    pub fn location(value: impl Into<String>) -> Self {
        Header::new(names::LOCATION, value)
    }

    pub fn transfer_encoding_chunked() -> Self {
        Header::new(names::TRANSFER_ENCODING, VALUE_CHUNKED)
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.is_named(&other.name) && self.value == other.value
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

// HEADERS

/// Marker for headers attached to a [`Request`](crate::Request).
#[derive(Debug)]
pub enum ForRequest {}

/// Marker for headers attached to a [`Response`](crate::Response).
#[derive(Debug)]
pub enum ForResponse {}

pub type RequestHeaders = Headers<ForRequest>;
pub type ResponseHeaders = Headers<ForResponse>;

/// An ordered header collection holding at most one entry per name.
///
/// Adding a header whose name is already present replaces the value in
/// place, so the original position is kept. There is no removal.
///
/// # Examples
/// ```
/// use resource_http::{Header, RequestHeaders};
///
/// let headers = RequestHeaders::new()
///     .and(Header::host("example.com"))
///     .and(Header::new("Content-length", "10"))
///     .and(Header::content_length(19));
///
/// assert_eq!(headers.len(), 2);
/// assert_eq!(headers.value_of("content-length"), Some("19"));
/// ```
pub struct Headers<K> {
    entries: Vec<Header>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Headers<K> {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(4)
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Headers {
            entries: Vec::with_capacity(capacity),
            _kind: PhantomData,
        }
    }

    /// Builder form of [`Headers::add`].
    #[inline]
    pub fn and(mut self, header: Header) -> Self {
        self.add(header);
        self
    }

    /// Upserts `header`: replaces the value of a same-named entry in place,
    /// otherwise appends.
    pub fn add(&mut self, header: Header) {
        match self.entries.iter_mut().find(|h| h.is_named(&header.name)) {
            Some(existing) => existing.value = header.value,
            None => self.entries.push(header),
        }
    }

    pub fn header_of(&self, name: &str) -> Option<&Header> {
        self.entries.iter().find(|h| h.is_named(name))
    }

    pub fn header_of_or_default<'a>(&'a self, name: &str, default: &'a Header) -> &'a Header {
        self.header_of(name).unwrap_or(default)
    }

    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.header_of(name).map(|h| h.value.as_str())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.header_of(name).is_some()
    }

    /// A detached copy, usable as the starting point for another message.
    #[inline]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Header> {
        self.entries.iter()
    }
}

impl<K> Default for Headers<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for Headers<K> {
    fn clone(&self) -> Self {
        Headers {
            entries: self.entries.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K> PartialEq for Headers<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K> fmt::Debug for Headers<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<'a, K> IntoIterator for &'a Headers<K> {
    type Item = &'a Header;
    type IntoIter = slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K> FromIterator<Header> for Headers<K> {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for header in iter {
            headers.add(header);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_line() {
        #[rustfmt::skip]
        let cases = [
            ("Host: example.com",               Some(("Host", "example.com"))),
            ("Host:example.com",                Some(("Host", "example.com"))),
            ("  Accept :  text/plain  ",      Some(("Accept", "text/plain"))),
            ("Date: Tue, 15 Nov 1994 08:12", Some(("Date", "Tue, 15 Nov 1994 08:12"))),
            ("X-Empty:",                      Some(("X-Empty", ""))),
            ("NoColonHere",                   None),
            (": value",                       None),
        ];

        for (line, expected) in cases {
            let header = Header::from_line(line).ok();
            let header = header.as_ref().map(|h| (h.name.as_str(), h.value.as_str()));
            assert_eq!(header, expected, "{line:?}");
        }
    }

    #[test]
    fn equality() {
        assert_eq!(Header::new("content-type", "a"), Header::new("Content-Type", "a"));
        assert_ne!(Header::new("Content-Type", "A"), Header::new("Content-Type", "a"));
    }

    #[test]
    fn upsert_keeps_position() {
        let mut headers = ResponseHeaders::new()
            .and(Header::new("Content-Length", "10"))
            .and(Header::content_type("text/plain"));

        headers.add(Header::new("Content-length", "20"));
        headers.add(Header::new("X-New", "yes"));

        let names: Vec<_> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Content-Length", "Content-Type", "X-New"]);
        assert_eq!(headers.value_of("CONTENT-LENGTH"), Some("20"));
    }

    #[test]
    fn lookups() {
        let headers: RequestHeaders = [Header::host("example.com"), Header::accept("*/*")]
            .into_iter()
            .collect();
        let default = Header::new("X-Missing", "none");

        assert_eq!(headers.header_of("host").map(|h| h.value.as_str()), Some("example.com"));
        assert_eq!(headers.header_of_or_default("X-Missing", &default).value, "none");
        assert!(headers.contains("ACCEPT"));
        assert!(!headers.contains("Accept-Encoding"));

        let copy = headers.copy().and(Header::host("example.com"));
        assert_eq!(headers.value_of("Host"), Some("example.com"));
        assert_eq!(copy.value_of("Host"), Some("example.com"));
    }

    #[test]
    fn semantics() {
        #[rustfmt::skip]
        let cases = [
            (Header::new("content-length", " 42 "),        Some(42)),
            (Header::new("Content-Length", "-1"),          None),
            (Header::new("Content-Length", "abc"),         None),
            (Header::new("X-Content-Length", "42"),        None),
        ];
        for (header, expected) in cases {
            assert_eq!(header.if_content_length(), expected, "{header}");
        }

        assert!(Header::new("connection", "Keep-Alive").is_keep_alive_connection());
        assert!(!Header::new("Connection", "close").is_keep_alive_connection());
        assert!(Header::new("Connection", "close").is_close_connection());
        assert!(Header::new("Content-Type", "text/event-stream;charset=utf-8").is_stream_content_type());
        assert!(!Header::new("Content-Type", "text/plain").is_stream_content_type());
        assert!(Header::transfer_encoding_chunked().is_transfer_encoding_chunked());
        assert!(Header::new("transfer-encoding", "CHUNKED").is_transfer_encoding_chunked());
    }
}
