//! The response model, its builder and its framing rules

use crate::http::{
    body::Body,
    header::{names, Header, ResponseHeaders},
    types::{StatusCode, Version},
};
use std::fmt;

/// An HTTP response.
///
/// Framing headers are kept consistent on every change:
/// - 1xx, `204` and `304` never carry `Content-Length`, even when one was
///   added explicitly;
/// - a chunked entity gets `Transfer-Encoding: chunked` and no
///   `Content-Length`;
/// - every other response gets a `Content-Length` when it has none, and
///   setting a new entity updates it.
///
/// # Examples
/// ```
/// use resource_http::{Body, Header, Response, StatusCode};
///
/// let response = Response::of(StatusCode::Ok)
///     .and(Header::content_type("text/plain"))
///     .and(Body::from("Hello"));
///
/// assert_eq!(
///     response.to_string(),
///     "HTTP/1.1 200 OK\nContent-Length: 5\nContent-Type: text/plain\n\nHello"
/// );
///
/// let response = Response::of(StatusCode::NoContent).and(Header::content_length(10));
/// assert_eq!(response.to_string(), "HTTP/1.1 204 No Content\n\n");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    version: Version,
    status: StatusCode,
    headers: ResponseHeaders,
    entity: Body,
}

impl Response {
    /// An `HTTP/1.1` response with `status` and an empty entity.
    pub fn of(status: StatusCode) -> Self {
        Response::of_parts(Version::Http1_1, status, ResponseHeaders::new(), Body::empty())
    }

    pub fn of_parts(
        version: Version,
        status: StatusCode,
        headers: ResponseHeaders,
        entity: Body,
    ) -> Self {
        let mut response = Response {
            version,
            status,
            headers,
            entity,
        };
        response.frame();
        response
    }

    /// Applies one part and returns the derived response.
    #[inline]
    pub fn and(mut self, part: impl ResponsePart) -> Self {
        part.apply_to(&mut self);
        self.frame();
        self
    }

    fn frame(&mut self) {
        let chunked = self.entity.is_complex()
            || self.headers.iter().any(Header::is_transfer_encoding_chunked);

        if self.status.forbids_content_length() || chunked {
            if self.headers.contains(names::CONTENT_LENGTH) {
                self.headers = self
                    .headers
                    .iter()
                    .filter(|h| !h.is_named(names::CONTENT_LENGTH))
                    .cloned()
                    .collect();
            }
            if self.entity.is_complex() {
                self.headers.add(Header::transfer_encoding_chunked());
            }
        } else if !self.headers.contains(names::CONTENT_LENGTH) {
            self.headers.add(Header::content_length(self.entity.len()));
        }
    }
}

// Public API
impl Response {
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    #[inline]
    pub fn entity(&self) -> &Body {
        &self.entity
    }

    #[inline]
    pub fn header_of(&self, name: &str) -> Option<&Header> {
        self.headers.header_of(name)
    }

    pub fn header_value_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.headers.value_of(name).unwrap_or(default)
    }

    /// Status line, e.g. `HTTP/1.1 404 Not Found`.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.version, self.status)
    }

    /// Wire bytes; unlike `Display`, binary entities are written raw.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(64 + self.entity.len());

        bytes.extend_from_slice(self.status_line().as_bytes());
        bytes.push(b'\n');
        for header in &self.headers {
            bytes.extend_from_slice(format!("{header}\n").as_bytes());
        }
        bytes.push(b'\n');
        bytes.extend_from_slice(self.entity.binary_content());

        bytes
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.status_line())?;
        for header in &self.headers {
            writeln!(f, "{header}")?;
        }
        write!(f, "\n{}", self.entity)
    }
}

/// A piece of a response accepted by [`Response::and`].
pub trait ResponsePart {
    fn apply_to(self, response: &mut Response);
}

impl ResponsePart for StatusCode {
    fn apply_to(self, response: &mut Response) {
        response.status = self;
    }
}

impl ResponsePart for Version {
    fn apply_to(self, response: &mut Response) {
        response.version = self;
    }
}

impl ResponsePart for Header {
    fn apply_to(self, response: &mut Response) {
        response.headers.add(self);
    }
}

impl ResponsePart for ResponseHeaders {
    fn apply_to(self, response: &mut Response) {
        for header in self.iter() {
            response.headers.add(header.clone());
        }
    }
}

// A new entity owns the length
impl ResponsePart for Body {
    fn apply_to(self, response: &mut Response) {
        response.entity = self;
        if !response.entity.is_complex() && response.headers.contains(names::CONTENT_LENGTH) {
            response
                .headers
                .add(Header::content_length(response.entity.len()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_added() {
        let response = Response::of(StatusCode::Ok);
        assert_eq!(response.to_string(), "HTTP/1.1 200 OK\nContent-Length: 0\n\n");

        let response = response.and(Body::from("\u{3b1}\u{3b2}c"));
        assert_eq!(response.header_value_or("Content-Length", "-"), "5");
    }

    #[test]
    fn explicit_content_length_kept() {
        let response = Response::of_parts(
            Version::Http1_1,
            StatusCode::Ok,
            ResponseHeaders::new().and(Header::content_length(100)),
            Body::empty(),
        );

        assert_eq!(response.header_value_or("content-length", "-"), "100");
    }

    #[test]
    fn no_content_length_for_bodiless_statuses() {
        #[rustfmt::skip]
        let cases = [
            (StatusCode::Continue,    "HTTP/1.1 100 Continue\n\n"),
            (StatusCode::NoContent,   "HTTP/1.1 204 No Content\n\n"),
            (StatusCode::NotModified, "HTTP/1.1 304 Not Modified\n\n"),
        ];

        for (status, expected) in cases {
            let plain = Response::of(status);
            let explicit = Response::of(status).and(Header::content_length(12));
            let built = Response::of_parts(
                Version::Http1_1,
                status,
                ResponseHeaders::new().and(Header::new("content-length", "7")),
                Body::empty(),
            );

            for response in [plain, explicit, built] {
                assert_eq!(response.to_string(), expected);
                assert!(response.header_of("Content-Length").is_none());
            }
        }
    }

    #[test]
    fn status_change_reframes() {
        let response = Response::of(StatusCode::Ok).and(StatusCode::NotModified);
        assert!(response.header_of("Content-Length").is_none());
    }

    #[test]
    fn chunked_entity() {
        let mut body = Body::begin_chunked();
        body.append_chunk("Hello").unwrap().end().unwrap();

        let response = Response::of(StatusCode::Ok)
            .and(Header::content_type("text/plain"))
            .and(body);

        assert_eq!(
            response.to_string(),
            "HTTP/1.1 200 OK\nContent-Type: text/plain\nTransfer-Encoding: chunked\n\n5\r\nHello\r\n0\r\n"
        );
    }

    #[test]
    fn header_order_preserved() {
        let response = Response::of(StatusCode::Created)
            .and(Header::location("/users/1"))
            .and(Header::correlation_id("abc"))
            .and(Header::location("/users/2"));

        let rendered: Vec<_> = response.headers().iter().map(|h| h.to_string()).collect();
        assert_eq!(
            rendered,
            ["Content-Length: 0", "Location: /users/2", "X-Correlation-ID: abc"]
        );
    }

    #[test]
    fn binary_bytes() {
        let response = Response::of(StatusCode::Ok).and(Body::Binary(vec![1, 2, 3]));

        assert_eq!(response.header_value_or("Content-Length", "-"), "3");
        assert!(response.into_bytes().ends_with(b"\n\n\x01\x02\x03"));
    }
}
