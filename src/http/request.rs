//! The request model and its builder

use crate::{
    errors::Result,
    http::{
        body::Body,
        header::{Header, RequestHeaders},
        query::QueryParameters,
        types::{Method, Version},
    },
};
use memchr::{memchr, memchr2};
use std::fmt;

// URI

/// A request target as it appeared on the request line.
///
/// # Components
///
/// - **Raw**: the whole target (e.g. `/users/123?sort=name#top`)
/// - **Path**: the target up to `?` or `#` (e.g. `/users/123`)
/// - **Query**: between `?` and `#`, without the `?` (e.g. `sort=name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    raw: String,
    path_end: usize,
}

impl Uri {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let path_end = memchr2(b'?', b'#', raw.as_bytes()).unwrap_or(raw.len());

        Uri { raw, path_end }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The target without query string or fragment.
    #[inline]
    pub fn path(&self) -> &str {
        &self.raw[..self.path_end]
    }

    /// The query string without the leading `?`, if there is one.
    pub fn query(&self) -> Option<&str> {
        let rest = self.raw[self.path_end..].strip_prefix('?')?;
        let end = memchr(b'#', rest.as_bytes()).unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

impl Default for Uri {
    fn default() -> Self {
        Uri::new("/")
    }
}

impl From<&str> for Uri {
    fn from(raw: &str) -> Self {
        Uri::new(raw)
    }
}

impl From<String> for Uri {
    fn from(raw: String) -> Self {
        Uri::new(raw)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// REQUEST

/// A parsed or constructed HTTP request.
///
/// Built with [`Request::has`] and refined with [`Request::and`], which
/// accepts any [`RequestPart`]: a [`Method`], [`Uri`], [`Version`],
/// [`Header`], [`RequestHeaders`] or [`Body`].
///
/// # Examples
/// ```
/// use resource_http::{Body, Header, Method, Request, Uri};
///
/// let request = Request::has(Method::Post)
///     .and(Uri::from("/users"))
///     .and(Header::host("example.com"))
///     .and(Header::content_length(19))
///     .and(Body::from("{ text:\"some text\"}"));
///
/// assert_eq!(
///     request.to_string(),
///     "POST /users HTTP/1.1\nHost: example.com\nContent-Length: 19\n\n{ text:\"some text\"}"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: RequestHeaders,
    body: Body,
}

impl Request {
    /// Starts a `method / HTTP/1.1` request with no headers and an empty body.
    pub fn has(method: Method) -> Self {
        Request {
            method,
            uri: Uri::default(),
            version: Version::Http1_1,
            headers: RequestHeaders::new(),
            body: Body::empty(),
        }
    }

    pub fn from_parts(
        method: Method,
        uri: Uri,
        version: Version,
        headers: RequestHeaders,
        body: Body,
    ) -> Self {
        Request {
            method,
            uri,
            version,
            headers,
            body,
        }
    }

    /// Applies one part and returns the derived request.
    #[inline]
    pub fn and(mut self, part: impl RequestPart) -> Self {
        part.apply_to(&mut self);
        self
    }
}

// Public API
impl Request {
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    #[inline]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Shorthand for `self.uri().path()`.
    #[inline]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Decodes the query component; an absent query gives empty parameters.
    ///
    /// # Errors
    ///
    /// [`Error::Query`](crate::Error::Query) when a parameter does not decode.
    pub fn query_parameters(&self) -> Result<QueryParameters> {
        match self.uri.query() {
            Some(query) => Ok(QueryParameters::parse(query)?),
            None => Ok(QueryParameters::default()),
        }
    }

    #[inline]
    pub fn header_of(&self, name: &str) -> Option<&Header> {
        self.headers.header_of(name)
    }

    pub fn header_value_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.headers.value_of(name).unwrap_or(default)
    }

    /// `true` unless the client sent `Connection: close`.
    pub fn is_keep_alive(&self) -> bool {
        !self.headers.iter().any(Header::is_close_connection)
    }

    /// Wire bytes; unlike `Display`, binary bodies are written raw.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(64 + self.body.len());

        bytes.extend_from_slice(
            format!("{} {} {}\n", self.method, self.uri, self.version).as_bytes(),
        );
        for header in &self.headers {
            bytes.extend_from_slice(format!("{header}\n").as_bytes());
        }
        bytes.push(b'\n');
        bytes.extend_from_slice(self.body.binary_content());

        bytes
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.method, self.uri, self.version)?;
        for header in &self.headers {
            writeln!(f, "{header}")?;
        }
        write!(f, "\n{}", self.body)
    }
}

/// A piece of a request accepted by [`Request::and`].
pub trait RequestPart {
    fn apply_to(self, request: &mut Request);
}

impl RequestPart for Method {
    fn apply_to(self, request: &mut Request) {
        request.method = self;
    }
}

impl RequestPart for Uri {
    fn apply_to(self, request: &mut Request) {
        request.uri = self;
    }
}

impl RequestPart for Version {
    fn apply_to(self, request: &mut Request) {
        request.version = self;
    }
}

impl RequestPart for Header {
    fn apply_to(self, request: &mut Request) {
        request.headers.add(self);
    }
}

impl RequestPart for RequestHeaders {
    fn apply_to(self, request: &mut Request) {
        for header in self.iter() {
            request.headers.add(header.clone());
        }
    }
}

impl RequestPart for Body {
    fn apply_to(self, request: &mut Request) {
        request.body = self;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_parts() {
        #[rustfmt::skip]
        let cases = [
            ("/users",                      "/users",       None),
            ("/users/123?sort=name",        "/users/123",   Some("sort=name")),
            ("/users?",                     "/users",       Some("")),
            ("/users?a=1#top",              "/users",       Some("a=1")),
            ("/users#top?a=1",              "/users",       None),
            ("",                            "",             None),
        ];

        for (raw, path, query) in cases {
            let uri = Uri::from(raw);
            assert_eq!(uri.path(), path, "{raw}");
            assert_eq!(uri.query(), query, "{raw}");
            assert_eq!(uri.to_string(), raw);
        }
    }

    #[test]
    fn builder() {
        let request = Request::has(Method::Get)
            .and(Uri::from("/users/1?x=1"))
            .and(Header::host("example.com"))
            .and(Header::accept("text/plain"))
            .and(Header::new("host", "example.com"));

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.path(), "/users/1");
        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.header_value_or("HOST", "-"), "example.com");
        assert_eq!(request.header_value_or("X-Missing", "-"), "-");
        assert_eq!(request.query_parameters().unwrap().value_of("x"), Some("1"));
        assert!(!request.body().has_content());
        assert!(request.is_keep_alive());

        let request = request.and(Method::Put).and(Header::connection("close"));
        assert_eq!(request.method(), Method::Put);
        assert!(!request.is_keep_alive());
    }

    #[test]
    fn rendering() {
        let request = Request::has(Method::Get)
            .and(Uri::from("/"))
            .and(Header::host("example.com"));

        assert_eq!(request.to_string(), "GET / HTTP/1.1\nHost: example.com\n\n");
        assert_eq!(
            request.clone().into_bytes(),
            request.to_string().into_bytes()
        );

        let binary = Request::has(Method::Post).and(Body::Binary(vec![0xff, 0x00]));
        assert!(binary.into_bytes().ends_with(&[b'\n', 0xff, 0x00]));
    }

    #[test]
    fn headers_part_merges() {
        let headers = RequestHeaders::new()
            .and(Header::host("a"))
            .and(Header::content_length(3));

        let request = Request::has(Method::Post)
            .and(Header::host("z"))
            .and(headers);

        let names: Vec<_> = request.headers().iter().map(|h| h.to_string()).collect();
        assert_eq!(names, ["Host: a", "Content-Length: 3"]);
    }
}
