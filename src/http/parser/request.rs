use super::{Content, MessageBuilder, Progress, Step};
use crate::{
    errors::{Error, Result},
    http::{
        header::ForRequest,
        request::{Request, Uri},
        types::{Method, Version},
    },
};
use std::{collections::VecDeque, time::Duration};

#[derive(Debug)]
struct RequestLine {
    method: Method,
    uri: Uri,
    version: Version,
}

/// Turns a stream of request bytes into [`Request`]s.
///
/// # Examples
/// ```
/// use resource_http::{Method, RequestParser};
///
/// let mut parser = RequestParser::new();
/// parser.parse_next(b"POST /users HTTP/1.1\nHost: example.com\nContent-Le")?;
/// assert!(!parser.has_full_request());
/// assert!(parser.is_missing_content());
///
/// parser.parse_next(b"ngth: 19\n\n{ text:\"some text\"}")?;
/// let request = parser.full_request()?;
///
/// assert_eq!(request.method(), Method::Post);
/// assert_eq!(request.path(), "/users");
/// assert_eq!(request.headers().len(), 2);
/// assert_eq!(request.body().content(), "{ text:\"some text\"}");
/// assert!(parser.has_completed());
/// # Ok::<(), resource_http::Error>(())
/// ```
///
/// After an error the parser is in an undefined step and should be dropped
/// together with its connection.
#[derive(Debug)]
pub struct RequestParser {
    content: Content,
    completed: VecDeque<Request>,
    step: Step,
    message: MessageBuilder<RequestLine, ForRequest>,
}

impl RequestParser {
    pub fn new() -> Self {
        RequestParser {
            content: Content::default(),
            completed: VecDeque::new(),
            step: Step::NotStarted,
            message: MessageBuilder::new(),
        }
    }

    /// A parser that has already consumed `bytes`.
    pub fn parser_for(bytes: &[u8]) -> Result<Self> {
        let mut parser = RequestParser::new();
        parser.parse_next(bytes)?;
        Ok(parser)
    }

    /// Feeds the next read into the parser and parses as far as it can.
    ///
    /// Running out of bytes mid-message is not an error: it returns `Ok`
    /// and [`RequestParser::is_missing_content`] turns `true`.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] for a malformed request line or header, an
    /// unknown method, an unsupported version, a request without headers or
    /// an invalid `Content-Length`.
    pub fn parse_next(&mut self, bytes: &[u8]) -> Result<()> {
        self.content.include(bytes);
        self.parse()
    }

    #[inline]
    pub fn has_full_request(&self) -> bool {
        !self.completed.is_empty()
    }

    /// Removes and returns the oldest completed request.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] when no request has completed.
    pub fn full_request(&mut self) -> Result<Request> {
        self.completed
            .pop_front()
            .ok_or_else(|| Error::NotReady("No full request is available".into()))
    }

    /// Drains every completed request, oldest first.
    pub fn full_requests(&mut self) -> impl Iterator<Item = Request> + '_ {
        self.completed.drain(..)
    }

    /// `true` when every buffered byte belongs to a completed request.
    #[inline]
    pub fn has_completed(&self) -> bool {
        self.step == Step::NotStarted && self.content.is_drained()
    }

    #[inline]
    pub fn is_missing_content(&self) -> bool {
        self.content.is_missing_content()
    }

    /// `true` when a partial request has waited for more bytes longer than `limit`.
    #[inline]
    pub fn has_missing_content_time_expired(&self, limit: Duration) -> bool {
        self.content.has_missing_content_time_expired(limit)
    }
}

impl RequestParser {
    fn parse(&mut self) -> Result<()> {
        loop {
            if self.step == Step::NotStarted {
                self.content.skip_blank_lines();
            }
            if self.has_completed() {
                break;
            }

            let progress = match self.step {
                Step::NotStarted => Progress::Advanced,
                Step::StartLine => self.parse_request_line()?,
                Step::Headers => self.parse_headers()?,
                Step::Body => self.message.parse_body(&mut self.content)?,
                Step::Completed => self.complete()?,
            };

            match progress {
                Progress::Advanced => self.step = self.step.next(),
                Progress::OutOfContent => {
                    self.content.out_of_content();
                    return Ok(());
                }
            }
        }

        self.content.compact();
        Ok(())
    }

    fn parse_request_line(&mut self) -> Result<Progress> {
        // blank lines ahead of a request line are skipped
        let line = loop {
            match self.content.next_line() {
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
                None => return Ok(Progress::OutOfContent),
            }
        };

        let mut parts = line.split_ascii_whitespace();
        let method = Method::from_token(next_part(&mut parts, "Method")?)?;
        let uri = Uri::new(next_part(&mut parts, "URI/path")?);
        let version = Version::from_token(next_part(&mut parts, "HTTP/version")?)?;

        if parts.next().is_some() {
            return Err(Error::bad_request(format!("Request line is malformed: {line}")));
        }
        if version.is_http2() {
            return Err(Error::bad_request("HTTP/2.0 is not supported"));
        }

        self.message.start = Some(RequestLine {
            method,
            uri,
            version,
        });
        Ok(Progress::Advanced)
    }

    fn parse_headers(&mut self) -> Result<Progress> {
        let progress = self.message.parse_headers(&mut self.content, |_| {})?;

        if progress == Progress::Advanced && self.message.headers.is_empty() {
            return Err(Error::bad_request("Header is required"));
        }
        Ok(progress)
    }

    fn complete(&mut self) -> Result<Progress> {
        let message = std::mem::replace(&mut self.message, MessageBuilder::new());
        let Some(line) = message.start else {
            return Err(Error::bad_request("Request line is missing"));
        };

        tracing::debug!(method = %line.method, uri = %line.uri, "request parsed");

        self.completed.push_back(Request::from_parts(
            line.method,
            line.uri,
            line.version,
            message.headers,
            message.body.unwrap_or_default(),
        ));
        Ok(Progress::Advanced)
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        RequestParser::new()
    }
}

#[inline]
fn next_part<'a>(parts: &mut impl Iterator<Item = &'a str>, expected: &str) -> Result<&'a str> {
    parts
        .next()
        .ok_or_else(|| Error::bad_request(format!("Request line part missing: {expected}")))
}
