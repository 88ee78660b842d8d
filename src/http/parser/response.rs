use super::{Content, MessageBuilder, Progress, Step};
use crate::{
    errors::{Error, Result},
    http::{
        header::ForResponse,
        response::Response,
        types::{StatusCode, Version},
    },
};
use std::{collections::VecDeque, time::Duration};

#[derive(Debug)]
struct StatusLine {
    version: Version,
    status: StatusCode,
}

/// Turns a stream of response bytes into [`Response`]s.
///
/// Besides `Content-Length` framing it reassembles `Transfer-Encoding:
/// chunked` bodies. Once a response announced both `Connection: keep-alive`
/// and `Content-Type: text/event-stream`, the parser switches to body-only
/// mode: each later packet becomes one `200 OK` response holding the packet
/// as its body.
///
/// # Examples
/// ```
/// use resource_http::{ResponseParser, StatusCode};
///
/// let mut parser = ResponseParser::parser_for(
///     b"HTTP/1.1 200 OK\nTransfer-Encoding: chunked\n\n5\r\nHello\r\n0\r\n",
/// )?;
/// let response = parser.full_response()?;
///
/// assert_eq!(response.status(), StatusCode::Ok);
/// assert_eq!(response.entity().content(), "Hello");
/// # Ok::<(), resource_http::Error>(())
/// ```
#[derive(Debug)]
pub struct ResponseParser {
    content: Content,
    completed: VecDeque<Response>,
    step: Step,
    message: MessageBuilder<StatusLine, ForResponse>,
    body_only: bool,
    keep_alive: bool,
    stream: bool,
}

impl ResponseParser {
    pub fn new() -> Self {
        ResponseParser {
            content: Content::default(),
            completed: VecDeque::new(),
            step: Step::NotStarted,
            message: MessageBuilder::new(),
            body_only: false,
            keep_alive: false,
            stream: false,
        }
    }

    /// A parser in body-only mode from the start.
    pub fn body_only() -> Self {
        ResponseParser {
            body_only: true,
            ..ResponseParser::new()
        }
    }

    pub fn parser_for(bytes: &[u8]) -> Result<Self> {
        let mut parser = ResponseParser::new();
        parser.parse_next(bytes)?;
        Ok(parser)
    }

    pub fn parser_for_body_only(bytes: &[u8]) -> Result<Self> {
        let mut parser = ResponseParser::body_only();
        parser.parse_next(bytes)?;
        Ok(parser)
    }

    /// Feeds the next read into the parser and parses as far as it can.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] for a malformed status line, header, chunk
    /// length or `Content-Length`, and for `HTTP/2.0`.
    pub fn parse_next(&mut self, bytes: &[u8]) -> Result<()> {
        self.content.include(bytes);
        self.parse()
    }

    #[inline]
    pub fn has_full_response(&self) -> bool {
        !self.completed.is_empty()
    }

    /// Removes and returns the oldest completed response.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] when no response has completed.
    pub fn full_response(&mut self) -> Result<Response> {
        self.completed
            .pop_front()
            .ok_or_else(|| Error::NotReady("No full response is available".into()))
    }

    pub fn full_responses(&mut self) -> impl Iterator<Item = Response> + '_ {
        self.completed.drain(..)
    }

    #[inline]
    pub fn has_completed(&self) -> bool {
        self.step == Step::NotStarted && self.content.is_drained()
    }

    #[inline]
    pub fn is_body_only(&self) -> bool {
        self.body_only
    }

    /// `true` once any response carried `Connection: keep-alive`.
    #[inline]
    pub fn is_keep_alive_connection(&self) -> bool {
        self.keep_alive
    }

    /// `true` once any response carried `Content-Type: text/event-stream`.
    #[inline]
    pub fn is_stream_content_type(&self) -> bool {
        self.stream
    }

    #[inline]
    pub fn is_missing_content(&self) -> bool {
        self.content.is_missing_content()
    }

    #[inline]
    pub fn has_missing_content_time_expired(&self, limit: Duration) -> bool {
        self.content.has_missing_content_time_expired(limit)
    }
}

impl ResponseParser {
    fn parse(&mut self) -> Result<()> {
        loop {
            if self.step == Step::NotStarted && !self.body_only {
                self.content.skip_blank_lines();
            }
            if self.has_completed() {
                break;
            }

            let progress = match self.step {
                Step::NotStarted => Progress::Advanced,
                Step::StartLine => self.parse_status_line()?,
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

    fn parse_status_line(&mut self) -> Result<Progress> {
        if self.body_only {
            self.message.start = Some(StatusLine {
                version: Version::Http1_1,
                status: StatusCode::Ok,
            });
            return Ok(Progress::Advanced);
        }

        let line = loop {
            match self.content.next_line() {
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
                None => return Ok(Progress::OutOfContent),
            }
        };

        let Some((version, status)) = line.split_once(' ') else {
            return Err(Error::bad_request(format!("Response status line is malformed: {line}")));
        };

        let version = Version::from_token(version)?;
        if version.is_http2() {
            return Err(Error::bad_request("HTTP/2.0 is not supported"));
        }

        self.message.start = Some(StatusLine {
            version,
            status: StatusCode::from_raw(status)?,
        });
        Ok(Progress::Advanced)
    }

    fn parse_headers(&mut self) -> Result<Progress> {
        if self.body_only {
            self.message.frame_remaining();
            return Ok(Progress::Advanced);
        }

        let (keep_alive, stream) = (&mut self.keep_alive, &mut self.stream);

        self.message.parse_headers(&mut self.content, |header| {
            if header.is_keep_alive_connection() {
                *keep_alive = true;
            } else if header.is_stream_content_type() {
                *stream = true;
            }
        })
    }

    fn complete(&mut self) -> Result<Progress> {
        let message = std::mem::replace(&mut self.message, MessageBuilder::new());
        let Some(line) = message.start else {
            return Err(Error::bad_request("Response status line is missing"));
        };

        tracing::debug!(status = line.status.code(), body_only = self.body_only, "response parsed");

        self.completed.push_back(Response::of_parts(
            line.version,
            line.status,
            message.headers,
            message.body.unwrap_or_default(),
        ));
        self.prepare_for_stream();
        Ok(Progress::Advanced)
    }

    // bytes after a keep-alive event stream response are bare events
    fn prepare_for_stream(&mut self) {
        if !self.body_only && self.keep_alive && self.stream {
            tracing::debug!("switching response parser to body-only streaming");
            self.body_only = true;
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        ResponseParser::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{body::Body, header::Header};

    fn whole(raw: &[u8]) -> Vec<Response> {
        let mut parser = ResponseParser::parser_for(raw).unwrap();
        assert!(parser.has_completed());
        parser.full_responses().collect()
    }

    #[test]
    fn single_response() {
        let responses = whole(b"HTTP/1.1 201 Created\r\nLocation: /users/1\r\nContent-Length: 2\r\n\r\n{}");

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status(), StatusCode::Created);
        assert_eq!(responses[0].header_value_or("location", "-"), "/users/1");
        assert_eq!(responses[0].entity(), &Body::from("{}"));
    }

    #[test]
    fn round_trip() {
        let mut chunked = Body::begin_chunked();
        chunked.append_chunk("\u{3b1}\u{3b2}\u{3b3}").unwrap().append_chunk(" ok").unwrap().end().unwrap();

        let plain = Response::of(StatusCode::Ok)
            .and(Header::content_type("text/plain"))
            .and(Body::from("\u{416}\u{443}\u{43a}"));
        let empty = Response::of(StatusCode::NotFound);
        let chunked = Response::of(StatusCode::Ok).and(chunked);

        for response in [plain, empty] {
            assert_eq!(whole(response.to_string().as_bytes()), [response]);
        }

        let parsed = whole(chunked.to_string().as_bytes());
        assert_eq!(parsed[0].entity(), &Body::from("\u{3b1}\u{3b2}\u{3b3} ok"));
        assert_eq!(parsed[0].headers(), chunked.headers());
    }

    #[test]
    fn without_headers() {
        let responses = whole(b"HTTP/1.1 204 No Content\n\nHTTP/1.1 200\nContent-Length: 0\n\n");

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].status(), StatusCode::NoContent);
        assert!(responses[0].headers().is_empty());
        assert_eq!(responses[1].status_line(), "HTTP/1.1 200 OK");
    }

    #[test]
    fn chunked_every_cut() {
        let raw = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                   4\r\n\u{3b1}\u{3b2}\r\na\r\n0123456789\r\n0\r\n\r\n\
                   HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\n\r\n";
        let bytes = raw.as_bytes();
        let expected = whole(bytes);

        assert_eq!(expected.len(), 2);
        assert_eq!(expected[0].entity(), &Body::from("\u{3b1}\u{3b2}0123456789"));

        for cut in 0..=bytes.len() {
            let mut parser = ResponseParser::new();
            parser.parse_next(&bytes[..cut]).unwrap();
            parser.parse_next(&bytes[cut..]).unwrap();

            assert!(parser.has_completed(), "cut at {cut}");
            assert_eq!(parser.full_responses().collect::<Vec<_>>(), expected, "cut at {cut}");
        }
    }

    #[test]
    fn stream_switches_to_body_only() {
        let mut parser = ResponseParser::parser_for(
            b"HTTP/1.1 200 OK\nConnection: keep-alive\nContent-Type: text/event-stream\nContent-Length: 0\n\n",
        )
        .unwrap();

        assert!(parser.is_keep_alive_connection());
        assert!(parser.is_stream_content_type());
        assert!(parser.is_body_only());
        assert_eq!(parser.full_response().unwrap().status(), StatusCode::Ok);

        parser.parse_next(b"event: tick\ndata: 1\n\n").unwrap();
        parser.parse_next(b"event: tick\ndata: 2\n\n").unwrap();

        let bodies: Vec<_> = parser
            .full_responses()
            .map(|r| r.entity().content().into_owned())
            .collect();
        assert_eq!(bodies, ["event: tick\ndata: 1\n\n", "event: tick\ndata: 2\n\n"]);
    }

    #[test]
    fn events_in_switching_packet() {
        let mut parser = ResponseParser::parser_for(
            b"HTTP/1.1 200 OK\nConnection: keep-alive\nContent-Type: text/event-stream\n\n\ndata: first\n\n",
        )
        .unwrap();

        let responses: Vec<_> = parser.full_responses().collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].header_value_or("Content-Length", "-"), "0");
        assert_eq!(responses[1].entity(), &Body::from("\ndata: first\n\n"));
    }

    #[test]
    fn keep_alive_alone_stays_framed() {
        let mut parser = ResponseParser::parser_for(
            b"HTTP/1.1 200 OK\nConnection: keep-alive\nContent-Length: 1\n\nx",
        )
        .unwrap();

        assert!(parser.is_keep_alive_connection());
        assert!(!parser.is_body_only());
        parser.parse_next(b"HTTP/1.1 404 Not Found\nContent-Length: 0\n\n").unwrap();
        assert_eq!(parser.full_responses().count(), 2);
    }

    #[test]
    fn body_only() {
        let mut parser = ResponseParser::parser_for_body_only("\u{3a9} packet".as_bytes()).unwrap();
        let response = parser.full_response().unwrap();

        assert_eq!(
            response.to_string(),
            "HTTP/1.1 200 OK\nContent-Length: 9\n\n\u{3a9} packet"
        );
        assert!(parser.has_completed());

        parser.parse_next(b"").unwrap();
        assert!(!parser.has_full_response());
    }

    #[test]
    fn malformed() {
        #[rustfmt::skip]
        let cases = [
            "HTTP/1.1\nContent-Length: 0\n\n",
            "HTTP/1.0 200 OK\nContent-Length: 0\n\n",
            "HTTP/2.0 200 OK\nContent-Length: 0\n\n",
            "HTTP/1.1 999 Unknown\nContent-Length: 0\n\n",
            "HTTP/1.1 OK\nContent-Length: 0\n\n",
            "HTTP/1.1 200 OK\nContent-Length 0\n\n",
            "HTTP/1.1 200 OK\nTransfer-Encoding: chunked\n\nxyz\n",
        ];

        for raw in cases {
            assert!(
                matches!(ResponseParser::parser_for(raw.as_bytes()), Err(Error::BadRequest(_))),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn not_ready() {
        let mut parser = ResponseParser::parser_for(b"HTTP/1.1 200 OK\nContent-Length: 5\n\nab").unwrap();

        assert!(parser.is_missing_content());
        assert!(matches!(parser.full_response(), Err(Error::NotReady(_))));
    }
}
