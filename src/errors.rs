use crate::{query, StatusCode};
use std::io;

/// Alias for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the parser, the message model and the dispatch layer can raise.
///
/// Incomplete wire data is never an error: the parsers yield and wait for more
/// bytes instead. What ends up here is genuinely malformed input, misuse of an
/// API, or a handler that failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed request/status line, missing headers, unknown method or
    /// unsupported protocol version.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A recognized input shape that is not implemented, such as appending a
    /// byte-array chunk to a chunked body.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A body encoding name that is neither `base64`, `utf-8` nor `none`.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// A full message was pulled from a parser whose completed queue is empty.
    #[error("not ready: {0}")]
    NotReady(String),

    /// A dispatched handler reported a failure.
    #[error("handler failure: {0}")]
    HandlerFailure(String),

    /// A matched action has no handler bound to it.
    #[error("handler missing: {0}")]
    HandlerMissing(String),

    /// A path template, handler signature or action list that cannot be registered.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("invalid query: {0}")]
    Query(#[from] query::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// The status a server answers with when this error ends a request.
    pub const fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Query(_) => StatusCode::BadRequest,
            Error::UnsupportedEncoding(_) => StatusCode::UnsupportedMediaType,
            Error::Unsupported(_) => StatusCode::NotImplemented,
            Error::NotReady(_)
            | Error::HandlerFailure(_)
            | Error::HandlerMissing(_)
            | Error::InvalidAction(_) => StatusCode::InternalServerError,
            Error::Io(_) => StatusCode::ServiceUnavailable,
        }
    }

    #[inline]
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest(message.into())
    }

    #[inline]
    pub(crate) fn invalid_action(message: impl Into<String>) -> Self {
        Error::InvalidAction(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        #[rustfmt::skip]
        let cases = [
            (Error::bad_request("x"),                         StatusCode::BadRequest),
            (Error::Query(query::Error::InvalidEncoding("%ff".into())), StatusCode::BadRequest),
            (Error::UnsupportedEncoding("gzip".into()),       StatusCode::UnsupportedMediaType),
            (Error::Unsupported("bytes chunk".into()),        StatusCode::NotImplemented),
            (Error::NotReady("empty".into()),                 StatusCode::InternalServerError),
            (Error::HandlerFailure("boom".into()),            StatusCode::InternalServerError),
            (Error::HandlerMissing("queryUser".into()),       StatusCode::InternalServerError),
            (Error::invalid_action("/{id"),                   StatusCode::InternalServerError),
            (Error::Io(io::ErrorKind::BrokenPipe.into()),     StatusCode::ServiceUnavailable),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::bad_request("Request line part missing: URI/path").to_string(),
            "bad request: Request line part missing: URI/path"
        );
        assert_eq!(
            Error::HandlerMissing("queryUser".into()).to_string(),
            "handler missing: queryUser"
        );
    }
}
