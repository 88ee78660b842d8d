#![allow(rustdoc::bare_urls)]

//! Request methods, protocol versions and status codes

use crate::errors::{Error, Result};
use std::fmt;

#[inline(always)]
pub(crate) fn slice_to_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }

    let mut result: usize = 0;

    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result
            .checked_mul(10)?
            .checked_add((byte - b'0') as usize)?;
    }

    Some(result)
}

#[inline(always)]
pub(crate) fn slice_to_hex_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }

    let mut result: usize = 0;

    for &byte in bytes {
        let digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => return None,
        };

        result = result.checked_mul(16)?.checked_add(digit as usize)?;
    }

    Some(result)
}

// METHOD

/// HTTP request methods
///
/// The wire token is matched case-sensitively, so `get` is not `GET`.
///
/// # References
///
/// - [RFC 9110, Section 9](https://datatracker.ietf.org/doc/html/rfc9110#section-9)
/// - [RFC 5789](https://datatracker.ietf.org/doc/html/rfc5789) (PATCH method)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Post,
    Get,
    Put,
    Patch,
    Delete,
    Head,
    Trace,
    Options,
    Connect,
}

impl Method {
    /// Parses a method from its wire token.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] for anything that is not one of the nine methods.
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "POST" => Ok(Method::Post),
            "GET" => Ok(Method::Get),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "TRACE" => Ok(Method::Trace),
            "OPTIONS" => Ok(Method::Options),
            "CONNECT" => Ok(Method::Connect),
            _ => Err(Error::bad_request(format!("Unknown method: {token}"))),
        }
    }

    /// The wire token, e.g. `"GET"`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Trace => "TRACE",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// VERSION

/// HTTP protocol version
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// HTTP/1.1, the only version the parsers accept on the wire.
    ///
    /// [RFC 9112](https://datatracker.ietf.org/doc/html/rfc9112)
    #[default]
    Http1_1,

    /// HTTP/2.0 is recognized so it can be reported distinctly, but no
    /// HTTP/2 framing is implemented.
    Http2_0,
}

impl Version {
    /// Parses a version from its wire token.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] for anything other than `HTTP/1.1` or `HTTP/2.0`.
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "HTTP/1.1" => Ok(Version::Http1_1),
            "HTTP/2.0" => Ok(Version::Http2_0),
            _ => Err(Error::bad_request(format!("Unsupported version: {token}"))),
        }
    }

    #[inline]
    pub const fn is_http1_1(&self) -> bool {
        matches!(self, Version::Http1_1)
    }

    #[inline]
    pub const fn is_http2(&self) -> bool {
        matches!(self, Version::Http2_0)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Version::Http1_1 => "HTTP/1.1",
            Version::Http2_0 => "HTTP/2.0",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])*
        $name:ident = ($num:literal, $str:literal);
    )+) => {
        /// HTTP status codes
        ///
        /// Each variant carries its numeric code and canonical reason phrase, see
        /// [RFC 9110, Section 15](https://datatracker.ietf.org/doc/html/rfc9110#section-15).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])*
            $name = $num,
        )+ }

        impl StatusCode {
            /// Numeric status code.
            #[inline]
            pub const fn code(&self) -> u16 {
                *self as u16
            }

            /// Canonical reason phrase, e.g. `"Not Found"`.
            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $str,
                )+ }
            }

            /// Looks a status up by its numeric code.
            pub const fn from_code(code: u16) -> Option<Self> {
                match code { $(
                    $num => Some(StatusCode::$name),
                )+
                    _ => None,
                }
            }
        }
    }
}

set_status_codes! {
    Continue = (100, "Continue");
    SwitchingProtocols = (101, "Switching Protocols");
    Processing = (102, "Processing");
    EarlyHints = (103, "Early Hints");

    Ok = (200, "OK");
    Created = (201, "Created");
    Accepted = (202, "Accepted");
    NonAuthoritativeInformation = (203, "Non-Authoritative Information");
    /// Never carries a `Content-Length` header.
    NoContent = (204, "No Content");
    ResetContent = (205, "Reset Content");
    PartialContent = (206, "Partial Content");
    MultiStatus = (207, "Multi-Status");
    AlreadyReported = (208, "Already Reported");
    ImUsed = (226, "IM Used");

    MultipleChoices = (300, "Multiple Choices");
    MovedPermanently = (301, "Moved Permanently");
    Found = (302, "Found");
    SeeOther = (303, "See Other");
    /// Never carries a `Content-Length` header.
    NotModified = (304, "Not Modified");
    UseProxy = (305, "Use Proxy");
    TemporaryRedirect = (307, "Temporary Redirect");
    PermanentRedirect = (308, "Permanent Redirect");

    BadRequest = (400, "Bad Request");
    Unauthorized = (401, "Unauthorized");
    PaymentRequired = (402, "Payment Required");
    Forbidden = (403, "Forbidden");
    NotFound = (404, "Not Found");
    MethodNotAllowed = (405, "Method Not Allowed");
    NotAcceptable = (406, "Not Acceptable");
    ProxyAuthenticationRequired = (407, "Proxy Authentication Required");
    RequestTimeout = (408, "Request Timeout");
    Conflict = (409, "Conflict");
    Gone = (410, "Gone");
    LengthRequired = (411, "Length Required");
    PreconditionFailed = (412, "Precondition Failed");
    PayloadTooLarge = (413, "Payload Too Large");
    UriTooLong = (414, "URI Too Long");
    UnsupportedMediaType = (415, "Unsupported Media Type");
    RangeNotSatisfiable = (416, "Range Not Satisfiable");
    ExpectationFailed = (417, "Expectation Failed");
    /// [RFC 2324](https://datatracker.ietf.org/doc/html/rfc2324#section-2.3.2)
    ImaTeapot = (418, "I'm a teapot");
    MisdirectedRequest = (421, "Misdirected Request");
    UnprocessableEntity = (422, "Unprocessable Entity");
    Locked = (423, "Locked");
    FailedDependency = (424, "Failed Dependency");
    TooEarly = (425, "Too Early");
    UpgradeRequired = (426, "Upgrade Required");
    PreconditionRequired = (428, "Precondition Required");
    TooManyRequests = (429, "Too Many Requests");
    RequestHeaderFieldsTooLarge = (431, "Request Header Fields Too Large");
    UnavailableForLegalReasons = (451, "Unavailable For Legal Reasons");

    InternalServerError = (500, "Internal Server Error");
    NotImplemented = (501, "Not Implemented");
    BadGateway = (502, "Bad Gateway");
    ServiceUnavailable = (503, "Service Unavailable");
    GatewayTimeout = (504, "Gateway Timeout");
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
    VariantAlsoNegotiates = (506, "Variant Also Negotiates");
    InsufficientStorage = (507, "Insufficient Storage");
    LoopDetected = (508, "Loop Detected");
    NotExtended = (510, "Not Extended");
    NetworkAuthenticationRequired = (511, "Network Authentication Required");
}

impl StatusCode {
    /// Parses the raw status portion of a status line, e.g. `"404 Not Found"`.
    ///
    /// Only the numeric code is significant; the reason phrase may be missing
    /// or differ from the canonical one.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] when the code is not a number or not a known status.
    pub fn from_raw(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let code = raw.split(' ').next().unwrap_or_default();

        slice_to_usize(code.as_bytes())
            .and_then(|code| u16::try_from(code).ok())
            .and_then(StatusCode::from_code)
            .ok_or_else(|| Error::bad_request(format!("Unknown status: {raw}")))
    }

    /// `true` for 1xx, 204 and 304, which must never carry a `Content-Length`.
    #[inline]
    pub const fn forbids_content_length(&self) -> bool {
        let code = self.code();
        (code >= 100 && code < 200) || code == 204 || code == 304
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        let code = self.code();
        code >= 200 && code < 300
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
