//! Message bodies: plain text, raw bytes and chunked transfer encoding

use crate::errors::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{borrow::Cow, fmt};

/// How raw bytes are turned into a [`Body`] by [`Body::from_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Bytes become a [`Body::Plain`] holding their Base64 text.
    Base64,
    /// Bytes become a [`Body::Plain`] holding their UTF-8 text.
    Utf8,
    /// Bytes are kept as they are in a [`Body::Binary`].
    None,
}

impl Encoding {
    /// Parses an encoding name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedEncoding`] for names other than `base64`,
    /// `utf-8`/`utf8` and `none`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(Encoding::Base64),
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "none" => Ok(Encoding::None),
            _ => Err(Error::UnsupportedEncoding(name.to_string())),
        }
    }
}

/// The content of a request or response.
///
/// # Examples
/// ```
/// use resource_http::Body;
///
/// let mut body = Body::begin_chunked();
/// body.append_chunk("Hello")?.append_chunk(", world")?.end()?;
///
/// assert!(body.is_complex());
/// assert_eq!(body.content(), "5\r\nHello\r\n7\r\n, world\r\n0\r\n");
/// # Ok::<(), resource_http::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Textual content. An empty `Plain` is the empty body.
    Plain(String),
    /// Raw bytes; equality compares the bytes.
    Binary(Vec<u8>),
    /// Already-framed chunked content: `hex(len)\r\nchunk\r\n` segments,
    /// terminated by `0\r\n` once [`Body::end`] is called.
    Chunked(String),
}

impl Body {
    #[inline]
    pub const fn empty() -> Self {
        Body::Plain(String::new())
    }

    /// Builds a body from bytes according to `encoding`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedEncoding`] when `Encoding::Utf8` is requested for
    /// bytes that are not valid UTF-8.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, encoding: Encoding) -> Result<Self> {
        let bytes = bytes.into();

        match encoding {
            Encoding::Base64 => Ok(Body::Plain(STANDARD.encode(&bytes))),
            Encoding::Utf8 => String::from_utf8(bytes)
                .map(Body::Plain)
                .map_err(|e| Error::UnsupportedEncoding(format!("body is not UTF-8: {e}"))),
            Encoding::None => Ok(Body::Binary(bytes)),
        }
    }

    /// Starts an empty chunked body.
    #[inline]
    pub const fn begin_chunked() -> Self {
        Body::Chunked(String::new())
    }

    /// Appends one chunk framed as `hex(byte length)\r\nchunk\r\n`.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] when this body is not chunked.
    pub fn append_chunk(&mut self, chunk: &str) -> Result<&mut Self> {
        let Body::Chunked(content) = self else {
            return Err(Error::Unsupported("Only chunked bodies accept chunks".into()));
        };

        content.push_str(&format!("{:x}\r\n", chunk.len()));
        content.push_str(chunk);
        content.push_str("\r\n");

        Ok(self)
    }

    /// Byte-array chunks are not supported; this always fails.
    ///
    /// # Errors
    ///
    /// Always [`Error::Unsupported`].
    pub fn append_bytes_chunk(&mut self, _chunk: &[u8]) -> Result<&mut Self> {
        Err(Error::Unsupported(
            "Adding chunks in the form of bytes is not supported".into(),
        ))
    }

    /// Appends the terminal zero-length chunk.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] when this body is not chunked.
    pub fn end(&mut self) -> Result<&mut Self> {
        let Body::Chunked(content) = self else {
            return Err(Error::Unsupported("Only chunked bodies can be ended".into()));
        };

        content.push_str("0\r\n");

        Ok(self)
    }

    /// Textual content; `Binary` bodies are rendered as Base64.
    pub fn content(&self) -> Cow<'_, str> {
        match self {
            Body::Plain(text) | Body::Chunked(text) => Cow::Borrowed(text),
            Body::Binary(bytes) => Cow::Owned(STANDARD.encode(bytes)),
        }
    }

    /// The bytes written to the wire for this body.
    pub fn binary_content(&self) -> &[u8] {
        match self {
            Body::Plain(text) | Body::Chunked(text) => text.as_bytes(),
            Body::Binary(bytes) => bytes,
        }
    }

    /// Byte length on the wire.
    #[inline]
    pub fn len(&self) -> usize {
        self.binary_content().len()
    }

    /// `false` only for an empty `Plain` body.
    pub fn has_content(&self) -> bool {
        match self {
            Body::Plain(text) => !text.is_empty(),
            Body::Binary(_) | Body::Chunked(_) => true,
        }
    }

    /// Chunked bodies cannot be framed with a `Content-Length`.
    #[inline]
    pub const fn is_complex(&self) -> bool {
        matches!(self, Body::Chunked(_))
    }

    /// Converts a chunked body into a plain body holding the framed text.
    pub fn into_plain(self) -> Self {
        match self {
            Body::Chunked(text) => Body::Plain(text),
            other => other,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Plain(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Plain(text)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Binary(bytes)
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content())
    }
}
