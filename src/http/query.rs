//! Query string parsing with percent-decoding.

use memchr::memchr;
use percent_encoding::percent_decode;
use std::borrow::Cow;

/// Decoded query parameters, grouped by name in first-seen order.
///
/// Parameters are separated by `&`; each is split on its first `=`. Names
/// and values are percent-decoded as UTF-8 independently, with `+` read as
/// a space. A parameter without `=` keeps its name with a `None` value, and
/// empty tokens produced by repeated `&` are skipped.
///
/// # Examples
/// ```rust
/// use resource_http::query::QueryParameters;
///
/// let query = QueryParameters::parse("one=1.1&three=three*&&flag&three=3.3&name=J%C3%BCrgen").unwrap();
///
/// assert_eq!(query.names().collect::<Vec<_>>(), ["one", "three", "flag", "name"]);
/// assert_eq!(query.values_of("three"), [Some("three*"), Some("3.3")]);
/// assert_eq!(query.values_of("flag"), [None]);
/// assert_eq!(query.value_of("name"), Some("Jürgen"));
/// assert!(query.values_of("missing").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    entries: Vec<(String, Vec<Option<String>>)>,
}

impl QueryParameters {
    /// Parses a raw query string (a leading `?` is ignored).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEncoding`] when a decoded name or value is not UTF-8.
    pub fn parse(query: &str) -> Result<Self, Error> {
        let data = query.strip_prefix('?').unwrap_or(query).as_bytes();
        let mut result = QueryParameters::default();

        let mut start = 0;
        while start < data.len() {
            // Find next '&' or end of string
            let end = memchr(b'&', &data[start..])
                .map(|pos| start + pos)
                .unwrap_or(data.len());

            if end > start {
                let token = &data[start..end];

                let (name, value) = match memchr(b'=', token) {
                    Some(index) => (&token[..index], Some(&token[index + 1..])),
                    None => (token, None),
                };

                result.add(decode(name)?, value.map(decode).transpose()?);
            }

            start = end + 1;
        }

        Ok(result)
    }

    fn add(&mut self, name: String, value: Option<String>) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Parameter names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// All values of `name` in order; empty when the name is absent.
    pub fn values_of(&self, name: &str) -> Vec<Option<&str>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.iter().map(Option::as_deref).collect())
            .unwrap_or_default()
    }

    /// The first value of `name`, if it has one.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, values)| values.first())
            .and_then(Option::as_deref)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// `+` stands for a space, as in form encoding
#[inline]
fn decode(raw: &[u8]) -> Result<String, Error> {
    let raw: Cow<'_, [u8]> = match memchr(b'+', raw) {
        Some(_) => raw.iter().map(|&b| if b == b'+' { b' ' } else { b }).collect(),
        None => Cow::Borrowed(raw),
    };

    percent_decode(&raw)
        .decode_utf8()
        .map(|text| text.into_owned())
        .map_err(|_| Error::InvalidEncoding(String::from_utf8_lossy(&raw).into_owned()))
}

/// Errors raised while parsing a query string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A name or value does not decode to UTF-8.
    ///
    /// # Fields
    /// - `0`: The raw, still-encoded text
    #[error("Query parameter is not valid UTF-8 once decoded: {0}")]
    InvalidEncoding(String),
}
