//! Typed handler parameters
//!
//! A [`ParameterResolver`] pulls one argument out of a matched request. Route
//! builders compose them at registration time, so a handler receives values
//! that are already converted to the types it declares.

use crate::{
    errors::{Error, Result},
    http::{body::Body, header::Header, request::Request},
    resource::action::RawPathParameter,
};
use std::{fmt, str::FromStr, sync::Arc};

/// Where a resolver takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// The n-th path parameter of the template.
    Path(usize),
    Query(String),
    Header(String),
    Body,
    Request,
}

type Resolve<T> = dyn Fn(&Request, &[RawPathParameter]) -> Result<T> + Send + Sync;

/// Resolves one typed handler argument.
///
/// # Examples
/// ```
/// use resource_http::{resource::{ParameterResolver, RawPathParameter}, Method, Request};
///
/// let request = Request::has(Method::Get).and(resource_http::Uri::from("/users/7?limit=20"));
/// let parameters = [RawPathParameter::new("id", "7")];
///
/// let id = ParameterResolver::<u64>::path(0);
/// let limit = ParameterResolver::<usize>::query_or("limit", 10);
/// let page = ParameterResolver::<usize>::query("page");
///
/// assert_eq!(id.apply(&request, &parameters)?, 7);
/// assert_eq!(limit.apply(&request, &parameters)?, 20);
/// assert_eq!(page.apply(&request, &parameters)?, None);
/// # Ok::<(), resource_http::Error>(())
/// ```
pub struct ParameterResolver<T> {
    kind: ParameterKind,
    resolve: Arc<Resolve<T>>,
}

impl<T> ParameterResolver<T> {
    fn of(
        kind: ParameterKind,
        resolve: impl Fn(&Request, &[RawPathParameter]) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        ParameterResolver {
            kind,
            resolve: Arc::new(resolve),
        }
    }

    #[inline]
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    #[inline]
    pub fn apply(&self, request: &Request, parameters: &[RawPathParameter]) -> Result<T> {
        (self.resolve)(request, parameters)
    }
}

impl<T: FromStr + 'static> ParameterResolver<T> {
    /// The path parameter at `position`, parsed as `T`.
    ///
    /// A value that does not parse is a [`Error::BadRequest`].
    pub fn path(position: usize) -> Self {
        Self::of(ParameterKind::Path(position), move |_, parameters| {
            let raw = parameters.get(position).ok_or_else(|| {
                Error::HandlerFailure(format!("No path parameter at position {position}"))
            })?;
            parse(&raw.name, &raw.value)
        })
    }

    /// The first value of query parameter `name`, or `default` when it is
    /// absent or has no value.
    pub fn query_or(name: &str, default: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        let name = name.to_string();
        Self::of(ParameterKind::Query(name.clone()), move |request, _| {
            match request.query_parameters()?.value_of(&name) {
                Some(raw) => parse(&name, raw),
                None => Ok(default.clone()),
            }
        })
    }

    /// The first value of query parameter `name`, if any.
    pub fn query(name: &str) -> ParameterResolver<Option<T>> {
        let name = name.to_string();
        ParameterResolver::of(ParameterKind::Query(name.clone()), move |request, _| {
            request
                .query_parameters()?
                .value_of(&name)
                .map(|raw| parse(&name, raw))
                .transpose()
        })
    }
}

impl ParameterResolver<Option<Header>> {
    pub fn header(name: &str) -> Self {
        let name = name.to_string();
        Self::of(ParameterKind::Header(name.clone()), move |request, _| {
            Ok(request.header_of(&name).cloned())
        })
    }
}

impl ParameterResolver<Body> {
    /// The request body as received.
    pub fn body() -> Self {
        Self::of(ParameterKind::Body, |request, _| Ok(request.body().clone()))
    }
}

impl ParameterResolver<Request> {
    /// The whole request.
    pub fn request() -> Self {
        Self::of(ParameterKind::Request, |request, _| Ok(request.clone()))
    }
}

impl<T: 'static> ParameterResolver<T> {
    /// The request body converted by `mapper`.
    pub fn body_with(mapper: impl BodyMapper<T>) -> Self {
        Self::of(ParameterKind::Body, move |request, _| mapper.from_body(request.body()))
    }
}

impl<T> Clone for ParameterResolver<T> {
    fn clone(&self) -> Self {
        ParameterResolver {
            kind: self.kind.clone(),
            resolve: Arc::clone(&self.resolve),
        }
    }
}

impl<T> fmt::Debug for ParameterResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterResolver")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::bad_request(format!("Parameter {name} has the wrong type: {raw}")))
}

/// Converts a wire body into a handler argument.
///
/// Any `Fn(&Body) -> Result<T>` is a mapper.
pub trait BodyMapper<T>: Send + Sync + 'static {
    fn from_body(&self, body: &Body) -> Result<T>;
}

impl<T, F> BodyMapper<T> for F
where
    F: Fn(&Body) -> Result<T> + Send + Sync + 'static,
{
    #[inline]
    fn from_body(&self, body: &Body) -> Result<T> {
        self(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{request::Uri, types::Method};

    fn request(uri: &str) -> Request {
        Request::has(Method::Post)
            .and(Uri::from(uri))
            .and(Header::correlation_id("c-1"))
            .and(Body::from("Ada Lovelace"))
    }

    #[test]
    fn path() {
        let parameters = [RawPathParameter::new("userId", "42"), RawPathParameter::new("name", "ada")];
        let request = request("/users/42/ada");

        assert_eq!(ParameterResolver::<u32>::path(0).apply(&request, &parameters).unwrap(), 42);
        assert_eq!(
            ParameterResolver::<String>::path(1).apply(&request, &parameters).unwrap(),
            "ada"
        );
        assert!(matches!(
            ParameterResolver::<u32>::path(1).apply(&request, &parameters),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            ParameterResolver::<u32>::path(2).apply(&request, &parameters),
            Err(Error::HandlerFailure(_))
        ));
    }

    #[test]
    fn query() {
        #[rustfmt::skip]
        let cases = [
            ("/users?page=3",        Some(3), 3),
            ("/users?page=3&page=4", Some(3), 3),
            ("/users?page",          None,    1),
            ("/users",               None,    1),
        ];

        for (uri, expected, or) in cases {
            let request = request(uri);
            assert_eq!(ParameterResolver::<u8>::query("page").apply(&request, &[]).unwrap(), expected, "{uri}");
            assert_eq!(ParameterResolver::query_or("page", 1u8).apply(&request, &[]).unwrap(), or, "{uri}");
        }

        assert!(matches!(
            ParameterResolver::<u8>::query("page").apply(&request("/users?page=x"), &[]),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn header_body_request() {
        let request = request("/users");

        let header = ParameterResolver::header("x-correlation-id").apply(&request, &[]).unwrap();
        assert_eq!(header.map(|h| h.value), Some("c-1".to_string()));
        assert_eq!(ParameterResolver::header("Accept").apply(&request, &[]).unwrap(), None);

        assert_eq!(ParameterResolver::body().apply(&request, &[]).unwrap(), Body::from("Ada Lovelace"));
        assert_eq!(ParameterResolver::request().apply(&request, &[]).unwrap(), request);
    }

    #[test]
    fn body_with_mapper() {
        let words = ParameterResolver::body_with(|body: &Body| {
            Ok(body.content().split(' ').map(str::to_string).collect::<Vec<_>>())
        });
        let failing = ParameterResolver::<()>::body_with(|_: &Body| {
            Err(Error::UnsupportedEncoding("xml".into()))
        });

        assert_eq!(words.kind(), &ParameterKind::Body);
        assert_eq!(words.apply(&request("/"), &[]).unwrap(), ["Ada", "Lovelace"]);
        assert!(matches!(failing.apply(&request("/"), &[]), Err(Error::UnsupportedEncoding(_))));
    }
}
