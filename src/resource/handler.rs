//! Typed route registration
//!
//! A route starts from a method and a path template ([`get`], [`post`], ...),
//! gains up to four typed parameters and is closed by [`handle`] with an async
//! function that receives a pooled handler instance plus those parameters:
//!
//! ```
//! use resource_http::{resource::{self, Dispatcher, Resource}, Body, Response, StatusCode};
//! use std::sync::Arc;
//!
//! struct Users;
//!
//! let resource = Resource::builder("users", || Users)
//!     .route(
//!         resource::get("/users/{userId}")
//!             .param::<u64>()
//!             .handle(|_: Arc<Users>, id| async move {
//!                 Ok(Response::of(StatusCode::Ok).and(Body::from(format!("user {id}"))))
//!             }),
//!     )
//!     .build()?;
//!
//! assert_eq!(resource.name(), "users");
//! # Ok::<(), resource_http::Error>(())
//! ```
//!
//! [`handle`]: RequestHandler0::handle

use crate::{
    errors::{Error, Result},
    http::{
        body::Body,
        header::Header,
        request::Request,
        response::Response,
        types::{Method, StatusCode},
    },
    resource::{
        action::{PathTemplate, RawPathParameter},
        parameter::{BodyMapper, ParameterKind, ParameterResolver},
    },
};
use std::{fmt, future::Future, pin::Pin, str::FromStr, sync::Arc};

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// SECTION: error handlers

/// Turns a failed handler invocation into a response.
///
/// Any `Fn(&Error) -> Result<Response>` is an error handler. When the error
/// handler itself fails, dispatch answers `500 Internal Server Error`.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, error: &Error) -> Result<Response>;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Error) -> Result<Response> + Send + Sync + 'static,
{
    #[inline]
    fn handle(&self, error: &Error) -> Result<Response> {
        self(error)
    }
}

/// Answers with [`Error::status`]: a bad parameter is `400`, an unsupported
/// encoding `415`, a handler failure `500`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, error: &Error) -> Result<Response> {
        Ok(Response::of(error.status()))
    }
}

/// An error handler that answers every failure with `status`.
pub fn handle_all_with(status: StatusCode) -> impl ErrorHandler {
    move |_: &Error| -> Result<Response> { Ok(Response::of(status)) }
}

// SECTION: routes

pub(crate) type Execute<H> =
    dyn Fn(Arc<H>, &Request, &[RawPathParameter]) -> BoxFuture<'static, Result<Response>> + Send + Sync;

/// A finished route for a resource whose pooled handler type is `H`.
pub struct Route<H> {
    pub(crate) method: Method,
    pub(crate) template: Result<PathTemplate>,
    /// Path positions the resolvers read, checked against the template.
    pub(crate) path_parameters: usize,
    pub(crate) execute: Box<Execute<H>>,
    pub(crate) error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template.as_ref().map(PathTemplate::as_str).ok())
            .field("error_handler", &self.error_handler.is_some())
            .finish_non_exhaustive()
    }
}

/// Starts a route for `method` on the path template `uri`.
///
/// A malformed template is reported when the resource is built.
pub fn route(method: Method, uri: &str) -> RequestHandler0 {
    RequestHandler0 {
        method,
        template: PathTemplate::compile(uri),
        paths: 0,
        error_handler: None,
    }
}

macro_rules! method_routes {
    ($($name:ident => $method:ident),+ $(,)?) => {$(
        #[doc = concat!("Starts a `", stringify!($method), "` route, see [`route`].")]
        #[inline]
        pub fn $name(uri: &str) -> RequestHandler0 {
            route(Method::$method, uri)
        }
    )+};
}

method_routes! {
    get => Get,
    post => Post,
    put => Put,
    patch => Patch,
    delete => Delete,
    head => Head,
    options => Options,
}

// Builder of arity N: its resolvers, `on_error` and `handle`.
macro_rules! request_handler {
    ($(#[$docs:meta])* $name:ident [$($resolver:ident: $ty:ident),*]) => {
        $(#[$docs])*
        pub struct $name<$($ty),*> {
            method: Method,
            template: Result<PathTemplate>,
            paths: usize,
            $($resolver: ParameterResolver<$ty>,)*
            error_handler: Option<Arc<dyn ErrorHandler>>,
        }

        impl<$($ty: Send + 'static),*> $name<$($ty),*> {
            /// Sets the error handler used when a parameter does not resolve
            /// or the handler fails.
            pub fn on_error(mut self, handler: impl ErrorHandler) -> Self {
                self.error_handler = Some(Arc::new(handler));
                self
            }

            /// Closes the route with `handler`, which receives the pooled
            /// handler instance followed by the resolved parameters.
            pub fn handle<H, F, Fut>(self, handler: F) -> Route<H>
            where
                H: Send + Sync + 'static,
                F: Fn(Arc<H>, $($ty),*) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = Result<Response>> + Send + 'static,
            {
                let $name { method, template, paths, $($resolver,)* error_handler } = self;

                Route {
                    method,
                    template,
                    path_parameters: paths,
                    error_handler,
                    execute: Box::new(move |instance: Arc<H>, request: &Request, parameters: &[RawPathParameter]|
                        -> BoxFuture<'static, Result<Response>>
                    {
                        let _ = (request, parameters);
                        $(
                            let $resolver = match $resolver.apply(request, parameters) {
                                Ok(value) => value,
                                Err(error) => return Box::pin(async move { Err(error) }),
                            };
                        )*
                        Box::pin(handler(instance, $($resolver),*))
                    }),
                }
            }
        }

        impl<$($ty),*> fmt::Debug for $name<$($ty),*> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("method", &self.method)
                    .field("template", &self.template.as_ref().map(PathTemplate::as_str).ok())
                    $(.field(stringify!($resolver), &self.$resolver))*
                    .finish_non_exhaustive()
            }
        }
    };
}

// Builder of arity N gaining one more resolver.
macro_rules! extend_request_handler {
    ($name:ident [$($resolver:ident: $ty:ident),*] => $next:ident [$added:ident: $added_ty:ident]) => {
        impl<$($ty: Send + 'static),*> $name<$($ty),*> {
            /// Adds a parameter resolved by the given resolver.
            pub fn with<$added_ty: Send + 'static>(
                self,
                $added: ParameterResolver<$added_ty>,
            ) -> $next<$($ty,)* $added_ty> {
                let paths = match $added.kind() {
                    ParameterKind::Path(position) => self.paths.max(position + 1),
                    _ => self.paths,
                };

                $next {
                    method: self.method,
                    template: self.template,
                    paths,
                    $($resolver: self.$resolver,)*
                    $added,
                    error_handler: self.error_handler,
                }
            }

            /// Adds the next path parameter, in template order.
            pub fn param<$added_ty: FromStr + Send + 'static>(self) -> $next<$($ty,)* $added_ty> {
                let position = self.paths;
                self.with(ParameterResolver::path(position))
            }

            pub fn query<$added_ty: FromStr + Send + 'static>(
                self,
                name: &str,
            ) -> $next<$($ty,)* Option<$added_ty>> {
                self.with(ParameterResolver::<$added_ty>::query(name))
            }

            pub fn query_or<$added_ty: FromStr + Clone + Send + Sync + 'static>(
                self,
                name: &str,
                default: $added_ty,
            ) -> $next<$($ty,)* $added_ty> {
                self.with(ParameterResolver::query_or(name, default))
            }

            pub fn header(self, name: &str) -> $next<$($ty,)* Option<Header>> {
                self.with(ParameterResolver::header(name))
            }

            pub fn body(self) -> $next<$($ty,)* Body> {
                self.with(ParameterResolver::body())
            }

            pub fn body_with<$added_ty: Send + 'static>(
                self,
                mapper: impl BodyMapper<$added_ty>,
            ) -> $next<$($ty,)* $added_ty> {
                self.with(ParameterResolver::body_with(mapper))
            }

            pub fn request(self) -> $next<$($ty,)* Request> {
                self.with(ParameterResolver::request())
            }
        }
    };
}

request_handler!(
    /// A route without parameters.
    RequestHandler0 []
);
request_handler!(RequestHandler1 [r1: T1]);
request_handler!(RequestHandler2 [r1: T1, r2: T2]);
request_handler!(RequestHandler3 [r1: T1, r2: T2, r3: T3]);
request_handler!(
    /// A route with the maximum of four parameters.
    RequestHandler4 [r1: T1, r2: T2, r3: T3, r4: T4]
);

extend_request_handler!(RequestHandler0 [] => RequestHandler1 [r1: T1]);
extend_request_handler!(RequestHandler1 [r1: T1] => RequestHandler2 [r2: T2]);
extend_request_handler!(RequestHandler2 [r1: T1, r2: T2] => RequestHandler3 [r3: T3]);
extend_request_handler!(RequestHandler3 [r1: T1, r2: T2, r3: T3] => RequestHandler4 [r4: T4]);
