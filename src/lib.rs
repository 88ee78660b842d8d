//! resource_http - incremental HTTP/1.1 parsing with resource-action routing
//!
//! The crate has three layers, usable on their own:
//!
//! - **Messages**: [`Request`] and [`Response`] with fluent builders, ordered
//!   upserting [`Headers`], and [`Body`] variants for text, bytes and
//!   pre-framed chunked content.
//! - **Parsers**: [`RequestParser`] and [`ResponseParser`] accept a byte stream
//!   cut at arbitrary points, suspend when data runs out and resume on the
//!   next read. Completed messages queue up in arrival order.
//! - **Dispatch**: [`Resources`] matches requests against path templates such
//!   as `/users/{userId}` and runs the bound handler with typed parameters.
//!
//! A thin Tokio [`Server`] ties the three together.
//!
//! # Examples
//!
//! Parsing a request that arrives in two reads:
//! ```
//! use resource_http::{Method, RequestParser};
//!
//! let mut parser = RequestParser::new();
//! parser.parse_next(b"POST /users HTTP/1.1\nHost: example.com\nContent-Le")?;
//! assert!(!parser.has_full_request());
//! assert!(parser.is_missing_content());
//!
//! parser.parse_next(b"ngth: 19\n\n{ text:\"some text\"}")?;
//! let request = parser.full_request()?;
//!
//! assert_eq!(request.method(), Method::Post);
//! assert_eq!(request.path(), "/users");
//! assert_eq!(request.headers().len(), 2);
//! assert_eq!(request.body().content(), "{ text:\"some text\"}");
//! # Ok::<(), resource_http::Error>(())
//! ```
//!
//! Serving a resource:
//! ```no_run
//! use resource_http::{resource::{self, Resource}, Body, Resources, Response, Server, StatusCode};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! struct Users;
//!
//! #[tokio::main]
//! async fn main() -> resource_http::Result<()> {
//!     let users = Resource::builder("users", || Users)
//!         .route(
//!             resource::get("/users/{userId}")
//!                 .param::<String>()
//!                 .query_or("verbose", false)
//!                 .handle(|_: Arc<Users>, id, verbose| async move {
//!                     let text = if verbose { format!("user {id}, all of it") } else { id };
//!                     Ok(Response::of(StatusCode::Ok).and(Body::from(text)))
//!                 }),
//!         )
//!         .build()?;
//!
//!     let mut resources = Resources::new();
//!     resources.add(users)?;
//!
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await?)
//!         .resources(resources)
//!         .build()?
//!         .launch()
//!         .await;
//!     Ok(())
//! }
//! ```

pub(crate) mod http {
    pub mod body;
    pub mod header;
    pub mod parser;
    pub mod query;
    pub mod request;
    pub mod response;
    pub mod types;
}

/// Route matching and dispatch.
pub mod resource {
    pub(crate) mod action;
    pub(crate) mod dispatcher;
    pub(crate) mod handler;
    pub(crate) mod parameter;
    pub(crate) mod resources;

    pub use self::{
        action::{
            Action, MappedParameter, MappedParameters, MatchResults, MethodParameter,
            ParameterValue, PathMatch, PathTemplate, RawPathParameter, ToSpec,
        },
        dispatcher::{Dispatch, Dispatcher, DynamicHandler, DynamicResource, Resource, ResourceBuilder},
        handler::{
            delete, get, handle_all_with, head, options, patch, post, put, route, DefaultErrorHandler,
            ErrorHandler, RequestHandler0, RequestHandler1, RequestHandler2, RequestHandler3,
            RequestHandler4, Route,
        },
        parameter::{BodyMapper, ParameterKind, ParameterResolver},
        resources::{Completes, Context, ContextIdGenerator, Resources},
    };
}

pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::{Error, Result},
    http::{
        body::{Body, Encoding},
        header::{names, Header, Headers, RequestHeaders, ResponseHeaders},
        parser::{request::RequestParser, response::ResponseParser},
        query,
        request::{Request, RequestPart, Uri},
        response::{Response, ResponsePart},
        types::{Method, StatusCode, Version},
    },
    resource::Resources,
    server::server_impl::{Server, ServerBuilder},
};
