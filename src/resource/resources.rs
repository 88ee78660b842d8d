//! The dispatch table and the per-request context

use crate::{
    errors::{Error, Result},
    http::{request::Request, response::Response, types::StatusCode},
    resource::{
        dispatcher::{Dispatch, Dispatcher},
        handler::ErrorHandler,
    },
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{sync::oneshot, task::JoinError};
use tracing::{debug, error, warn};

/// Every registered resource, matched in registration order.
///
/// Registration happens before serving starts; afterwards the table is only
/// read, so it is shared between connections without locking.
///
/// # Examples
/// ```
/// use resource_http::{
///     resource::{self, Completes, Context, Resource, Resources},
///     Method, Request, Response, StatusCode, Uri,
/// };
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> resource_http::Result<()> {
/// let mut resources = Resources::new();
/// resources.add(
///     Resource::builder("health", || ())
///         .route(resource::get("/health").handle(|_: Arc<()>| async move {
///             Ok(Response::of(StatusCode::NoContent))
///         }))
///         .build()?,
/// )?;
///
/// let resources = Arc::new(resources);
/// let (completes, response) = Completes::channel();
/// let request = Request::has(Method::Get).and(Uri::from("/health"));
/// resources.dispatch_for(Context::new(1, request, completes)).await;
///
/// assert_eq!(response.await.unwrap().status(), StatusCode::NoContent);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Resources {
    resources: Vec<Box<dyn Dispatcher>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// [`Error::InvalidAction`] when a resource with the same name exists.
    pub fn add(&mut self, resource: impl Dispatcher) -> Result<&mut Self> {
        if self.named(resource.name()).is_some() {
            return Err(Error::invalid_action(format!(
                "Resource {} is already registered",
                resource.name()
            )));
        }

        self.resources.push(Box::new(resource));
        Ok(self)
    }

    pub fn named(&self, name: &str) -> Option<&dyn Dispatcher> {
        self.resources
            .iter()
            .find(|resource| resource.name() == name)
            .map(|resource| resource.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|resource| resource.name())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Answers the context's request and completes it, exactly once.
    ///
    /// The action runs on its own task: a handler or error handler that
    /// panics is answered `500 Internal Server Error` and the caller keeps
    /// running.
    pub async fn dispatch_for(self: Arc<Self>, context: Context) {
        let Context {
            id,
            request,
            completes,
        } = context;

        let task = tokio::spawn(async move { self.dispatch_matching(&request).await });
        let response = match task.await {
            Ok(response) => response,
            Err(failure) => unwound(id, &failure),
        };
        debug!(context = id, status = response.status().code(), "dispatched");

        completes.with(response);
    }

    /// Runs the first action matching `request` across all resources.
    ///
    /// No match answers `404 Not Found`. A failed action goes to its error
    /// handler; without one, or when that fails too, the answer is
    /// `500 Internal Server Error`.
    pub async fn dispatch_matching(&self, request: &Request) -> Response {
        let Some((resource, dispatch)) = self
            .resources
            .iter()
            .find_map(|resource| Some((resource.name(), resource.dispatch(request)?)))
        else {
            warn!(method = %request.method(), uri = %request.uri(), "no matching action");
            return Response::of(StatusCode::NotFound);
        };

        let Dispatch {
            action,
            outcome,
            error_handler,
        } = dispatch;

        match outcome.await {
            Ok(response) => response,
            Err(failure) => recover(resource, &action, error_handler, &failure),
        }
    }
}

fn recover(resource: &str, action: &str, handler: Option<&dyn ErrorHandler>, failure: &Error) -> Response {
    let Some(handler) = handler else {
        error!(resource, action, error = %failure, "action failed");
        return Response::of(StatusCode::InternalServerError);
    };

    debug!(resource, action, error = %failure, "action failed, handing to error handler");
    handler.handle(failure).unwrap_or_else(|handler_failure| {
        error!(resource, action, error = %handler_failure, "error handler failed");
        Response::of(StatusCode::InternalServerError)
    })
}

fn unwound(context: u64, failure: &JoinError) -> Response {
    match failure.is_panic() {
        true => error!(context, "action panicked"),
        false => error!(context, error = %failure, "action task cancelled"),
    }
    Response::of(StatusCode::InternalServerError)
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// SECTION: context

/// One parsed request on its way through dispatch.
#[derive(Debug)]
pub struct Context {
    id: u64,
    request: Request,
    completes: Completes,
}

impl Context {
    pub fn new(id: u64, request: Request, completes: Completes) -> Self {
        Context {
            id,
            request,
            completes,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn request(&self) -> &Request {
        &self.request
    }
}

/// The sink that receives a context's single response.
#[derive(Debug)]
pub struct Completes {
    sender: oneshot::Sender<Response>,
}

impl Completes {
    /// A sink and the receiver its response arrives on.
    pub fn channel() -> (Completes, oneshot::Receiver<Response>) {
        let (sender, receiver) = oneshot::channel();
        (Completes { sender }, receiver)
    }

    /// Delivers `response`. A receiver that is gone is not an error.
    pub fn with(self, response: Response) {
        if self.sender.send(response).is_err() {
            debug!("response receiver dropped before completion");
        }
    }
}

/// Hands out context ids; one generator per server.
#[derive(Debug, Default)]
pub struct ContextIdGenerator {
    next: AtomicU64,
}

impl ContextIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids start at `1`.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}
