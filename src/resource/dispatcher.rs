//! Named groups of routes sharing a pool of handler instances

use crate::{
    errors::{Error, Result},
    http::{request::Request, response::Response, types::Method},
    limits::ResourceLimits,
    resource::{
        action::{Action, MappedParameters, PathMatch, PathTemplate},
        handler::{BoxFuture, ErrorHandler, Execute, Route},
    },
};
use std::{
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// A resource as seen by [`Resources`](crate::resource::Resources).
///
/// Implemented by [`Resource`] and [`DynamicResource`].
pub trait Dispatcher: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Starts the first action matching `request`, or returns `None`.
    fn dispatch<'a>(&'a self, request: &'a Request) -> Option<Dispatch<'a>>;
}

/// A started action: its pending outcome and the error handler that applies.
pub struct Dispatch<'a> {
    pub(crate) action: String,
    pub(crate) outcome: BoxFuture<'a, Result<Response>>,
    pub(crate) error_handler: Option<&'a dyn ErrorHandler>,
}

impl Dispatch<'_> {
    /// The matched action, e.g. `GET /users/{userId}`.
    #[inline]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Debug for Dispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("action", &self.action)
            .field("error_handler", &self.error_handler.is_some())
            .finish_non_exhaustive()
    }
}

// Fixed set of instances handed out round-robin
struct HandlerPool<H> {
    instances: Vec<Arc<H>>,
    next: AtomicUsize,
}

impl<H> HandlerPool<H> {
    fn new(size: usize, factory: impl Fn() -> H) -> Self {
        HandlerPool {
            instances: (0..size.max(1)).map(|_| Arc::new(factory())).collect(),
            next: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn next(&self) -> Arc<H> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.instances.len();
        Arc::clone(&self.instances[index])
    }

    #[inline]
    fn len(&self) -> usize {
        self.instances.len()
    }
}

// SECTION: typed resource

struct CompiledRoute<H> {
    method: Method,
    template: PathTemplate,
    execute: Box<Execute<H>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

/// Routes registered with typed parameter resolvers.
///
/// Built by [`Resource::builder`]; see [`get`](crate::resource::get) for
/// how routes are declared.
pub struct Resource<H> {
    name: String,
    pool: HandlerPool<H>,
    routes: Vec<CompiledRoute<H>>,
    disallow_path_parameters_with_slash: bool,
}

impl<H: Send + Sync + 'static> Resource<H> {
    /// Starts a resource whose handler instances are made by `factory`.
    pub fn builder(name: impl Into<String>, factory: impl Fn() -> H + 'static) -> ResourceBuilder<H> {
        ResourceBuilder {
            name: name.into(),
            factory: Box::new(factory),
            limits: ResourceLimits::default(),
            disallow_path_parameters_with_slash: true,
            routes: Vec::new(),
        }
    }

    #[inline]
    pub fn handler_pool_size(&self) -> usize {
        self.pool.len()
    }

    #[inline]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

impl<H: Send + Sync + 'static> Dispatcher for Resource<H> {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    fn dispatch<'a>(&'a self, request: &'a Request) -> Option<Dispatch<'a>> {
        self.routes
            .iter()
            .filter(|compiled| compiled.method == request.method())
            .find_map(|compiled| {
                match compiled
                    .template
                    .match_path(request.path(), self.disallow_path_parameters_with_slash)
                {
                    PathMatch::Matched(parameters) => Some((compiled, parameters)),
                    PathMatch::Rejected | PathMatch::Unmatched => None,
                }
            })
            .map(|(compiled, parameters)| Dispatch {
                action: format!("{} {}", compiled.method, compiled.template),
                outcome: (compiled.execute)(self.pool.next(), request, &parameters),
                error_handler: compiled.error_handler.as_deref(),
            })
    }
}

impl<H> fmt::Debug for Resource<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("handler_pool_size", &self.pool.len())
            .field(
                "routes",
                &self
                    .routes
                    .iter()
                    .map(|r| format!("{} {}", r.method, r.template))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Builder returned by [`Resource::builder`].
pub struct ResourceBuilder<H> {
    name: String,
    factory: Box<dyn Fn() -> H>,
    limits: ResourceLimits,
    disallow_path_parameters_with_slash: bool,
    routes: Vec<Route<H>>,
}

impl<H: Send + Sync + 'static> ResourceBuilder<H> {
    pub fn route(mut self, route: Route<H>) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = Route<H>>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Number of handler instances (default: [`ResourceLimits::handler_pool_size`]).
    pub fn handler_pool_size(mut self, size: usize) -> Self {
        self.limits.handler_pool_size = size;
        self
    }

    pub fn limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether inner path parameters may contain `/` (forbidden by default).
    pub fn disallow_path_parameters_with_slash(mut self, disallow: bool) -> Self {
        self.disallow_path_parameters_with_slash = disallow;
        self
    }

    /// # Errors
    ///
    /// [`Error::InvalidAction`] for an empty name, a route whose template
    /// did not compile, or a route reading more path parameters than its
    /// template declares.
    pub fn build(self) -> Result<Resource<H>> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_action("Resource name is empty"));
        }

        let routes = self
            .routes
            .into_iter()
            .map(|route| {
                let Route {
                    method,
                    template,
                    path_parameters,
                    execute,
                    error_handler,
                } = route;

                let template = template?;
                if path_parameters > template.parameter_count() {
                    return Err(Error::invalid_action(format!(
                        "{method} {template} declares {} path parameters, the route reads {path_parameters}",
                        template.parameter_count()
                    )));
                }

                Ok(CompiledRoute {
                    method,
                    template,
                    execute,
                    error_handler,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Resource {
            pool: HandlerPool::new(self.limits.handler_pool_size, &self.factory),
            name: self.name,
            routes,
            disallow_path_parameters_with_slash: self.disallow_path_parameters_with_slash,
        })
    }
}

// SECTION: signature resource

/// Handles actions declared by signature strings.
///
/// The handler receives the converted parameters and picks the method by
/// [`MappedParameters::method_name`](MappedParameters); a name it does not
/// know should be answered with [`MappedParameters::handler_missing`].
pub trait DynamicHandler: Send + Sync + 'static {
    fn handle(
        &self,
        request: &Request,
        parameters: MappedParameters,
    ) -> impl Future<Output = Result<Response>> + Send;
}

/// Actions registered as `(id, method, template, signature)`.
///
/// # Examples
/// ```
/// use resource_http::{
///     resource::{Action, DynamicHandler, DynamicResource, MappedParameters},
///     Body, Request, Response, Result, StatusCode,
/// };
///
/// struct Users;
///
/// impl DynamicHandler for Users {
///     async fn handle(&self, _: &Request, parameters: MappedParameters) -> Result<Response> {
///         match parameters.method_name.as_str() {
///             "queryUser" => {
///                 let id = parameters.string_of("userId")?;
///                 Ok(Response::of(StatusCode::Ok).and(Body::from(id.to_string())))
///             }
///             _ => Err(parameters.handler_missing()),
///         }
///     }
/// }
///
/// let resource = DynamicResource::new("users", 4, || Users, vec![
///     Action::new(0, "GET", "/users/{userId}", "queryUser(String userId)")?,
///     Action::new(1, "GET", "/users", "queryUsers()")?,
/// ])?;
/// assert_eq!(resource.actions().len(), 2);
///
/// // ids must run 0, 1, 2, ...
/// assert!(DynamicResource::new("users", 4, || Users, vec![
///     Action::new(1, "GET", "/users", "queryUsers()")?,
/// ]).is_err());
/// # Ok::<(), resource_http::Error>(())
/// ```
pub struct DynamicResource<H> {
    name: String,
    pool: HandlerPool<H>,
    actions: Vec<Action>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl<H: DynamicHandler> DynamicResource<H> {
    /// # Errors
    ///
    /// [`Error::InvalidAction`] for an empty name or when action ids are not
    /// `0, 1, 2, ...` in order.
    pub fn new(
        name: impl Into<String>,
        handler_pool_size: usize,
        factory: impl Fn() -> H,
        actions: Vec<Action>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_action("Resource name is empty"));
        }

        if let Some((expected, action)) = actions
            .iter()
            .enumerate()
            .find(|(expected, action)| action.id() != *expected)
        {
            return Err(Error::invalid_action(format!(
                "Action id {} of {name} is out of order, expected {expected}",
                action.id()
            )));
        }

        Ok(DynamicResource {
            pool: HandlerPool::new(handler_pool_size, factory),
            name,
            actions,
            error_handler: None,
        })
    }

    /// Applies the slash policy to every action.
    pub fn disallow_path_parameters_with_slash(mut self, disallow: bool) -> Self {
        self.actions = self
            .actions
            .into_iter()
            .map(|action| action.disallow_path_parameters_with_slash(disallow))
            .collect();
        self
    }

    pub fn on_error(mut self, handler: impl ErrorHandler) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    #[inline]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[inline]
    pub fn handler_pool_size(&self) -> usize {
        self.pool.len()
    }
}

impl<H: DynamicHandler> Dispatcher for DynamicResource<H> {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    fn dispatch<'a>(&'a self, request: &'a Request) -> Option<Dispatch<'a>> {
        self.actions.iter().find_map(|action| {
            let results = action.match_with(request.method(), request.uri());
            if !results.is_matched() {
                return None;
            }

            let mapped = action.map(request, results.parameters());
            let instance = self.pool.next();

            Some(Dispatch {
                action: action.to_string(),
                outcome: Box::pin(async move { instance.handle(request, mapped?).await }),
                error_handler: self.error_handler.as_deref(),
            })
        })
    }
}

impl<H> fmt::Debug for DynamicResource<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicResource")
            .field("name", &self.name)
            .field("handler_pool_size", &self.pool.len())
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}
