use crate::{
    errors::{Error, Result},
    http::{
        header::{Header, VALUE_CLOSE},
        response::Response,
        types::StatusCode,
    },
    limits::{ConnLimits, ServerLimits, WaitStrategy},
    resource::{ContextIdGenerator, Resources},
    server::connection::HttpConnection,
};
use crossbeam::queue::SegQueue;
use std::{io, net::SocketAddr, sync::Arc};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    task::yield_now,
    time::{sleep as tokio_sleep, timeout},
};
use tracing::debug;

/// Accepts connections and serves them with a fixed pool of worker tasks.
///
/// Accepted streams are queued; each worker takes one, serves it to the end
/// and takes the next. When the queue is full the stream goes to a separate
/// worker that answers `503 Service Unavailable` and closes it. See
/// [`ServerLimits`] for the sizes involved.
///
/// # Examples
/// ```no_run
/// use resource_http::{resource::{self, Resource}, Resources, Response, Server, StatusCode};
/// use std::sync::Arc;
/// use tokio::net::TcpListener;
///
/// #[tokio::main]
/// async fn main() -> resource_http::Result<()> {
///     let mut resources = Resources::new();
///     resources.add(
///         Resource::builder("health", || ())
///             .route(resource::get("/health").handle(|_: Arc<()>| async move {
///                 Ok(Response::of(StatusCode::NoContent))
///             }))
///             .build()?,
///     )?;
///
///     Server::builder()
///         .listener(TcpListener::bind("127.0.0.1:8080").await?)
///         .resources(resources)
///         .build()?
///         .launch()
///         .await;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    stream_queue: TcpQueue,
    error_queue: TcpQueue,
    server_limits: ServerLimits,
}

impl Server {
    #[inline]
    pub fn builder() -> ServerBuilder {
        ServerBuilder {
            listener: None,
            resources: None,
            server_limits: None,
            connection_limits: None,
        }
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    pub async fn launch(self) {
        loop {
            let value = match self.listener.accept().await {
                Ok(value) => value,
                Err(error) => {
                    debug!(%error, "accept failed");
                    continue;
                }
            };

            match self.stream_queue.len() < self.server_limits.max_pending_connections {
                true => self.stream_queue.push(value),
                false => self.error_queue.push(value),
            }
        }
    }

    #[inline]
    async fn get_stream(queue: &TcpQueue, wait: &WaitStrategy) -> (TcpStream, SocketAddr) {
        loop {
            if let Some(value) = queue.pop() {
                return value;
            }

            match wait {
                WaitStrategy::Yield => yield_now().await,
                WaitStrategy::Sleep(time) => tokio_sleep(*time).await,
            }
        }
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    listener: Option<TcpListener>,
    resources: Option<Resources>,
    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
}

impl ServerBuilder {
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// The dispatch table every connection answers from.
    #[inline(always)]
    pub fn resources(mut self, resources: Resources) -> Self {
        self.resources = Some(resources);
        self
    }

    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Spawns the worker tasks and returns the server, ready to
    /// [`launch`](Server::launch). Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] with [`io::ErrorKind::InvalidInput`] when
    /// [`listener`](Self::listener) or [`resources`](Self::resources) was not
    /// called.
    pub fn build(self) -> Result<Server> {
        let missing = |what: &str| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("The `{what}` method must be called to create a server"),
            ))
        };

        let listener = self.listener.ok_or_else(|| missing("listener"))?;
        let resources = Arc::new(self.resources.ok_or_else(|| missing("resources"))?);
        let server_limits = self.server_limits.unwrap_or_default();
        let conn_limits = self.connection_limits.unwrap_or_default();

        let stream_queue = Arc::new(SegQueue::new());
        let error_queue = Arc::new(SegQueue::new());
        let ids = Arc::new(ContextIdGenerator::new());

        for _ in 0..server_limits.max_connections.max(1) {
            Self::spawn_worker(&stream_queue, &server_limits, &conn_limits, &resources, &ids);
        }
        Self::spawn_alarmist(&error_queue, &server_limits, &conn_limits);

        debug!(
            workers = server_limits.max_connections.max(1),
            resources = resources.len(),
            "server built"
        );

        Ok(Server {
            listener,
            stream_queue,
            error_queue,
            server_limits,
        })
    }

    #[inline]
    fn spawn_worker(
        queue: &TcpQueue,
        server_limits: &ServerLimits,
        conn_limits: &ConnLimits,
        resources: &Arc<Resources>,
        ids: &Arc<ContextIdGenerator>,
    ) {
        let queue = queue.clone();
        let wait = server_limits.wait_strategy.clone();
        let mut conn = HttpConnection::new(resources.clone(), ids.clone(), conn_limits.clone());

        tokio::spawn(async move {
            loop {
                let (mut stream, addr) = Server::get_stream(&queue, &wait).await;
                debug!(%addr, "connection opened");

                match conn.run(&mut stream).await {
                    Ok(()) => debug!(%addr, "connection closed"),
                    Err(error) => debug!(%addr, %error, "connection failed"),
                }
            }
        });
    }

    #[inline]
    fn spawn_alarmist(queue: &TcpQueue, server_limits: &ServerLimits, conn_limits: &ConnLimits) {
        let queue = queue.clone();
        let wait = server_limits.wait_strategy.clone();
        let write_timeout = conn_limits.socket_write_timeout;
        let unavailable = Response::of(StatusCode::ServiceUnavailable)
            .and(Header::connection(VALUE_CLOSE))
            .into_bytes();

        tokio::spawn(async move {
            loop {
                let (mut stream, addr) = Server::get_stream(&queue, &wait).await;
                debug!(%addr, "queue full, refusing connection");

                let _ = timeout(write_timeout, stream.write_all(&unavailable)).await;
            }
        });
    }
}

type TcpQueue = Arc<SegQueue<(TcpStream, SocketAddr)>>;
