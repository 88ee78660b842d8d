//! Server, connection and resource configuration
//!
//! Every struct here is plain data with public fields and a [`Default`], so a
//! configuration overrides only what it needs:
//!
//! ```no_run
//! use resource_http::{limits::{ConnLimits, ServerLimits}, Resources, Server};
//! use tokio::net::TcpListener;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> resource_http::Result<()> {
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await?)
//!         .resources(Resources::new())
//!         .server_limits(ServerLimits {
//!             max_connections: 500,
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             missing_content_timeout: Duration::from_millis(500),
//!             ..ConnLimits::default()
//!         })
//!         .build()?
//!         .launch()
//!         .await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

/// Concurrency and admission control of a [`Server`](crate::Server).
///
/// ```text
///  [ accept ] ==> queue full? == yes ==> [ 503 worker ]
///                     || no
///                     \/
///              [ pending queue ] ==> [ connection worker ] x max_connections
/// ```
///
/// Workers are spawned once at launch and loop forever, taking accepted
/// streams from the pending queue.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Number of connection workers, i.e. connections served at once (default: `100`).
    pub max_connections: usize,

    /// Accepted streams waiting for a worker (default: `250`).
    ///
    /// Streams accepted while the queue is full are answered
    /// `503 Service Unavailable` and closed.
    pub max_pending_connections: usize,

    /// How an idle worker waits for the next stream (default: `Sleep(50µs)`).
    pub wait_strategy: WaitStrategy,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 100,
            max_pending_connections: 250,
            wait_strategy: WaitStrategy::Sleep(Duration::from_micros(50)),
        }
    }
}

/// How a worker waits while its queue is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStrategy {
    /// [`tokio::task::yield_now`] between polls. Lowest latency, keeps a core busy.
    Yield,
    /// [`tokio::time::sleep`] between polls.
    Sleep(Duration),
}

/// Limits and timeouts of one TCP connection.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Longest wait for the next read (default: `2 seconds`).
    ///
    /// An idle connection is closed when it expires.
    pub socket_read_timeout: Duration,

    /// Longest wait for one response write (default: `3 seconds`).
    pub socket_write_timeout: Duration,

    /// How long a started message may stay incomplete (default: `1 second`).
    ///
    /// Checked against the parser's missing-content clock after every read;
    /// the connection is answered `408 Request Timeout` and closed when it
    /// expires. This is what stops a client trickling a partial request.
    pub missing_content_timeout: Duration,

    /// Requests served before the connection is closed (default: `100`).
    pub max_requests_per_connection: usize,

    /// Longest life of a connection, from accept to close (default: `2 minutes`).
    pub connection_lifetime: Duration,

    /// Size of each socket read (default: `4096` bytes).
    pub read_buffer_size: usize,
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(2),
            socket_write_timeout: Duration::from_secs(3),
            missing_content_timeout: Duration::from_secs(1),
            max_requests_per_connection: 100,
            connection_lifetime: Duration::from_secs(120),
            read_buffer_size: 4096,
        }
    }
}

/// Defaults for a [`Resource`](crate::resource::Resource) built without
/// explicit settings.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Handler instances created per resource (default: `10`).
    ///
    /// Requests are spread over the pool round-robin. A size of `0` is
    /// treated as `1`.
    pub handler_pool_size: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            handler_pool_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let server = ServerLimits::default();
        assert_eq!(server.max_connections, 100);
        assert_eq!(server.max_pending_connections, 250);
        assert_eq!(server.wait_strategy, WaitStrategy::Sleep(Duration::from_micros(50)));

        let conn = ConnLimits::default();
        assert!(conn.missing_content_timeout < conn.socket_read_timeout);
        assert!(conn.read_buffer_size > 0);

        assert_eq!(ResourceLimits::default().handler_pool_size, 10);
    }
}
