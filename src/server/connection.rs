use crate::{
    http::{
        header::{Header, VALUE_CLOSE},
        parser::request::RequestParser,
        request::Request,
        response::Response,
        types::StatusCode,
    },
    limits::ConnLimits,
    resource::{Completes, Context, ContextIdGenerator, Resources},
};
use std::{io, sync::Arc, time::Instant};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::timeout,
};
use tracing::debug;

/// Serves one stream at a time: reads feed a [`RequestParser`], every full
/// request is dispatched through [`Resources`] and its response written
/// back in order.
pub(crate) struct HttpConnection {
    resources: Arc<Resources>,
    ids: Arc<ContextIdGenerator>,
    limits: ConnLimits,
    buffer: Vec<u8>,
}

impl HttpConnection {
    #[inline]
    pub(crate) fn new(resources: Arc<Resources>, ids: Arc<ContextIdGenerator>, limits: ConnLimits) -> Self {
        Self {
            buffer: vec![0; limits.read_buffer_size.max(1)],
            resources,
            ids,
            limits,
        }
    }

    /// Serves `stream` until the client closes it, asks to close, sends a
    /// malformed message, stalls mid-message or outlives its limits.
    pub(crate) async fn run<S>(&mut self, stream: &mut S) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut connection = Connection::new();
        let mut parser = RequestParser::new();

        while !connection.is_expired(&self.limits) {
            let wait = match parser.is_missing_content() {
                true => self.limits.missing_content_timeout.min(self.limits.socket_read_timeout),
                false => self.limits.socket_read_timeout,
            };

            let read = match timeout(wait, stream.read(&mut self.buffer)).await {
                Ok(read) => read?,
                Err(_) if parser.is_missing_content() => {
                    debug!("partial request stalled");
                    return self.write(stream, closing(StatusCode::RequestTimeout)).await;
                }
                Err(_) => break,
            };
            if read == 0 {
                break;
            }

            if let Err(error) = parser.parse_next(&self.buffer[..read]) {
                debug!(%error, "malformed request");
                return self.write(stream, closing(error.status())).await;
            }

            for request in parser.full_requests() {
                let keep_alive = request.is_keep_alive();
                let response = self.dispatch(request).await;

                connection.served();
                if !keep_alive || connection.is_expired(&self.limits) {
                    return self.write(stream, response.and(Header::connection(VALUE_CLOSE))).await;
                }
                self.write(stream, response).await?;
            }

            if parser.has_missing_content_time_expired(self.limits.missing_content_timeout) {
                debug!("partial request stalled");
                return self.write(stream, closing(StatusCode::RequestTimeout)).await;
            }
        }

        Ok(())
    }

    async fn dispatch(&self, request: Request) -> Response {
        let (completes, response) = Completes::channel();
        let context = Context::new(self.ids.next_id(), request, completes);

        self.resources.clone().dispatch_for(context).await;

        // dispatch always completes, a missing response is a bug upstream
        response
            .await
            .unwrap_or_else(|_| Response::of(StatusCode::InternalServerError))
    }

    async fn write<S: AsyncWrite + Unpin>(&self, stream: &mut S, response: Response) -> io::Result<()> {
        let bytes = response.into_bytes();
        timeout(self.limits.socket_write_timeout, async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        })
        .await?
    }
}

#[inline]
fn closing(status: StatusCode) -> Response {
    Response::of(status).and(Header::connection(VALUE_CLOSE))
}

#[derive(Debug)]
struct Connection {
    created: Instant,
    request_count: usize,
}

impl Connection {
    #[inline(always)]
    fn new() -> Self {
        Self {
            created: Instant::now(),
            request_count: 0,
        }
    }

    #[inline(always)]
    fn served(&mut self) {
        self.request_count += 1;
    }

    #[inline(always)]
    fn is_expired(&self, limits: &ConnLimits) -> bool {
        self.request_count >= limits.max_requests_per_connection
            || self.created.elapsed() > limits.connection_lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        http::{body::Body, parser::response::ResponseParser},
        resource::{self, Resource},
    };
    use std::time::Duration;
    use tokio::io::duplex;

    fn resources() -> Arc<Resources> {
        let echo = Resource::builder("echo", || ())
            .route(resource::post("/echo").body().handle(|_: Arc<()>, body: Body| async move {
                Ok(Response::of(StatusCode::Ok).and(body))
            }))
            .route(resource::get("/users/{id}").param::<u32>().handle(|_: Arc<()>, id| async move {
                Ok(Response::of(StatusCode::Ok).and(Body::from(format!("user {id}"))))
            }))
            .route(resource::get("/boom").handle(|_: Arc<()>| async move {
                if true {
                    panic!("handler gave up");
                }
                Ok(Response::of(StatusCode::Ok))
            }))
            .build()
            .unwrap();

        let mut resources = Resources::new();
        resources.add(echo).unwrap();
        Arc::new(resources)
    }

    /// Runs a connection against `input` and returns every response it wrote.
    async fn serve(limits: ConnLimits, input: &[u8], keep_open: bool) -> Vec<Response> {
        let (mut client, mut server) = duplex(64 * 1024);
        let mut connection = HttpConnection::new(resources(), Arc::new(ContextIdGenerator::new()), limits);

        let task = tokio::spawn(async move { connection.run(&mut server).await });

        client.write_all(input).await.unwrap();
        if !keep_open {
            client.shutdown().await.unwrap();
        }

        let mut output = Vec::new();
        client.read_to_end(&mut output).await.unwrap();
        task.await.unwrap().unwrap();

        let mut parser = ResponseParser::parser_for(&output).unwrap();
        parser.full_responses().collect()
    }

    fn statuses(responses: &[Response]) -> Vec<u16> {
        responses.iter().map(|r| r.status().code()).collect()
    }

    #[tokio::test]
    async fn pipelined_requests() {
        let input = b"GET /users/1 HTTP/1.1\nHost: a\n\n\
                      POST /echo HTTP/1.1\nHost: a\nContent-Length: 5\n\nhello\
                      GET /missing HTTP/1.1\nHost: a\n\n";

        let responses = serve(ConnLimits::default(), input, false).await;

        assert_eq!(statuses(&responses), [200, 200, 404]);
        assert_eq!(responses[0].entity().content(), "user 1");
        assert_eq!(responses[1].entity().content(), "hello");
    }

    #[tokio::test]
    async fn panicking_handler_keeps_connection() {
        let input = b"GET /boom HTTP/1.1\nHost: a\n\nGET /users/2 HTTP/1.1\nHost: a\n\n";

        let responses = serve(ConnLimits::default(), input, false).await;

        assert_eq!(statuses(&responses), [500, 200]);
        assert_eq!(responses[1].entity().content(), "user 2");
    }

    #[tokio::test]
    async fn close_requested() {
        let input = b"GET /users/1 HTTP/1.1\nHost: a\nConnection: close\n\nGET /users/2 HTTP/1.1\nHost: a\n\n";

        let responses = serve(ConnLimits::default(), input, true).await;

        assert_eq!(statuses(&responses), [200]);
        assert_eq!(responses[0].header_value_or("Connection", "-"), "close");
    }

    #[tokio::test]
    async fn malformed_request() {
        #[rustfmt::skip]
        let cases: [(&[u8], u16); 3] = [
            (b"FETCH /users/1 HTTP/1.1\nHost: a\n\n", 400),
            (b"GET /users/1\nHost: a\n\n",            400),
            (b"GET /users/1 HTTP/2.0\nHost: a\n\n",   400),
        ];

        for (input, status) in cases {
            let responses = serve(ConnLimits::default(), input, true).await;
            assert_eq!(statuses(&responses), [status]);
            assert_eq!(responses[0].header_value_or("Connection", "-"), "close");
        }
    }

    #[tokio::test]
    async fn stalled_partial_request() {
        let limits = ConnLimits {
            missing_content_timeout: Duration::from_millis(30),
            ..ConnLimits::default()
        };

        let responses = serve(limits, b"POST /echo HTTP/1.1\nHost: a\nContent-Length: 10\n\nhel", true).await;
        assert_eq!(statuses(&responses), [408]);
    }

    #[tokio::test]
    async fn idle_connection_times_out() {
        let limits = ConnLimits {
            socket_read_timeout: Duration::from_millis(30),
            ..ConnLimits::default()
        };

        let responses = serve(limits, b"GET /users/1 HTTP/1.1\nHost: a\n\n", true).await;
        assert_eq!(statuses(&responses), [200]);
    }

    #[tokio::test]
    async fn request_limit() {
        let limits = ConnLimits {
            max_requests_per_connection: 2,
            ..ConnLimits::default()
        };
        let request = Request::has(crate::Method::Get)
            .and(crate::Uri::from("/users/3"))
            .and(Header::host("a"))
            .into_bytes()
            .repeat(3);

        let responses = serve(limits, &request, true).await;

        assert_eq!(statuses(&responses), [200, 200]);
        assert_eq!(responses[1].header_value_or("Connection", "-"), "close");
    }
}
