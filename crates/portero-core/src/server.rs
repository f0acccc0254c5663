//! HTTP server loop
//!
//! hyper-based server with:
//! - Multi-threaded tokio runtime (sized by the caller)
//! - Per-method routing for O(1) dispatch
//! - One spawned task per connection
//! - TCP_NODELAY for low latency

use crate::{Error, Method, Request, Response, ResponseBuilder, Result, Router, ServerConfig, StatusCode};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::RwLock;
use socket2::{Domain, Protocol, Socket, Type};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// Fixed plain-text message returned when the body exceeds the size limit.
pub const BODY_TOO_LARGE_MESSAGE: &str = "El cuerpo de la solicitud es demasiado grande";

/// Boxed async route handler
pub type Handler = Arc<
    dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync,
>;

/// Server state shared across all connections
pub struct ServerState {
    /// Router mapping (method, path) to handlers
    router: RwLock<Router<Handler>>,
    /// Maximum accepted request body size in bytes
    max_body_size: usize,
}

impl ServerState {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            router: RwLock::new(Router::new()),
            max_body_size,
        }
    }

    /// Register a route
    pub fn add_route<F, Fut>(&self, method: Method, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |req| Box::pin(handler(req)));
        self.router.write().route(method, path, handler)
    }

    /// Match and handle a request
    pub async fn handle(&self, mut req: Request) -> Response {
        let matched = self.router.read().match_route(req.method, &req.path);
        match matched {
            Some(m) => {
                req.params = m.params;
                (m.value)(req).await
            }
            None => Response::not_found(),
        }
    }
}

/// HTTP server under construction: owns the router, not yet bound
pub struct Server {
    config: ServerConfig,
    state: Arc<ServerState>,
}

impl Server {
    /// Create a server from an explicit configuration
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(ServerState::new(config.max_body_size));
        Self { config, state }
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register a route
    pub fn route<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.state.add_route(method, path, handler)
    }

    /// Register a GET route
    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// Register a POST route
    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    /// Bind the listener
    ///
    /// A bind failure (port in use, permission denied) is fatal for the
    /// caller: no requests are served. Must be called from within a tokio
    /// runtime.
    pub fn bind(self) -> Result<BoundServer> {
        let addr: SocketAddr = format!("{}:{}", self.config.hostname, self.config.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| Error::InvalidAddress(e.to_string()))?;

        let listener = create_listener(&addr)?;
        let listener = TcpListener::from_std(listener)?;

        Ok(BoundServer {
            listener,
            state: self.state,
        })
    }
}

/// A server with a live listener, ready to accept connections
pub struct BoundServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl BoundServer {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until the process is terminated
    ///
    /// Each connection is served on its own task; per-request errors never
    /// escape the handler, and accept errors do not stop the loop.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let state = self.state.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let state = state.clone();
                    async move { handle_request(state, req).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    // Normal connection closes are not worth logging
                    if !e.to_string().contains("connection closed") {
                        debug!(peer = %peer, error = %e, "connection error");
                    }
                }
            });
        }
    }
}

/// Create a TCP listener in non-blocking mode
fn create_listener(addr: &SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;

    // Required for tokio's TcpListener::from_std
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

/// Handle one incoming HTTP request
async fn handle_request(
    state: Arc<ServerState>,
    req: hyper::Request<Incoming>,
) -> std::result::Result<hyper::Response<Full<Bytes>>, std::convert::Infallible> {
    // Unknown methods cannot match any route
    let method = match Method::from_str(req.method().as_str()) {
        Ok(m) => m,
        Err(_) => return Ok(to_hyper_response(Response::not_found())),
    };

    // Reject oversized bodies from the declared length before reading them
    if let Some(len) = declared_content_length(&req) {
        if len > state.max_body_size {
            return Ok(to_hyper_response(body_too_large_response()));
        }
    }

    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        // An error reading the body is terminal for this request only
        Err(_) => {
            return Ok(to_hyper_response(Response::bad_request(
                crate::handlers::DECODE_ERROR_MESSAGE,
            )))
        }
    };

    // Chunked bodies carry no Content-Length; enforce the limit again
    if body.len() > state.max_body_size {
        return Ok(to_hyper_response(body_too_large_response()));
    }

    let request = from_hyper_parts(method, &parts, body);
    let response = state.handle(request).await;

    Ok(to_hyper_response(response))
}

/// Read the Content-Length header, if present and well-formed
fn declared_content_length(req: &hyper::Request<Incoming>) -> Option<usize> {
    req.headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn body_too_large_response() -> Response {
    ResponseBuilder::new(StatusCode::PAYLOAD_TOO_LARGE)
        .header("content-type", "text/plain")
        .body(BODY_TOO_LARGE_MESSAGE)
        .build()
}

/// Convert hyper request parts to our Request type
fn from_hyper_parts(
    method: Method,
    parts: &hyper::http::request::Parts,
    body: Bytes,
) -> Request {
    let path = parts.uri.path().to_string();

    let mut request = Request::new(method, path);
    request.body = body;

    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    request
}

/// Convert our Response to hyper Response
fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut builder = hyper::Response::builder().status(res.status.as_u16());

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    match builder.body(Full::new(res.body)) {
        Ok(response) => response,
        Err(_) => {
            let mut response =
                hyper::Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *response.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{handlers, RequestBuilder};

    #[tokio::test]
    async fn test_dispatch_to_registered_route() {
        let state = ServerState::new(1024 * 1024);
        state.add_route(Method::Post, "/login", handlers::login).unwrap();

        let req = RequestBuilder::new(Method::Post, "/login")
            .body(r#"{"username":"a","password":"b"}"#.to_string())
            .build();

        let res = state.handle(req).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(
            res.body_string().as_deref(),
            Some(r#"{"username":"a","password":"b"}"#)
        );
    }

    #[tokio::test]
    async fn test_unmatched_route_is_not_found() {
        let state = ServerState::new(1024 * 1024);
        state.add_route(Method::Post, "/login", handlers::login).unwrap();

        let req = RequestBuilder::new(Method::Post, "/logout").build();
        let res = state.handle(req).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);

        // Registered path, unregistered method
        let req = RequestBuilder::new(Method::Get, "/login").build();
        let res = state.handle(req).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_route_params_reach_handler() {
        let state = ServerState::new(1024 * 1024);
        state
            .add_route(Method::Get, "/users/{id}", |req: Request| async move {
                let id = req.param("id").unwrap_or("").to_string();
                Response::json(format!(r#"{{"id":"{id}"}}"#))
            })
            .unwrap();

        let req = RequestBuilder::new(Method::Get, "/users/42").build();
        let res = state.handle(req).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body_string().as_deref(), Some(r#"{"id":"42"}"#));
    }

    #[tokio::test]
    async fn test_handlers_share_no_state() {
        let state = Arc::new(ServerState::new(1024 * 1024));
        state.add_route(Method::Post, "/login", handlers::login).unwrap();

        let a = state.clone();
        let b = state.clone();
        let (res_a, res_b) = tokio::join!(
            a.handle(
                RequestBuilder::new(Method::Post, "/login")
                    .body(r#"{"username":"alice","password":"pa"}"#.to_string())
                    .build()
            ),
            b.handle(
                RequestBuilder::new(Method::Post, "/login")
                    .body(r#"{"username":"bob","password":"pb"}"#.to_string())
                    .build()
            ),
        );

        assert_eq!(
            res_a.body_string().as_deref(),
            Some(r#"{"username":"alice","password":"pa"}"#)
        );
        assert_eq!(
            res_b.body_string().as_deref(),
            Some(r#"{"username":"bob","password":"pb"}"#)
        );
    }

    #[test]
    fn test_to_hyper_response_headers() {
        let res = Response::json(r#"{"username":"a","password":"b"}"#);
        let hyper_res = to_hyper_response(res);
        assert_eq!(hyper_res.status(), hyper::StatusCode::OK);
        assert_eq!(
            hyper_res.headers().get("content-type").map(|v| v.to_str().unwrap()),
            Some("application/json")
        );
    }
}
