//! HTTP server setup and the forwarding handler.
//!
//! # Responsibilities
//! - Create the Axum router and bind it to the listener
//! - Serve the `/health` liveness probe
//! - Forward everything else to the fixed upstream: same method, same
//!   path and query, all headers, streamed body
//! - Inject the resolved client IP header on the outbound request
//! - Relay the upstream status, headers, and body back verbatim
//!
//! # Design Decisions
//! - One shared outbound client; connection reuse is its concern
//! - Bodies are relayed as streams in both directions, never buffered
//! - Single attempt per request: upstream failures surface as 502,
//!   request construction failures as 500, nothing is retried

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{
        header::{CONNECTION, HOST, TRANSFER_ENCODING},
        HeaderValue, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body::{Body as HttpBody, Frame, SizeHint};
use hyper::body::Incoming;
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::time::{sleep_until, Instant, Sleep};
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::headers::{copy_headers, X_MGM_CLIENT_IP};
use crate::resolver::resolve_client_ip;

/// Outbound client type; the default upstream is HTTPS, so the
/// connector must handle both schemes.
type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub client: HttpClient,
    pub config: Arc<ProxyConfig>,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let client: HttpClient =
            Client::<(), ()>::builder(TokioExecutor::new()).build(HttpsConnector::new());

        let state = AppState {
            client,
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router. Every path and method lands on the same
    /// handler; the probe short-circuit lives inside it.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream_base,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler: one inbound request, one outbound call, one
/// relayed response.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    // Liveness probe, never forwarded.
    if request.uri().path() == "/health" {
        return (StatusCode::OK, "ok").into_response();
    }

    let client_ip = resolve_client_ip(request.headers(), &addr.to_string());

    let path_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| request.uri().path());
    let target = format!("{}{}", state.config.upstream_base, path_query);

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        method = %method,
        path = %path,
        client_ip = %client_ip,
        "Proxying request"
    );

    let outbound = match build_outbound(request, &target, &client_ip) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(
                method = %method,
                path = %path,
                error = %e,
                "Failed to build outbound request"
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create request")
                .into_response();
        }
    };

    // One deadline covers the whole call: connect, headers, and the
    // body relay that continues after this handler returns.
    let deadline = Instant::now() + state.config.upstream_timeout;

    match tokio::time::timeout_at(deadline, state.client.request(outbound)).await {
        Ok(Ok(upstream)) => relay_response(upstream, deadline),
        Ok(Err(e)) => {
            tracing::error!(method = %method, path = %path, error = %e, "Upstream request failed");
            (StatusCode::BAD_GATEWAY, "Failed to reach upstream").into_response()
        }
        Err(_) => {
            tracing::error!(
                method = %method,
                path = %path,
                timeout = ?state.config.upstream_timeout,
                "Upstream request timed out"
            );
            (StatusCode::BAD_GATEWAY, "Failed to reach upstream").into_response()
        }
    }
}

/// Construct the outbound request: same method, target URI, all
/// inbound headers, the injected client-IP header, and the inbound
/// body passed through as a stream.
fn build_outbound(
    request: Request<Body>,
    target: &str,
    client_ip: &str,
) -> Result<Request<Body>, axum::http::Error> {
    let uri: Uri = target.parse()?;
    let (parts, body) = request.into_parts();

    let mut outbound = Request::builder().method(parts.method).uri(uri).body(body)?;

    copy_headers(&parts.headers, outbound.headers_mut());
    // The inbound Host names this proxy; the client derives the real
    // one from the target URI.
    outbound.headers_mut().remove(HOST);
    // Overwrite, never append: exactly one copy of the injected header
    // reaches the upstream, even if the caller supplied its own.
    outbound
        .headers_mut()
        .insert(X_MGM_CLIENT_IP, HeaderValue::from_str(client_ip)?);

    Ok(outbound)
}

/// Relay an upstream response verbatim: exact status, every header in
/// order, body streamed through under the remaining deadline.
fn relay_response(upstream: Response<Incoming>, deadline: Instant) -> Response {
    let (parts, body) = upstream.into_parts();
    let mut response = Response::new(Body::new(DeadlineBody::new(body, deadline)));
    *response.status_mut() = parts.status;
    copy_headers(&parts.headers, response.headers_mut());
    // The client already deframed the body; upstream's framing headers
    // no longer describe what goes out on the wire.
    response.headers_mut().remove(TRANSFER_ENCODING);
    response.headers_mut().remove(CONNECTION);
    response
}

/// Upstream body bounded by the request's deadline.
///
/// `client.request` resolves once response headers arrive, so the
/// timeout around it stops covering the stream that follows. Racing
/// every frame poll against the deadline keeps an upstream that stalls
/// mid-body from holding the caller and the connection open forever.
struct DeadlineBody {
    inner: Pin<Box<Incoming>>,
    sleep: Pin<Box<Sleep>>,
}

impl DeadlineBody {
    fn new(inner: Incoming, deadline: Instant) -> Self {
        Self {
            inner: Box::pin(inner),
            sleep: Box::pin(sleep_until(deadline)),
        }
    }
}

impl HttpBody for DeadlineBody {
    type Data = Bytes;
    type Error = axum::BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.sleep.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Some(Err("upstream body relay timed out".into())));
        }
        match this.inner.as_mut().poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(Ok(frame))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e.into()))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
