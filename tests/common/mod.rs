//! Shared utilities for integration testing.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::Request,
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use mgm_proxy::{HttpServer, ProxyConfig};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start the proxy on an ephemeral port, pointed at the given upstream
/// base. Returns the proxy's address.
pub async fn start_proxy(upstream_base: &str) -> SocketAddr {
    start_proxy_with_timeout(upstream_base, std::time::Duration::from_secs(5)).await
}

/// Same as [`start_proxy`] with an explicit outbound timeout.
pub async fn start_proxy_with_timeout(
    upstream_base: &str,
    upstream_timeout: std::time::Duration,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ProxyConfig {
        upstream_base: upstream_base.to_string(),
        bind_address: addr.to_string(),
        upstream_timeout,
    };

    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    addr
}

/// Start a mock upstream that echoes the request back as JSON:
/// method, full URI, every header with all of its values, and body.
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(any(echo_handler));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

async fn echo_handler(request: Request<Body>) -> impl IntoResponse {
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let (parts, body) = request.into_parts();

    let mut headers = serde_json::Map::new();
    for key in parts.headers.keys() {
        let values: Vec<String> = parts
            .headers
            .get_all(key)
            .iter()
            .map(|v| v.to_str().unwrap_or("").to_string())
            .collect();
        headers.insert(key.to_string(), values.into());
    }

    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    Json(json!({
        "method": method,
        "uri": uri,
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Start a raw-TCP upstream that sends a fully hand-built response,
/// framing included, then closes.
pub async fn start_raw_upstream_full(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a raw-TCP upstream that sends response headers and a partial
/// body, then holds the connection open without ever finishing.
pub async fn start_stalling_body_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let _ = socket
                            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc")
                            .await;
                        // Keep the socket open; the remaining 7 bytes
                        // never arrive.
                        while let Ok(n) = socket.read(&mut buf).await {
                            if n == 0 {
                                break;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock upstream that accepts connections, reads the request,
/// and never answers.
pub async fn start_stalling_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        while let Ok(n) = socket.read(&mut buf).await {
                            if n == 0 {
                                break;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a raw-TCP mock upstream that returns a fixed response,
/// including repeated header lines the HTTP machinery would normally
/// collapse on the way in.
pub async fn start_raw_upstream(status_line: &'static str, headers: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            headers,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
