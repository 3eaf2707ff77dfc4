//! Shared utilities for integration testing.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use smart_router::{RouterConfig, RouterServer, Shutdown};

/// Start a mock backend that answers every request with a JSON echo:
/// `{"backend": name, "path": ..., "headers": {lowercased name: value}}`.
pub async fn start_echo_backend(addr: SocketAddr, name: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let (read_half, mut write_half) = socket.into_split();
                        let mut reader = BufReader::new(read_half);

                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).await.is_err() {
                            return;
                        }
                        let path = request_line
                            .split_whitespace()
                            .nth(1)
                            .unwrap_or("")
                            .to_string();

                        let mut headers = BTreeMap::new();
                        loop {
                            let mut line = String::new();
                            match reader.read_line(&mut line).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) => {}
                            }
                            let line = line.trim_end();
                            if line.is_empty() {
                                break;
                            }
                            if let Some((k, v)) = line.split_once(':') {
                                headers.insert(k.trim().to_ascii_lowercase(), v.trim().to_string());
                            }
                        }

                        let body = json!({ "backend": name, "path": path, "headers": headers })
                            .to_string();
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = write_half.write_all(response.as_bytes()).await;
                        let _ = write_half.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Run a router on `addr`. Returns the shutdown handle and the sender for
/// configuration updates.
pub async fn start_router(
    addr: SocketAddr,
    config: RouterConfig,
) -> (Shutdown, mpsc::UnboundedSender<RouterConfig>) {
    let shutdown = Shutdown::new();
    let (update_tx, config_updates) = mpsc::unbounded_channel();
    let server = RouterServer::new(config);
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    (shutdown, update_tx)
}

/// Client without connection pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
