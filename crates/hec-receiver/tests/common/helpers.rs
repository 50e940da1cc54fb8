// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use hec_receiver::config::Config;
use hec_receiver::receiver::HecReceiver;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

pub struct RunningReceiver {
    pub addr: SocketAddr,
    pub config: Arc<Config>,
    pub receiver: Arc<HecReceiver>,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<Result<(), hec_receiver::error::ReceiverError>>,
    _log_dir: TempDir,
}

/// Start a receiver on a random local port, writing into a fresh temp dir
pub async fn start_receiver(region: &str) -> RunningReceiver {
    let log_dir = TempDir::new().expect("Failed to create temp dir");
    let config = Arc::new(Config {
        region: region.to_string(),
        log_dir: log_dir.path().join("logs"),
        port: 0,
        bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        ..Default::default()
    });
    let receiver = Arc::new(HecReceiver::new(config.clone()).expect("Failed to create receiver"));
    let listener = receiver.bind().await.expect("Failed to bind receiver");
    let addr = listener.local_addr().expect("Failed to get local addr");

    let shutdown = CancellationToken::new();
    let serving = receiver.clone();
    let token = shutdown.clone();
    let handle = tokio::spawn(async move { serving.serve(listener, token).await });

    RunningReceiver {
        addr,
        config,
        receiver,
        shutdown,
        handle,
        _log_dir: log_dir,
    }
}

/// Send an HTTP request over TCP and return the status and body
pub async fn send_tcp_request(
    addr: SocketAddr,
    uri: &str,
    method: &str,
    body: Option<&str>,
) -> Result<(StatusCode, hyper::HeaderMap, Bytes), Box<dyn std::error::Error + Send + Sync>> {
    let stream = timeout(Duration::from_secs(2), tokio::net::TcpStream::connect(addr)).await??;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    tokio::spawn(async move {
        let _ = conn.await;
    });

    let mut request_builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Host", addr.to_string())
        .header("Content-Type", "application/json")
        .header("Authorization", "Splunk 00000000-0000-0000-0000-000000000000");

    let request = if let Some(body_data) = body {
        request_builder = request_builder.header("Content-Length", body_data.len().to_string());
        request_builder.body(Full::new(Bytes::from(body_data.to_string())))?
    } else {
        request_builder.body(Full::new(Bytes::new()))?
    };

    let response = timeout(Duration::from_secs(2), sender.send_request(request)).await??;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, headers, bytes))
}

pub async fn get_json(addr: SocketAddr, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = send_tcp_request(addr, uri, "GET", None)
        .await
        .expect("request failed");
    let json = serde_json::from_slice(&body).expect("response is not JSON");
    (status, json)
}

pub async fn post_events(addr: SocketAddr, body: &str) -> (StatusCode, String) {
    let (status, _, bytes) = send_tcp_request(addr, "/services/collector/event", "POST", Some(body))
        .await
        .expect("request failed");
    (status, String::from_utf8(bytes.to_vec()).expect("body is not UTF-8"))
}
