// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{http, Method, Request, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::batch::parse_batch;
use crate::config::Config;
use crate::error::{IngestError, ReceiverError};
use crate::event::{LogEntry, SUMMARY_MAX_LEN};
use crate::http_utils::{
    create_hec_response, create_json_response, create_not_found_response,
    create_preflight_response, declared_content_length, log_and_create_error_response, HecStatus,
    HttpResponse,
};
use crate::sink_registry::SinkRegistry;
use crate::tail::{self, DEFAULT_TAIL_LINES};

pub const COLLECTOR_ENDPOINT_PREFIX: &str = "/services/collector";
pub const HEALTH_ENDPOINT_PATH: &str = "/health";
pub const INDEXES_ENDPOINT_PATH: &str = "/indexes";
pub const TAIL_ENDPOINT_PREFIX: &str = "/tail/";

#[derive(Serialize)]
struct Health<'a> {
    status: &'static str,
    region: &'a str,
    log_dir: String,
}

pub struct HecReceiver {
    pub config: Arc<Config>,
    pub registry: Arc<SinkRegistry>,
}

impl HecReceiver {
    /// Prepares the receiver, creating the log directory if needed.
    pub fn new(config: Arc<Config>) -> Result<Self, ReceiverError> {
        let registry = Arc::new(SinkRegistry::new(config.log_dir.clone())?);
        Ok(Self { config, registry })
    }

    pub async fn bind(&self) -> Result<TcpListener, ReceiverError> {
        let addr = self.config.socket_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|source| ReceiverError::Bind {
                addr: addr.to_string(),
                source,
            })
    }

    /// Binds the configured address and serves until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), ReceiverError> {
        let listener = self.bind().await?;
        debug!(
            "HEC receiver started: listening on {}",
            self.config.socket_addr()
        );
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` is cancelled, then
    /// drops in-flight connections and closes every sink.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ReceiverError> {
        let config = Arc::clone(&self.config);
        let registry = Arc::clone(&self.registry);
        let service = service_fn(move |req: Request<Incoming>| {
            // called for each http request
            let config = Arc::clone(&config);
            let registry = Arc::clone(&registry);
            HecReceiver::endpoint_handler(config, registry, req)
        });

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        let result = loop {
            let conn = tokio::select! {
                () = shutdown.cancelled() => {
                    info!("[{}] Shutting down...", self.config.region);
                    break Ok(());
                },
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        break Err(ReceiverError::Accept(e));
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        };

        joinset.shutdown().await;
        self.registry.close_all();
        result
    }

    pub async fn endpoint_handler<B>(
        config: Arc<Config>,
        registry: Arc<SinkRegistry>,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: Body,
        B::Error: Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!("Received {method} {path}");

        match (&method, path.as_str()) {
            (&Method::GET, HEALTH_ENDPOINT_PATH) => Self::health_handler(&config),
            (&Method::GET, INDEXES_ENDPOINT_PATH) => Self::indexes_handler(&registry).await,
            (&Method::GET, tail_path) if tail_path.starts_with(TAIL_ENDPOINT_PREFIX) => {
                match parse_tail_path(tail_path) {
                    Some((index, count)) => Self::tail_handler(&registry, index, count).await,
                    None => create_not_found_response(),
                }
            }
            (&Method::OPTIONS, _) => create_preflight_response(),
            (&Method::POST, collector_path) if collector_path.starts_with(COLLECTOR_ENDPOINT_PREFIX) => {
                Self::ingest_handler(&config, &registry, req).await
            }
            _ => create_not_found_response(),
        }
    }

    fn health_handler(config: &Config) -> http::Result<HttpResponse> {
        let health = Health {
            status: "healthy",
            region: &config.region,
            log_dir: config.log_dir.display().to_string(),
        };
        create_json_response(&health, StatusCode::OK)
    }

    async fn indexes_handler(registry: &SinkRegistry) -> http::Result<HttpResponse> {
        match tail::list_indexes(registry.log_dir()).await {
            Ok(indexes) => create_json_response(&json!({ "indexes": indexes }), StatusCode::OK),
            Err(err) => log_and_create_error_response(
                &format!("Error listing indexes: {err}"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }

    async fn tail_handler(
        registry: &SinkRegistry,
        index: &str,
        count: usize,
    ) -> http::Result<HttpResponse> {
        let not_found = format!("Index {index} not found");
        let Ok(path) = registry.log_path(index) else {
            return log_and_create_error_response(&not_found, StatusCode::NOT_FOUND);
        };
        match tail::read_tail(index, &path, count).await {
            Ok(Some(tail)) => create_json_response(&tail, StatusCode::OK),
            Ok(None) => log_and_create_error_response(&not_found, StatusCode::NOT_FOUND),
            Err(err) => log_and_create_error_response(
                &format!("Error reading index {index}: {err}"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }

    async fn ingest_handler<B>(
        config: &Config,
        registry: &SinkRegistry,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: Body,
        B::Error: Display,
    {
        match Self::ingest(config, registry, req).await {
            Ok(count) => {
                debug!("Successfully wrote {count} events");
                create_hec_response(HecStatus::Success)
            }
            Err(IngestError::Batch(err)) => {
                error!("[{}] JSON parse error: {err}", config.region);
                create_hec_response(HecStatus::InvalidJson)
            }
            Err(err) => {
                error!("[{}] Error processing event: {err}", config.region);
                create_hec_response(HecStatus::InternalError)
            }
        }
    }

    /// Parses the whole body first, then appends each event in order. A sink
    /// failure part way through leaves the earlier events written.
    async fn ingest<B>(
        config: &Config,
        registry: &SinkRegistry,
        req: Request<B>,
    ) -> Result<usize, IngestError>
    where
        B: Body,
        B::Error: Display,
    {
        let (parts, body) = req.into_parts();
        let content_length = declared_content_length(&parts.headers);
        let body = if content_length == 0 {
            Bytes::new()
        } else {
            let mut bytes = body
                .collect()
                .await
                .map_err(|e| IngestError::Body(e.to_string()))?
                .to_bytes();
            bytes.truncate(content_length);
            bytes
        };

        let events = parse_batch(&body)?;
        for record in &events {
            let entry = LogEntry::from_record(record, &config.region);
            registry.append(&entry)?;
            info!(
                "[{}][{}] {}",
                config.region,
                entry.index,
                entry.summary(SUMMARY_MAX_LEN)
            );
        }
        Ok(events.len())
    }
}

/// Splits `/tail/<index>[/<n>]` into the index name and line count.
fn parse_tail_path(path: &str) -> Option<(&str, usize)> {
    let mut segments = path.strip_prefix(TAIL_ENDPOINT_PREFIX)?.split('/');
    let index = segments.next().filter(|index| !index.is_empty())?;
    let count = match segments.next() {
        None | Some("") => DEFAULT_TAIL_LINES,
        Some(count) => count.parse().ok()?,
    };
    if segments.any(|rest| !rest.is_empty()) {
        return None;
    }
    Some((index, count))
}
