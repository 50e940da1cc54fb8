// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;

/// Errors raised while reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port '{0}': must be an integer between 1 and 65535")]
    InvalidPort(String),

    #[error("Invalid bind host '{0}': must be an IP address")]
    InvalidBindHost(String),

    #[error("Invalid log level '{0}'. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("REGION cannot be empty")]
    EmptyRegion,

    #[error("LOG_DIR cannot be empty")]
    EmptyLogDir,
}

/// Errors raised while decoding a request body into a batch of events
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("invalid JSON array: {0}")]
    InvalidArray(#[source] serde_json::Error),

    #[error("invalid JSON on line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("event at position {position} is not a JSON object")]
    NotAnObject { position: usize },
}

/// Errors raised by the log sinks backing each index
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("unable to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write to index {index}: {source}")]
    Write {
        index: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to serialize entry for index {index}: {source}")]
    Serialize {
        index: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid index name '{0}'")]
    InvalidIndexName(String),

    #[error("sink for index {0} is closed")]
    Closed(String),
}

/// Errors raised while handling an ingest request
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unable to read request body: {0}")]
    Body(String),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Errors that stop the receiver from starting or serving
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("unable to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Accept(#[source] io::Error),
}
