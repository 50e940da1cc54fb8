// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::RawEvent;

pub const DEFAULT_INDEX: &str = "main";
const UNKNOWN: &str = "unknown";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
pub const SUMMARY_MAX_LEN: usize = 120;

/// One line of an index file. Field order is part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub host: String,
    pub source: String,
    pub sourcetype: String,
    pub index: String,
    pub region: String,
    pub event: String,
}

impl LogEntry {
    /// Normalizes a raw event, stamping it with the current local time.
    pub fn from_record(record: &RawEvent, default_region: &str) -> Self {
        Self::normalize(record, default_region, Local::now())
    }

    /// Normalizes a raw event received at `received_at`.
    ///
    /// Missing or `null` metadata falls back to its default; values of any other
    /// non-string type are kept as their JSON text. Timestamps carried by the
    /// event itself are ignored.
    pub fn normalize(record: &RawEvent, default_region: &str, received_at: DateTime<Local>) -> Self {
        let region = record
            .get("fields")
            .and_then(Value::as_object)
            .and_then(|fields| text_field(fields.get("region")))
            .unwrap_or_else(|| default_region.to_string());

        Self {
            timestamp: received_at.format(TIMESTAMP_FORMAT).to_string(),
            host: text_field(record.get("host")).unwrap_or_else(|| UNKNOWN.to_string()),
            source: text_field(record.get("source")).unwrap_or_else(|| UNKNOWN.to_string()),
            sourcetype: text_field(record.get("sourcetype"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            index: text_field(record.get("index")).unwrap_or_else(|| DEFAULT_INDEX.to_string()),
            region,
            event: event_body(record.get("event")),
        }
    }

    /// Human readable form of the entry for operator output, capped at `max_len` characters.
    pub fn summary(&self, max_len: usize) -> String {
        let line = format!(
            "{} host={} source={} sourcetype={} | {}",
            self.timestamp, self.host, self.source, self.sourcetype, self.event
        );
        match line.char_indices().nth(max_len) {
            Some((cut, _)) => format!("{}...", &line[..cut]),
            None => line,
        }
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn event_body(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
