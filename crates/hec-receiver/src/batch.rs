// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decodes an HEC request body into an ordered batch of raw events.
//!
//! A body is accepted in any of the three shapes HEC clients send:
//! a single JSON object, a JSON array of objects, or newline-delimited
//! JSON objects. The whole body is decoded before any event is returned,
//! so a malformed body never yields a partial batch.

use serde_json::{Map, Value};

use crate::error::BatchError;

/// A single event as submitted by a client, before normalization
pub type RawEvent = Map<String, Value>;

pub fn parse_batch(body: &[u8]) -> Result<Vec<RawEvent>, BatchError> {
    let body = std::str::from_utf8(body)?.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    if body.starts_with('[') {
        let value: Value = serde_json::from_str(body).map_err(BatchError::InvalidArray)?;
        return match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(position, item)| into_event(item, position))
                .collect(),
            Value::Object(event) => Ok(vec![event]),
            _ => Err(BatchError::NotAnObject { position: 0 }),
        };
    }

    let mut events = Vec::new();
    for (line_index, line) in body.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|source| BatchError::InvalidLine {
            line: line_index + 1,
            source,
        })?;
        events.push(into_event(value, events.len())?);
    }
    Ok(events)
}

fn into_event(value: Value, position: usize) -> Result<RawEvent, BatchError> {
    match value {
        Value::Object(event) => Ok(event),
        _ => Err(BatchError::NotAnObject { position }),
    }
}
