// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_TAIL_LINES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tail {
    pub index: String,
    pub total_lines: usize,
    pub lines: Vec<Value>,
}

/// Lists the indexes that have a `.log` file in `log_dir`, sorted by name.
/// A missing directory has no indexes.
pub async fn list_indexes(log_dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(log_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut indexes = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "log") {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                indexes.push(stem.to_string());
            }
        }
    }
    indexes.sort();
    Ok(indexes)
}

/// Reads the last `count` lines of an index file, oldest first.
///
/// Returns `Ok(None)` when the file doesn't exist. Lines are parsed back into
/// JSON; a line that isn't valid JSON is returned as a JSON string.
pub async fn read_tail(index: &str, path: &Path, count: usize) -> io::Result<Option<Tail>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let all_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let total_lines = all_lines.len();
    let lines = all_lines[total_lines.saturating_sub(count)..]
        .iter()
        .map(|line| {
            serde_json::from_str(line).unwrap_or_else(|_| Value::String((*line).to_string()))
        })
        .collect();

    Ok(Some(Tail {
        index: index.to_string(),
        total_lines,
        lines,
    }))
}
