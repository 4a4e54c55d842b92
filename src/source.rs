//! Decoding of the records handed over by the extraction step.
//!
//! Accepted shapes, at any nesting of arrays:
//!
//! - API pages: `{"records": [ ... ]}`
//! - API records: `{"record": {"fields": {...}}}` or `{"fields": {...}}`
//! - bare field objects: `{"id": ..., "room_type": ..., ...}`
//!
//! Input is either one JSON document or newline-delimited JSON.

use crate::types::RawRecord;
use anyhow::{Context, Result};
use serde_json::Value;
use std::io::{BufReader, Read};
use tracing::{debug, warn};

/// Read every raw listing from `reader`, in input order
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut content = Vec::new();
    BufReader::new(reader)
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    let mut records = Vec::new();

    // simd-json parses in place, so give it a scratch copy to keep the NDJSON fallback intact
    let mut scratch = content.clone();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(document) => collect(document, &mut records),
        Err(_) => {
            let text = String::from_utf8_lossy(&content);
            for (line_no, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse JSON on line {}", line_no + 1))?;
                collect(value, &mut records);
            }
        }
    }

    debug!(count = records.len(), "decoded raw records");
    Ok(records)
}

/// Decode raw listings from an already parsed JSON value
pub fn records_from_value(value: Value) -> Vec<RawRecord> {
    let mut records = Vec::new();
    collect(value, &mut records);
    records
}

fn collect(value: Value, records: &mut Vec<RawRecord>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, records);
            }
        }
        Value::Object(mut obj) => {
            if let Some(page) = obj.remove("records") {
                collect(page, records);
            } else if let Some(record @ Value::Object(_)) = obj.remove("record") {
                collect(record, records);
            } else if let Some(fields @ Value::Object(_)) = obj.remove("fields") {
                push_fields(fields, records);
            } else {
                push_fields(Value::Object(obj), records);
            }
        }
        other => warn!(value = %other, "skipping non-object record"),
    }
}

fn push_fields(fields: Value, records: &mut Vec<RawRecord>) {
    match serde_json::from_value::<RawRecord>(fields) {
        Ok(record) => records.push(record),
        Err(err) => warn!(error = %err, "skipping undecodable record"),
    }
}
