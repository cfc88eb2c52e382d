// src/store.rs
// =============================================================================
// Reads and writes the FAQ data file.
//
// Format: a pretty-printed JSON array (2-space indent, UTF-8, non-ASCII kept
// as-is) of {"question", "answer", "url"} objects. This file is the handoff
// between the crawler and the chat command.
//
// Neither function returns an error. Failures are logged and reported as
// `false` / `None` so a bad write or a corrupt file never crashes the CLI.
// =============================================================================

use crate::crawl::FaqRecord;
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{error, info, warn};

// Writes records to `destination`
//
// An empty slice is "nothing to save" and returns false without touching
// the file system.
pub fn save(records: &[FaqRecord], destination: &Path) -> bool {
    if records.is_empty() {
        warn!("no data to save");
        return false;
    }

    let json = match serde_json::to_string_pretty(records) {
        Ok(json) => json,
        Err(e) => {
            error!(path = %destination.display(), error = %e, "failed to serialize FAQ data");
            return false;
        }
    };

    let written = fs::File::create(destination).and_then(|mut file| {
        file.write_all(json.as_bytes())?;
        file.sync_all()
    });

    match written {
        Ok(()) => {
            info!(path = %destination.display(), count = records.len(), "saved FAQ data");
            true
        }
        Err(e) => {
            error!(path = %destination.display(), error = %e, "failed to write FAQ data");
            false
        }
    }
}

// Reads records back from `source`
//
// Returns None when the file is missing, is not valid JSON, is not a JSON
// array, or holds array items that are not records.
pub fn load(source: &Path) -> Option<Vec<FaqRecord>> {
    let text = match fs::read_to_string(source) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %source.display(), "FAQ data file not found");
            return None;
        }
        Err(e) => {
            error!(path = %source.display(), error = %e, "failed to read FAQ data file");
            return None;
        }
    };

    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            error!(path = %source.display(), error = %e, "FAQ data file is not valid JSON");
            return None;
        }
    };

    if !value.is_array() {
        error!(path = %source.display(), "FAQ data file does not contain a list");
        return None;
    }

    match serde_json::from_value::<Vec<FaqRecord>>(value) {
        Ok(records) => {
            info!(path = %source.display(), count = records.len(), "loaded FAQ data");
            Some(records)
        }
        Err(e) => {
            error!(path = %source.display(), error = %e, "FAQ data file has malformed entries");
            None
        }
    }
}
