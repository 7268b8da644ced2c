//! Channel list loading from `channels.json`.
//!
//! The file is a JSON array of channel usernames, with or without a leading
//! `@`. A missing or malformed file yields an empty list: the worker keeps
//! running and simply has nothing to poll.

use std::path::Path;

use tracing::warn;

pub fn load_channels(path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Channel list not readable");
            return Vec::new();
        }
    };

    match parse_channels(&raw) {
        Ok(channels) => channels,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Channel list is not a JSON array of strings");
            Vec::new()
        }
    }
}

pub fn parse_channels(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    let entries: Vec<String> = serde_json::from_str(raw)?;

    let mut channels: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.trim().trim_start_matches('@').to_string();
        if name.is_empty() || channels.contains(&name) {
            continue;
        }
        channels.push(name);
    }
    Ok(channels)
}
