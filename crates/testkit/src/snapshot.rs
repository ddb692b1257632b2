//! Golden-file JSON snapshots.
//!
//! Values are written as pretty JSON with object keys sorted, so a snapshot
//! only changes when the data does. Set `CROPCRAFT_UPDATE_SNAPSHOTS=1` to
//! rewrite the golden files instead of comparing against them.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Environment variable that switches snapshot assertions to update mode.
pub const UPDATE_SNAPSHOTS_ENV: &str = "CROPCRAFT_UPDATE_SNAPSHOTS";

/// Compare `value` with the golden file at `path`, or rewrite it in update mode.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let actual = render_snapshot(value)?;

    if update_requested() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
        }
        return fs::write(path, &actual)
            .with_context(|| format!("Failed to write snapshot {}", path.display()));
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "No snapshot at {}; rerun with {UPDATE_SNAPSHOTS_ENV}=1 to record it",
            path.display()
        )
    })?;
    // Golden files checked out on Windows may carry CRLF line endings.
    if expected.replace("\r\n", "\n") != actual {
        anyhow::bail!(
            "Snapshot {} is out of date; rerun with {UPDATE_SNAPSHOTS_ENV}=1 to accept\n--- expected\n{expected}\n--- actual\n{actual}",
            path.display()
        );
    }
    Ok(())
}

/// The exact text a snapshot of `value` is stored as.
pub fn render_snapshot<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let mut text =
        serde_json::to_string_pretty(&sort_keys(value)).context("Failed to format snapshot JSON")?;
    text.push('\n');
    Ok(text)
}

fn update_requested() -> bool {
    std::env::var(UPDATE_SNAPSHOTS_ENV)
        .map(|flag| matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
