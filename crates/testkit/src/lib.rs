#![warn(missing_docs)]
//! Test support for the crop engine: event logs, golden snapshots, farm
//! fixtures, storage doubles and sampling helpers.

mod backend;
mod fixtures;
mod micro_worldtest;
mod snapshot;
mod stats;

use anyhow::{Context, Result};
use cropcraft_core::SimTick;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use backend::*;
pub use fixtures::*;
pub use micro_worldtest::*;
pub use snapshot::*;
pub use stats::*;

/// One line of a headless test's event log.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a, P: Serialize> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Event label, e.g. `"Planted"` or `"ChunkUnloaded"`.
    pub kind: &'a str,
    /// Event-specific data.
    pub payload: P,
}

/// Newline-delimited JSON event log.
pub struct JsonlSink {
    writer: BufWriter<File>,
    lines: usize,
}

impl JsonlSink {
    /// Create a sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Append an event.
    pub fn write<P: Serialize>(&mut self, event: &EventRecord<'_, P>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Events written so far.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Flush buffered events to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
