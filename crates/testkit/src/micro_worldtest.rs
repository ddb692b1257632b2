//! Micro-worldtests: step a tiny farm for a fixed number of ticks and
//! snapshot a summary after each one.
//!
//! Each tick covers `tick_seconds` of simulated time, so a handful of frames
//! can span a whole crop lifecycle. The report is checked against a golden
//! JSON file (see [`assert_json_snapshot`](crate::assert_json_snapshot)).

use crate::snapshot::assert_json_snapshot;
use anyhow::Result;
use cropcraft_core::SimTick;
use serde::Serialize;
use std::path::PathBuf;

/// Parameters of one micro-worldtest.
#[derive(Debug, Clone)]
pub struct MicroWorldtestConfig {
    /// Name written into the report.
    pub name: String,
    /// Ticks to step; the report holds `ticks + 1` frames.
    pub ticks: u64,
    /// Simulated seconds per tick.
    pub tick_seconds: f64,
    /// Golden file location.
    pub snapshot_path: PathBuf,
}

/// Summary captured after a tick.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Captured summary.
    pub snapshot: S,
}

#[derive(Debug, Clone, Serialize)]
struct MicroWorldtestReport<S> {
    name: String,
    tick_seconds: u64,
    frames: Vec<MicroWorldtestFrame<S>>,
}

/// Run a micro-worldtest and check its report against `config.snapshot_path`.
///
/// `step` receives the tick being simulated and the seconds it covers.
pub fn run_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: MicroWorldtestConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<()>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, f64, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut tick = SimTick::ZERO;
    let mut frames = Vec::with_capacity(config.ticks as usize + 1);
    frames.push(MicroWorldtestFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    });

    for _ in 0..config.ticks {
        step(tick, config.tick_seconds, &mut state);
        tick = tick.advance(1);
        frames.push(MicroWorldtestFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }

    assert_json_snapshot(
        config.snapshot_path,
        &MicroWorldtestReport {
            name: config.name,
            tick_seconds: config.tick_seconds.round() as u64,
            frames,
        },
    )
}
