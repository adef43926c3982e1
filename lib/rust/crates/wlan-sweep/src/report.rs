// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Reception statistics per session, rate cell and location.

use {
    crate::{
        rate::{nominal_rate, CALIBRATION_RATE_MBIT},
        session::{CellKey, Registry, Session, Tally},
    },
    serde::Serialize,
    std::collections::BTreeMap,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub source: String,
    pub sessions: Vec<SessionReport>,
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session_id: u32,
    pub total_count: u32,
    pub rows: Vec<Row>,
}

/// One reported (rate cell, location) pair. A cell that received nothing at any location is
/// reported once with neither a location nor statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub cell: CellKey,
    pub nominal_rate: f64,
    pub location: Option<u8>,
    pub stats: Option<CellStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellStats {
    pub unique_packets: usize,
    pub percentage: f64,
    pub min_signal: i32,
    pub avg_signal: f64,
    pub max_signal: i32,
}

impl CellStats {
    /// None when there are no samples.
    pub fn compute(samples: &BTreeMap<u32, i32>, total_count: u32) -> Option<Self> {
        let min_signal = *samples.values().min()?;
        let max_signal = *samples.values().max()?;
        let unique_packets = samples.len();
        let sum: i64 = samples.values().map(|&s| i64::from(s)).sum();
        let percentage = if total_count == 0 {
            0.0
        } else {
            100.0 * unique_packets as f64 / f64::from(total_count)
        };
        Some(CellStats {
            unique_packets,
            percentage,
            min_signal,
            avg_signal: sum as f64 / unique_packets as f64,
            max_signal,
        })
    }
}

impl Row {
    pub fn is_placeholder(&self) -> bool {
        self.location.is_none()
    }
}

fn cell_rate(cell: CellKey) -> f64 {
    match cell {
        CellKey::Calibration => CALIBRATION_RATE_MBIT,
        // Every grid cell is within the rate table.
        CellKey::Mcs { index, cbw, gi } => nominal_rate(index, cbw, gi).unwrap_or(0.0),
    }
}

impl SessionReport {
    pub fn from_session(session: &Session) -> Self {
        let mut rows = vec![];
        for (cell, rate_cell) in session.cells() {
            let nominal_rate = cell_rate(cell);
            if rate_cell.is_empty() {
                if cell != CellKey::Calibration {
                    rows.push(Row { cell, nominal_rate, location: None, stats: None });
                }
                continue;
            }
            for (&location, samples) in rate_cell.locations() {
                rows.push(Row {
                    cell,
                    nominal_rate,
                    location: Some(location),
                    stats: CellStats::compute(samples, session.total_count()),
                });
            }
        }
        SessionReport { session_id: session.id(), total_count: session.total_count(), rows }
    }
}

impl FileReport {
    pub fn from_registry(source: impl Into<String>, registry: &Registry) -> Self {
        FileReport {
            source: source.into(),
            sessions: registry.sessions().map(SessionReport::from_session).collect(),
            tally: registry.tally(),
        }
    }

    pub fn session(&self, id: u32) -> Option<&SessionReport> {
        self.sessions.iter().find(|s| s.session_id == id)
    }
}
