// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Correlation of MCS sweep test transmissions with what a monitoring radio received.
//!
//! A sweep rig transmits beacons at every HT rate it is asked to test, each carrying its claimed
//! rate, location and packet sequence in a vendor element. This crate decodes those claims from
//! captured frames, checks them against the PHY the receiver observed, and reports the share of
//! unique packets received and their signal strength per session, rate and location.

pub mod capture;
pub mod config;
pub mod frame;
pub mod ie;
pub mod meta;
pub mod phy;
pub mod rate;
pub mod record;
pub mod render;
pub mod report;
pub mod session;

use {
    crate::{
        capture::RecordError, record::PacketRecord, report::FileReport, session::Registry,
    },
    log::{info, warn},
};

/// Runs one capture file's records through decoding, validation and aggregation.
///
/// Records that fail to parse or validate are counted and skipped. A fatal stream error stops
/// processing and the report covers the records consumed up to that point.
pub fn process<I>(source: &str, records: I, ssid_marker: &str) -> FileReport
where
    I: IntoIterator<Item = Result<PacketRecord, RecordError>>,
{
    let mut registry = Registry::new(ssid_marker);
    for record in records {
        match record {
            // Rejections are counted and logged by the registry.
            Ok(record) => {
                let _ = registry.ingest(&record);
            }
            Err(e) if e.is_fatal() => {
                warn!("{}: {}; reporting partial results", source, e);
                registry.note_unreadable();
                break;
            }
            Err(e) => {
                warn!("{}: skipping record: {}", source, e);
                registry.note_unreadable();
            }
        }
    }
    let report = FileReport::from_registry(source, &registry);
    let tally = &report.tally;
    info!(
        "{}: {} records, {} accepted, {} duplicates, {} rejected, {} unreadable, {} sessions",
        source,
        tally.records,
        tally.accepted,
        tally.duplicates,
        tally.rejected(),
        tally.unreadable,
        report.sessions.len()
    );
    report
}
