// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-session aggregation of validated samples.
//!
//! A session holds one `RateCell` per (MCS, bandwidth, guard interval) combination of the sweep
//! plus one for calibration frames. Each cell maps location -> packet sequence -> signal, so a
//! retransmitted or twice-captured packet replaces its earlier sample instead of adding one.

use {
    crate::{
        meta::TxFlags,
        record::{self, PacketRecord, Rejection, Sample},
        rate::{Cbw, GuardInterval, HT_NUM_MCS},
    },
    log::{debug, warn},
    serde::Serialize,
    std::collections::{btree_map, BTreeMap},
};

const CBW_PER_MCS: usize = 2;
const GI_PER_CBW: usize = 2;
pub const GRID_CELLS: usize = HT_NUM_MCS as usize * CBW_PER_MCS * GI_PER_CBW;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CellKey {
    Calibration,
    Mcs { index: u8, cbw: Cbw, gi: GuardInterval },
}

impl CellKey {
    /// None for a claimed MCS index the sweep never transmits.
    pub fn for_flags(flags: TxFlags) -> Option<Self> {
        if flags.is_calibration() {
            Some(CellKey::Calibration)
        } else if flags.mcs() < HT_NUM_MCS {
            Some(CellKey::Mcs { index: flags.mcs(), cbw: flags.cbw(), gi: flags.gi() })
        } else {
            None
        }
    }

    fn grid_index(self) -> Option<usize> {
        match self {
            CellKey::Calibration => None,
            CellKey::Mcs { index, cbw, gi } => Some(
                index as usize * CBW_PER_MCS * GI_PER_CBW + cbw as usize * GI_PER_CBW + gi as usize,
            ),
        }
    }

    fn from_grid_index(i: usize) -> Self {
        let gi = GuardInterval::from_short(i % GI_PER_CBW == 1);
        let cbw = Cbw::from_ht40((i / GI_PER_CBW) % CBW_PER_MCS == 1);
        CellKey::Mcs { index: (i / (CBW_PER_MCS * GI_PER_CBW)) as u8, cbw, gi }
    }
}

/// Samples of one rate cell: location -> packet sequence -> signal (dBm).
#[derive(Debug, Default, Clone)]
pub struct RateCell {
    locations: BTreeMap<u8, BTreeMap<u32, i32>>,
}

impl RateCell {
    /// Returns the signal previously stored for this packet, if any.
    pub fn insert(&mut self, location: u8, packet_seq: u32, signal_dbm: i32) -> Option<i32> {
        self.locations.entry(location).or_insert_with(BTreeMap::new).insert(packet_seq, signal_dbm)
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn locations(&self) -> btree_map::Iter<'_, u8, BTreeMap<u32, i32>> {
        self.locations.iter()
    }

    pub fn samples(&self, location: u8) -> Option<&BTreeMap<u32, i32>> {
        self.locations.get(&location)
    }

    pub fn unique_packet_count(&self, location: u8) -> usize {
        self.samples(location).map_or(0, |s| s.len())
    }
}

#[derive(Debug)]
pub struct Session {
    id: u32,
    total_count: u32,
    calibration: RateCell,
    grid: Box<[RateCell]>,
}

impl Session {
    pub fn new(id: u32, total_count: u32) -> Self {
        Session {
            id,
            total_count,
            calibration: RateCell::default(),
            grid: vec![RateCell::default(); GRID_CELLS].into_boxed_slice(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Packets sent per rate cell, as claimed by the first record seen for this session.
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn cell(&self, key: CellKey) -> &RateCell {
        match key.grid_index() {
            None => &self.calibration,
            Some(i) => &self.grid[i],
        }
    }

    fn cell_mut(&mut self, key: CellKey) -> &mut RateCell {
        match key.grid_index() {
            None => &mut self.calibration,
            Some(i) => &mut self.grid[i],
        }
    }

    /// Returns true if the sample's packet had not been seen before.
    pub fn insert(&mut self, sample: &Sample) -> bool {
        let meta = &sample.meta;
        let cell = self.cell_mut(sample.cell);
        cell.insert(meta.location, meta.packet_seq, sample.signal_dbm).is_none()
    }

    /// Cells in report order: calibration, then MCS 0-15 x {20, 40} MHz x {normal, short} GI.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, &RateCell)> + '_ {
        std::iter::once((CellKey::Calibration, &self.calibration)).chain(
            self.grid.iter().enumerate().map(|(i, cell)| (CellKey::from_grid_index(i), cell)),
        )
    }
}

/// Per-file counts of how records were disposed of.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub records: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub malformed: u64,
    pub foreign: u64,
    pub phy_mismatch: u64,
    pub unsupported_mcs: u64,
    pub unreadable: u64,
}

impl Tally {
    pub fn rejected(&self) -> u64 {
        self.malformed + self.foreign + self.phy_mismatch + self.unsupported_mcs
    }
}

/// Sessions of one capture file, keyed by session id.
pub struct Registry {
    ssid_marker: String,
    sessions: BTreeMap<u32, Session>,
    tally: Tally,
}

impl Registry {
    pub fn new(ssid_marker: impl Into<String>) -> Self {
        Registry {
            ssid_marker: ssid_marker.into(),
            sessions: BTreeMap::new(),
            tally: Tally::default(),
        }
    }

    /// Classifies one record and, if it validates, folds it into its session.
    pub fn ingest(&mut self, record: &PacketRecord) -> Result<(), Rejection> {
        self.tally.records += 1;
        match record::classify(record, &self.ssid_marker) {
            Ok(sample) => {
                self.insert(&sample);
                Ok(())
            }
            Err(rejection) => {
                match &rejection {
                    Rejection::Malformed(e) => {
                        self.tally.malformed += 1;
                        debug!("skipping malformed record: {}", e);
                    }
                    Rejection::ForeignSsid(ssid) => {
                        self.tally.foreign += 1;
                        debug!("ignoring frame for ssid {:?}", ssid);
                    }
                    Rejection::Phy(e) => {
                        self.tally.phy_mismatch += 1;
                        warn!("rejecting record: {}", e);
                    }
                    Rejection::UnsupportedMcs(mcs) => {
                        self.tally.unsupported_mcs += 1;
                        debug!("ignoring record claiming MCS {}", mcs);
                    }
                }
                Err(rejection)
            }
        }
    }

    /// Adds a validated sample. The session is created on first sight of its id and keeps the
    /// total count of that first sample.
    pub fn insert(&mut self, sample: &Sample) {
        let meta = &sample.meta;
        let session = self
            .sessions
            .entry(meta.session_id)
            .or_insert_with(|| Session::new(meta.session_id, meta.total_count));
        if session.total_count() != meta.total_count {
            debug!(
                "session {}: ignoring total count {} (fixed at {})",
                meta.session_id,
                meta.total_count,
                session.total_count()
            );
        }
        if session.insert(sample) {
            self.tally.accepted += 1;
        } else {
            self.tally.duplicates += 1;
        }
    }

    /// Counts a record the capture decoder could not produce.
    pub fn note_unreadable(&mut self) {
        self.tally.records += 1;
        self.tally.unreadable += 1;
    }

    pub fn session(&self, id: u32) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn sessions(&self) -> btree_map::Values<'_, u32, Session> {
        self.sessions.values()
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{frame::SweepFrame, meta::DEFAULT_SSID_MARKER, phy::ObservedPhy},
        assert_matches::assert_matches,
    };

    fn mcs3(location: u8, packet_seq: u32, total: u32, session: u32) -> SweepFrame<'static> {
        SweepFrame::mcs(3, Cbw::Cbw40, GuardInterval::Short, location, packet_seq, total, session)
    }

    fn record(frame: SweepFrame, signal_dbm: i32) -> PacketRecord {
        let phy = if frame.meta.is_calibration() {
            ObservedPhy::legacy(signal_dbm, 1.0)
        } else {
            ObservedPhy {
                signal_dbm,
                datarate_mbit: 0.0,
                mcs_index: frame.meta.flags.mcs(),
                short_gi: frame.meta.flags.short_gi(),
                bandwidth_40: frame.meta.flags.ht40(),
            }
        };
        PacketRecord { tags: frame.tags().expect("frame tags"), ssid: None, phy }
    }

    const MCS3: CellKey = CellKey::Mcs { index: 3, cbw: Cbw::Cbw40, gi: GuardInterval::Short };

    #[test]
    fn grid_index_roundtrip() {
        for i in 0..GRID_CELLS {
            assert_eq!(Some(i), CellKey::from_grid_index(i).grid_index());
        }
        let first = CellKey::Mcs { index: 0, cbw: Cbw::Cbw20, gi: GuardInterval::Normal };
        assert_eq!(Some(0), first.grid_index());
        let last = CellKey::Mcs { index: 15, cbw: Cbw::Cbw40, gi: GuardInterval::Short };
        assert_eq!(Some(GRID_CELLS - 1), last.grid_index());
        assert_eq!(None, CellKey::Calibration.grid_index());
    }

    #[test]
    fn cells_in_report_order() {
        let session = Session::new(1, 10);
        let keys: Vec<_> = session.cells().map(|(key, _)| key).take(6).collect();
        assert_eq!(
            vec![
                CellKey::Calibration,
                CellKey::Mcs { index: 0, cbw: Cbw::Cbw20, gi: GuardInterval::Normal },
                CellKey::Mcs { index: 0, cbw: Cbw::Cbw20, gi: GuardInterval::Short },
                CellKey::Mcs { index: 0, cbw: Cbw::Cbw40, gi: GuardInterval::Normal },
                CellKey::Mcs { index: 0, cbw: Cbw::Cbw40, gi: GuardInterval::Short },
                CellKey::Mcs { index: 1, cbw: Cbw::Cbw20, gi: GuardInterval::Normal },
            ],
            keys
        );
        assert_eq!(GRID_CELLS + 1, session.cells().count());
        assert!(session.cells().all(|(_, cell)| cell.is_empty()));
    }

    #[test]
    fn duplicate_packet_replaces_sample() {
        let mut registry = Registry::new(DEFAULT_SSID_MARKER);
        registry.ingest(&record(mcs3(1, 5, 100, 42), -40)).expect("first copy");
        registry.ingest(&record(mcs3(1, 5, 100, 42), -47)).expect("second copy");

        let cell = registry.session(42).expect("session 42").cell(MCS3);
        assert_eq!(1, cell.unique_packet_count(1));
        assert_eq!(Some(&-47), cell.samples(1).and_then(|s| s.get(&5)));

        let tally = registry.tally();
        assert_eq!(2, tally.records);
        assert_eq!(1, tally.accepted);
        assert_eq!(1, tally.duplicates);
    }

    #[test]
    fn first_total_count_wins() {
        let mut registry = Registry::new(DEFAULT_SSID_MARKER);
        registry.ingest(&record(mcs3(1, 0, 100, 7), -40)).unwrap();
        registry.ingest(&record(mcs3(1, 1, 5000, 7), -40)).unwrap();
        let session = registry.session(7).expect("session 7");
        assert_eq!(100, session.total_count());
        assert_eq!(2, session.cell(MCS3).unique_packet_count(1));
    }

    #[test]
    fn sessions_are_separate() {
        let mut registry = Registry::new(DEFAULT_SSID_MARKER);
        registry.ingest(&record(mcs3(1, 0, 100, 7), -40)).unwrap();
        registry.ingest(&record(mcs3(1, 0, 50, 8), -41)).unwrap();
        registry.ingest(&record(mcs3(1, 0, 10, 0).legacy(), -42)).unwrap();
        let ids: Vec<_> = registry.sessions().map(|s| s.id()).collect();
        assert_eq!(vec![0, 7, 8], ids);
        assert_eq!(10, registry.session(0).unwrap().total_count());
        assert_eq!(50, registry.session(8).unwrap().total_count());
    }

    #[test]
    fn calibration_cell() {
        let mut registry = Registry::new(DEFAULT_SSID_MARKER);
        registry.ingest(&record(SweepFrame::calibration(2, 0, 10, 3), -60)).unwrap();
        let session = registry.session(3).unwrap();
        assert_eq!(1, session.cell(CellKey::Calibration).unique_packet_count(2));
        assert!(session.cells().skip(1).all(|(_, cell)| cell.is_empty()));
    }

    #[test]
    fn rejected_records_leave_no_state() {
        let mut registry = Registry::new(DEFAULT_SSID_MARKER);

        let mut mismatched = record(mcs3(1, 0, 100, 9), -40);
        mismatched.phy.mcs_index = 4;
        assert_matches!(registry.ingest(&mismatched), Err(Rejection::Phy(_)));

        let foreign = record(mcs3(1, 0, 100, 9).with_marker("OTHER"), -40);
        assert_matches!(registry.ingest(&foreign), Err(Rejection::ForeignSsid(_)));

        let mut truncated = record(mcs3(1, 0, 100, 9), -40);
        truncated.tags.truncate(3);
        assert_matches!(registry.ingest(&truncated), Err(Rejection::Malformed(_)));

        registry.note_unreadable();

        assert!(registry.session(9).is_none());
        assert_eq!(0, registry.sessions().count());
        assert_eq!(
            Tally {
                records: 4,
                accepted: 0,
                duplicates: 0,
                malformed: 1,
                foreign: 1,
                phy_mismatch: 1,
                unsupported_mcs: 0,
                unreadable: 1,
            },
            registry.tally()
        );
        assert_eq!(3, registry.tally().rejected());
    }
}
