// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Nominal HT PHY rates for the MCS indices a sweep exercises.
//!
//! IEEE Std 802.11-2016, Tables 19-27 and 19-28 (one and two spatial streams).

use serde::Serialize;

/// A sweep covers MCS 0-15 (one and two spatial streams).
pub const HT_NUM_MCS: u8 = 16;

/// Rate of the legacy (non-HT) calibration transmission, in Mbit/s.
pub const CALIBRATION_RATE_MBIT: f64 = 1.0;

/// HT channel bandwidth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Cbw {
    Cbw20 = 0,
    Cbw40 = 1,
}

impl Cbw {
    pub fn from_ht40(ht40: bool) -> Self {
        if ht40 {
            Cbw::Cbw40
        } else {
            Cbw::Cbw20
        }
    }

    pub fn is_40(self) -> bool {
        self == Cbw::Cbw40
    }

    pub fn label(self) -> &'static str {
        match self {
            Cbw::Cbw20 => "20MHz",
            Cbw::Cbw40 => "40MHz",
        }
    }
}

/// HT guard interval: 800ns (normal) or 400ns (short).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GuardInterval {
    Normal = 0,
    Short = 1,
}

impl GuardInterval {
    pub fn from_short(short_gi: bool) -> Self {
        if short_gi {
            GuardInterval::Short
        } else {
            GuardInterval::Normal
        }
    }

    pub fn is_short(self) -> bool {
        self == GuardInterval::Short
    }

    /// The normal guard interval has no label in reports.
    pub fn label(self) -> &'static str {
        match self {
            GuardInterval::Normal => "",
            GuardInterval::Short => "Short-GI",
        }
    }
}

// Indexed as [mcs][cbw][gi].
#[rustfmt::skip]
const HT_RATES: [[[f64; 2]; 2]; HT_NUM_MCS as usize] = [
    //  20 MHz          40 MHz
    // 800ns  400ns    800ns  400ns
    [[  6.5,   7.2], [ 13.5,  15.0]], // MCS 0
    [[ 13.0,  14.4], [ 27.0,  30.0]], // MCS 1
    [[ 19.5,  21.7], [ 40.5,  45.0]], // MCS 2
    [[ 26.0,  28.9], [ 54.0,  60.0]], // MCS 3
    [[ 39.0,  43.3], [ 81.0,  90.0]], // MCS 4
    [[ 52.0,  57.8], [108.0, 120.0]], // MCS 5
    [[ 58.5,  65.0], [121.5, 135.0]], // MCS 6
    [[ 65.0,  72.2], [135.0, 150.0]], // MCS 7
    [[ 13.0,  14.4], [ 27.0,  30.0]], // MCS 8
    [[ 26.0,  28.9], [ 54.0,  60.0]], // MCS 9
    [[ 39.0,  43.3], [ 81.0,  90.0]], // MCS 10
    [[ 52.0,  57.8], [108.0, 120.0]], // MCS 11
    [[ 78.0,  86.7], [162.0, 180.0]], // MCS 12
    [[104.0, 115.6], [216.0, 240.0]], // MCS 13
    [[117.0, 130.0], [243.0, 270.0]], // MCS 14
    [[130.0, 144.4], [270.0, 300.0]], // MCS 15
];

/// Returns the published rate in Mbit/s, or None if `mcs` is outside 0-15.
pub fn nominal_rate(mcs: u8, cbw: Cbw, gi: GuardInterval) -> Option<f64> {
    HT_RATES.get(mcs as usize).map(|by_cbw| by_cbw[cbw as usize][gi as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_check_published_rates() {
        assert_eq!(Some(6.5), nominal_rate(0, Cbw::Cbw20, GuardInterval::Normal));
        assert_eq!(Some(150.0), nominal_rate(7, Cbw::Cbw40, GuardInterval::Short));
        assert_eq!(Some(300.0), nominal_rate(15, Cbw::Cbw40, GuardInterval::Short));
        assert_eq!(Some(86.7), nominal_rate(12, Cbw::Cbw20, GuardInterval::Short));
        assert_eq!(Some(121.5), nominal_rate(6, Cbw::Cbw40, GuardInterval::Normal));
    }

    #[test]
    fn every_cell_has_a_rate() {
        for mcs in 0..HT_NUM_MCS {
            for &cbw in &[Cbw::Cbw20, Cbw::Cbw40] {
                for &gi in &[GuardInterval::Normal, GuardInterval::Short] {
                    let rate = nominal_rate(mcs, cbw, gi).expect("rate for sweep cell");
                    assert!(rate > 0.0);
                }
            }
        }
    }

    #[test]
    fn short_gi_and_wider_channel_are_faster() {
        for mcs in 0..HT_NUM_MCS {
            let base = nominal_rate(mcs, Cbw::Cbw20, GuardInterval::Normal).unwrap();
            assert!(nominal_rate(mcs, Cbw::Cbw20, GuardInterval::Short).unwrap() > base);
            assert!(nominal_rate(mcs, Cbw::Cbw40, GuardInterval::Normal).unwrap() > base);
        }
    }

    #[test]
    fn out_of_range_mcs() {
        assert_eq!(None, nominal_rate(16, Cbw::Cbw20, GuardInterval::Normal));
        assert_eq!(None, nominal_rate(63, Cbw::Cbw40, GuardInterval::Short));
    }

    #[test]
    fn labels() {
        assert_eq!("40MHz", Cbw::from_ht40(true).label());
        assert_eq!("20MHz", Cbw::from_ht40(false).label());
        assert_eq!("Short-GI", GuardInterval::from_short(true).label());
        assert_eq!("", GuardInterval::from_short(false).label());
    }
}
