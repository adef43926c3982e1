// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        meta::TestMetadata,
        rate::{Cbw, GuardInterval},
    },
    failure::Fail,
    serde::{Deserialize, Serialize},
};

/// PHY parameters the receiving radio reported for a frame (radiotap).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedPhy {
    pub signal_dbm: i32,
    pub datarate_mbit: f64,
    pub mcs_index: u8,
    pub short_gi: bool,
    pub bandwidth_40: bool,
}

impl ObservedPhy {
    /// MCS index reported for frames that carried no HT MCS field.
    pub const NO_MCS: u8 = 0xFF;

    /// A frame received at a legacy (non-HT) rate.
    pub fn legacy(signal_dbm: i32, datarate_mbit: f64) -> Self {
        ObservedPhy {
            signal_dbm,
            datarate_mbit,
            mcs_index: Self::NO_MCS,
            short_gi: false,
            bandwidth_40: false,
        }
    }

    pub fn cbw(&self) -> Cbw {
        Cbw::from_ht40(self.bandwidth_40)
    }

    pub fn gi(&self) -> GuardInterval {
        GuardInterval::from_short(self.short_gi)
    }
}

#[derive(Debug, Fail, PartialEq, Eq, Clone, Copy)]
pub enum PhyMismatch {
    #[fail(display = "HT mismatch: claimed {:?}, observed {:?}", claimed, observed)]
    Bandwidth { claimed: Cbw, observed: Cbw },
    #[fail(display = "GI mismatch: claimed {:?}, observed {:?}", claimed, observed)]
    GuardInterval { claimed: GuardInterval, observed: GuardInterval },
    #[fail(display = "MCS index mismatch: claimed {}, observed {}", claimed, observed)]
    McsIndex { claimed: u8, observed: u8 },
}

/// Checks the transmitter's claimed rate against what the radio observed. Every field must
/// match exactly. Calibration frames go out at a legacy rate and are not compared.
pub fn validate(meta: &TestMetadata, observed: &ObservedPhy) -> Result<(), PhyMismatch> {
    if meta.is_calibration() {
        return Ok(());
    }
    let claimed = meta.flags;
    if claimed.cbw() != observed.cbw() {
        return Err(PhyMismatch::Bandwidth { claimed: claimed.cbw(), observed: observed.cbw() });
    }
    if claimed.gi() != observed.gi() {
        return Err(PhyMismatch::GuardInterval { claimed: claimed.gi(), observed: observed.gi() });
    }
    if claimed.mcs() != observed.mcs_index {
        return Err(PhyMismatch::McsIndex { claimed: claimed.mcs(), observed: observed.mcs_index });
    }
    Ok(())
}
