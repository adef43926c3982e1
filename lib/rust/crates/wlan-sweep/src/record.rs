// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        meta::{self, DecodeError, TestMetadata},
        phy::{self, ObservedPhy, PhyMismatch},
        session::CellKey,
    },
    failure::Fail,
    serde::{Deserialize, Serialize},
};

/// One received beacon, as produced by the capture decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Raw tagged parameters of the management frame body.
    #[serde(with = "hex_bytes")]
    pub tags: Vec<u8>,
    /// SSID as already extracted by the decoder, if it did so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(flatten)]
    pub phy: ObservedPhy,
}

/// A record whose claims were confirmed by the radio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub meta: TestMetadata,
    pub cell: CellKey,
    pub signal_dbm: i32,
}

#[derive(Debug, Fail)]
pub enum Rejection {
    #[fail(display = "{}", _0)]
    Malformed(#[cause] DecodeError),
    #[fail(display = "foreign ssid {:?}", _0)]
    ForeignSsid(String),
    #[fail(display = "{}", _0)]
    Phy(#[cause] PhyMismatch),
    #[fail(display = "MCS {} is outside the sweep rate table", _0)]
    UnsupportedMcs(u8),
}

impl From<DecodeError> for Rejection {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::ForeignSsid(ssid) => Rejection::ForeignSsid(ssid),
            other => Rejection::Malformed(other),
        }
    }
}

impl From<PhyMismatch> for Rejection {
    fn from(e: PhyMismatch) -> Self {
        Rejection::Phy(e)
    }
}

/// Decodes a record's test metadata and cross-checks it against the observed PHY.
pub fn classify(record: &PacketRecord, ssid_marker: &str) -> Result<Sample, Rejection> {
    if let Some(ssid) = &record.ssid {
        if ssid != ssid_marker {
            return Err(Rejection::ForeignSsid(ssid.clone()));
        }
    }
    let meta = meta::decode_frame(&record.tags[..], ssid_marker)?;
    phy::validate(&meta, &record.phy)?;
    let cell =
        CellKey::for_flags(meta.flags).ok_or(Rejection::UnsupportedMcs(meta.flags.mcs()))?;
    Ok(Sample { meta, cell, signal_dbm: record.phy.signal_dbm })
}

mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            frame::SweepFrame,
            meta::DEFAULT_SSID_MARKER,
            rate::{Cbw, GuardInterval},
        },
        assert_matches::assert_matches,
    };

    fn record(frame: SweepFrame, phy: ObservedPhy) -> PacketRecord {
        PacketRecord { tags: frame.tags().expect("frame tags"), ssid: None, phy }
    }

    fn mcs5_frame() -> SweepFrame<'static> {
        SweepFrame::mcs(5, Cbw::Cbw40, GuardInterval::Short, 2, 17, 100, 9)
    }

    fn ht(mcs_index: u8, bandwidth_40: bool, short_gi: bool) -> ObservedPhy {
        ObservedPhy { signal_dbm: -52, datarate_mbit: 0.0, mcs_index, short_gi, bandwidth_40 }
    }

    #[test]
    fn accepted() {
        let rec = record(mcs5_frame(), ht(5, true, true));
        let sample = classify(&rec, DEFAULT_SSID_MARKER).expect("valid record");
        assert_eq!(-52, sample.signal_dbm);
        assert_eq!(17, sample.meta.packet_seq);
        assert_eq!(9, sample.meta.session_id);
        let cell = CellKey::Mcs { index: 5, cbw: Cbw::Cbw40, gi: GuardInterval::Short };
        assert_eq!(cell, sample.cell);
    }

    #[test]
    fn rejected_on_phy_mismatch() {
        let rec = record(mcs5_frame(), ht(6, true, true));
        assert_matches!(
            classify(&rec, DEFAULT_SSID_MARKER),
            Err(Rejection::Phy(PhyMismatch::McsIndex { claimed: 5, observed: 6 }))
        );
    }

    #[test]
    fn calibration_accepted_at_legacy_rate() {
        let rec = record(SweepFrame::calibration(2, 0, 100, 9), ObservedPhy::legacy(-70, 1.0));
        let sample = classify(&rec, DEFAULT_SSID_MARKER).expect("calibration record");
        assert!(sample.meta.is_calibration());
        assert_eq!(CellKey::Calibration, sample.cell);
    }

    #[test]
    fn mcs_beyond_rate_table() {
        let rec = record(
            SweepFrame::mcs(20, Cbw::Cbw20, GuardInterval::Normal, 2, 0, 100, 9),
            ht(20, false, false),
        );
        assert_matches!(classify(&rec, DEFAULT_SSID_MARKER), Err(Rejection::UnsupportedMcs(20)));
    }

    #[test]
    fn foreign_by_decoder_ssid() {
        let mut rec = record(SweepFrame::calibration(2, 0, 100, 9), ObservedPhy::legacy(-70, 1.0));
        rec.ssid = Some("CoffeeShop".to_string());
        assert_matches!(classify(&rec, DEFAULT_SSID_MARKER), Err(Rejection::ForeignSsid(_)));
    }

    #[test]
    fn foreign_by_ssid_element() {
        let frame = SweepFrame::calibration(2, 0, 100, 9).with_marker("CoffeeShop");
        let rec = record(frame, ObservedPhy::legacy(-70, 1.0));
        assert_matches!(
            classify(&rec, DEFAULT_SSID_MARKER),
            Err(Rejection::ForeignSsid(ref ssid)) if ssid == "CoffeeShop"
        );
    }

    #[test]
    fn malformed_tags() {
        let mut rec = record(SweepFrame::calibration(2, 0, 100, 9), ObservedPhy::legacy(-70, 1.0));
        rec.tags.truncate(15);
        assert_matches!(classify(&rec, DEFAULT_SSID_MARKER), Err(Rejection::Malformed(_)));
    }

    #[test]
    fn json_shape() {
        let line = r#"{"tags":"0008","ssid":"MCS_TEST","signal_dbm":-40,"datarate_mbit":60.0,
                       "mcs_index":3,"short_gi":true,"bandwidth_40":true}"#;
        let rec: PacketRecord = serde_json::from_str(line).expect("parse record");
        assert_eq!(vec![0x00, 0x08], rec.tags);
        assert_eq!(Some("MCS_TEST".to_string()), rec.ssid);
        assert_eq!(ht(3, true, true).cbw(), rec.phy.cbw());
        assert_eq!(-40, rec.phy.signal_dbm);

        let back = serde_json::to_string(&rec).expect("serialize record");
        let again: PacketRecord = serde_json::from_str(&back).expect("reparse record");
        assert_eq!(rec, again);
    }

    #[test]
    fn json_bad_hex() {
        let line = r#"{"tags":"0g","signal_dbm":-40,"datarate_mbit":1.0,
                       "mcs_index":0,"short_gi":false,"bandwidth_40":false}"#;
        assert!(serde_json::from_str::<PacketRecord>(line).is_err());
    }
}
