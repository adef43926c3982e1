// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Test metadata the sweep transmitter embeds in every frame.
//!
//! The SSID element carries a fixed marker and element 10 carries a packed big-endian record:
//!
//! ```text
//!   byte 0      flags: bit 7 HT40, bit 6 short GI, bits 0-5 MCS (0xFF = calibration)
//!   byte 1      location code
//!   bytes 2-5   packet sequence number
//!   bytes 6-9   packets sent per rate
//!   bytes 10-13 session id (absent in the 10 byte form written by older rigs)
//! ```

use {
    crate::{
        ie::{Id, ScanError, TagMap},
        rate::{Cbw, GuardInterval},
    },
    failure::Fail,
    std::mem::size_of,
    zerocopy::{
        byteorder::{BigEndian, U32},
        AsBytes, FromBytes, LayoutVerified, Unaligned,
    },
};

pub const DEFAULT_SSID_MARKER: &str = "MCS_TEST";

#[repr(C)]
#[derive(Debug, PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy)]
pub struct TxFlags(pub u8);

impl TxFlags {
    pub const CALIBRATION: Self = Self(0xFF);

    const HT40: u8 = 1 << 7;
    const SHORT_GI: u8 = 1 << 6;
    const MCS_MASK: u8 = 0x3F;

    pub fn new(mcs: u8, cbw: Cbw, gi: GuardInterval) -> Self {
        let mut flags = mcs & Self::MCS_MASK;
        if cbw.is_40() {
            flags |= Self::HT40;
        }
        if gi.is_short() {
            flags |= Self::SHORT_GI;
        }
        TxFlags(flags)
    }

    pub fn is_calibration(self) -> bool {
        self == Self::CALIBRATION
    }

    pub fn ht40(self) -> bool {
        self.0 & Self::HT40 != 0
    }

    pub fn short_gi(self) -> bool {
        self.0 & Self::SHORT_GI != 0
    }

    pub fn mcs(self) -> u8 {
        self.0 & Self::MCS_MASK
    }

    pub fn cbw(self) -> Cbw {
        Cbw::from_ht40(self.ht40())
    }

    pub fn gi(self) -> GuardInterval {
        GuardInterval::from_short(self.short_gi())
    }
}

#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy)]
pub struct LegacySweepFields {
    pub flags: TxFlags,
    pub location: u8,
    pub packet_seq: U32<BigEndian>,
    pub total_count: U32<BigEndian>,
}

#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy)]
pub struct SweepFields {
    pub legacy: LegacySweepFields,
    pub session_id: U32<BigEndian>,
}

pub const LEGACY_SWEEP_LEN: usize = size_of::<LegacySweepFields>();
pub const SWEEP_LEN: usize = size_of::<SweepFields>();

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SweepFormat {
    /// 10 bytes, no session id.
    Legacy,
    /// 14 bytes, trailing session id.
    Session,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TestMetadata {
    pub flags: TxFlags,
    pub location: u8,
    pub packet_seq: u32,
    pub total_count: u32,
    /// Always 0 for `SweepFormat::Legacy`.
    pub session_id: u32,
    pub format: SweepFormat,
}

impl TestMetadata {
    fn from_fields(fields: &LegacySweepFields, session_id: u32, format: SweepFormat) -> Self {
        TestMetadata {
            flags: fields.flags,
            location: fields.location,
            packet_seq: fields.packet_seq.get(),
            total_count: fields.total_count.get(),
            session_id,
            format,
        }
    }

    pub fn is_calibration(&self) -> bool {
        self.flags.is_calibration()
    }

    /// Body of the sweep element in this metadata's format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let legacy = LegacySweepFields {
            flags: self.flags,
            location: self.location,
            packet_seq: U32::new(self.packet_seq),
            total_count: U32::new(self.total_count),
        };
        match self.format {
            SweepFormat::Legacy => legacy.as_bytes().to_vec(),
            SweepFormat::Session => {
                SweepFields { legacy, session_id: U32::new(self.session_id) }.as_bytes().to_vec()
            }
        }
    }
}

#[derive(Debug, Fail)]
pub enum DecodeError {
    #[fail(display = "malformed elements: {}", _0)]
    Scan(#[cause] ScanError),
    #[fail(display = "required element {} is absent", _0)]
    MissingElement(Id),
    #[fail(display = "sweep element has unsupported length {}", _0)]
    BadSweepLength(usize),
    #[fail(display = "frame is not part of a sweep; ssid {:?}", _0)]
    ForeignSsid(String),
}

impl From<ScanError> for DecodeError {
    fn from(e: ScanError) -> Self {
        DecodeError::Scan(e)
    }
}

pub fn decode_sweep_element(body: &[u8]) -> Result<TestMetadata, DecodeError> {
    match body.len() {
        LEGACY_SWEEP_LEN => {
            let fields = LayoutVerified::<_, LegacySweepFields>::new_unaligned(body)
                .ok_or(DecodeError::BadSweepLength(body.len()))?;
            Ok(TestMetadata::from_fields(&fields, 0, SweepFormat::Legacy))
        }
        SWEEP_LEN => {
            let fields = LayoutVerified::<_, SweepFields>::new_unaligned(body)
                .ok_or(DecodeError::BadSweepLength(body.len()))?;
            Ok(TestMetadata::from_fields(
                &fields.legacy,
                fields.session_id.get(),
                SweepFormat::Session,
            ))
        }
        other => Err(DecodeError::BadSweepLength(other)),
    }
}

pub fn decode(tags: &TagMap, ssid_marker: &str) -> Result<TestMetadata, DecodeError> {
    let ssid = tags.get(Id::SSID).ok_or(DecodeError::MissingElement(Id::SSID))?;
    let sweep = tags.get(Id::SWEEP_META).ok_or(DecodeError::MissingElement(Id::SWEEP_META))?;
    if ssid != ssid_marker.as_bytes() {
        return Err(DecodeError::ForeignSsid(String::from_utf8_lossy(ssid).into_owned()));
    }
    decode_sweep_element(sweep)
}

/// Scans a frame's tagged parameters and decodes its test metadata.
pub fn decode_frame(tag_bytes: &[u8], ssid_marker: &str) -> Result<TestMetadata, DecodeError> {
    let tags = TagMap::parse(tag_bytes)?;
    decode(&tags, ssid_marker)
}
