// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Tagged parameters of a sweep beacon, as the transmitting rig assembles them.

use {
    crate::{
        ie::{write_element, Id},
        meta::{SweepFormat, TestMetadata, TxFlags, DEFAULT_SSID_MARKER},
        rate::{Cbw, GuardInterval},
    },
    failure::Error,
};

/// The rig writes the description into a 64 byte C string.
pub const DESCRIPTION_MAX_LEN: usize = 63;

pub struct SweepFrame<'a> {
    pub ssid_marker: &'a str,
    pub meta: TestMetadata,
    pub location_name: Option<&'a str>,
}

impl<'a> SweepFrame<'a> {
    pub fn new(meta: TestMetadata) -> Self {
        SweepFrame { ssid_marker: DEFAULT_SSID_MARKER, meta, location_name: None }
    }

    /// A frame carrying one packet of the given rate cell.
    pub fn mcs(
        mcs: u8,
        cbw: Cbw,
        gi: GuardInterval,
        location: u8,
        packet_seq: u32,
        total_count: u32,
        session_id: u32,
    ) -> Self {
        Self::new(TestMetadata {
            flags: TxFlags::new(mcs, cbw, gi),
            location,
            packet_seq,
            total_count,
            session_id,
            format: SweepFormat::Session,
        })
    }

    /// A legacy rate calibration frame.
    pub fn calibration(location: u8, packet_seq: u32, total_count: u32, session_id: u32) -> Self {
        Self::new(TestMetadata {
            flags: TxFlags::CALIBRATION,
            location,
            packet_seq,
            total_count,
            session_id,
            format: SweepFormat::Session,
        })
    }

    pub fn with_marker(mut self, ssid_marker: &'a str) -> Self {
        self.ssid_marker = ssid_marker;
        self
    }

    pub fn with_location_name(mut self, name: &'a str) -> Self {
        self.location_name = Some(name);
        self
    }

    /// Emit the 10 byte element older rigs wrote; it carries no session id.
    pub fn legacy(mut self) -> Self {
        self.meta.format = SweepFormat::Legacy;
        self.meta.session_id = 0;
        self
    }

    /// Human readable summary carried in the description element.
    pub fn description(&self) -> String {
        let meta = &self.meta;
        let rate = if meta.is_calibration() {
            "Non-MCS Calibration".to_string()
        } else {
            format!(
                "MCS {} {}{}",
                meta.flags.mcs(),
                meta.flags.cbw().label(),
                if meta.flags.short_gi() { " short-gi" } else { "" }
            )
        };
        let mut text = format!(
            "{} Packet {} of {} Location {} Name {} Session {}",
            rate,
            meta.packet_seq,
            meta.total_count,
            meta.location,
            self.location_name.unwrap_or("n/a"),
            meta.session_id
        );
        if text.len() > DESCRIPTION_MAX_LEN {
            let mut end = DESCRIPTION_MAX_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        text
    }

    /// SSID, sweep metadata and description elements, in transmit order.
    pub fn tags(&self) -> Result<Vec<u8>, Error> {
        let mut buf = vec![];
        write_element(&mut buf, Id::SSID, self.ssid_marker.as_bytes())?;
        write_element(&mut buf, Id::SWEEP_META, &self.meta.to_bytes()[..])?;
        write_element(&mut buf, Id::SWEEP_DESCRIPTION, self.description().as_bytes())?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{ie::TagMap, meta::decode_frame},
    };

    #[test]
    fn mcs_description() {
        let frame = SweepFrame::mcs(12, Cbw::Cbw20, GuardInterval::Normal, 2, 0, 10, 1)
            .with_location_name("roof");
        assert_eq!("MCS 12 20MHz Packet 0 of 10 Location 2 Name roof Session 1", frame.description());

        // A long sweep fills the field and loses the tail of the session id.
        let frame = SweepFrame::mcs(3, Cbw::Cbw40, GuardInterval::Short, 1, 7, 100, 42);
        assert_eq!(
            "MCS 3 40MHz short-gi Packet 7 of 100 Location 1 Name n/a Sessio",
            frame.description()
        );
    }

    #[test]
    fn calibration_description() {
        let frame = SweepFrame::calibration(4, 0, 5, 3);
        let text = frame.description();
        assert_eq!("Non-MCS Calibration Packet 0 of 5 Location 4 Name n/a Session 3", text);
        assert_eq!(DESCRIPTION_MAX_LEN, text.len());

        let frame = SweepFrame::calibration(4, 9, 50, 3);
        assert_eq!(
            "Non-MCS Calibration Packet 9 of 50 Location 4 Name n/a Session ",
            frame.description()
        );
    }

    #[test]
    fn description_is_truncated() {
        let frame = SweepFrame::calibration(4, 9, 50, 3)
            .with_location_name("the far end of the parking structure");
        let text = frame.description();
        assert_eq!(DESCRIPTION_MAX_LEN, text.len());
        assert!(text.starts_with("Non-MCS Calibration Packet 9 of 50 Location 4 Name the far"));
    }

    #[test]
    fn tags_in_transmit_order() {
        let frame = SweepFrame::mcs(5, Cbw::Cbw20, GuardInterval::Short, 1, 2, 3, 4);
        let bytes = frame.tags().expect("frame tags");
        #[rustfmt::skip]
        assert_eq!(
            &bytes[..20],
            &[
                0, 8, b'M', b'C', b'S', b'_', b'T', b'E', b'S', b'T',
                10, 14, 0b0100_0101, 1,
                0, 0, 0, 2,
                0, 0,
            ][..]
        );
        let tags = TagMap::parse(&bytes[..]).expect("parse frame");
        let ids: Vec<_> = tags.iter().map(|(id, _)| id).collect();
        assert_eq!(vec![Id::SSID, Id::SWEEP_META, Id::SWEEP_DESCRIPTION], ids);
    }

    #[test]
    fn frame_decodes_to_its_metadata() {
        let frame = SweepFrame::mcs(15, Cbw::Cbw40, GuardInterval::Short, 8, 99, 100, 0xabcd);
        let bytes = frame.tags().unwrap();
        assert_eq!(frame.meta, decode_frame(&bytes[..], DEFAULT_SSID_MARKER).unwrap());

        let legacy = SweepFrame::mcs(15, Cbw::Cbw40, GuardInterval::Short, 8, 99, 100, 0xabcd)
            .legacy();
        let decoded = decode_frame(&legacy.tags().unwrap()[..], DEFAULT_SSID_MARKER).unwrap();
        assert_eq!(SweepFormat::Legacy, decoded.format);
        assert_eq!(0, decoded.session_id);
        assert_eq!(99, decoded.packet_seq);
    }

    #[test]
    fn custom_marker() {
        let bytes = SweepFrame::calibration(1, 0, 1, 1).with_marker("SURVEY").tags().unwrap();
        assert!(decode_frame(&bytes[..], "SURVEY").is_ok());
    }
}
