// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Readers for decoded capture records, one JSON object per line.
//!
//! Two shapes are understood: the native `PacketRecord` schema, and the Elasticsearch bulk
//! form tshark writes with `-x -T ek`, where every packet line is preceded by an index line
//! that carries no `layers` object.

use {
    crate::{phy::ObservedPhy, record::PacketRecord},
    failure::Fail,
    serde::Deserialize,
    serde_json::Value,
    std::{
        convert::TryFrom,
        io::{self, BufRead},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    Native,
    Ek,
}

impl Default for RecordFormat {
    fn default() -> Self {
        RecordFormat::Native
    }
}

#[derive(Debug, Fail)]
pub enum RecordError {
    #[fail(display = "line {}: invalid JSON: {}", line, cause)]
    Json {
        line: usize,
        #[cause]
        cause: serde_json::Error,
    },
    #[fail(display = "line {}: missing or invalid field {}", line, name)]
    Field { line: usize, name: &'static str },
    #[fail(display = "line {}: invalid tag hex: {}", line, cause)]
    Hex {
        line: usize,
        #[cause]
        cause: hex::FromHexError,
    },
    #[fail(display = "read failed: {}", _0)]
    Io(#[cause] io::Error),
}

impl RecordError {
    /// An I/O error ends the stream; every other error concerns a single line.
    pub fn is_fatal(&self) -> bool {
        match self {
            RecordError::Io(_) => true,
            _ => false,
        }
    }
}

const RADIOTAP: &str = "radiotap";
const WLAN_MGT: &str = "wlan_mgt";
const ANTSIGNAL: &str = "radiotap_radiotap_dbm_antsignal";
const DATARATE: &str = "radiotap_radiotap_datarate";
const MCS_GI: &str = "radiotap_mcs_radiotap_mcs_gi";
const MCS_BW: &str = "radiotap_mcs_radiotap_mcs_bw";
const MCS_INDEX: &str = "radiotap_mcs_radiotap_mcs_index";
const TAGGED_ALL_RAW: &str = "wlan_mgt_wlan_mgt_tagged_all_raw";

// Radiotap MCS bandwidth value for 40 MHz. 20L and 20U are 20 MHz transmissions.
const RADIOTAP_MCS_BW_40: i64 = 1;

/// Single values are sometimes wrapped in a one element array.
fn scalar(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        _ => value,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match scalar(value) {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

// Values that do not fit the narrower type are invalid, not wrapped.
fn as_i32(value: &Value) -> Option<i32> {
    as_i64(value).and_then(|n| i32::try_from(n).ok())
}

fn as_u8(value: &Value) -> Option<u8> {
    as_i64(value).and_then(|n| u8::try_from(n).ok())
}

fn as_f64(value: &Value) -> Option<f64> {
    match scalar(value) {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

struct Layer<'a> {
    fields: &'a Value,
    line: usize,
}

impl<'a> Layer<'a> {
    fn get(&self, name: &'static str) -> Option<&'a Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    fn required<T>(
        &self,
        name: &'static str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<T, RecordError> {
        self.get(name).and_then(convert).ok_or(RecordError::Field { line: self.line, name })
    }

    fn optional<T>(
        &self,
        name: &'static str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>, RecordError> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => convert(v).map(Some).ok_or(RecordError::Field { line: self.line, name }),
        }
    }
}

/// Parses one `tshark -T ek` line. Returns None for bulk index lines.
pub fn parse_ek(line_no: usize, line: &str) -> Result<Option<PacketRecord>, RecordError> {
    let value: Value =
        serde_json::from_str(line).map_err(|cause| RecordError::Json { line: line_no, cause })?;
    let layers = match value.get("layers") {
        Some(layers) => layers,
        None => return Ok(None),
    };
    let layer = |name: &'static str| {
        layers
            .get(name)
            .map(|fields| Layer { fields, line: line_no })
            .ok_or(RecordError::Field { line: line_no, name })
    };
    let radiotap = layer(RADIOTAP)?;
    let wlan_mgt = layer(WLAN_MGT)?;

    let signal_dbm = radiotap.required(ANTSIGNAL, as_i32)?;
    let datarate_mbit = radiotap.optional(DATARATE, as_f64)?.unwrap_or(0.0);
    let phy = match radiotap.optional(MCS_INDEX, as_u8)? {
        // Legacy rate frames carry no MCS fields.
        None => ObservedPhy::legacy(signal_dbm, datarate_mbit),
        Some(index) => ObservedPhy {
            signal_dbm,
            datarate_mbit,
            mcs_index: index,
            short_gi: radiotap.optional(MCS_GI, as_i64)?.unwrap_or(0) != 0,
            bandwidth_40: radiotap.optional(MCS_BW, as_i64)? == Some(RADIOTAP_MCS_BW_40),
        },
    };

    let raw = wlan_mgt.required(TAGGED_ALL_RAW, |v| scalar(v).as_str().map(str::to_string))?;
    let tags =
        hex::decode(raw.trim()).map_err(|cause| RecordError::Hex { line: line_no, cause })?;
    Ok(Some(PacketRecord { tags, ssid: None, phy }))
}

/// Parses one native record line.
pub fn parse_native(line_no: usize, line: &str) -> Result<PacketRecord, RecordError> {
    serde_json::from_str(line).map_err(|cause| RecordError::Json { line: line_no, cause })
}

/// Iterates over the records of a JSON-lines stream. Blank lines and EK index lines are skipped.
/// After an I/O error the iterator is exhausted.
pub struct Records<R> {
    lines: io::Lines<R>,
    format: RecordFormat,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> Records<R> {
    pub fn new(reader: R, format: RecordFormat) -> Self {
        Records { lines: reader.lines(), format, line_no: 0, done: false }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<PacketRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(RecordError::Io(e)));
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match self.format {
                RecordFormat::Native => return Some(parse_native(self.line_no, &line)),
                RecordFormat::Ek => match parse_ek(self.line_no, &line) {
                    Ok(None) => continue,
                    Ok(Some(record)) => return Some(Ok(record)),
                    Err(e) => return Some(Err(e)),
                },
            }
        }
        None
    }
}
