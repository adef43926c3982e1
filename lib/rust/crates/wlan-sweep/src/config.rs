// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{capture::RecordFormat, meta::DEFAULT_SSID_MARKER},
    failure::{Error, ResultExt},
    serde::Deserialize,
    std::{fs::File, io::BufReader, path::Path},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// SSID the sweep transmitter broadcasts. Frames with any other SSID are ignored.
    pub ssid_marker: String,
    pub input_format: RecordFormat,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            ssid_marker: DEFAULT_SSID_MARKER.to_string(),
            input_format: RecordFormat::default(),
        }
    }
}

impl SweepConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)
            .with_context(|_| format!("failed to open config {}", path.display()))?;
        let config: SweepConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|_| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}
