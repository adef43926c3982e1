// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {std::path::PathBuf, structopt::StructOpt, wlan_sweep::render::Format};

#[derive(StructOpt, Debug)]
pub enum Opt {
    #[structopt(name = "report")]
    /// summarize reception per session, rate and location for each capture file
    Report(ReportCmd),
    #[structopt(name = "encode")]
    /// print the hex tag body a sweep transmitter embeds in a beacon
    Encode(EncodeCmd),
}

#[derive(StructOpt, Debug)]
pub struct ReportCmd {
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    /// JSON file with `ssid_marker` and `input_format`
    pub config: Option<PathBuf>,
    #[structopt(long = "ek")]
    /// input is `tshark -x -T ek` output rather than native records
    pub ek: bool,
    #[structopt(short = "f", long = "format", default_value = "text")]
    /// text, markdown, csv or json
    pub format: Format,
    #[structopt(long = "ssid")]
    /// SSID marking sweep frames (default MCS_TEST)
    pub ssid: Option<String>,
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    /// log more; repeat for more detail
    pub verbose: u64,
    #[structopt(name = "FILE", parse(from_os_str), raw(required = "true"))]
    /// decoded capture files, one record per line; `-` reads stdin
    pub files: Vec<PathBuf>,
}

#[derive(StructOpt, Debug)]
pub struct EncodeCmd {
    #[structopt(long = "location")]
    pub location: u8,
    #[structopt(long = "seq")]
    pub seq: u32,
    #[structopt(long = "total")]
    /// packets sent per rate cell
    pub total: u32,
    #[structopt(long = "session", default_value = "0")]
    pub session: u32,
    #[structopt(long = "mcs", raw(required_unless = "\"calibration\""))]
    pub mcs: Option<u8>,
    #[structopt(long = "ht40")]
    pub ht40: bool,
    #[structopt(long = "short-gi")]
    pub short_gi: bool,
    #[structopt(
        long = "calibration",
        raw(conflicts_with_all = "&[\"mcs\", \"ht40\", \"short_gi\"]")
    )]
    /// legacy rate calibration frame
    pub calibration: bool,
    #[structopt(long = "legacy")]
    /// write the 10 byte element without a session id
    pub legacy: bool,
    #[structopt(long = "name")]
    /// location name for the description element
    pub name: Option<String>,
    #[structopt(long = "ssid")]
    pub ssid: Option<String>,
}
