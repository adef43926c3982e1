// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    failure::{bail, ensure, Error, ResultExt},
    log::error,
    std::{
        fs::File,
        io::{self, BufRead, BufReader},
        path::Path,
    },
    structopt::StructOpt,
    wlan_sweep::{
        capture::{RecordFormat, Records},
        config::SweepConfig,
        frame::SweepFrame,
        process,
        rate::{Cbw, GuardInterval, HT_NUM_MCS},
        render::Renderer,
    },
};

mod logger;
mod opts;
use crate::opts::*;

const STDIN_PATH: &str = "-";

fn main() {
    if let Err(e) = main_res() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn main_res() -> Result<(), Error> {
    match Opt::from_args() {
        Opt::Report(cmd) => do_report(cmd),
        Opt::Encode(cmd) => do_encode(cmd),
    }
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>, Error> {
    if path == Path::new(STDIN_PATH) {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file =
        File::open(path).with_context(|_| format!("failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn do_report(cmd: ReportCmd) -> Result<(), Error> {
    logger::init(cmd.verbose).context("failed to install logger")?;

    let mut config = match &cmd.config {
        Some(path) => SweepConfig::load_from_file(path)?,
        None => SweepConfig::default(),
    };
    if let Some(ssid) = cmd.ssid {
        config.ssid_marker = ssid;
    }
    if cmd.ek {
        config.input_format = RecordFormat::Ek;
    }

    let stdout = io::stdout();
    let mut renderer = Renderer::new(cmd.format, stdout.lock());
    let mut unreadable = 0;
    // Files are independent: one that cannot be opened does not stop the others.
    for path in &cmd.files {
        let input = match open_input(path) {
            Ok(input) => input,
            Err(e) => {
                error!("{}", e);
                unreadable += 1;
                continue;
            }
        };
        let source = path.display().to_string();
        let records = Records::new(input, config.input_format);
        let report = process(&source, records, &config.ssid_marker);
        renderer.render(&report).context("failed to write report")?;
    }
    if unreadable > 0 {
        bail!("{} of {} input files could not be read", unreadable, cmd.files.len());
    }
    Ok(())
}

fn do_encode(cmd: EncodeCmd) -> Result<(), Error> {
    let frame = if cmd.calibration {
        SweepFrame::calibration(cmd.location, cmd.seq, cmd.total, cmd.session)
    } else {
        let mcs = match cmd.mcs {
            Some(mcs) => mcs,
            None => bail!("either --mcs or --calibration is required"),
        };
        ensure!(mcs < HT_NUM_MCS, "MCS {} is outside 0-{}", mcs, HT_NUM_MCS - 1);
        SweepFrame::mcs(
            mcs,
            Cbw::from_ht40(cmd.ht40),
            GuardInterval::from_short(cmd.short_gi),
            cmd.location,
            cmd.seq,
            cmd.total,
            cmd.session,
        )
    };
    let frame = if cmd.legacy { frame.legacy() } else { frame };
    let frame = match &cmd.name {
        Some(name) => frame.with_location_name(name),
        None => frame,
    };
    let frame = match &cmd.ssid {
        Some(ssid) => frame.with_marker(ssid),
        None => frame,
    };
    let tags = frame.tags().context("failed to assemble frame tags")?;
    println!("{}", hex::encode(&tags));
    Ok(())
}
