// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    log::{LevelFilter, SetLoggerError},
    simplelog::{ColorChoice, Config, TermLogger, TerminalMode},
};

/// Warnings are always shown; each `-v` adds a level.
pub fn level_for_verbosity(verbose: u64) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logs go to stderr so stdout carries only the rendered reports.
pub fn init(verbose: u64) -> Result<(), SetLoggerError> {
    TermLogger::init(
        level_for_verbosity(verbose),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
}
