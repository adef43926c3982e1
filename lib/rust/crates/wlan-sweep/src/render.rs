// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        report::{CellStats, FileReport, Row, SessionReport},
        session::CellKey,
    },
    failure::{format_err, Error},
    std::{fmt, io::Write, str::FromStr},
};

const CALIBRATION_LABEL: &str = "1mbit Non-MCS Calibration";
const CSV_HEADER: [&str; 8] = ["file", "session", "location", "rate", "seen", "min", "avg", "max"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Markdown,
    Csv,
    Json,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "markdown" | "md" => Ok(Format::Markdown),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            other => Err(format_err!("unknown report format {:?}", other)),
        }
    }
}

/// Writes file reports one after another to `out`. CSV output carries a single header line
/// ahead of the first report; JSON output is one report object per line.
pub struct Renderer<W: Write> {
    format: Format,
    out: W,
    csv_header_written: bool,
}

struct Signal<'a>(&'a CellStats);

impl fmt::Display for Signal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} dBm/{:.1} dBm/{} dBm",
            self.0.min_signal, self.0.avg_signal, self.0.max_signal
        )
    }
}

fn mcs_fields(cell: CellKey) -> Option<(u8, &'static str, &'static str)> {
    match cell {
        CellKey::Calibration => None,
        CellKey::Mcs { index, cbw, gi } => Some((index, cbw.label(), gi.label())),
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(format: Format, out: W) -> Self {
        Renderer { format, out, csv_header_written: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, report: &FileReport) -> Result<(), Error> {
        match self.format {
            Format::Text => self.text(report)?,
            Format::Markdown => self.markdown(report)?,
            Format::Csv => self.csv(report)?,
            Format::Json => {
                serde_json::to_writer(&mut self.out, report)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn text(&mut self, report: &FileReport) -> Result<(), Error> {
        writeln!(self.out, "MCS pcap: {}", report.source)?;
        writeln!(self.out, "Sessions found: {}", report.sessions.len())?;
        for session in &report.sessions {
            writeln!(
                self.out,
                "Session {}: {} packets per rate",
                session.session_id, session.total_count
            )?;
            for row in &session.rows {
                self.text_row(row)?;
            }
        }
        Ok(())
    }

    fn text_row(&mut self, row: &Row) -> Result<(), Error> {
        let location = match row.location {
            Some(l) => format!("Location {}", l),
            None => "Location --".to_string(),
        };
        match (mcs_fields(row.cell), &row.stats) {
            (None, Some(stats)) => writeln!(
                self.out,
                "Calibration 1mbit                {:12} {:.2}% {}",
                location,
                stats.percentage,
                Signal(stats)
            )?,
            (None, None) => {}
            (Some((mcs, cbw, gi)), Some(stats)) => writeln!(
                self.out,
                "MCS {:2} {:5} {:8} {:10} {:12} {:.2}% {}",
                mcs,
                cbw,
                gi,
                format!("{} mbit", row.nominal_rate),
                location,
                stats.percentage,
                Signal(stats)
            )?,
            (Some((mcs, cbw, gi)), None) => writeln!(
                self.out,
                "MCS {:2} {:5} {:8} {:10} {:12} {:.2}%",
                mcs,
                cbw,
                gi,
                format!("{} mbit", row.nominal_rate),
                location,
                0.0
            )?,
        }
        Ok(())
    }

    fn markdown(&mut self, report: &FileReport) -> Result<(), Error> {
        writeln!(self.out, "## MCS pcap: {}", report.source)?;
        writeln!(self.out, "Sessions found: {}", report.sessions.len())?;
        for session in &report.sessions {
            self.markdown_session(session)?;
        }
        Ok(())
    }

    fn markdown_session(&mut self, session: &SessionReport) -> Result<(), Error> {
        writeln!(self.out, "### Session {}", session.session_id)?;
        writeln!(self.out, "Packets per rate: {}", session.total_count)?;
        writeln!(self.out, "|Rate|Location                |% Seen|Min/Avg/Max|")?;
        writeln!(self.out, "|----|-----------------------|-------|-----------|")?;
        for row in &session.rows {
            let rate = match mcs_fields(row.cell) {
                None => CALIBRATION_LABEL.to_string(),
                Some((mcs, cbw, gi)) => {
                    format!("{} {} {} {} mbit", mcs, cbw, gi, row.nominal_rate)
                }
            };
            match (row.location, &row.stats) {
                (Some(location), Some(stats)) => writeln!(
                    self.out,
                    "|{}|Location {}|{:.2}%|{}|",
                    rate,
                    location,
                    stats.percentage,
                    Signal(stats)
                )?,
                _ => writeln!(self.out, "|{}|Location --|0.00%|-- dBm/-- dBm/-- dBm|", rate)?,
            }
        }
        Ok(())
    }

    fn csv(&mut self, report: &FileReport) -> Result<(), Error> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(&mut self.out);
        if !self.csv_header_written {
            writer.write_record(&CSV_HEADER)?;
            self.csv_header_written = true;
        }
        for session in &report.sessions {
            let session_id = session.session_id.to_string();
            for row in &session.rows {
                let rate = match row.cell {
                    CellKey::Calibration => CALIBRATION_LABEL.to_string(),
                    CellKey::Mcs { .. } => row.nominal_rate.to_string(),
                };
                let location = row.location.map_or("--".to_string(), |l| l.to_string());
                let stats = match &row.stats {
                    Some(s) => [
                        format!("{:.2}", s.percentage),
                        s.min_signal.to_string(),
                        format!("{:.1}", s.avg_signal),
                        s.max_signal.to_string(),
                    ],
                    None => ["0".to_string(), "0".to_string(), "0".to_string(), "0".to_string()],
                };
                writer.write_record(
                    [&report.source, &session_id, &location, &rate]
                        .iter()
                        .map(|s| s.as_str())
                        .chain(stats.iter().map(|s| s.as_str())),
                )?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
