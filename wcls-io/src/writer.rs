//! File writers for per-channel electron records.

use crate::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use wcls_core::SimChannel;

/// Output layout of a [`SimChannelWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One row per IDE.
    #[default]
    Csv,
    /// One JSON object per channel and event.
    JsonLines,
}

impl OutputFormat {
    /// Picks a format from the file extension: `.jsonl` and `.json` give
    /// JSON lines, anything else CSV.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("jsonl" | "json") => Self::JsonLines,
            _ => Self::Csv,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" | "json" => Ok(Self::JsonLines),
            other => Err(Error::InvalidFormat(format!("unknown output format '{other}'"))),
        }
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    event: u64,
    #[serde(flatten)]
    simchannel: &'a SimChannel,
}

/// Writer for simulated channel output.
///
/// Writes the per-channel IDEs of successive events to one file.
pub struct SimChannelWriter {
    writer: BufWriter<File>,
    format: OutputFormat,
    header_written: bool,
    rows: usize,
}

impl SimChannelWriter {
    /// Creates a new file writer, choosing the format from the extension.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = OutputFormat::from_path(&path);
        Self::create_with_format(path, format)
    }

    pub fn create_with_format<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            format,
            header_written: false,
            rows: 0,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Rows written so far: IDEs for CSV, channels for JSON lines.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Writes the channels produced for event `event`.
    pub fn write_event(&mut self, event: u64, channels: &[SimChannel]) -> Result<()> {
        match self.format {
            OutputFormat::Csv => self.write_csv(event, channels),
            OutputFormat::JsonLines => self.write_json_lines(event, channels),
        }
    }

    fn write_csv(&mut self, event: u64, channels: &[SimChannel]) -> Result<()> {
        if !self.header_written {
            writeln!(
                self.writer,
                "event,channel,tdc,track_id,num_electrons,energy,x,y,z,orig_track_id"
            )?;
            self.header_written = true;
        }
        for sc in channels {
            for (tdc, ides) in sc.tdc_ides() {
                for ide in ides {
                    writeln!(
                        self.writer,
                        "{},{},{},{},{},{},{},{},{},{}",
                        event,
                        sc.channel(),
                        tdc,
                        ide.track_id,
                        ide.num_electrons,
                        ide.energy,
                        ide.x,
                        ide.y,
                        ide.z,
                        ide.orig_track_id
                    )?;
                    self.rows += 1;
                }
            }
        }
        Ok(())
    }

    fn write_json_lines(&mut self, event: u64, channels: &[SimChannel]) -> Result<()> {
        for simchannel in channels {
            serde_json::to_writer(&mut self.writer, &JsonLine { event, simchannel })?;
            writeln!(self.writer)?;
            self.rows += 1;
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn channels() -> Vec<SimChannel> {
        let mut a = SimChannel::new(12);
        a.add_ionization_electrons(3, 20, 100.0, [1.0, 2.0, 3.0], 0.5, -999);
        a.add_ionization_electrons(4, 21, 10.0, [1.0, 2.0, 3.0], 0.05, 1);
        let b = SimChannel::new(13);
        vec![a, b]
    }

    fn read(file: &tempfile::NamedTempFile) -> String {
        let mut contents = String::new();
        File::open(file.path())
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }

    #[test]
    fn test_write_csv() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let mut writer = SimChannelWriter::create(file.path()).unwrap();
        assert_eq!(writer.format(), OutputFormat::Csv);
        writer.write_event(1, &channels()).unwrap();
        writer.write_event(2, &channels()[..1]).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.rows(), 4);

        let contents = read(&file);
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "event,channel,tdc,track_id,num_electrons,energy,x,y,z,orig_track_id"
        );
        assert_eq!(lines[1], "1,12,20,3,100,0.5,1,2,3,-999");
        assert!(lines[3].starts_with("2,12,20,"));
    }

    #[test]
    fn test_write_json_lines() {
        let file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        let mut writer = SimChannelWriter::create(file.path()).unwrap();
        assert_eq!(writer.format(), OutputFormat::JsonLines);
        writer.write_event(5, &channels()).unwrap();
        writer.flush().unwrap();

        let contents = read(&file);
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], 5);
        assert_eq!(lines[0]["channel"], 12);
        assert_eq!(lines[0]["tdc_ides"]["21"][0]["track_id"], 4);
        assert_eq!(lines[1]["channel"], 13);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::JsonLines);
        assert!("hdf5".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::from_path("out.txt"), OutputFormat::Csv);
    }
}
