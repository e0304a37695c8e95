//! CSV output for samples.

use std::fs::{File, OpenOptions};
use std::io;
use std::io::{BufWriter, Write};
use std::path::Path;

use radee_common::Sample;
use radee_common::output::SampleSink;
use tracing::warn;

const HEADER: &str = "timestamp,voltage_code";

/// Appends `timestamp,voltage_code` rows.
#[derive(Debug)]
pub struct CSVSampleWriter<W: Write> {
    writer: BufWriter<W>,
    header_pending: bool,
}

impl CSVSampleWriter<File> {
    /// Open `path` for appending, creating it if needed.
    ///
    /// The header row is only written to an empty file.
    pub fn append(path: &Path) -> io::Result<CSVSampleWriter<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let empty = file.metadata()?.len() == 0;

        Ok(CSVSampleWriter::new(file, empty))
    }
}

impl<W: Write> CSVSampleWriter<W> {
    pub fn new(out: W, write_header: bool) -> CSVSampleWriter<W> {
        CSVSampleWriter {
            writer: BufWriter::new(out),
            header_pending: write_header,
        }
    }

    fn write_row(&mut self, sample: &Sample) -> io::Result<()> {
        if self.header_pending {
            writeln!(self.writer, "{}", HEADER)?;
            self.header_pending = false;
        }
        writeln!(self.writer, "{}", format_row(sample))
    }
}

impl<W: Write> SampleSink for CSVSampleWriter<W> {
    fn accept(&mut self, sample: Sample) {
        if let Err(e) = self.write_row(&sample) {
            warn!("csv: failed to write sample {}: {}", sample, e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("csv: failed to flush: {}", e);
        }
    }
}

/// One CSV row, without line ending.
pub fn format_row(sample: &Sample) -> String {
    format!("{},{}", sample.timestamp(), sample.voltage_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use radee_common::clock::Timestamp;

    #[test]
    fn row_format() {
        let sample = Sample::new(Timestamp::from_secs(1_571_234_567), 1023);
        assert_eq!(format_row(&sample), "1571234567,1023");
    }

    #[test]
    fn header_once() {
        let mut csv = CSVSampleWriter::new(Vec::new(), true);
        csv.accept(Sample::new(Timestamp::from_secs(10), 1));
        csv.accept(Sample::new(Timestamp::from_secs(11), 2));
        csv.flush();

        let text = String::from_utf8(csv.writer.get_ref().clone()).unwrap();
        assert_eq!(text, "timestamp,voltage_code\n10,1\n11,2\n");
    }

    #[test]
    fn no_header_when_appending() {
        let mut csv = CSVSampleWriter::new(Vec::new(), false);
        csv.accept(Sample::new(Timestamp::from_secs(10), 1));
        csv.flush();
        assert_eq!(csv.writer.get_ref().as_slice(), b"10,1\n");
    }
}
