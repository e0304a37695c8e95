//! Printing samples as they arrive.

use std::io;
use std::io::Write;

use radee_common::Sample;
use radee_common::output::SampleSink;
use tracing::warn;

/// Writes one `timestamp, code` line per sample.
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> ConsoleSink<io::Stdout> {
        ConsoleSink::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> ConsoleSink<W> {
        ConsoleSink {
            out,
        }
    }
}

impl<W: Write> SampleSink for ConsoleSink<W> {
    fn accept(&mut self, sample: Sample) {
        if let Err(e) = writeln!(self.out, "{}", sample) {
            warn!("console: could not print sample: {}", e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("console: failed to flush: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radee_common::clock::Timestamp;

    #[test]
    fn prints_time_and_code() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.accept(Sample::new(Timestamp::from_secs(1_571_234_567), 564));
        sink.accept(Sample::new(Timestamp::from_secs(1_571_234_568), 3));
        assert_eq!(String::from_utf8(sink.out).unwrap(),
                   "1571234567, 564\n1571234568, 3\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn write_errors_do_not_stop_the_sink() {
        let mut sink = ConsoleSink::new(BrokenPipe);
        sink.accept(Sample::new(Timestamp::from_secs(1), 1));
        sink.flush();
        sink.accept(Sample::new(Timestamp::from_secs(2), 2));
    }
}
