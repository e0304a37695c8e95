//! Sample sinks for the console and files.

use radee_common::output::SampleSink;
use radee_common::{Cancellation, Sample};

pub mod console;
pub mod csv;

/// Passes samples through and requests a stop once enough have been seen.
#[derive(Debug)]
pub struct SampleLimit<S> {
    inner: S,
    remaining: Option<u64>,
    cancel: Cancellation,
}

impl<S: SampleSink> SampleLimit<S> {
    /// With `limit` of `None`, samples pass through forever.
    pub fn new(inner: S, limit: Option<u64>, cancel: Cancellation) -> SampleLimit<S> {
        SampleLimit {
            inner,
            remaining: limit,
            cancel,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SampleSink> SampleSink for SampleLimit<S> {
    fn accept(&mut self, sample: Sample) {
        if let Some(0) = self.remaining {
            return;
        }

        self.inner.accept(sample);
        if let Some(ref mut remaining) = self.remaining {
            *remaining -= 1;
            if *remaining == 0 {
                self.cancel.cancel();
            }
        }
    }

    fn flush(&mut self) {
        self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radee_common::clock::Timestamp;

    #[test]
    fn stops_after_limit() {
        let cancel = Cancellation::new();
        let mut limited = SampleLimit::new(Vec::new(), Some(2), cancel.clone());

        limited.accept(Sample::new(Timestamp::from_secs(1), 10));
        assert!(!cancel.is_cancelled());
        limited.accept(Sample::new(Timestamp::from_secs(2), 20));
        assert!(cancel.is_cancelled());
        limited.accept(Sample::new(Timestamp::from_secs(3), 30));

        assert_eq!(limited.into_inner().len(), 2);
    }

    #[test]
    fn unlimited_never_cancels() {
        let cancel = Cancellation::new();
        let mut limited = SampleLimit::new(Vec::new(), None, cancel.clone());
        for n in 0..100 {
            limited.accept(Sample::new(Timestamp::from_secs(n), n as u16));
        }
        assert!(!cancel.is_cancelled());
    }
}
