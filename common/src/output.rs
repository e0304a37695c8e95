/*! Where samples go once a cycle completes.

A [`SampleSink`] sits inline in the acquisition loop, so `accept` has to return quickly.
Sinks that touch files or terminals should be wrapped in a [`QueuedSink`],
which hands samples to a writer thread over a bounded channel.
 */

use std::fmt;
use std::io;
use std::sync::mpsc;
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::sample::Sample;

/// Receiver of completed samples.
pub trait SampleSink {
    /// Take ownership of a completed sample. Must not block for long.
    fn accept(&mut self, sample: Sample);

    /// Push out anything buffered.
    fn flush(&mut self) {  }
}

impl SampleSink for Vec<Sample> {
    fn accept(&mut self, sample: Sample) {
        self.push(sample);
    }
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn accept(&mut self, sample: Sample) {
        (**self).accept(sample)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Several sinks fed the same samples, in the order they were added.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn SampleSink + Send>>,
}

impl SinkSet {
    /// Create an empty set.
    pub fn new() -> SinkSet {
        SinkSet::default()
    }

    /// Add a sink to the set.
    pub fn push(&mut self, sink: Box<dyn SampleSink + Send>) {
        self.sinks.push(sink);
    }

    /// Returns true if there are no sinks in the set.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl SampleSink for SinkSet {
    fn accept(&mut self, sample: Sample) {
        for sink in &mut self.sinks {
            sink.accept(sample);
        }
    }

    fn flush(&mut self) {
        for sink in &mut self.sinks {
            sink.flush();
        }
    }
}

/** Sink that forwards samples to another sink running on its own thread.

The queue is bounded. When the writer falls behind and the queue is full,
new samples are dropped and counted instead of stalling acquisition.
Dropping the `QueuedSink` (or calling [`QueuedSink::close`]) lets the writer drain the queue,
flushes the inner sink, and joins the thread.
 */
#[derive(Debug)]
pub struct QueuedSink {
    sender: Option<SyncSender<Sample>>,
    writer: Option<JoinHandle<()>>,
    dropped: u64,
}

impl QueuedSink {
    /// Queue capacity used by the binary.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Start a writer thread owning `inner`.
    pub fn spawn<S>(inner: S, capacity: usize) -> io::Result<QueuedSink>
    where
        S: SampleSink + Send + 'static,
    {
        let (schannel, rchannel) = mpsc::sync_channel::<Sample>(capacity);

        let writer = thread::Builder::new()
            .name("sample-writer".to_string())
            .spawn(move || {
                debug!("writer: started");

                let mut inner = inner;
                // Ends once the sending side is dropped and the queue is empty.
                for sample in rchannel {
                    inner.accept(sample);
                }
                inner.flush();

                debug!("writer: exiting");
            })?;

        Ok(QueuedSink {
            sender: Some(schannel),
            writer: Some(writer),
            dropped: 0,
        })
    }

    /// Returns how many samples were discarded because the writer could not keep up.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drain the queue and stop the writer thread.
    pub fn close(mut self) -> u64 {
        self.shutdown();
        self.dropped
    }

    fn shutdown(&mut self) {
        drop(self.sender.take());
        if let Some(writer) = self.writer.take() {
            writer.join().unwrap_or_else(|_e| {
                warn!("writer: thread panicked; some samples may be lost");
            });
        }
    }
}

impl SampleSink for QueuedSink {
    fn accept(&mut self, sample: Sample) {
        let sender = match self.sender {
            Some(ref sender) => sender,
            None => {
                self.dropped += 1;
                return;
            },
        };

        match sender.try_send(sample) {
            Ok(()) => (),
            Err(TrySendError::Full(sample)) => {
                self.dropped += 1;
                warn!("writer: queue full, dropped sample {}", sample);
            },
            Err(TrySendError::Disconnected(sample)) => {
                self.dropped += 1;
                warn!("writer: thread gone, dropped sample {}", sample);
            },
        }
    }
}

impl Drop for QueuedSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::clock::Timestamp;

    #[derive(Clone, Default)]
    struct Shared {
        seen: Arc<Mutex<Vec<Sample>>>,
        flushed: Arc<Mutex<bool>>,
    }

    impl SampleSink for Shared {
        fn accept(&mut self, sample: Sample) {
            self.seen.lock().unwrap().push(sample);
        }

        fn flush(&mut self) {
            *self.flushed.lock().unwrap() = true;
        }
    }

    fn sample(n: u16) -> Sample {
        Sample::new(Timestamp::from_secs(1_600_000_000 + n as u64), n)
    }

    #[test]
    fn queued_sink_preserves_order() {
        let shared = Shared::default();
        let mut queued = QueuedSink::spawn(shared.clone(), 64).unwrap();
        for n in 0..50 {
            queued.accept(sample(n));
        }
        assert_eq!(queued.close(), 0);

        let seen = shared.seen.lock().unwrap();
        let codes: Vec<u16> = seen.iter().map(|s| s.voltage_code()).collect();
        assert_eq!(codes, (0..50).collect::<Vec<u16>>());
        assert!(*shared.flushed.lock().unwrap());
    }

    #[test]
    fn sink_set_fans_out() {
        let a = Shared::default();
        let b = Shared::default();
        let mut set = SinkSet::new();
        assert!(set.is_empty());
        set.push(Box::new(a.clone()));
        set.push(Box::new(b.clone()));

        set.accept(sample(7));
        set.flush();

        assert_eq!(*a.seen.lock().unwrap(), vec![sample(7)]);
        assert_eq!(*b.seen.lock().unwrap(), vec![sample(7)]);
        assert!(*b.flushed.lock().unwrap());
    }

    #[test]
    fn sink_set_debug_counts_sinks() {
        let mut set = SinkSet::new();
        set.push(Box::new(Shared::default()));
        set.push(Box::new(Shared::default()));
        assert_eq!(format!("{:?}", set), "SinkSet { sinks: 2 }");
    }

    #[test]
    fn vec_collects() {
        let mut v: Vec<Sample> = Vec::new();
        v.accept(sample(1));
        v.accept(sample(2));
        assert_eq!(v.len(), 2);
    }
}
