/*! The event-triggered acquisition sequence.

Each cycle runs through the same fixed steps:

1. wait for a rising edge on the edge pin (the only unbounded wait),
2. sleep for the peak delay so the shaped pulse reaches its maximum,
3. assert hold, read the wall clock, do exactly one ADC transfer, release hold,
4. sleep for the settle delay, then pulse the reset line,
5. hand the finished [`Sample`] to the caller.

A failed transfer aborts only the cycle it happened in.
On every way out of a cycle or of [`Sequencer::run`], hold and reset are left low.
 */

use std::error;
use std::fmt;
use std::fmt::Display;

use tracing::{debug, info, trace, warn};

use crate::cancel::Cancellation;
use crate::clock::{Clock, Timestamp};
use crate::codec::{AdcCodec, CodecError};
use crate::config::AcquisitionConfig;
use crate::io::{BusError, BusInterface, EdgeWait, Level};
use crate::output::SampleSink;
use crate::sample::Sample;

type Result<T> = std::result::Result<T, AcquisitionFailure>;

/// A cycle that did not produce a sample.
#[derive(Debug)]
pub enum AcquisitionFailure {
    /// Waiting for the edge failed.
    EdgeWait(BusError),
    /// Driving an output line failed.
    Output {
        /// Pin that could not be driven.
        pin: u8,
        /// Underlying bus error.
        cause: BusError,
    },
    /// The ADC transfer failed.
    Transfer(BusError),
    /// The ADC response could not be decoded.
    Codec(CodecError),
}

impl error::Error for AcquisitionFailure {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        use AcquisitionFailure::*;
        match self {
            EdgeWait(ref e) => Some(e),
            Output { ref cause, .. } => Some(cause),
            Transfer(ref e) => Some(e),
            Codec(ref e) => Some(e),
        }
    }
}

impl Display for AcquisitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use AcquisitionFailure::*;
        match self {
            EdgeWait(ref e) => write!(f, "failed waiting for edge: {}", e),
            Output { pin, ref cause } => write!(f, "failed to drive P{:02}: {}", pin, cause),
            Transfer(ref e) => write!(f, "ADC transfer failed: {}", e),
            Codec(ref e) => write!(f, "ADC response unusable: {}", e),
        }
    }
}

impl AcquisitionFailure {
    /// Short name of the failure category, for tallies.
    pub fn kind(&self) -> &'static str {
        use AcquisitionFailure::*;
        match self {
            EdgeWait(_) => "edge wait",
            Output { .. } => "output",
            Transfer(_) => "transfer",
            Codec(_) => "codec",
        }
    }
}

impl From<CodecError> for AcquisitionFailure {
    fn from(e: CodecError) -> Self {
        AcquisitionFailure::Codec(e)
    }
}

/// Where the sequencer is in its cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Between cycles.
    Idle,
    /// Blocked on the edge input.
    WaitingForEdge,
    /// Letting the pulse reach its peak.
    Peaking,
    /// Hold asserted, converting.
    Holding,
    /// Settling and pulsing reset.
    Resetting,
    /// Cancelled; outputs released.
    Stopped,
}

impl Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use State::*;
        let name = match self {
            Idle => "idle",
            WaitingForEdge => "waiting for edge",
            Peaking => "peaking",
            Holding => "holding",
            Resetting => "resetting",
            Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

/// Totals for one call to [`Sequencer::run`].
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Samples handed to the sink.
    pub samples: u64,
    /// Cycles aborted by a recoverable failure.
    pub failures: u64,
    /// Failure that ended the run early, if any.
    pub fault: Option<AcquisitionFailure>,
}

/// Drives one detector channel through repeated acquisition cycles.
#[derive(Debug)]
pub struct Sequencer<B, C> {
    config: AcquisitionConfig,
    codec: Box<dyn AdcCodec>,
    bus: B,
    clock: C,
    state: State,
}

impl<B, C> Sequencer<B, C>
where
    B: BusInterface,
    C: Clock,
{
    /** Create a sequencer with exclusive use of `bus`.

    `config` was validated when it was built, so nothing here touches hardware or can fail.
    The codec strategy comes from [`AcquisitionConfig::codec`].
     */
    pub fn new(config: AcquisitionConfig, bus: B, clock: C) -> Sequencer<B, C> {
        Sequencer {
            codec: config.codec().codec(),
            config,
            bus,
            clock,
            state: State::Idle,
        }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Returns the current state.
    pub fn state(&self) -> State {
        self.state
    }

    /** Run a single acquisition cycle.

    Returns `Ok(None)` if `cancel` fired while waiting for the edge; no partial sample is produced
    and both outputs are driven low.
    Once an edge has been taken the cycle always runs to completion, since it is short and bounded
    and stopping halfway would leave the sensor un-reset.
     */
    pub fn cycle(&mut self, cancel: &Cancellation) -> Result<Option<Sample>> {
        self.state = State::WaitingForEdge;
        let wait = self.bus.wait_for_rising_edge(self.config.edge_pin(), cancel);
        match wait {
            Ok(EdgeWait::Edge) => (),
            Ok(EdgeWait::Cancelled) => {
                debug!("sequencer: cancelled while waiting for edge");
                self.release_outputs();
                self.state = State::Stopped;
                return Ok(None);
            },
            Err(e) => {
                self.state = State::Idle;
                return Err(AcquisitionFailure::EdgeWait(e));
            },
        }

        self.state = State::Peaking;
        self.clock.sleep(self.config.peak_delay());

        self.state = State::Holding;
        let held = self.hold_and_convert();
        let (timestamp, voltage_code) = match held {
            Ok(conversion) => conversion,
            Err(e) => {
                // The detector fired, so it still needs rearming.
                self.state = State::Resetting;
                if let Err(reset_err) = self.reset_sensor() {
                    warn!("sequencer: reset after failed conversion also failed: {}", reset_err);
                }
                self.state = State::Idle;
                return Err(e);
            },
        };

        self.state = State::Resetting;
        let reset = self.reset_sensor();
        self.state = State::Idle;
        reset?;

        trace!("sequencer: sample {} @ {}", voltage_code, timestamp);
        Ok(Some(Sample::new(timestamp, voltage_code)))
    }

    /** Acquire until cancelled.

    Samples go to `sink` in the order their edges arrived.
    Failed cycles are passed to `on_failure` and acquisition carries on with the next edge.
    A failure of the edge wait itself means the input is unusable; it ends the run and is
    returned in [`RunSummary::fault`].
     */
    pub fn run<S, F>(&mut self,
                     sink: &mut S,
                     cancel: &Cancellation,
                     mut on_failure: F) -> RunSummary
    where
        S: SampleSink + ?Sized,
        F: FnMut(&AcquisitionFailure),
    {
        info!("sequencer: acquiring on P{:02} (ADC channel {})",
              self.config.edge_pin(),
              self.config.adc_channel());

        let mut summary = RunSummary::default();
        while !cancel.is_cancelled() {
            match self.cycle(cancel) {
                Ok(Some(sample)) => {
                    summary.samples += 1;
                    sink.accept(sample);
                },
                Ok(None) => break,
                Err(failure @ AcquisitionFailure::EdgeWait(_)) => {
                    warn!("sequencer: giving up: {}", failure);
                    on_failure(&failure);
                    summary.fault = Some(failure);
                    break;
                },
                Err(failure) => {
                    warn!("sequencer: cycle aborted: {}", failure);
                    summary.failures += 1;
                    on_failure(&failure);
                },
            }
        }

        self.release_outputs();
        self.state = State::Stopped;
        sink.flush();
        info!("sequencer: stopped after {} samples ({} failed cycles)",
              summary.samples,
              summary.failures);

        summary
    }

    /// Drive both outputs low and give the bus back.
    pub fn release(mut self) -> B {
        self.release_outputs();
        self.bus
    }

    /// Assert hold, convert, release hold. Hold is released even if the transfer fails.
    fn hold_and_convert(&mut self) -> Result<(Timestamp, u16)> {
        let hold_pin = self.config.hold_pin();
        let tx = self.codec.frame(self.config.adc_channel())?;

        if let Err(e) = self.bus.set_pin(hold_pin, Level::High) {
            self.drive_low(hold_pin);
            return Err(AcquisitionFailure::Output { pin: hold_pin, cause: e });
        }
        let timestamp = self.clock.now();
        let rx = self.bus.exchange(&tx);
        let released = self.bus.set_pin(hold_pin, Level::Low);

        let rx = rx.map_err(AcquisitionFailure::Transfer)?;
        released.map_err(|e| AcquisitionFailure::Output { pin: hold_pin, cause: e })?;
        let voltage_code = self.codec.decode(&rx)?;

        Ok((timestamp, voltage_code))
    }

    fn reset_sensor(&mut self) -> Result<()> {
        let reset_pin = self.config.reset_pin();
        self.clock.sleep(self.config.reset_settle_delay());

        if let Err(e) = self.bus.set_pin(reset_pin, Level::High) {
            self.drive_low(reset_pin);
            return Err(AcquisitionFailure::Output { pin: reset_pin, cause: e });
        }
        self.clock.sleep(self.config.reset_hold_duration());
        self.bus.set_pin(reset_pin, Level::Low)
            .map_err(|e| AcquisitionFailure::Output { pin: reset_pin, cause: e })
    }

    fn release_outputs(&mut self) {
        self.drive_low(self.config.hold_pin());
        self.drive_low(self.config.reset_pin());
    }

    fn drive_low(&mut self, pin: u8) {
        if let Err(e) = self.bus.set_pin(pin, Level::Low) {
            warn!("sequencer: could not release P{:02}: {}", pin, e);
        }
    }
}
