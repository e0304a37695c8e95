/*! Interacting with the detector's digital lines and the ADC's serial bus.

[`BusInterface`] is the only way the sequencer reaches hardware.
[`RpiBus`] implements it on a Raspberry Pi with GPIO and SPI0;
[`crate::sim::SimulatedBus`] implements it without any hardware.
 */

use std::collections::HashMap;
use std::convert::From;
use std::fmt;
use std::fmt::{Debug, Display};
use std::iter::IntoIterator;
use std::time::Duration;

use rppal::gpio;
use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use rppal::spi;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::{debug, trace};

use crate::cancel::Cancellation;
use crate::config::AcquisitionConfig;

pub use rppal::gpio::Level;

/// Bus I/O result type.
pub type Result<T> = std::result::Result<T, BusError>;

/// SPI clock used for the ADC.
pub const SPI_CLOCK_HZ: u32 = 1_000_000;

/// Longest stretch an edge wait goes without checking for cancellation.
pub const EDGE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors related to acquiring and driving bus I/O.
#[derive(Debug)]
pub enum BusError {
    /// GPIO-specific error.
    Gpio(gpio::Error),
    /// SPI-specific error.
    Spi(spi::Error),
    /// A pin the bus does not own was used.
    UndefinedPin(u8),
    /// The transfer returned a different number of bytes than were sent.
    LengthMismatch {
        /// Bytes clocked out.
        sent: usize,
        /// Bytes clocked in.
        received: usize,
    },
    /// Failure produced by a simulated bus.
    Simulated(String),
}

impl std::error::Error for BusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BusError::Gpio(ref e) => Some(e),
            BusError::Spi(ref e) => Some(e),
            _ => None,
        }
    }
}

impl Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use BusError::*;
        match self {
            Gpio(ref e) => write!(f, "error with GPIO interface: {}", e),
            Spi(ref e) => write!(f, "error with SPI interface: {}", e),
            UndefinedPin(pin_no) => write!(f, "undefined pin ({}) used", pin_no),
            LengthMismatch { sent, received } =>
                write!(f, "transfer length mismatch ({} sent, {} received)", sent, received),
            Simulated(ref msg) => write!(f, "simulated bus failure: {}", msg),
        }
    }
}

impl From<gpio::Error> for BusError {
    fn from(e: gpio::Error) -> Self {
        BusError::Gpio(e)
    }
}

impl From<spi::Error> for BusError {
    fn from(e: spi::Error) -> Self {
        BusError::Spi(e)
    }
}

/// How an edge wait ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgeWait {
    /// A rising edge was seen.
    Edge,
    /// The wait was cancelled before an edge arrived.
    Cancelled,
}

/// Raw primitives the acquisition sequence is built from.
pub trait BusInterface: Debug {
    /** Block until a rising edge appears on `pin`.

    There is no timeout; the detector paces the wait.
    Returns `EdgeWait::Cancelled` promptly once `cancel` is triggered, whether or not an edge ever arrives.
    Edges that arrived before the call are not reported.
     */
    fn wait_for_rising_edge(&mut self, pin: u8, cancel: &Cancellation) -> Result<EdgeWait>;

    /// Drive an output pin.
    fn set_pin(&mut self, pin: u8, level: Level) -> Result<()>;

    /// Full-duplex transfer; the response has the same length as `tx`.
    fn exchange(&mut self, tx: &[u8]) -> Result<Vec<u8>>;
}

/// Wrapper around a set of pins.
#[derive(Debug)]
pub struct Pins<T> {
    pins: HashMap<u8, T>,
}

impl<T> Pins<T> {
    /// Create a new collection of pins.
    pub fn new<U>(pins: U) -> Pins<T> where
        U: IntoIterator<Item = (u8, T)>
    {
        Pins {
            pins: pins.into_iter().collect(),
        }
    }

    /// Returns a mutable reference to the specified pin.
    pub fn get_pin_mut(&mut self, pin_no: u8) -> Result<&mut T> {
        self.pins.get_mut(&pin_no)
            .ok_or(BusError::UndefinedPin(pin_no))
    }
}

/** Raspberry Pi GPIO and SPI0 wired to the detector front end.

The edge pin is an input with a pull-down and a rising-edge interrupt.
The hold and reset pins are outputs, driven low as soon as they are acquired.
The ADC sits on SPI0, chip enable 0, at 1 MHz in mode 0.
 */
#[derive(Debug)]
pub struct RpiBus {
    inputs: Pins<InputPin>,
    outputs: Pins<OutputPin>,
    spi: Spi,
}

impl RpiBus {
    /** Acquire the pins and SPI bus named by `config`.

    # Errors
    - `BusError::Gpio` if the GPIO peripheral or one of the pins is unavailable.
    - `BusError::Spi` if SPI0 cannot be opened.
     */
    pub fn open(config: &AcquisitionConfig) -> Result<RpiBus> {
        let gpio = Gpio::new()?;

        let mut edge = gpio.get(config.edge_pin())?.into_input_pulldown();
        edge.set_interrupt(Trigger::RisingEdge)?;

        let mut outputs = Vec::new();
        for &pin_no in &[config.hold_pin(), config.reset_pin()] {
            let mut pin = gpio.get(pin_no)?.into_output();
            pin.set_low();
            outputs.push((pin_no, pin));
        }

        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
        debug!("bus: opened SPI0/CE0 at {} Hz", SPI_CLOCK_HZ);

        Ok(RpiBus {
            inputs: Pins::new(vec![(config.edge_pin(), edge)]),
            outputs: Pins::new(outputs),
            spi,
        })
    }
}

impl BusInterface for RpiBus {
    fn wait_for_rising_edge(&mut self, pin: u8, cancel: &Cancellation) -> Result<EdgeWait> {
        let input = self.inputs.get_pin_mut(pin)?;

        // Throw away edges latched while the previous cycle was running.
        let mut reset = true;
        loop {
            if cancel.is_cancelled() {
                return Ok(EdgeWait::Cancelled);
            }

            if let Some(_level) = input.poll_interrupt(reset, Some(EDGE_POLL_INTERVAL))? {
                trace!("bus: rising edge on P{:02}", pin);
                return Ok(EdgeWait::Edge);
            }
            reset = false;
        }
    }

    fn set_pin(&mut self, pin: u8, level: Level) -> Result<()> {
        self.outputs.get_pin_mut(pin)?.write(level);
        Ok(())
    }

    fn exchange(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        let mut rx = vec![0; tx.len()];
        let received = self.spi.transfer(&mut rx, tx)?;
        if received != tx.len() {
            return Err(BusError::LengthMismatch { sent: tx.len(), received });
        }

        Ok(rx)
    }
}
