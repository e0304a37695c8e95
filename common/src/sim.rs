/*! Hardware-free stand-in for the detector front end.

[`SimulatedBus`] raises one edge per interval and answers every transfer with a
pseudo-random conversion, so the whole acquisition path can run on a desktop.
 */

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::cancel::Cancellation;
use crate::io::{BusError, BusInterface, EdgeWait, Level, Result};

/// Edge interval used when none is given.
pub const DEFAULT_EDGE_INTERVAL: Duration = Duration::from_secs(1);

/// Longest stretch a simulated edge wait goes without checking for cancellation.
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Bus producing periodic edges and random ADC codes in `1..=1023`.
#[derive(Debug)]
pub struct SimulatedBus {
    interval: Duration,
    seed: u32,
    levels: HashMap<u8, Level>,
    transfers: u64,
}

impl SimulatedBus {
    /// Create a bus raising an edge every `interval`.
    pub fn new(interval: Duration) -> SimulatedBus {
        SimulatedBus {
            interval,
            seed: 0x5241_4445,
            levels: HashMap::new(),
            transfers: 0,
        }
    }

    /// Use a specific generator seed.
    pub fn with_seed(self, seed: u32) -> Self {
        Self {
            seed,
            ..self
        }
    }

    /// Returns the last level driven on `pin`, if it was ever driven.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// Returns how many transfers have been performed.
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    fn next_code(&mut self) -> u16 {
        self.seed = self.seed.wrapping_mul(1103515245).wrapping_add(12345);
        1 + ((self.seed >> 16) % 1023) as u16
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        SimulatedBus::new(DEFAULT_EDGE_INTERVAL)
    }
}

impl BusInterface for SimulatedBus {
    fn wait_for_rising_edge(&mut self, pin: u8, cancel: &Cancellation) -> Result<EdgeWait> {
        let t_edge = Instant::now() + self.interval;
        loop {
            if cancel.is_cancelled() {
                return Ok(EdgeWait::Cancelled);
            }

            let now = Instant::now();
            if now >= t_edge {
                trace!("sim: rising edge on P{:02}", pin);
                return Ok(EdgeWait::Edge);
            }

            let remaining = t_edge - now;
            thread::sleep(if remaining < WAIT_SLICE { remaining } else { WAIT_SLICE });
        }
    }

    fn set_pin(&mut self, pin: u8, level: Level) -> Result<()> {
        self.levels.insert(pin, level);
        Ok(())
    }

    fn exchange(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        if tx.len() < 2 {
            return Err(BusError::Simulated(format!("{}-byte frame cannot carry a conversion", tx.len())));
        }

        // High bits go in the first word's two low bits,
        // which both the standard and the legacy decoding agree on.
        let code = self.next_code();
        let mut rx = vec![0; tx.len()];
        rx[0] = (code >> 8) as u8;
        rx[1] = (code & 0xFF) as u8;
        self.transfers += 1;

        Ok(rx)
    }
}
