//! Acquisition core for an event-triggered radiation sensor read out by an MCP3002 ADC.

#![deny(missing_docs)]

pub mod cancel;
pub mod clock;
pub mod codec;
pub mod config;
pub mod io;
pub mod output;
pub mod sample;
pub mod sequencer;
pub mod sim;

pub use cancel::Cancellation;
pub use sample::Sample;
pub use sequencer::{AcquisitionFailure, Sequencer};
