#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![doc = include_str!("../README.md")]

mod clocked;
pub use clocked::*;
mod dac;
pub use dac::*;
mod format;
pub use format::*;
mod sequencer;
pub use sequencer::*;
mod bus;
pub use bus::*;
pub mod csr;
pub use csr::{Csr, Registers, Status};
mod transform;
pub use transform::*;
mod interpolator;
pub use interpolator::*;
mod config;
pub use config::*;
mod pulsegen;
pub use pulsegen::*;

#[cfg(test)]
pub mod testing;
