//! An emulator for the LS-8, a small 8-bit register machine.
//!
//! Programs are loaded into a 256 byte [`Memory`](memory::Memory) and
//! executed by a [`Processor`](processor::Processor) until they halt.

pub mod error;
pub mod memory;
pub mod processor;

pub use error::{Fault, LoadError};
pub use memory::Memory;
pub use processor::Processor;
