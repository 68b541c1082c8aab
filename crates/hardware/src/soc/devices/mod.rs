//! Peripheral controllers attached beside the memory hierarchy.
//!
//! This module contains the per-thread interrupt controller whose port triple is wired
//! to the system crossbar as a side channel.

/// Interrupt controller (pio / int_requestor / int_responder).
pub mod interrupts;

pub use interrupts::{INTERRUPT_TRIPLE, InterruptController};
