//! Main memory.
//!
//! This module holds the DRAM memory controller, the terminal leaf every hierarchy
//! path ends in.

/// DRAM memory controller.
pub mod controller;

pub use controller::MemCtrl;
