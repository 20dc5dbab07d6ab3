//! Test utilities for the batch sponsorship protocol.

mod runners;
mod state;

pub use runners::*;
pub use state::*;
