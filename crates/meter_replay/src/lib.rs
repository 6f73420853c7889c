//! Offline driver for the taximeter engine: replays recorded event logs or
//! simulated routes and emits the resulting receipts as JSON.

pub mod cli;
pub mod error;
pub mod events;
pub mod session;
