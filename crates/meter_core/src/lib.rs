//! Live taximeter engine.
//!
//! GPS fixes are filtered and accumulated into a discounted trip distance
//! ([odometer]), priced together with waiting time and surcharges ([pricing])
//! and driven through the trip lifecycle by [controller::TripController],
//! which produces a [summary::TripSummary] when the trip stops.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod geo;
pub mod gps;
pub mod ledger;
pub mod odometer;
pub mod pricing;
pub mod replay;
pub mod schedule;
pub mod simulate;
pub mod summary;
pub mod surcharges;
pub mod trip;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
