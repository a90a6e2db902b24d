//! Data layer for volunteer-hours.
//!
//! Fetches calendar events from Teamup (or reads saved responses), resolves
//! sign-ups to members and totals their hours, and computes shift coverage.

pub mod aggregator;
pub mod client;
pub mod coverage;
pub mod reader;
pub mod teamup;

pub use hours_core as core;
