//! Core types and algorithms for volunteer hour tracking.
//!
//! Holds the shared error type, the member/sign-up data model, inscription
//! normalisation and fuzzy comparison, time and number formatting helpers,
//! and the command line settings.

pub mod error;
pub mod formatting;
pub mod inscription;
pub mod models;
pub mod settings;
pub mod similarity;
pub mod time_utils;

pub use error::{Result, RosterError};
