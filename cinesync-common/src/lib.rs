//! # cinesync common library
//!
//! Shared code for the cinesync workspace:
//! - Error type used across crates
//! - Configuration loading and resolution
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
