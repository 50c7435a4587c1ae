//! Optik core crate - shared configuration, error and data types.

pub mod config;
pub mod error;
pub mod types;

pub use config::OptikConfig;
pub use error::{OptikError, Result};
pub use types::*;
