//! Common types for the hgemm benchmarking harness
//!
//! This crate holds the error taxonomy and configuration shared by the
//! matrix fixture crate and the benchmark drivers built on top of it.

pub mod config;
pub mod error;

pub use config::*;
pub use error::*;
