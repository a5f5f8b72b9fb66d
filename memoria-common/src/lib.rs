//! # Memoria Common Library
//!
//! Shared code for the Memoria services:
//! - Common error type
//! - Bootstrap TOML configuration and config file discovery
//! - Secret resolution helpers (environment → TOML)

pub mod config;
pub mod error;

pub use error::{Error, Result};
