//! Command implementations for the CLI
//!
//! - start: Start the proxy server
//! - test: Test configuration validity
//! - config: Display the effective configuration

pub mod config;
pub mod start;
pub mod test;
