//! tabhost command-line driver.
//!
//! Loads host and tab configuration, brings up the runtime pools with
//! headless backends, and runs one command against the host core.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod styles;
