//! Data types shared between the tabhost CLI and the runtime host core.
//!
//! Nothing in this crate performs I/O. The types describe what the tab
//! configuration file contains and which build mode the process runs in.
//!
//! # Main Types
//!
//! - [`TabConfig`] - One tab record as written in `tab_config.json`
//! - [`TabsConfiguration`] - The file's top-level container
//! - [`TabType`] - Runtime kind named by a record
//! - [`BuildMode`] - Debug/release switch fixed at process start

pub mod mode;
pub mod tab;

pub use mode::BuildMode;
pub use tab::{TabConfig, TabType, TabsConfiguration, default_tabs};
