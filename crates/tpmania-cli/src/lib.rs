//! TPMania host tooling
//!
//! Library half of the `tpmania` command: configuration, logging setup,
//! background execution of device operations and the command
//! implementations. The protocol itself lives in `tpmania-serial-protocol`.
//!
//! # Example
//!
//! ```rust,ignore
//! use tpmania_cli::{commands, AppConfig};
//!
//! let config = AppConfig::load(None)?;
//! let mut tasks = commands::connect(&config);
//!
//! let (status, windows) = commands::windows_get(&mut tasks)?;
//! ```

pub mod audio;
pub mod commands;
mod config;
mod error;
pub mod logging;
pub mod report;
mod tasks;

pub use config::*;
pub use error::*;
pub use tasks::*;
