//! TPMania Serial Transfer Protocol
//!
//! This crate moves sequence files and timing windows between a host and a
//! TPMania rhythm game controller over a serial link.
//!
//! # Protocol Overview
//!
//! Everything on the wire is ASCII:
//!
//! - **Opcodes** (host → device): a single unterminated byte selecting the
//!   operation (`S`, `E`, `B`, `T`, `R`, `N`, `W`)
//! - **Data lines**: newline-terminated text, possibly padded with NUL bytes
//!   by the device
//! - **Ready** (device → host): the line `RDY`, sent once per handshake and,
//!   for EEPROM writes, once per beat
//! - **End of transfer** (device → host): the unterminated byte `X`
//!
//! # Layers
//!
//! - [`LineCodec`] splits raw bytes into clean lines.
//! - [`DeviceChannel`] is the blocking, timeout-bound line channel the
//!   protocols run on; [`LineChannel`] adapts any byte stream (including a
//!   serial port) and [`ScriptedChannel`] replays a canned device for tests.
//! - [`ResponseWaiter`] polls a channel for an expected token.
//! - [`upload_sequence`], [`download_sequence`], [`upload_timing_windows`]
//!   and [`request_timing_windows`] implement the transfers.
//! - [`Device`] owns the channel and turns every outcome into a
//!   [`TransferStatus`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tpmania_serial_protocol::{open_serial, Device, SaveTarget, UploadRequest};
//! use tpmania_sequence::SequenceDocument;
//!
//! let channel = open_serial(&settings, &timing)?;
//! let mut device = Device::with_channel(channel, timing);
//!
//! let doc = SequenceDocument::load("songs/yeah.tsq")?;
//! let status = device.upload_sequence(&UploadRequest {
//!     document: &doc,
//!     target: SaveTarget::EEPROM,
//!     audio_length: "03:25",
//! });
//! ```

mod channel;
mod codec;
mod config;
mod constants;
mod device;
mod download;
mod error;
mod scripted;
mod status;
mod upload;
mod waiter;
mod windows;

pub use channel::*;
pub use codec::*;
pub use config::*;
pub use constants::*;
pub use device::*;
pub use download::*;
pub use error::*;
pub use scripted::*;
pub use status::*;
pub use upload::*;
pub use waiter::*;
pub use windows::*;
