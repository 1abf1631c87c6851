//! TPMania Sequence Files
//!
//! This crate reads and writes the line-based `.tsq` sequence format used by
//! TPMania rhythm game controllers. A sequence is a small metadata preamble
//! followed by a beat buffer grouped into bars.
//!
//! # File Overview
//!
//! ```text
//! Name: <string>
//! Artist: <string>
//! BPM: <string>
//! Difficulty: <string>
//! Offset: <string>
//! ---
//! <beat-line>     first bar: 4 or 8 beats
//! ...
//! ,
//! <beat-line>     later bars: 4 beats each
//! ...
//! ;
//! ```
//!
//! - **Preamble**: `Key: value` lines before the `---` buffer marker. Unknown
//!   keys are ignored by the parser.
//! - **Beat buffer**: one beat per line, bars separated by `,`.
//! - **File end**: a single `;` line.
//!
//! Files whose first bar holds 8 beats encode half beats. The device only
//! stores full beats, so every second beat is dropped on the way out and the
//! reported beat count is halved.
//!
//! # Example
//!
//! ```rust,ignore
//! use tpmania_sequence::SequenceDocument;
//!
//! let doc = SequenceDocument::load("songs/yeah.tsq")?;
//! println!("{} by {}: {} beats", doc.name, doc.artist, doc.beat_count);
//! ```

mod constants;
mod document;
mod error;
mod scanner;
mod writer;

pub use constants::*;
pub use document::*;
pub use error::*;
pub use scanner::*;
pub use writer::*;
