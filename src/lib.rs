//! Convert VTT captions into Adobe Encore text subtitle scripts.
//!
//! Encore scripts address time in frames, so every timestamp is converted for
//! a fixed frame rate (NTSC or PAL) and consecutive entries are kept a minimum
//! number of frames apart.

pub mod convert;
pub mod error;
pub mod script;
pub mod timecode;

pub use convert::{convert, convert_with, Converter, Numbering, Options};
pub use error::ConvertError;
pub use timecode::{FrameRate, Timecode};
