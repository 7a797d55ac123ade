use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid timecode {0:?}, expected HH:MM:SS.mmm")]
    InvalidTimecode(String),

    #[error("unknown frame rate {0:?}, expected ntsc or pal")]
    UnknownFrameRate(String),

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    /// Attach the input line number to a parsing error. IO errors are returned as is.
    pub fn at(self, line: usize) -> ConvertError {
        match self {
            ConvertError::Io(_) | ConvertError::Line { .. } => self,
            other => ConvertError::Line {
                line,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
