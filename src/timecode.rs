use std::fmt;
use std::str::FromStr;
use regex::Regex;
use once_cell::sync::Lazy;

use crate::error::{ConvertError, Result};

static TIMECODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+):(\d+):(\d+)\.(\d+)$").unwrap());

/// Broadcast frame rate of the target timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRate {
    Ntsc,
    #[default]
    Pal,
}

impl FrameRate {
    pub fn separator(&self) -> char {
        match self {
            FrameRate::Ntsc => ';',
            FrameRate::Pal => ':',
        }
    }

    pub fn fps(&self) -> f64 {
        match self {
            FrameRate::Ntsc => 29.97,
            FrameRate::Pal => 25.,
        }
    }
}

impl FromStr for FrameRate {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<FrameRate> {
        match s.to_lowercase().as_str() {
            "ntsc" => Ok(FrameRate::Ntsc),
            "pal" => Ok(FrameRate::Pal),
            _ => Err(ConvertError::UnknownFrameRate(s.to_string())),
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRate::Ntsc => f.write_str("ntsc"),
            FrameRate::Pal => f.write_str("pal"),
        }
    }
}

/// A `HH:MM:SS.mmm` caption timestamp.
///
/// The hour, minute and second fields keep the digits as written so that
/// the converted form reproduces them untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Timecode {
    raw: String,
    hours: String,
    minutes: String,
    seconds: String,
    total_millis: u64,
    millis: u64,
}

impl Timecode {
    pub fn millis(&self) -> u64 {
        self.millis
    }

    /// Total elapsed milliseconds since `00:00:00.000`.
    pub fn total_millis(&self) -> u64 {
        self.total_millis
    }

    /// Elapsed time as a fractional frame count. Only used for comparisons.
    pub fn to_frames(&self, rate: FrameRate) -> f64 {
        self.total_millis() as f64 * rate.fps() / 1000.
    }

    /// Render as `HH<sep>MM<sep>SS<sep>FF`, with `increment` frames added to
    /// the frame field.
    ///
    /// The frame field never carries into the seconds: a large increment
    /// yields a frame number above the frame rate.
    pub fn convert_timecode(&self, rate: FrameRate, increment: f64) -> String {
        let sep = rate.separator();
        let frame = (self.millis as f64 * rate.fps() / 1000. + increment) as u64;
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.hours,
            self.minutes,
            self.seconds,
            frame,
            sep = sep
        )
    }
}

impl FromStr for Timecode {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Timecode> {
        let invalid = || ConvertError::InvalidTimecode(s.to_string());
        let caps = TIMECODE_RE.captures(s).ok_or_else(invalid)?;

        let number = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());
        let (hours, minutes, seconds, millis) = (number(1)?, number(2)?, number(3)?, number(4)?);
        let total_millis = hours
            .checked_mul(3600)
            .and_then(|t| t.checked_add(minutes.checked_mul(60)?))
            .and_then(|t| t.checked_add(seconds))
            .and_then(|t| t.checked_mul(1000))
            .and_then(|t| t.checked_add(millis))
            .ok_or_else(invalid)?;

        Ok(Timecode {
            raw: s.to_string(),
            hours: caps[1].to_string(),
            minutes: caps[2].to_string(),
            seconds: caps[3].to_string(),
            total_millis,
            millis,
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
