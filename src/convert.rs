use std::io::{BufRead, BufReader, Read, Write};
use tracing::{debug, trace};

use crate::error::Result;
use crate::script::Entry;
use crate::timecode::{FrameRate, Timecode};

static TIMING_SEPARATOR: &str = " --> ";

/// How entries are numbered in the first column of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Numbering {
    /// Every entry carries `0`.
    #[default]
    Constant,
    /// Entries are numbered from 1 in output order.
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub frame_rate: FrameRate,
    /// Minimum number of frames between the end of an entry and the start of the next one.
    pub gap: u32,
    pub numbering: Numbering,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            frame_rate: FrameRate::Pal,
            gap: 5,
            numbering: Numbering::Constant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Skipping the `WEBVTT` preamble.
    Header,
    AwaitingTimes,
    AccumulatingText,
}

/// A cue whose text is still being collected.
#[derive(Debug)]
struct Block {
    start: Timecode,
    end: Timecode,
    text: String,
}

/// Line driven VTT to Encore script converter.
///
/// Lines are fed one at a time with [`Converter::feed_line`]; [`Converter::finish`]
/// flushes a cue left open by a missing trailing blank line.
pub struct Converter<W: Write> {
    out: W,
    options: Options,
    state: State,
    block: Option<Block>,
    last_end: f64,
    written: usize,
}

impl<W: Write> Converter<W> {
    pub fn new(out: W, options: Options) -> Self {
        Converter {
            out,
            options,
            state: State::Header,
            block: None,
            last_end: 0.,
            written: 0,
        }
    }

    /// Number of entries written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        match self.state {
            State::Header => {
                if line.is_empty() {
                    self.transition(State::AwaitingTimes);
                }
            }
            State::AwaitingTimes => {
                if line.contains(TIMING_SEPARATOR) {
                    let mut times = line.split(TIMING_SEPARATOR).map(str::trim);
                    // the separator is present so both pieces exist
                    let start: Timecode = times.next().unwrap_or_default().parse()?;
                    let end: Timecode = times.next().unwrap_or_default().parse()?;
                    self.block = Some(Block {
                        start,
                        end,
                        text: String::new(),
                    });
                    self.transition(State::AccumulatingText);
                }
            }
            State::AccumulatingText => {
                if line.is_empty() {
                    if let Some(block) = self.block.take() {
                        self.finalize(block)?;
                    }
                    self.transition(State::AwaitingTimes);
                } else if let Some(block) = self.block.as_mut() {
                    block.text.push_str(line);
                    block.text.push(' ');
                }
            }
        }
        Ok(())
    }

    /// Flush the open cue, if any, and return the number of entries written.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(block) = self.block.take() {
            debug!(start = %block.start, "input ended inside a cue");
            self.finalize(block)?;
        }
        Ok(self.written)
    }

    fn transition(&mut self, state: State) {
        trace!(from = ?self.state, to = ?state, "state change");
        self.state = state;
    }

    fn finalize(&mut self, block: Block) -> Result<()> {
        let rate = self.options.frame_rate;
        let gap = self.options.gap as f64;

        let diff = block.start.to_frames(rate) - self.last_end;
        let start = if diff < gap {
            debug!(start = %block.start, shift = gap - diff, "start too close to previous entry");
            block.start.convert_timecode(rate, gap - diff)
        } else {
            block.start.convert_timecode(rate, 0.)
        };

        if block.text.is_empty() {
            debug!(start = %block.start, "dropping cue without text");
        } else {
            let number = match self.options.numbering {
                Numbering::Constant => 0,
                Numbering::Sequential => self.written + 1,
            };
            let entry = Entry {
                number,
                start,
                end: block.end.convert_timecode(rate, 0.),
                text: block.text,
            };
            entry.write_to(&mut self.out)?;
            self.written += 1;
        }

        self.last_end = block.end.to_frames(rate);
        Ok(())
    }
}

/// Convert a VTT stream into an Encore text script, returning the number of entries written.
///
/// The output is neither flushed nor closed.
pub fn convert<R: Read, W: Write>(input: R, output: W, format: FrameRate, gap: u32) -> Result<usize> {
    let options = Options {
        frame_rate: format,
        gap,
        ..Options::default()
    };
    convert_with(input, output, options)
}

pub fn convert_with<R: Read, W: Write>(input: R, output: W, options: Options) -> Result<usize> {
    let mut converter = Converter::new(output, options);
    for (i, line) in BufReader::new(input).lines().enumerate() {
        converter.feed_line(&line?).map_err(|e| e.at(i + 1))?;
    }
    converter.finish()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use tempfile::NamedTempFile;

    use crate::convert::{convert, convert_with, Converter, Numbering, Options};
    use crate::error::ConvertError;
    use crate::timecode::FrameRate;

    fn run(input: &str, format: FrameRate, gap: u32) -> String {
        let mut out: Vec<u8> = Vec::new();
        convert(input.as_bytes(), &mut out, format, gap).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn header_example() {
        let input = "WEBVTT
Kind: captions
Language: en

00:00:01.000 --> 00:00:02.000
Hello world

00:00:02.500 --> 00:00:04.000
Second line

";
        assert_eq!(
            run(input, FrameRate::Pal, 5),
            "0\t00:00:01:0\t00:00:02:0\tHello world \n0\t00:00:02:12\t00:00:04:0\tSecond line \n"
        );
    }

    #[test]
    fn ntsc_separator() {
        let input = "WEBVTT

00:03:17.440 --> 00:03:19.440
Subtitle text

";
        assert_eq!(run(input, FrameRate::Ntsc, 5), "0\t00;03;17;13\t00;03;19;13\tSubtitle text \n");
    }

    #[test]
    fn gap_is_enforced() {
        // previous entry ends at frame 50, next one starts at frame 52
        let input = "WEBVTT

00:00:01.000 --> 00:00:02.000
One

00:00:02.080 --> 00:00:03.000
Two

";
        let out = run(input, FrameRate::Pal, 5);
        let second = out.lines().nth(1).unwrap();
        assert_eq!(second, "0\t00:00:02:5\t00:00:03:0\tTwo ");

        let out = run(input, FrameRate::Pal, 0);
        let second = out.lines().nth(1).unwrap();
        assert_eq!(second, "0\t00:00:02:2\t00:00:03:0\tTwo ");
    }

    #[test]
    fn first_entry_measured_from_zero() {
        let input = "WEBVTT

00:00:00.040 --> 00:00:01.000
Early

";
        assert_eq!(run(input, FrameRate::Pal, 5), "0\t00:00:00:5\t00:00:01:0\tEarly \n");
    }

    #[test]
    fn shifted_frame_does_not_carry() {
        let input = "WEBVTT

00:00:01.000 --> 00:00:02.000
One

00:00:01.960 --> 00:00:03.000
Overlap

";
        let out = run(input, FrameRate::Pal, 5);
        assert_eq!(out.lines().nth(1).unwrap(), "0\t00:00:01:30\t00:00:03:0\tOverlap ");
    }

    const FRACTIONAL_GAP: &str = "WEBVTT

00:00:01.000 --> 00:00:02.010
A

00:00:02.070 --> 00:00:03.000
B

";

    #[test]
    fn fractional_shift_is_truncated_with_base() {
        // end 50.25 frames, next start 51.75: shift 3.5 on a 1.75 base gives 5, not 1 + 3.5
        let out = run(FRACTIONAL_GAP, FrameRate::Pal, 5);
        assert_eq!(out, "0\t00:00:01:0\t00:00:02:0\tA \n0\t00:00:02:5\t00:00:03:0\tB \n");
    }

    #[test]
    fn ntsc_shift() {
        let out = run(FRACTIONAL_GAP, FrameRate::Ntsc, 5);
        assert_eq!(out, "0\t00;00;01;0\t00;00;02;0\tA \n0\t00;00;02;5\t00;00;03;0\tB \n");
    }

    #[test]
    fn converter_counts_entries() {
        let mut out: Vec<u8> = Vec::new();
        let mut converter = Converter::new(&mut out, Options::default());
        for line in FRACTIONAL_GAP.lines().take(4) {
            converter.feed_line(line).unwrap();
        }
        assert_eq!(converter.written(), 0);
        converter.feed_line("").unwrap();
        assert_eq!(converter.written(), 1);
        converter.feed_line("00:00:02.070 --> 00:00:03.000").unwrap();
        converter.feed_line("B").unwrap();
        assert_eq!(converter.written(), 1);
        assert_eq!(converter.finish().unwrap(), 2);
    }

    #[test]
    fn multi_line_caption() {
        let input = "WEBVTT

00:00:01.000 --> 00:00:02.000
First half
second half

";
        assert_eq!(run(input, FrameRate::Pal, 5), "0\t00:00:01:0\t00:00:02:0\tFirst half second half \n");
    }

    #[test]
    fn empty_block_is_dropped_but_moves_baseline() {
        // the dropped cue ends at frame 75, the next one starts at frame 76
        let input = "WEBVTT

00:00:01.000 --> 00:00:03.000

00:00:03.040 --> 00:00:04.000
After
";
        assert_eq!(run(input, FrameRate::Pal, 5), "0\t00:00:03:5\t00:00:04:0\tAfter \n");
    }

    #[test]
    fn residual_block_is_flushed() {
        let input = "WEBVTT\r\n\r\n00:00:01.000 --> 00:00:02.000\r\nNo trailing\r\nblank line";
        assert_eq!(run(input, FrameRate::Pal, 5), "0\t00:00:01:0\t00:00:02:0\tNo trailing blank line \n");
    }

    #[test]
    fn empty_and_header_only_input() {
        assert_eq!(run("", FrameRate::Pal, 5), "");
        assert_eq!(run("WEBVTT\nKind: captions\nLanguage: en\n", FrameRate::Pal, 5), "");
        assert_eq!(run("WEBVTT\n\nnot a cue\n\n", FrameRate::Ntsc, 5), "");
    }

    #[test]
    fn malformed_timecode_aborts() {
        let input = "WEBVTT

00:00:01.000 --> 00:00:02.000
Kept

00:00:03 --> 00:00:04.000
Broken

";
        let mut out: Vec<u8> = Vec::new();
        let err = convert(input.as_bytes(), &mut out, FrameRate::Pal, 5).unwrap_err();
        match err {
            ConvertError::Line { line, source } => {
                assert_eq!(line, 6);
                assert!(matches!(*source, ConvertError::InvalidTimecode(ref v) if v == "00:00:03"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(String::from_utf8(out).unwrap(), "0\t00:00:01:0\t00:00:02:0\tKept \n");
    }

    #[test]
    fn sequential_numbering() {
        let input = "WEBVTT

00:00:01.000 --> 00:00:02.000
One

00:00:03.000 --> 00:00:04.000

00:00:05.000 --> 00:00:06.000
Two

";
        let options = Options {
            numbering: Numbering::Sequential,
            ..Options::default()
        };
        let mut out: Vec<u8> = Vec::new();
        let written = convert_with(input.as_bytes(), &mut out, options).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1\t00:00:01:0\t00:00:02:0\tOne \n2\t00:00:05:0\t00:00:06:0\tTwo \n"
        );
    }

    #[test]
    fn convert_file() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n00:03:17.440 --> 00:03:19.440\nSubtitle text\n\n";
        let tempfile = NamedTempFile::new().unwrap();
        fs::write(&tempfile, vtt).expect("fail to write tempfile");

        let input = fs::File::open(tempfile.path()).unwrap();
        let mut out: Vec<u8> = Vec::new();
        let written = convert(input, &mut out, FrameRate::Pal, 5).unwrap();
        assert_eq!(written, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "0\t00:03:17:11\t00:03:19:11\tSubtitle text \n");
    }
}
