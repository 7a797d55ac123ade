use std::process;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::error::Error;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vtt2txt::{convert_with, FrameRate, Numbering, Options};

/// Convert subtitles to Adobe text format.
#[derive(Parser, Debug)]
#[command(name = "vtt2txt", version)]
struct Opt {
    /// Encoding to use (ntsc or pal)
    #[arg(long, default_value = "pal", value_name = "ntsc|pal")]
    format: FrameRate,

    /// Number of frames to insert between subsequent clips if needed
    #[arg(long, default_value_t = 5)]
    gap: u32,

    /// Number entries from 1 instead of writing 0 for every entry
    #[arg(long)]
    numbered: bool,

    /// Source VTT file (standard input if omitted or `-`)
    vttfile: Option<PathBuf>,

    /// Destination file for converted Adobe data (standard output if omitted or `-`)
    txtfile: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn is_stdio(path: &Option<PathBuf>) -> bool {
    match path {
        None => true,
        Some(p) => p.as_path() == Path::new("-"),
    }
}

fn open_input(path: &Option<PathBuf>) -> Result<Box<dyn Read>, Box<dyn Error>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdin()));
    }
    let path = path.as_deref().ok_or("input path required")?;
    let file = fs::File::open(path).map_err(|e| format!("fail to open {}: {}", path.display(), e))?;
    Ok(Box::new(file))
}

fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>, Box<dyn Error>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdout()));
    }
    let path = path.as_deref().ok_or("output path required")?;
    let file = fs::File::create(path).map_err(|e| format!("fail to create {}: {}", path.display(), e))?;
    Ok(Box::new(file))
}

fn run(opt: Opt) -> Result<usize, Box<dyn Error>> {
    let options = Options {
        frame_rate: opt.format,
        gap: opt.gap,
        numbering: if opt.numbered { Numbering::Sequential } else { Numbering::Constant },
    };

    let input = open_input(&opt.vttfile)?;
    let mut output = BufWriter::new(open_output(&opt.txtfile)?);

    let written = convert_with(input, &mut output, options)?;
    output.flush()?;
    Ok(written)
}

/// Fatal errors bypass the log filter.
fn report<W: Write>(w: &mut W, e: &dyn Error) {
    let _ = writeln!(w, "vtt2txt: {}", e);
}

fn main() {
    let opt = Opt::parse();
    init_logging();

    match run(opt) {
        Ok(written) => info!(entries = written, "conversion done"),
        Err(e) => {
            report(&mut io::stderr(), &*e);
            process::exit(1);
        }
    }
}
