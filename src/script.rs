use std::fmt;
use std::io::{self, Write};

/// One line of an Adobe Encore text script:
/// `number<TAB>start<TAB>end<TAB>text`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub number: usize,
    pub start: String,
    pub end: String,
    pub text: String,
}

impl Entry {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{}", self)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.number, self.start, self.end, self.text)
    }
}
