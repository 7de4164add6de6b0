//! `Range` header parsing and resolution.
//!
//! Only single byte ranges are understood, in one of three forms after the
//! case-sensitive `bytes=` prefix:
//!
//! | form  | meaning        | resolves to (inclusive)  |
//! |-------|----------------|--------------------------|
//! | `-N`  | last N bytes   | `size - N ..= size - 1`  |
//! | `N-`  | from N to end  | `N ..= size - 1`         |
//! | `A-B` | explicit       | `A ..= B`                |
//!
//! Parsing never looks at the resource size. [`RangeSpec::resolve`] checks
//! the bounds afterwards and never clamps: a range that does not fit is
//! rejected as a whole.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use thiserror::Error;

const BYTES_UNIT: &str = "bytes=";

/// A parsed, not yet resolved `Range` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `-N`: the last N bytes
    Suffix(u64),
    /// `N-`: from byte N to the end
    From(u64),
    /// `A-B`: an explicit inclusive interval
    Bounded { start: u64, end: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("range unit must be `bytes=`")]
    MissingUnit,

    #[error("multiple ranges are not supported")]
    MultipleRanges,

    #[error("range `{0}` is not one of `-N`, `N-` or `A-B`")]
    InvalidForm(String),
}

/// A resolved range that does not fit the resource.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("range {spec} is not satisfiable for {size} bytes")]
pub struct UnsatisfiableRange {
    pub spec: RangeSpec,
    pub size: u64,
}

impl FromStr for RangeSpec {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.strip_prefix(BYTES_UNIT).ok_or(RangeParseError::MissingUnit)?.trim();
        if spec.contains(',') {
            return Err(RangeParseError::MultipleRanges);
        }

        let invalid = || RangeParseError::InvalidForm(spec.to_owned());
        let (first, last) = spec.split_once('-').ok_or_else(invalid)?;

        match (first.is_empty(), last.is_empty()) {
            (true, false) => parse_offset(last).map(RangeSpec::Suffix).ok_or_else(invalid),
            (false, true) => parse_offset(first).map(RangeSpec::From).ok_or_else(invalid),
            (false, false) => {
                let start = parse_offset(first).ok_or_else(invalid)?;
                let end = parse_offset(last).ok_or_else(invalid)?;
                Ok(RangeSpec::Bounded { start, end })
            }
            (true, true) => Err(invalid()),
        }
    }
}

/// Plain decimal digits only: no sign, no whitespace, no second dash.
fn parse_offset(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl RangeSpec {
    /// Resolves the range against a resource of `size` bytes.
    pub fn resolve(self, size: u64) -> Result<ByteRange, UnsatisfiableRange> {
        let unsatisfiable = UnsatisfiableRange { spec: self, size };
        let (start, end) = match self {
            RangeSpec::Suffix(n) if n > 0 && n <= size => (size - n, size - 1),
            RangeSpec::From(start) if start < size => (start, size - 1),
            RangeSpec::Bounded { start, end } if start <= end && end < size => (start, end),
            _ => return Err(unsatisfiable),
        };
        ByteRange::new(start, end).ok_or(unsatisfiable)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::Suffix(n) => write!(f, "{BYTES_UNIT}-{n}"),
            RangeSpec::From(start) => write!(f, "{BYTES_UNIT}{start}-"),
            RangeSpec::Bounded { start, end } => write!(f, "{BYTES_UNIT}{start}-{end}"),
        }
    }
}

/// An inclusive byte interval `start ..= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// The last byte offset, inclusive.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes in the interval; never zero.
    #[allow(clippy::len_without_is_empty, reason = "a byte range always holds at least one byte")]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// The equivalent half-open range `start..end + 1`.
    pub fn as_range(&self) -> Range<u64> {
        self.start..self.end + 1
    }

    /// Formats the `Content-Range` value for a resource of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(header: &str, size: u64) -> ByteRange {
        header.parse::<RangeSpec>().unwrap().resolve(size).unwrap()
    }

    #[test]
    fn three_forms_on_500_bytes() {
        assert_eq!(resolve("bytes=-100", 500).as_range(), 400..500);
        assert_eq!(resolve("bytes=100-", 500).as_range(), 100..500);

        let explicit = resolve("bytes=0-99", 500);
        assert_eq!((explicit.start(), explicit.end()), (0, 99));
        assert_eq!(explicit.len(), 100);
        assert_eq!(explicit.content_range(500), "bytes 0-99/500");
    }

    #[test]
    fn parse_failures() {
        assert_eq!("bytes=abc".parse::<RangeSpec>(), Err(RangeParseError::InvalidForm("abc".into())));
        assert_eq!("Bytes=0-1".parse::<RangeSpec>(), Err(RangeParseError::MissingUnit));
        assert_eq!("0-1".parse::<RangeSpec>(), Err(RangeParseError::MissingUnit));
        assert_eq!("bytes=0-1,5-9".parse::<RangeSpec>(), Err(RangeParseError::MultipleRanges));
        assert!("bytes=1-2-3".parse::<RangeSpec>().is_err());
        assert!("bytes=--5".parse::<RangeSpec>().is_err());
        assert!("bytes=-".parse::<RangeSpec>().is_err());
        assert!("bytes=+1-2".parse::<RangeSpec>().is_err());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!("bytes= 5-9 ".parse::<RangeSpec>(), Ok(RangeSpec::Bounded { start: 5, end: 9 }));
    }

    #[test]
    fn out_of_bounds_is_not_clamped() {
        let unsatisfiable = |header: &str, size| header.parse::<RangeSpec>().unwrap().resolve(size).is_err();

        assert!(unsatisfiable("bytes=-0", 500));
        assert!(unsatisfiable("bytes=-501", 500));
        assert!(unsatisfiable("bytes=500-", 500));
        assert!(unsatisfiable("bytes=0-500", 500));
        assert!(unsatisfiable("bytes=9-3", 500));
        assert!(unsatisfiable("bytes=0-", 0));
    }

    #[test]
    fn edges_inside_the_resource() {
        assert_eq!(resolve("bytes=-500", 500).as_range(), 0..500);
        assert_eq!(resolve("bytes=499-499", 500).len(), 1);
        assert_eq!(resolve("bytes=499-", 500).as_range(), 499..500);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for spec in [RangeSpec::Suffix(7), RangeSpec::From(3), RangeSpec::Bounded { start: 1, end: 2 }] {
            assert_eq!(spec.to_string().parse::<RangeSpec>(), Ok(spec));
        }
    }
}
