use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::ExtractError;

const RANGE_HINT: &str = "ranges need to be of the form d1-d2, e.g. 2-10";

/// Which frames of a container to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSelection {
    /// `*`: every frame up to the end of the container.
    All,
    /// `n`: a single frame.
    Single(u64),
    /// `a-b`: frames `a` through `b`, both inclusive.
    Inclusive(u64, u64),
}

impl FrameSelection {
    /// Half-open index range covered by this selection.
    ///
    /// An inclusive range whose start exceeds its end selects nothing.
    pub fn range(&self) -> Range<u64> {
        match *self {
            FrameSelection::All => 0..u64::MAX,
            FrameSelection::Single(n) => n..n.saturating_add(1),
            FrameSelection::Inclusive(a, b) => a..b.saturating_add(1),
        }
    }
}

impl FromStr for FrameSelection {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" {
            return Ok(FrameSelection::All);
        }
        if let Ok(n) = s.parse::<u64>() {
            return Ok(FrameSelection::Single(n));
        }

        let invalid = || ExtractError::InvalidSelection {
            input: s.to_string(),
            reason: RANGE_HINT.to_string(),
        };

        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse::<u64>().map_err(|_| invalid())?;
        let end = end.trim().parse::<u64>().map_err(|_| invalid())?;
        Ok(FrameSelection::Inclusive(start, end))
    }
}

impl fmt::Display for FrameSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSelection::All => write!(f, "*"),
            FrameSelection::Single(n) => write!(f, "{n}"),
            FrameSelection::Inclusive(a, b) => write!(f, "{a}-{b}"),
        }
    }
}
