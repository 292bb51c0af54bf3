use {
    crate::{Error, Height},
    serde::{Deserialize, Serialize},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// A closed interval of block heights, `start <= end`.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct Range {
    start: Height,
    end: Height,
}

#[derive(Deserialize)]
struct RawRange {
    start: Height,
    end: Height,
}

impl TryFrom<RawRange> for Range {
    type Error = Error;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TryFrom<(i64, i64)> for Range {
    type Error = Error;

    fn try_from((start, end): (i64, i64)) -> Result<Self, Self::Error> {
        let start = Height::try_from(start).map_err(|_| Error::Negative(start))?;
        let end = Height::try_from(end).map_err(|_| Error::Negative(end))?;
        Self::new(start, end)
    }
}

impl Range {
    pub fn new(start: Height, end: Height) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidOrder { start, end });
        }
        Ok(Self { start, end })
    }

    /// Callers guarantee `start <= end`.
    pub(crate) fn new_unchecked(start: Height, end: Height) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// A range covering a single height.
    pub fn single(height: Height) -> Self {
        Self {
            start: height,
            end: height,
        }
    }

    pub fn start(&self) -> Height {
        self.start
    }

    pub fn end(&self) -> Height {
        self.end
    }

    /// Number of heights in the range. Saturates for the full `u64` domain.
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    pub fn contains(&self, height: Height) -> bool {
        self.start <= height && height <= self.end
    }

    /// Whether `other` lies completely within `self`.
    pub fn covers(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The heights both ranges have in common, if any.
    pub fn intersection(a: &Range, b: &Range) -> Option<Range> {
        let start = a.start.max(b.start);
        let end = a.end.min(b.end);
        (start <= end).then_some(Range { start, end })
    }

    /// The parts of `a` that are not covered by `b`: nothing if `b` covers
    /// `a`, `a` itself if they don't overlap, one trimmed range if `b`
    /// overlaps one edge of `a` and two ranges if `b` punches a hole into `a`.
    pub fn difference(a: &Range, b: &Range) -> Vec<Range> {
        let Some(overlap) = Range::intersection(a, b) else {
            return vec![*a];
        };

        let mut remaining = Vec::with_capacity(2);
        // `overlap.start > a.start` implies `overlap.start >= 1` and
        // `overlap.end < a.end` implies `overlap.end < Height::MAX`.
        if overlap.start > a.start {
            remaining.push(Range {
                start: a.start,
                end: overlap.start - 1,
            });
        }
        if overlap.end < a.end {
            remaining.push(Range {
                start: overlap.end + 1,
                end: a.end,
            });
        }
        remaining
    }
}

impl FromStr for Range {
    type Err = Error;

    /// Parses `START-END` or a single height.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |height: &str| {
            height
                .trim()
                .parse::<Height>()
                .map_err(|_| Error::Parse(s.to_owned()))
        };
        match s.split_once('-') {
            Some((start, end)) => Self::new(parse(start)?, parse(end)?),
            None => parse(s).map(Self::single),
        }
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
