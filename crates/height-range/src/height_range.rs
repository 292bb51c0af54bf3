use {
    crate::{Height, Range},
    itertools::Itertools,
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
};

/// A set of block heights stored as a list of closed ranges.
///
/// The list is kept in the order it was built in. Use [`HeightRange::normalize`]
/// to get the canonical form of sorted, disjoint and non-adjacent segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeightRange {
    ranges: Vec<Range>,
}

impl HeightRange {
    pub fn new(ranges: Vec<Range>) -> Self {
        Self { ranges }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, height: Height) -> bool {
        self.ranges.iter().any(|range| range.contains(height))
    }

    /// Lowest and highest height in the set.
    pub fn bounds(&self) -> Option<Range> {
        let start = self.ranges.iter().map(Range::start).min()?;
        let end = self.ranges.iter().map(Range::end).max()?;
        Some(Range::new_unchecked(start, end))
    }

    /// The heights of `r1` that are not in `r2`. Every segment of `r2` is
    /// subtracted from whatever is left of `r1` after the previous segments.
    pub fn difference(r1: &HeightRange, r2: &HeightRange) -> HeightRange {
        let ranges = r2.ranges.iter().fold(r1.ranges.clone(), |remaining, sub| {
            remaining
                .iter()
                .flat_map(|segment| Range::difference(segment, sub))
                .collect()
        });
        HeightRange { ranges }
    }

    /// All heights in either set, normalized.
    pub fn union(r1: &HeightRange, r2: &HeightRange) -> HeightRange {
        HeightRange {
            ranges: r1.ranges.iter().chain(&r2.ranges).copied().collect(),
        }
        .normalize()
    }

    /// Sorts the segments and merges the ones that overlap or touch into
    /// maximal runs.
    pub fn normalize(&self) -> HeightRange {
        let ranges = self
            .ranges
            .iter()
            .copied()
            .sorted()
            .coalesce(|a, b| {
                if a.end().saturating_add(1) >= b.start() {
                    Ok(Range::new_unchecked(a.start(), a.end().max(b.end())))
                } else {
                    Err((a, b))
                }
            })
            .collect();
        HeightRange { ranges }
    }
}

impl From<Range> for HeightRange {
    fn from(range: Range) -> Self {
        Self::new(vec![range])
    }
}

impl FromIterator<Range> for HeightRange {
    fn from_iter<T: IntoIterator<Item = Range>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Display for HeightRange {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}]", self.ranges.iter().format(", "))
    }
}
