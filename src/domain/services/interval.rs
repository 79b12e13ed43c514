//! Half-open time ranges and sets of them.
//!
//! `Interval` is `[start, end)`: two intervals that merely touch do not
//! overlap. `IntervalSet` keeps its members sorted, disjoint and merged, so
//! the free time of a day can be built with plain union and subtract calls.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// `None` for empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        Interval::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// What is left of `self` once `cut` is removed: zero, one or two pieces.
    pub fn subtract(&self, cut: &Interval) -> Vec<Interval> {
        if !self.overlaps(cut) {
            return vec![*self];
        }
        [Interval::new(self.start, cut.start), Interval::new(cut.end, self.end)]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the union of arbitrary, possibly overlapping intervals.
    pub fn from_intervals<I: IntoIterator<Item = Interval>>(items: I) -> Self {
        let mut sorted: Vec<Interval> = items.into_iter().collect();
        sorted.sort();

        let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
        for next in sorted {
            match merged.last_mut() {
                Some(last) if next.start <= last.end => {
                    last.end = last.end.max(next.end);
                }
                _ => merged.push(next),
            }
        }

        Self { intervals: merged }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        IntervalSet::from_intervals(self.intervals.iter().chain(other.intervals.iter()).copied())
    }

    pub fn subtract_interval(&self, cut: &Interval) -> IntervalSet {
        IntervalSet {
            intervals: self.intervals.iter().flat_map(|i| i.subtract(cut)).collect(),
        }
    }

    pub fn subtract<'a, I: IntoIterator<Item = &'a Interval>>(&self, cuts: I) -> IntervalSet {
        cuts.into_iter().fold(self.clone(), |acc, cut| acc.subtract_interval(cut))
    }

    pub fn clip(&self, bounds: &Interval) -> IntervalSet {
        IntervalSet {
            intervals: self.intervals.iter().filter_map(|i| i.intersect(bounds)).collect(),
        }
    }

    /// True when `interval` fits entirely inside one member.
    pub fn contains(&self, interval: &Interval) -> bool {
        self.intervals.iter().any(|i| i.contains(interval))
    }

    pub fn total_minutes(&self) -> i64 {
        self.intervals.iter().map(|i| i.duration().num_minutes()).sum()
    }
}
