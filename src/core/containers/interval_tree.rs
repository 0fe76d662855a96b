use num_traits::{One, Zero};
use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Div},
};

/// Closed interval `[start, stop]` carrying a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval<Scalar, Value> {
    pub start: Scalar,
    pub stop: Scalar,
    pub value: Value,
}

impl<Scalar, Value> Interval<Scalar, Value>
where
    Scalar: PartialOrd + Copy,
{
    pub fn new(s: Scalar, e: Scalar, v: Value) -> Self {
        let (start, stop) = if s <= e { (s, e) } else { (e, s) };
        Self {
            start,
            stop,
            value: v,
        }
    }

    #[inline]
    pub fn overlaps(&self, start: Scalar, stop: Scalar) -> bool {
        self.stop >= start && self.start <= stop
    }
}

impl<Scalar, Value> fmt::Display for Interval<Scalar, Value>
where
    Scalar: fmt::Display,
    Value: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}:{}", self.start, self.stop, self.value)
    }
}

// Leaves hold at most this many intervals before a node is split around its centre
const LEAF_BUCKET: usize = 32;
const MAX_DEPTH: usize = 24;

/// Centred interval tree: each node keeps the intervals spanning its centre, the rest
/// are pushed to the left or right child.
#[derive(Debug)]
pub struct IntervalTree<Scalar, Value> {
    intervals: Vec<Interval<Scalar, Value>>,
    left: Option<Box<IntervalTree<Scalar, Value>>>,
    right: Option<Box<IntervalTree<Scalar, Value>>>,
    center: Scalar,
    len: usize,
}

impl<Scalar, Value> Default for IntervalTree<Scalar, Value>
where
    Scalar: Zero,
{
    fn default() -> Self {
        Self {
            intervals: Vec::new(),
            left: None,
            right: None,
            center: Scalar::zero(),
            len: 0,
        }
    }
}

impl<Scalar, Value> IntervalTree<Scalar, Value>
where
    Scalar: PartialOrd + Copy + Add<Output = Scalar> + Div<Output = Scalar> + Zero + One,
{
    pub fn new(mut intervals: Vec<Interval<Scalar, Value>>) -> Self {
        intervals.sort_unstable_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
        Self::build(intervals, MAX_DEPTH)
    }

    fn build(intervals: Vec<Interval<Scalar, Value>>, depth: usize) -> Self {
        let len = intervals.len();
        let (Some(lo), Some(hi)) = (
            intervals.first().map(|i| i.start),
            intervals.iter().map(|i| i.stop).reduce(|a, b| if b > a { b } else { a }),
        ) else {
            return Self::default();
        };
        let center = (lo + hi) / (Scalar::one() + Scalar::one());

        if depth == 0 || len <= LEAF_BUCKET {
            return Self {
                intervals,
                left: None,
                right: None,
                center,
                len,
            };
        }

        let (lefts, rest): (Vec<_>, Vec<_>) = intervals.into_iter().partition(|i| i.stop < center);
        let (centers, rights): (Vec<_>, Vec<_>) = rest.into_iter().partition(|i| i.start <= center);

        // Sorted input keeps every partition sorted by start
        let child = |part: Vec<Interval<Scalar, Value>>| {
            (!part.is_empty()).then(|| Box::new(Self::build(part, depth - 1)))
        };
        Self {
            left: child(lefts),
            right: child(rights),
            intervals: centers,
            center,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn visit_overlapping<F>(&self, start: Scalar, stop: Scalar, f: &mut F)
    where
        F: FnMut(&Interval<Scalar, Value>),
    {
        for interval in &self.intervals {
            if interval.start > stop {
                break;
            }
            if interval.overlaps(start, stop) {
                f(interval);
            }
        }
        if start <= self.center {
            if let Some(left) = &self.left {
                left.visit_overlapping(start, stop, f);
            }
        }
        if stop >= self.center {
            if let Some(right) = &self.right {
                right.visit_overlapping(start, stop, f);
            }
        }
    }

    pub fn find_overlapping(&self, start: Scalar, stop: Scalar) -> Vec<Interval<Scalar, Value>>
    where
        Value: Clone,
    {
        let mut result = Vec::new();
        self.visit_overlapping(start, stop, &mut |i| result.push(i.clone()));
        result
    }

    /// Returns true when any interval covers `position`.
    pub fn contains_point(&self, position: Scalar) -> bool {
        let mut hit = false;
        self.visit_overlapping(position, position, &mut |_| hit = true);
        hit
    }

    pub fn visit_all<F>(&self, f: &mut F)
    where
        F: FnMut(&Interval<Scalar, Value>),
    {
        if let Some(left) = &self.left {
            left.visit_all(f);
        }
        self.intervals.iter().for_each(&mut *f);
        if let Some(right) = &self.right {
            right.visit_all(f);
        }
    }
}
