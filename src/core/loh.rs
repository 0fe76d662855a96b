use crate::{
    core::containers::interval_tree::{Interval, IntervalTree},
    utils::util::normalize_chromosome,
};
use std::collections::HashMap;

/// A caller-reported loss-of-heterozygosity segment, closed coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LohSegment {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LohEdge {
    Start(usize),
    End(usize),
}

impl LohEdge {
    pub fn segment(self) -> usize {
        match self {
            LohEdge::Start(i) | LohEdge::End(i) => i,
        }
    }
}

/// LOH segments of one sample, with their edges indexed for tolerance lookups.
#[derive(Debug, Default)]
pub struct LohSegments {
    segments: Vec<LohSegment>,
    edges: HashMap<String, IntervalTree<i64, LohEdge>>,
}

impl LohSegments {
    pub fn new(segments: Vec<LohSegment>) -> Self {
        let mut edges: HashMap<String, Vec<Interval<i64, LohEdge>>> = HashMap::new();
        for (i, segment) in segments.iter().enumerate() {
            let bucket = edges
                .entry(normalize_chromosome(&segment.chromosome).to_string())
                .or_default();
            bucket.push(Interval::new(segment.start, segment.start, LohEdge::Start(i)));
            bucket.push(Interval::new(segment.end, segment.end, LohEdge::End(i)));
        }
        Self {
            segments,
            edges: edges
                .into_iter()
                .map(|(chromosome, intervals)| (chromosome, IntervalTree::new(intervals)))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[LohSegment] {
        &self.segments
    }

    /// Segment edges lying within `tolerance` bases of `position`.
    pub fn edges_near(&self, chromosome: &str, position: i64, tolerance: i64) -> Vec<LohEdge> {
        let mut found = Vec::new();
        if let Some(tree) = self.edges.get(normalize_chromosome(chromosome)) {
            tree.visit_overlapping(position - tolerance, position + tolerance, &mut |i| {
                found.push(i.value)
            });
        }
        found
    }

    pub fn has_edge_near(&self, chromosome: &str, position: i64, tolerance: i64) -> bool {
        !self.edges_near(chromosome, position, tolerance).is_empty()
    }
}
