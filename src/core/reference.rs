use crate::{
    core::{
        breakend::ChromosomeArm,
        containers::interval_tree::{Interval, IntervalTree},
    },
    utils::util::normalize_chromosome,
};
use std::collections::HashMap;

/// Named regions per chromosome, keyed without any `chr` prefix.
pub type RegionSet = HashMap<String, IntervalTree<i64, String>>;

/// Centromere starts on GRCh37.
const GRCH37_CENTROMERES: [(&str, i64); 24] = [
    ("1", 121_535_434),
    ("2", 92_326_171),
    ("3", 90_504_854),
    ("4", 49_660_117),
    ("5", 46_405_641),
    ("6", 58_830_166),
    ("7", 58_054_331),
    ("8", 43_838_887),
    ("9", 47_367_679),
    ("10", 39_254_935),
    ("11", 51_644_205),
    ("12", 34_856_694),
    ("13", 16_000_000),
    ("14", 16_000_000),
    ("15", 17_000_000),
    ("16", 35_335_801),
    ("17", 22_263_006),
    ("18", 15_460_898),
    ("19", 24_681_782),
    ("20", 26_369_569),
    ("21", 11_288_129),
    ("22", 13_000_000),
    ("X", 58_632_012),
    ("Y", 10_104_553),
];

pub fn region_set(regions: impl IntoIterator<Item = (String, i64, i64, String)>) -> RegionSet {
    let mut by_chromosome: HashMap<String, Vec<Interval<i64, String>>> = HashMap::new();
    for (chromosome, start, end, name) in regions {
        by_chromosome
            .entry(normalize_chromosome(&chromosome).to_string())
            .or_default()
            .push(Interval::new(start, end, name));
    }
    by_chromosome
        .into_iter()
        .map(|(chromosome, intervals)| (chromosome, IntervalTree::new(intervals)))
        .collect()
}

/// Read-only context shared by every sample of a run.
#[derive(Debug, Default)]
pub struct ReferenceData {
    centromeres: HashMap<String, i64>,
    fragile_sites: RegionSet,
    line_regions: RegionSet,
}

impl ReferenceData {
    pub fn new(centromeres: HashMap<String, i64>) -> Self {
        Self {
            centromeres: centromeres
                .into_iter()
                .map(|(chromosome, position)| {
                    (normalize_chromosome(&chromosome).to_string(), position)
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn grch37() -> Self {
        Self::new(
            GRCH37_CENTROMERES
                .iter()
                .map(|(chromosome, position)| (chromosome.to_string(), *position))
                .collect(),
        )
    }

    pub fn with_fragile_sites(mut self, fragile_sites: RegionSet) -> Self {
        self.fragile_sites = fragile_sites;
        self
    }

    pub fn with_line_regions(mut self, line_regions: RegionSet) -> Self {
        self.line_regions = line_regions;
        self
    }

    /// Chromosomes without a known centromere are treated as a single P arm.
    pub fn arm(&self, chromosome: &str, position: i64) -> ChromosomeArm {
        match self.centromeres.get(normalize_chromosome(chromosome)) {
            Some(&centromere) if position >= centromere => ChromosomeArm::Q,
            _ => ChromosomeArm::P,
        }
    }

    pub fn is_fragile_site(&self, chromosome: &str, position: i64) -> bool {
        Self::in_regions(&self.fragile_sites, chromosome, position)
    }

    pub fn in_line_region(&self, chromosome: &str, position: i64) -> bool {
        Self::in_regions(&self.line_regions, chromosome, position)
    }

    fn in_regions(regions: &RegionSet, chromosome: &str, position: i64) -> bool {
        regions
            .get(normalize_chromosome(chromosome))
            .is_some_and(|tree| tree.contains_point(position))
    }
}
