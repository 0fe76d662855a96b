use crate::core::{
    cluster::Cluster,
    links::Link,
    variant::{BreakendLookup, Variant},
};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClusterMetrics {
    pub deletion_bridges: usize,
    pub deletion_bridge_length: i64,
    /// Deletion bridges lying wholly inside a chained templated insertion.
    pub traversed_deletions: usize,
    pub traversed_deletion_length: i64,
    pub assembled_tis: usize,
    pub implied_tis: usize,
    pub total_range: i64,
    pub chained_length: i64,
    pub foldback_pairs: usize,
}

impl ClusterMetrics {
    pub fn compute(cluster: &Cluster, variants: &[Variant]) -> Self {
        let mut metrics = ClusterMetrics::default();

        for db in cluster.links.deletion_bridges() {
            metrics.deletion_bridges += 1;
            metrics.deletion_bridge_length += db.length;
        }

        let chained: BTreeSet<_> = cluster
            .chains
            .iter()
            .flat_map(|c| c.links.iter().copied())
            .collect();
        let chained: Vec<&Link> = chained
            .into_iter()
            .map(|id| cluster.links.get(id))
            .filter(|l| l.is_templated_insertion())
            .collect();
        for ti in &chained {
            if ti.is_assembled() {
                metrics.assembled_tis += 1;
            } else {
                metrics.implied_tis += 1;
            }
            metrics.chained_length += ti.length;
        }

        for db in cluster.links.deletion_bridges() {
            let traversed = chained.iter().any(|ti| {
                ti.covers(&db.chromosome, db.lower_position)
                    && ti.covers(&db.chromosome, db.upper_position)
            });
            if traversed {
                metrics.traversed_deletions += 1;
                metrics.traversed_deletion_length += db.length;
            }
        }

        metrics.total_range = cluster
            .index
            .chromosomes()
            .filter_map(|(_, ordered)| {
                let first = variants.breakend(*ordered.first()?).position;
                let last = variants.breakend(*ordered.last()?).position;
                Some(last - first)
            })
            .sum();
        metrics.foldback_pairs = cluster.foldbacks.pairs().len();
        metrics
    }
}
