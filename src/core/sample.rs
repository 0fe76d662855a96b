//! Per-sample pipeline: index, cluster, link, fold, annotate, chain, classify, measure.

use crate::{
    cli::AnalysisArgs,
    core::{
        arm_topology::{ArmTopology, analyse_arms},
        breakend::{BreakendId, BreakendSide, LineElementType, VariantId},
        breakend_index::BreakendIndex,
        chain::{Chain, ChainId, build_chains},
        classify::{ResolvedType, SyntheticLengths, annotate_cluster, classify_cluster},
        cluster::{Cluster, ClusterId},
        clustering::ProximityClusterer,
        double_minute::DoubleMinuteFinder,
        foldback::FoldbackFinder,
        jcn::{Replication, refine_breakend_jcn},
        line_element::annotate_line_elements,
        links::ClusterLinks,
        loh::LohSegments,
        metrics::ClusterMetrics,
        reference::ReferenceData,
        svtype::SvType,
        variant::{BreakendLookup, Variant, VariantRecord},
    },
    error::SvReconError,
    utils::util::Result,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BreakendAnnotation {
    pub deletion_bridge_length: Option<i64>,
    pub foldback_partner: Option<String>,
    pub foldback_length: Option<i64>,
    pub arm_group: Option<usize>,
    pub topology: Option<ArmTopology>,
    pub ti_count: Option<usize>,
    pub line_element: LineElementType,
    pub fragile_site: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantAnnotation {
    pub id: String,
    pub svtype: SvType,
    pub cluster: ClusterId,
    pub chain: Option<ChainId>,
    pub chain_index: Option<usize>,
    pub start: BreakendAnnotation,
    pub end: Option<BreakendAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub id: ClusterId,
    pub variant_count: usize,
    pub resolved_type: ResolvedType,
    pub synthetic: Option<SyntheticLengths>,
    pub annotations: Vec<String>,
    pub metrics: ClusterMetrics,
    pub chain_count: usize,
    pub closed_chains: usize,
    pub open_breakends: usize,
}

/// In-memory output of one sample, consumed by the cohort writers.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    pub sample_id: String,
    pub variants: Vec<VariantAnnotation>,
    pub clusters: Vec<ClusterSummary>,
    pub excluded: Vec<String>,
}

/// A sample's variant arena and clusters after the full pipeline.
#[derive(Debug)]
pub struct SampleGraph<'a> {
    pub sample_id: String,
    pub variants: Vec<Variant>,
    pub clusters: Vec<Cluster>,
    pub excluded: Vec<String>,
    loh: &'a LohSegments,
    args: &'a AnalysisArgs,
}

impl<'a> SampleGraph<'a> {
    pub fn build(
        sample_id: &str,
        records: &[VariantRecord],
        reference: &ReferenceData,
        loh: &'a LohSegments,
        args: &'a AnalysisArgs,
    ) -> Result<Self> {
        let (variants, excluded) = load_variants(sample_id, records, reference);
        let mut graph = Self {
            sample_id: sample_id.to_string(),
            variants,
            clusters: Vec::new(),
            excluded,
            loh,
            args,
        };

        let index = BreakendIndex::build(&graph.variants);
        let groups = ProximityClusterer::new(&graph.variants, &index, loh, args).run();
        for (id, members) in groups.into_iter().enumerate() {
            if let Some(&missing) = members.iter().find(|v| **v >= graph.variants.len()) {
                return Err(SvReconError::MissingClusterVariant {
                    cluster: id,
                    variant: missing,
                });
            }
            let cluster = graph.process_cluster(id, members, reference)?;
            graph.clusters.push(cluster);
        }
        graph.classify_all();

        log::debug!(
            "Sample {}: {} variants in {} clusters",
            graph.sample_id,
            graph.variants.len(),
            graph.clusters.len()
        );
        Ok(graph)
    }

    fn process_cluster(
        &mut self,
        id: ClusterId,
        members: Vec<VariantId>,
        reference: &ReferenceData,
    ) -> Result<Cluster> {
        let mut cluster = Cluster::new(id, members, &self.variants);
        for &v in &cluster.variants {
            self.variants[v].cluster = Some(id);
        }

        cluster.links = ClusterLinks::find(&self.variants, &cluster.index);
        cluster.foldbacks =
            FoldbackFinder::new(&self.variants, &cluster.index, &cluster.links, self.args).find();
        cluster.line = annotate_line_elements(
            &self.variants,
            &cluster.index,
            &cluster.links,
            reference,
            self.args,
        );
        for (be, status) in &cluster.line.breakends {
            self.variants[be.variant].breakend_mut(be.side).line_element = *status;
        }

        refine_breakend_jcn(&mut self.variants, &cluster.variants)?;
        let replication = Replication::compute(&self.variants, &cluster.variants);
        let chaining = build_chains(
            &self.variants,
            &cluster.variants,
            &cluster.links,
            &replication,
            self.args,
        );
        cluster.chains = chaining.chains;
        cluster.replicated = chaining.replicated;

        log::trace!(
            "Cluster {id}: {} variants, {} links, {} foldbacks, {} chains",
            cluster.len(),
            cluster.links.len(),
            cluster.foldbacks.len(),
            cluster.chains.len()
        );
        Ok(cluster)
    }

    /// Double-minute, arm topology, classification and metrics for every cluster.
    ///
    /// Reads only the cluster's links and chains, so repeated calls agree.
    pub fn classify_all(&mut self) {
        for cluster in &mut self.clusters {
            cluster.double_minute = if cluster.line.has_linking_line_elements {
                None
            } else {
                DoubleMinuteFinder::new(
                    &self.variants,
                    &cluster.variants,
                    &cluster.links,
                    &cluster.foldbacks,
                    self.args,
                )
                .find(&cluster.chains)
            };
            cluster.arm_groups = analyse_arms(
                &self.variants,
                &cluster.index,
                &cluster.links,
                &cluster.foldbacks,
                &cluster.line,
            );

            let classification = classify_cluster(cluster, &self.variants, self.loh, self.args);
            cluster.resolved_type = classification.resolved_type;
            cluster.synthetic = classification.synthetic;
            if cluster.resolved_type.splits_chains() && cluster.chains.iter().any(|c| c.len() > 1) {
                log::trace!("Cluster {}: splitting chains for {}", cluster.id, cluster.resolved_type);
                cluster.chains = cluster
                    .variants
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Chain::singleton(i, &self.variants[*v]))
                    .collect();
            }

            cluster.annotations = annotate_cluster(cluster, &self.variants);
            cluster.metrics = ClusterMetrics::compute(cluster, &self.variants);
        }
    }

    pub fn cluster_of(&self, variant: VariantId) -> Option<&Cluster> {
        self.variants[variant].cluster.map(|id| &self.clusters[id])
    }

    fn breakend_annotation(&self, cluster: &Cluster, be: BreakendId) -> BreakendAnnotation {
        let breakend = self.variants.breakend(be);
        let foldback = cluster.foldbacks.get(be);
        let group = cluster.arm_groups.iter().find(|g| g.contains(be));
        BreakendAnnotation {
            deletion_bridge_length: cluster.links.deletion_bridge(be).map(|db| db.length),
            foldback_partner: foldback.map(|fb| {
                format!(
                    "{}:{}",
                    self.variants[fb.partner.variant].id,
                    match fb.partner.side {
                        BreakendSide::Start => "start",
                        BreakendSide::End => "end",
                    }
                )
            }),
            foldback_length: foldback.map(|fb| fb.length),
            arm_group: group.map(|g| g.id),
            topology: group.map(|g| g.topology),
            ti_count: group.map(|g| g.ti_count),
            line_element: breakend.line_element,
            fragile_site: breakend.is_fragile_site,
        }
    }

    pub fn result(&self) -> SampleResult {
        let mut variants = Vec::with_capacity(self.variants.len());
        for variant in &self.variants {
            let Some(cluster) = self.cluster_of(variant.index) else {
                continue;
            };
            let position = cluster.chain_position(variant.index);
            variants.push(VariantAnnotation {
                id: variant.id.clone(),
                svtype: variant.svtype,
                cluster: cluster.id,
                chain: position.map(|(chain, _)| chain.id),
                chain_index: position.map(|(_, i)| i),
                start: self.breakend_annotation(cluster, BreakendId::start(variant.index)),
                end: variant
                    .end()
                    .map(|end| self.breakend_annotation(cluster, end.id)),
            });
        }

        let clusters = self
            .clusters
            .iter()
            .map(|cluster| ClusterSummary {
                id: cluster.id,
                variant_count: cluster.len(),
                resolved_type: cluster.resolved_type,
                synthetic: cluster.synthetic,
                annotations: cluster.annotations.iter().map(|a| a.to_string()).collect(),
                metrics: cluster.metrics,
                chain_count: cluster.chains.len(),
                closed_chains: cluster.closed_chains().count(),
                open_breakends: cluster.open_breakend_count(),
            })
            .collect();

        SampleResult {
            sample_id: self.sample_id.clone(),
            variants,
            clusters,
            excluded: self.excluded.clone(),
        }
    }
}

/// Validates records into the variant arena; defective records are reported once.
fn load_variants(
    sample_id: &str,
    records: &[VariantRecord],
    reference: &ReferenceData,
) -> (Vec<Variant>, Vec<String>) {
    let mut variants = Vec::with_capacity(records.len());
    let mut excluded = Vec::new();
    for record in records {
        match Variant::from_record(variants.len(), record, reference) {
            Ok(variant) => variants.push(variant),
            Err(defect) => {
                log::trace!("Excluding {}: {defect}", record.id);
                excluded.push(record.id.clone());
            }
        }
    }
    if !excluded.is_empty() {
        log::warn!(
            "Sample {sample_id}: excluded {} variants with invalid orientation or copy number: {}",
            excluded.len(),
            excluded.join(",")
        );
    }
    (variants, excluded)
}

/// Runs the full pipeline for one sample.
pub fn analyse_sample(
    sample_id: &str,
    records: &[VariantRecord],
    reference: &ReferenceData,
    loh: &LohSegments,
    args: &AnalysisArgs,
) -> Result<SampleResult> {
    Ok(SampleGraph::build(sample_id, records, reference, loh, args)?.result())
}
