use crate::{
    constants::{CLUSTERS_OUTPUT_FILENAME, SVS_OUTPUT_FILENAME},
    core::sample::{BreakendAnnotation, ClusterSummary, SampleResult, VariantAnnotation},
    utils::util::{Result, fmt_opt},
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

const SVS_HEADER: &str = "sample_id\tsv_id\ttype\tcluster_id\tresolved_type\tchain_id\tchain_index\tdb_len_start\tdb_len_end\tfoldback_start\tfoldback_len_start\tfoldback_end\tfoldback_len_end\tarm_group_start\ttopology_start\tti_count_start\tarm_group_end\ttopology_end\tti_count_end\tline_start\tline_end\tfragile_start\tfragile_end";
const CLUSTERS_HEADER: &str = "sample_id\tcluster_id\tvariant_count\tresolved_type\tsynthetic_length\tsynthetic_ti_length\tannotations\tchains\tclosed_chains\topen_breakends\tdeletion_bridges\tdeletion_bridge_length\ttraversed_deletions\ttraversed_deletion_length\tassembled_tis\timplied_tis\ttotal_range\tchained_length\tfoldback_pairs";

pub(crate) type SharedCohortWriter = Arc<CohortWriter>;

/// Append-only cohort tables; each sample's rows are written under one lock per file.
pub(crate) struct CohortWriter {
    svs: Mutex<BufWriter<File>>,
    clusters: Mutex<BufWriter<File>>,
}

fn create_table(path: &Path, header: &str) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|error| {
        crate::svrecon_error!("Failed to create output file at {}: {}", path.display(), error)
    })?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{header}")
        .map_err(|error| crate::svrecon_error!("Failed to write header to {}: {error}", path.display()))?;
    Ok(writer)
}

impl CohortWriter {
    pub(crate) fn from_dir(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir).map_err(|error| {
            crate::svrecon_error!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                error
            )
        })?;
        Ok(Self {
            svs: Mutex::new(create_table(&output_dir.join(SVS_OUTPUT_FILENAME), SVS_HEADER)?),
            clusters: Mutex::new(create_table(
                &output_dir.join(CLUSTERS_OUTPUT_FILENAME),
                CLUSTERS_HEADER,
            )?),
        })
    }

    pub(crate) fn write_sample(&self, result: &SampleResult) -> Result<()> {
        let sample_id = sanitize_tsv_field(&result.sample_id);
        let resolved_of = |cluster: usize| {
            result
                .clusters
                .get(cluster)
                .map_or_else(String::new, |c| c.resolved_type.to_string())
        };

        {
            let mut writer = lock(&self.svs)?;
            for variant in &result.variants {
                write_row(
                    &mut writer,
                    &sv_row(&sample_id, variant, resolved_of(variant.cluster)),
                )?;
            }
            writer
                .flush()
                .map_err(|error| crate::svrecon_error!("Failed to flush SV rows: {error}"))?;
        }

        let mut writer = lock(&self.clusters)?;
        for cluster in &result.clusters {
            write_row(&mut writer, &cluster_row(&sample_id, cluster))?;
        }
        writer
            .flush()
            .map_err(|error| crate::svrecon_error!("Failed to flush cluster rows: {error}"))?;
        Ok(())
    }
}

fn lock(writer: &Mutex<BufWriter<File>>) -> Result<MutexGuard<'_, BufWriter<File>>> {
    writer
        .lock()
        .map_err(|_| crate::svrecon_error!("Cohort file writer lock poisoned"))
}

fn sv_row(sample_id: &str, variant: &VariantAnnotation, resolved_type: String) -> Vec<String> {
    let mut row = vec![
        sample_id.to_string(),
        sanitize_tsv_field(&variant.id),
        variant.svtype.to_string(),
        variant.cluster.to_string(),
        resolved_type,
        fmt_opt(variant.chain),
        fmt_opt(variant.chain_index),
    ];
    let ends = [Some(&variant.start), variant.end.as_ref()];
    let field = |f: &dyn Fn(&BreakendAnnotation) -> String| -> Vec<String> {
        ends.iter()
            .map(|end| end.map_or_else(|| ".".to_string(), f))
            .collect()
    };
    row.extend(field(&|e| fmt_opt(e.deletion_bridge_length)));
    for end in ends {
        row.push(end.map_or_else(
            || ".".to_string(),
            |e| fmt_opt(e.foldback_partner.as_deref().map(sanitize_tsv_field)),
        ));
        row.push(end.map_or_else(|| ".".to_string(), |e| fmt_opt(e.foldback_length)));
    }
    for end in ends {
        row.push(end.map_or_else(|| ".".to_string(), |e| fmt_opt(e.arm_group)));
        row.push(end.map_or_else(|| ".".to_string(), |e| fmt_opt(e.topology)));
        row.push(end.map_or_else(|| ".".to_string(), |e| fmt_opt(e.ti_count)));
    }
    row.extend(field(&|e| e.line_element.to_string()));
    row.extend(field(&|e| e.fragile_site.to_string()));
    row
}

fn cluster_row(sample_id: &str, cluster: &ClusterSummary) -> Vec<String> {
    let metrics = &cluster.metrics;
    let annotations = if cluster.annotations.is_empty() {
        ".".to_string()
    } else {
        cluster.annotations.join(";")
    };
    vec![
        sample_id.to_string(),
        cluster.id.to_string(),
        cluster.variant_count.to_string(),
        cluster.resolved_type.to_string(),
        fmt_opt(cluster.synthetic.map(|s| s.length)),
        fmt_opt(cluster.synthetic.map(|s| s.ti_length)),
        annotations,
        cluster.chain_count.to_string(),
        cluster.closed_chains.to_string(),
        cluster.open_breakends.to_string(),
        metrics.deletion_bridges.to_string(),
        metrics.deletion_bridge_length.to_string(),
        metrics.traversed_deletions.to_string(),
        metrics.traversed_deletion_length.to_string(),
        metrics.assembled_tis.to_string(),
        metrics.implied_tis.to_string(),
        metrics.total_range.to_string(),
        metrics.chained_length.to_string(),
        metrics.foldback_pairs.to_string(),
    ]
}

fn sanitize_tsv_field(input: &str) -> String {
    input
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn write_row(writer: &mut BufWriter<File>, fields: &[String]) -> Result<()> {
    writeln!(writer, "{}", fields.join("\t"))
        .map_err(|error| crate::svrecon_error!("Failed to write output row: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cli::AnalysisArgs,
        core::{
            loh::LohSegments,
            reference::ReferenceData,
            sample::analyse_sample,
            variant::test_utils::{inv, sgl_record},
        },
    };
    use tempfile::tempdir;

    #[test]
    fn test_cohort_writer_rows_match_headers() {
        let dir = tempdir().expect("temp dir should be created");
        let writer = CohortWriter::from_dir(dir.path()).expect("writer should initialize");

        let result = analyse_sample(
            "tumour\t1",
            &[
                inv("a", "1", 100, 300, 1),
                inv("b", "1", 200, 400, -1),
                sgl_record("s", ("5", 1_000, 1), 1.0),
            ],
            &ReferenceData::grch37(),
            &LohSegments::default(),
            &AnalysisArgs::default(),
        )
        .expect("sample should be analysed");
        writer.write_sample(&result).expect("rows should be written");
        drop(writer);

        let svs = std::fs::read_to_string(dir.path().join(SVS_OUTPUT_FILENAME)).unwrap();
        let lines: Vec<&str> = svs.lines().collect();
        assert_eq!(lines.len(), 4);
        let columns = SVS_HEADER.split('\t').count();
        assert!(lines.iter().all(|l| l.split('\t').count() == columns));
        assert!(lines[1].starts_with("tumour\\t1\ta\tINV\t0\tDEL\t"));
        assert!(lines[3].contains("\tSGL\t"));
        // single-breakend variants leave every end column empty
        let sgl: Vec<&str> = lines[3].split('\t').collect();
        assert_eq!(sgl[8], ".");
        assert_eq!(sgl[22], ".");

        let clusters = std::fs::read_to_string(dir.path().join(CLUSTERS_OUTPUT_FILENAME)).unwrap();
        let lines: Vec<&str> = clusters.lines().collect();
        assert_eq!(lines.len(), 3);
        let columns = CLUSTERS_HEADER.split('\t').count();
        assert!(lines.iter().all(|l| l.split('\t').count() == columns));
        assert!(lines[1].contains("\tDEL\t300\t99\t"));
    }
}
