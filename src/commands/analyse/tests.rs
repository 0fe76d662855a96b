use super::*;
use crate::{
    cli::AnalysisArgs,
    constants::{CLUSTERS_OUTPUT_FILENAME, SVS_OUTPUT_FILENAME},
    utils::util::init_logger,
};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const HEADER: &str = "id\ttype\tchr_start\tpos_start\torient_start\tchr_end\tpos_end\torient_end\tcn_start\tcn_change_start\tcn_end\tcn_change_end\tjcn\tjcn_uncertainty\tinsert_seq\thomology\tasm_start\tasm_end\tequivalent";

const GOOD_ROWS: [&str; 2] = [
    "a\tINV\t1\t100\t1\t1\t300\t1\t3\t1\t3\t1\t1\t0.25\t.\t.\t.\t.\tfalse",
    "b\tINV\t1\t200\t-1\t1\t400\t-1\t3\t1\t3\t1\t1\t0.25\t.\t.\t.\t.\tfalse",
];

fn write_sample(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut contents = format!("{HEADER}\n");
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    std::fs::write(&path, contents).unwrap();
    path
}

fn cohort_args(dir: &Path, fail_on_sample_error: bool) -> AnalyseArgs {
    let good = write_sample(dir, "good.tsv", &GOOD_ROWS);
    let bad = write_sample(
        dir,
        "bad.tsv",
        &["x\tDEL\t1\tnot_a_position\t1\t1\t300\t-1\t3\t1\t3\t1\t1\t0.25\t.\t.\t.\t.\tfalse"],
    );
    let list = dir.join("samples.tsv");
    std::fs::write(
        &list,
        format!("S1\t{}\nS2\t{}\n", good.display(), bad.display()),
    )
    .unwrap();
    AnalyseArgs {
        sample: None,
        variants: None,
        loh: None,
        sample_list: Some(list),
        fragile_sites: None,
        line_regions: None,
        centromeres: None,
        output_dir: dir.join("out"),
        num_threads: 2,
        fail_on_sample_error,
        analysis: AnalysisArgs::default(),
    }
}

#[test]
fn test_cohort_run_skips_failed_sample() {
    init_logger();
    let dir = tempdir().unwrap();
    let args = cohort_args(dir.path(), false);
    let output_dir = args.output_dir.clone();
    analyse(args).unwrap();

    let svs = std::fs::read_to_string(output_dir.join(SVS_OUTPUT_FILENAME)).unwrap();
    assert_eq!(svs.lines().count(), 3);
    assert!(svs.lines().skip(1).all(|l| l.starts_with("S1\t")));
    let clusters = std::fs::read_to_string(output_dir.join(CLUSTERS_OUTPUT_FILENAME)).unwrap();
    assert!(clusters.contains("S1\t0\t2\tDEL\t"));

    let stats: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(output_dir.join(RUN_STATS_FILENAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(stats["samples_total"], 2);
    assert_eq!(stats["samples_succeeded"], 1);
    assert_eq!(stats["samples_failed"][0]["sample_id"], "S2");
}

#[test]
fn test_cohort_run_fails_when_requested() {
    init_logger();
    let dir = tempdir().unwrap();
    let args = cohort_args(dir.path(), true);
    let output_dir = args.output_dir.clone();
    let err = analyse(args).unwrap_err();
    assert!(err.to_string().contains("1 of 2 samples failed"));
    // every sample is still attempted and reported
    assert!(output_dir.join(RUN_STATS_FILENAME).exists());
}

#[test]
fn test_single_sample_failure_is_fatal() {
    init_logger();
    let dir = tempdir().unwrap();
    let bad = write_sample(dir.path(), "bad.tsv", &["x\tXYZ"]);
    let args = AnalyseArgs {
        sample: Some("S9".to_string()),
        variants: Some(bad),
        loh: None,
        sample_list: None,
        fragile_sites: None,
        line_regions: None,
        centromeres: None,
        output_dir: dir.path().join("out"),
        num_threads: 1,
        fail_on_sample_error: false,
        analysis: AnalysisArgs::default(),
    };
    let err = analyse(args).unwrap_err();
    assert!(matches!(err, SvReconError::SampleFailed { ref sample, .. } if sample == "S9"));
}

#[test]
fn test_load_reference_reads_region_files() {
    let dir = tempdir().unwrap();
    let fragile = dir.path().join("fragile.bed");
    std::fs::write(&fragile, "chr3\t1000\t2000\tFRA3B\n").unwrap();
    let centromeres = dir.path().join("centromeres.tsv");
    std::fs::write(&centromeres, "1\t500\n").unwrap();
    let mut args = cohort_args(dir.path(), false);
    args.fragile_sites = Some(fragile);
    args.centromeres = Some(centromeres);

    let reference = load_reference(&args).unwrap();
    assert!(reference.is_fragile_site("3", 1_500));
    assert!(!reference.is_fragile_site("3", 2_500));
    assert_eq!(reference.arm("1", 600), crate::core::breakend::ChromosomeArm::Q);
}
