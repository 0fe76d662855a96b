use crate::constants::*;
use anyhow::{anyhow, Result};
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

/// Full version string including the crate version and git description.
///
/// # Examples
/// * `0.1.0-1ba958a-dirty` - while on a dirty branch
/// * `0.1.0-1ba958a` - with a fresh commit
pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    let git_describe = option_env!("VERGEN_GIT_DESCRIBE").unwrap_or_default();
    if git_describe.is_empty() {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), git_describe)
    }
});

#[derive(Parser, Debug)]
#[command(name="svrecon",
          version=&**FULL_VERSION,
          about="Somatic structural variant clustering, chaining and classification",
          long_about = None,
          after_help = format!("Copyright (C) {}     svrecon developers
          This program comes with ABSOLUTELY NO WARRANTY; it is intended for
          Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Analyse(AnalyseArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Analyse(_) => "analyse",
        }
    }
}

/// One sample to analyse, either from the command line or a cohort list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleJob {
    pub sample_id: String,
    pub variants_path: PathBuf,
    pub loh_path: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["variants", "sample_list"]),
))]
#[command(arg_required_else_help(true))]
pub struct AnalyseArgs {
    /// Sample identifier for single-sample mode
    #[arg(long = "sample", value_name = "SAMPLE", requires = "variants")]
    pub sample: Option<String>,

    /// Variant TSV file (optionally gzipped) for single-sample mode
    #[arg(
        long = "variants",
        value_name = "TSV",
        requires = "sample",
        value_parser = check_file_exists
    )]
    pub variants: Option<PathBuf>,

    /// LOH segment BED file for single-sample mode
    #[arg(
        long = "loh",
        value_name = "BED",
        requires = "variants",
        value_parser = check_file_exists
    )]
    pub loh: Option<PathBuf>,

    /// Cohort file with one `sample_id<TAB>variants[<TAB>loh]` row per sample
    #[arg(
        long = "sample-list",
        value_name = "SAMPLE_LIST",
        value_parser = check_file_exists
    )]
    pub sample_list: Option<PathBuf>,

    /// BED file with fragile-site regions
    #[arg(
        long = "fragile-sites",
        value_name = "BED",
        value_parser = check_file_exists
    )]
    pub fragile_sites: Option<PathBuf>,

    /// BED file with known LINE source regions
    #[arg(
        long = "line-regions",
        value_name = "BED",
        value_parser = check_file_exists
    )]
    pub line_regions: Option<PathBuf>,

    /// Centromere positions (`chrom<TAB>position`) [default: built-in GRCh37 table]
    #[arg(
        long = "centromeres",
        value_name = "TSV",
        value_parser = check_file_exists
    )]
    pub centromeres: Option<PathBuf>,

    /// Directory receiving cohort TSV files and run statistics
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        value_parser = check_prefix_path
    )]
    pub output_dir: PathBuf,

    /// Number of threads to use
    #[arg(
        short = '@',
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,

    /// Exit non-zero at the end of a cohort run when any sample failed
    #[arg(
        long = "fail-on-sample-error",
        default_value_t = DEFAULT_FAIL_ON_SAMPLE_ERROR
    )]
    pub fail_on_sample_error: bool,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Thresholds read by the per-sample pipeline.
#[derive(Parser, Debug, Clone)]
pub struct AnalysisArgs {
    /// Base distance for proximity clustering of same-arm breakends
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_PROXIMITY_DISTANCE,
        value_parser = non_negative_i64
    )]
    pub proximity_distance: i64,

    /// Largest cluster (in variants) that gets a backtracking chain search
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_MAX_CHAINING_CLUSTER_SIZE
    )]
    pub max_chaining_cluster_size: usize,

    /// Number of search nodes the backtracking chain search may visit
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_CHAIN_SEARCH_BUDGET
    )]
    pub chain_search_budget: usize,

    /// Templated insertions shorter than this are treated like deletion bridges
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_SHORT_TI_LENGTH,
        value_parser = non_negative_i64
    )]
    pub short_ti_length: i64,

    /// Window within which LINE breakends pair up
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_LINE_PROXIMITY_WINDOW,
        value_parser = non_negative_i64
    )]
    pub line_proximity_window: i64,

    /// Minimum junction copy number of a double-minute amplicon
    #[arg(
        help_heading("Advanced"),
        long = "dm-min-jcn",
        default_value_t = DEFAULT_DM_MIN_JCN
    )]
    pub dm_min_jcn: f64,

    /// Minimum ratio of amplicon JCN to flanking copy number
    #[arg(
        help_heading("Advanced"),
        long = "dm-min-jcn-ratio",
        default_value_t = DEFAULT_DM_MIN_JCN_RATIO
    )]
    pub dm_min_jcn_ratio: f64,

    /// Double minutes require open/total breakends below this ratio
    #[arg(
        help_heading("Advanced"),
        long = "dm-max-open-breakend-ratio",
        default_value_t = DEFAULT_DM_MAX_OPEN_BREAKEND_RATIO,
        value_parser = ratio_in_range
    )]
    pub dm_max_open_breakend_ratio: f64,

    /// Double minutes require crossing/internal links below this ratio
    #[arg(
        help_heading("Advanced"),
        long = "dm-max-int-ext-ratio",
        default_value_t = DEFAULT_DM_MAX_INT_EXT_RATIO
    )]
    pub dm_max_int_ext_ratio: f64,

    /// Longest span a chained foldback may cover
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_CHAINED_FOLDBACK_MAX_LENGTH,
        value_parser = non_negative_i64
    )]
    pub chained_foldback_max_length: i64,

    /// Lone single breakends below this JCN are reported as LOW_VAF
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_LOW_JCN_THRESHOLD
    )]
    pub low_jcn_threshold: f64,

    /// Tolerance when matching LOH segment edges to breakends
    #[arg(
        help_heading("Advanced"),
        long,
        default_value_t = DEFAULT_LOH_BOUNDARY_TOLERANCE,
        value_parser = non_negative_i64
    )]
    pub loh_boundary_tolerance: i64,
}

impl AnalysisArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, updates: impl FnOnce(&mut Self)) -> Self {
        updates(&mut self);
        self
    }
}

impl Default for AnalysisArgs {
    fn default() -> Self {
        Self {
            proximity_distance: DEFAULT_PROXIMITY_DISTANCE,
            max_chaining_cluster_size: DEFAULT_MAX_CHAINING_CLUSTER_SIZE,
            chain_search_budget: DEFAULT_CHAIN_SEARCH_BUDGET,
            short_ti_length: DEFAULT_SHORT_TI_LENGTH,
            line_proximity_window: DEFAULT_LINE_PROXIMITY_WINDOW,
            dm_min_jcn: DEFAULT_DM_MIN_JCN,
            dm_min_jcn_ratio: DEFAULT_DM_MIN_JCN_RATIO,
            dm_max_open_breakend_ratio: DEFAULT_DM_MAX_OPEN_BREAKEND_RATIO,
            dm_max_int_ext_ratio: DEFAULT_DM_MAX_INT_EXT_RATIO,
            chained_foldback_max_length: DEFAULT_CHAINED_FOLDBACK_MAX_LENGTH,
            low_jcn_threshold: DEFAULT_LOW_JCN_THRESHOLD,
            loh_boundary_tolerance: DEFAULT_LOH_BOUNDARY_TOLERANCE,
        }
    }
}

/// Initializes the verbosity level for logging based on the command-line arguments.
///
/// Sets up the logger with a specific verbosity level that is determined
/// by the number of occurrences of the `-v` or `--verbose` flag in the command-line arguments.
pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.module_path().unwrap_or("unknown_module"),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

/// Validates that the provided string represents a valid number of threads.
fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse::<usize>()
        .map_err(|_| anyhow!("`{}` is not a valid thread number", s))?;
    if thread == 0 {
        return Err(anyhow!("Number of threads must be >= 1"));
    }
    Ok(thread)
}

/// Checks if the provided file path exists.
fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(anyhow!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(anyhow!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(path.to_path_buf())
}

fn non_negative_i64(s: &str) -> Result<i64> {
    let value: i64 = s
        .parse::<i64>()
        .map_err(|_| anyhow!("`{}` is not a valid length", s))?;
    if value < 0 {
        return Err(anyhow!("Length must be >= 0"));
    }
    Ok(value)
}

fn ratio_in_range(s: &str) -> Result<f64> {
    let value: f64 = s
        .parse::<f64>()
        .map_err(|_| anyhow!("`{}` is not a valid ratio", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("Ratio must be within [0, 1]"));
    }
    Ok(value)
}

impl AnalyseArgs {
    /// Returns true when samples come from a cohort list.
    pub fn is_cohort_mode(&self) -> bool {
        self.sample_list.is_some()
    }

    pub fn sample_jobs(&self) -> Result<Vec<SampleJob>> {
        match (&self.sample, &self.variants, &self.sample_list) {
            (Some(sample), Some(variants), None) => Ok(vec![SampleJob {
                sample_id: sample.clone(),
                variants_path: variants.clone(),
                loh_path: self.loh.clone(),
            }]),
            (_, None, Some(list_path)) => Self::read_sample_list(list_path),
            _ => Err(anyhow!(
                "Provide either --sample with --variants, or --sample-list"
            )),
        }
    }

    fn read_sample_list(path: &Path) -> Result<Vec<SampleJob>> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Failed to open sample list {}: {}", path.display(), e))?;
        let reader = BufReader::new(file);

        let mut jobs: Vec<SampleJob> = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| anyhow!("Error reading line {}: {}", line_num + 1, e))?;
            let trimmed = line.trim();
            // Skip empty or comment lines
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            jobs.push(parse_sample_row(trimmed, line_num + 1)?);
        }

        if jobs.is_empty() {
            Err(anyhow!("No samples found in {}", path.display()))?;
        }
        if let Some(dup) = first_duplicate_sample(&jobs) {
            Err(anyhow!("Sample {} is listed more than once", dup))?;
        }

        Ok(jobs)
    }
}

fn parse_sample_row(row: &str, line_num: usize) -> Result<SampleJob> {
    let fields: Vec<&str> = row.split('\t').map(str::trim).collect();
    if fields.len() < 2 || fields.len() > 3 {
        return Err(anyhow!(
            "Line {}: expected `sample_id<TAB>variants[<TAB>loh]`, found {} fields",
            line_num,
            fields.len()
        ));
    }
    let variants_path = PathBuf::from(fields[1]);
    if !variants_path.exists() {
        return Err(anyhow!(
            "Line {}: variant file does not exist: {}",
            line_num,
            variants_path.display()
        ));
    }
    let loh_path = match fields.get(2) {
        Some(p) if !p.is_empty() && *p != "." => {
            let path = PathBuf::from(p);
            if !path.exists() {
                return Err(anyhow!(
                    "Line {}: LOH file does not exist: {}",
                    line_num,
                    path.display()
                ));
            }
            Some(path)
        }
        _ => None,
    };
    Ok(SampleJob {
        sample_id: fields[0].to_string(),
        variants_path,
        loh_path,
    })
}

fn first_duplicate_sample(jobs: &[SampleJob]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    jobs.iter()
        .map(|job| job.sample_id.as_str())
        .find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_threads_in_range() {
        assert_eq!(threads_in_range("4").unwrap(), 4);
        assert!(threads_in_range("0").is_err());
        assert!(threads_in_range("four").is_err());
    }

    #[test]
    fn test_ratio_in_range() {
        assert!(ratio_in_range("0.5").is_ok());
        assert!(ratio_in_range("1.5").is_err());
    }

    #[test]
    fn test_analysis_args_with() {
        let args = AnalysisArgs::new().with(|a| a.proximity_distance = 100);
        assert_eq!(args.proximity_distance, 100);
        assert_eq!(args.short_ti_length, DEFAULT_SHORT_TI_LENGTH);
    }

    #[test]
    fn test_parse_cli_single_sample() {
        let dir = tempfile::tempdir().unwrap();
        let variants = dir.path().join("s1.tsv");
        std::fs::write(&variants, "id\n").unwrap();
        let cli = Cli::try_parse_from([
            "svrecon",
            "analyse",
            "--sample",
            "S1",
            "--variants",
            variants.to_str().unwrap(),
            "-o",
            dir.path().to_str().unwrap(),
            "--short-ti-length",
            "500",
        ])
        .unwrap();
        let Command::Analyse(args) = cli.command;
        assert!(!args.is_cohort_mode());
        assert_eq!(args.analysis.short_ti_length, 500);
        let jobs = args.sample_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].sample_id, "S1");
    }

    #[test]
    fn test_read_sample_list() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = dir.path().join("a.tsv");
        let v2 = dir.path().join("b.tsv");
        let loh = dir.path().join("b.loh.bed");
        for p in [&v1, &v2, &loh] {
            std::fs::write(p, "").unwrap();
        }
        let list = dir.path().join("samples.tsv");
        let mut f = File::create(&list).unwrap();
        writeln!(f, "# cohort").unwrap();
        writeln!(f, "A\t{}", v1.display()).unwrap();
        writeln!(f, "B\t{}\t{}", v2.display(), loh.display()).unwrap();
        drop(f);

        let jobs = AnalyseArgs::read_sample_list(&list).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].loh_path, None);
        assert_eq!(jobs[1].loh_path.as_deref(), Some(loh.as_path()));
    }

    #[test]
    fn test_read_sample_list_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = dir.path().join("a.tsv");
        std::fs::write(&v1, "").unwrap();
        let list = dir.path().join("samples.tsv");
        std::fs::write(
            &list,
            format!("A\t{}\nA\t{}\n", v1.display(), v1.display()),
        )
        .unwrap();
        assert!(AnalyseArgs::read_sample_list(&list).is_err());
    }
}
