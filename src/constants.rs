pub const DEFAULT_PROXIMITY_DISTANCE: i64 = 5000;
pub const DEFAULT_MAX_CHAINING_CLUSTER_SIZE: usize = 12;
pub const DEFAULT_CHAIN_SEARCH_BUDGET: usize = 20_000;
pub const DEFAULT_SHORT_TI_LENGTH: i64 = 1000;
pub const DEFAULT_LINE_PROXIMITY_WINDOW: i64 = 5000;
pub const DEFAULT_DM_MIN_JCN: f64 = 5.0;
pub const DEFAULT_DM_MIN_JCN_RATIO: f64 = 2.3;
pub const DEFAULT_DM_MAX_OPEN_BREAKEND_RATIO: f64 = 0.5;
pub const DEFAULT_DM_MAX_INT_EXT_RATIO: f64 = 0.5;
pub const DEFAULT_CHAINED_FOLDBACK_MAX_LENGTH: i64 = 5000;
pub const DEFAULT_LOW_JCN_THRESHOLD: f64 = 0.5;
pub const DEFAULT_LOH_BOUNDARY_TOLERANCE: i64 = 10;
pub const DEFAULT_FAIL_ON_SAMPLE_ERROR: bool = false;

// LINE insert-sequence motif
pub const LINE_POLY_RUN_MIN_LENGTH: usize = 8;
pub const LINE_MOTIF_SEARCH_WINDOW: usize = 20;

// Replication bounds for chain building
pub const MIN_JCN_UNIT: f64 = 0.5;
pub const MAX_REPLICATION_COUNT: usize = 32;
pub const REPLICATION_ROUNDING_OFFSET: f64 = 0.25;

// Chained foldbacks may pass through at most this many templated insertions
pub const MAX_CHAINED_FOLDBACK_LINKS: usize = 2;

pub const SVS_OUTPUT_FILENAME: &str = "svrecon.svs.tsv";
pub const CLUSTERS_OUTPUT_FILENAME: &str = "svrecon.clusters.tsv";
pub const RUN_STATS_FILENAME: &str = "run_stats.json";
