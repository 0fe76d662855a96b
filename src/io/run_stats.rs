use crate::{core::sample::SampleResult, utils::util::Result};
use serde::Serialize;
use std::{collections::BTreeMap, fs::File, io::BufWriter, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSample {
    pub sample_id: String,
    pub message: String,
}

/// Cohort-wide tallies written once at the end of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub version: String,
    pub samples_total: usize,
    pub samples_succeeded: usize,
    pub samples_failed: Vec<FailedSample>,
    pub variants: usize,
    pub variants_excluded: usize,
    pub clusters: usize,
    pub resolved_types: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn new(version: &str, samples_total: usize) -> Self {
        Self {
            version: version.to_string(),
            samples_total,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, result: &SampleResult) {
        self.samples_succeeded += 1;
        self.variants += result.variants.len();
        self.variants_excluded += result.excluded.len();
        self.clusters += result.clusters.len();
        for cluster in &result.clusters {
            *self
                .resolved_types
                .entry(cluster.resolved_type.to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn record_failure(&mut self, sample_id: &str, message: &str) {
        self.samples_failed.push(FailedSample {
            sample_id: sample_id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.samples_failed.is_empty()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|error| {
            crate::svrecon_error!("Failed to create run stats at {}: {}", path.display(), error)
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
