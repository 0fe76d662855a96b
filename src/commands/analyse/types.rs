use crate::{
    cli::AnalysisArgs,
    core::{reference::ReferenceData, sample::SampleResult},
    io::cohort_writer::SharedCohortWriter,
};

/// What a worker reports back for one sample.
#[derive(Debug)]
pub enum SampleOutcome {
    Completed(SampleResult),
    Failed { sample_id: String, message: String },
}

/// Read-only state shared by every worker for the lifetime of a run.
pub struct RunContext {
    pub reference: ReferenceData,
    pub analysis: AnalysisArgs,
    pub(crate) writer: SharedCohortWriter,
}
