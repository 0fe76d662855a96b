use super::{
    shutdown::panic_payload_message,
    types::{RunContext, SampleOutcome},
};
use crate::{
    cli::SampleJob,
    core::{loh::LohSegments, sample::{SampleResult, analyse_sample}},
    io::{region_reader::read_loh_segments, variant_reader::read_variants},
    utils::util::Result,
};
use crossbeam_channel::Sender;
use std::{
    panic::{self, AssertUnwindSafe},
    thread,
};

/// Loads, analyses and writes one sample.
pub(super) fn run_sample(job: &SampleJob, context: &RunContext) -> Result<SampleResult> {
    let records = read_variants(&job.variants_path)?;
    let loh = match job.loh_path.as_ref() {
        Some(path) => read_loh_segments(path)?,
        None => LohSegments::default(),
    };
    let result = analyse_sample(
        &job.sample_id,
        &records,
        &context.reference,
        &loh,
        &context.analysis,
    )?;
    context.writer.write_sample(&result)?;
    Ok(result)
}

/// Runs one sample to completion and reports its outcome; errors and panics stay with the sample.
pub(super) fn process_sample(
    job: &SampleJob,
    context: &RunContext,
    sender: &Sender<SampleOutcome>,
) -> Result<()> {
    let current_thread = thread::current();
    let worker_name = current_thread.name().unwrap_or("unnamed");
    log::debug!(
        "Worker [{worker_name}]: Processing sample {} from {}",
        job.sample_id,
        job.variants_path.display()
    );

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| run_sample(job, context))) {
        Ok(Ok(result)) => {
            log::debug!(
                "Worker [{worker_name}]: Sample {} finished with {} clusters",
                job.sample_id,
                result.clusters.len()
            );
            SampleOutcome::Completed(result)
        }
        Ok(Err(error)) => SampleOutcome::Failed {
            sample_id: job.sample_id.clone(),
            message: error.to_string(),
        },
        Err(panic_payload) => SampleOutcome::Failed {
            sample_id: job.sample_id.clone(),
            message: format!("panicked: {}", panic_payload_message(panic_payload.as_ref())),
        },
    };

    if let Err(error) = sender.send(outcome) {
        log::error!("Worker [{worker_name}]: Failed to send outcome to collector thread: {error}");
        return Err(crate::svrecon_error!(
            "Failed to send outcome to collector thread: {error}"
        ));
    }
    Ok(())
}
