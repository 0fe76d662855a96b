use crate::{
    cli::{AnalyseArgs, FULL_VERSION, SampleJob},
    constants::RUN_STATS_FILENAME,
    core::reference::ReferenceData,
    error::SvReconError,
    io::{
        cohort_writer::CohortWriter,
        region_reader::{read_centromeres, read_region_set},
        run_stats::RunStats,
    },
    utils::util::{Result, format_number_with_commas},
};
use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPoolBuilder, prelude::*};
use std::{sync::Arc, thread};

mod shutdown;
mod types;
mod worker;

use shutdown::{aggregate_shutdown_errors, join_thread_result};
use types::{RunContext, SampleOutcome};
use worker::process_sample;

#[cfg(test)]
mod tests;

/// Reference context shared by every sample of the run.
pub fn load_reference(args: &AnalyseArgs) -> Result<ReferenceData> {
    let mut reference = match args.centromeres.as_ref() {
        Some(path) => ReferenceData::new(read_centromeres(path)?),
        None => ReferenceData::grch37(),
    };
    if let Some(path) = args.fragile_sites.as_ref() {
        reference = reference.with_fragile_sites(read_region_set(path)?);
    }
    if let Some(path) = args.line_regions.as_ref() {
        reference = reference.with_line_regions(read_region_set(path)?);
    }
    Ok(reference)
}

fn collect_outcomes(receiver: Receiver<SampleOutcome>, samples_total: usize) -> RunStats {
    let mut stats = RunStats::new(&FULL_VERSION, samples_total);
    for outcome in receiver {
        match outcome {
            SampleOutcome::Completed(result) => {
                log::info!(
                    "Sample {}: {} variants, {} clusters, {} excluded",
                    result.sample_id,
                    result.variants.len(),
                    result.clusters.len(),
                    result.excluded.len()
                );
                stats.record_success(&result);
            }
            SampleOutcome::Failed { sample_id, message } => {
                log::error!("Sample {sample_id} failed: {message}");
                stats.record_failure(&sample_id, &message);
            }
        }
    }
    log::debug!("Collector thread finished.");
    stats
}

/// Applies the run's failure policy once every sample has been attempted.
fn check_failures(stats: &RunStats, cohort_mode: bool, fail_on_sample_error: bool) -> Result<()> {
    let Some(first) = stats.samples_failed.first() else {
        return Ok(());
    };
    if !cohort_mode {
        return Err(SvReconError::SampleFailed {
            sample: first.sample_id.clone(),
            message: first.message.clone(),
        });
    }
    if fail_on_sample_error {
        return Err(crate::svrecon_error!(
            "{} of {} samples failed: {}",
            stats.samples_failed.len(),
            stats.samples_total,
            stats
                .samples_failed
                .iter()
                .map(|f| f.sample_id.as_str())
                .collect::<Vec<_>>()
                .join(",")
        ));
    }
    log::warn!(
        "{} of {} samples failed and were skipped",
        stats.samples_failed.len(),
        stats.samples_total
    );
    Ok(())
}

pub fn analyse(args: AnalyseArgs) -> Result<()> {
    let jobs: Vec<SampleJob> = args
        .sample_jobs()
        .map_err(|error| crate::svrecon_error!("{error}"))?;
    let cohort_mode = args.is_cohort_mode();
    log::info!(
        "Analysing {} sample(s) with {} thread(s)",
        jobs.len(),
        args.num_threads
    );

    let context = Arc::new(RunContext {
        reference: load_reference(&args)?,
        analysis: args.analysis.clone(),
        writer: Arc::new(CohortWriter::from_dir(&args.output_dir)?),
    });

    let (outcome_sender, outcome_receiver): (Sender<SampleOutcome>, Receiver<SampleOutcome>) =
        unbounded();
    let samples_total = jobs.len();
    let collector_thread = thread::spawn(move || -> Result<RunStats> {
        log::debug!("Collector thread started.");
        Ok(collect_outcomes(outcome_receiver, samples_total))
    });

    log::debug!(
        "Initializing sample thread pool with {} threads...",
        args.num_threads
    );
    let pool = ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .thread_name(|i| format!("svrecon-sample-{i}"))
        .build()
        .map_err(|e| crate::svrecon_error!("Failed to initialize sample thread pool: {e}"))?;

    let worker_context = Arc::clone(&context);
    let worker_result: Result<()> = pool.install(|| {
        jobs.par_iter().try_for_each_with(outcome_sender, |sender, job| {
            process_sample(job, &worker_context, sender)
        })
    });

    let mut errors = Vec::new();
    if let Err(error) = worker_result {
        errors.push(error);
    }
    let stats = match join_thread_result("Collector", collector_thread) {
        Ok(stats) => Some(stats),
        Err(error) => {
            errors.push(error);
            None
        }
    };
    aggregate_shutdown_errors(errors)?;
    let Some(stats) = stats else {
        return Err(crate::svrecon_error!("Collector thread produced no run statistics"));
    };

    stats.write(&args.output_dir.join(RUN_STATS_FILENAME))?;
    log::info!(
        "Analysed {}/{} samples: {} variants in {} clusters",
        stats.samples_succeeded,
        stats.samples_total,
        format_number_with_commas(stats.variants),
        format_number_with_commas(stats.clusters)
    );
    check_failures(&stats, cohort_mode, args.fail_on_sample_error)
}
