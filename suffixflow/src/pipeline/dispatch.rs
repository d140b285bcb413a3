//! Per-stage dispatch.
//!
//! `check_run` is a small state machine over the stage's execution mode:
//! check requirements, consult the skip cache, then invoke the body once,
//! per sample in order, or per sample on a bounded pool. Missing inputs and
//! body failures both set `halt` on the stage's context.

use super::cache::check_samples;
use super::report::{SampleOutcome, StageReport};
use crate::context::PipelineContext;
use crate::core::ExecutionMode;
use crate::errors::StageError;
use crate::events::{DispatchDecision, DispatchEvent, EventSink};
use crate::observability::SpanTimer;
use crate::stages::Stage;
use crate::tasks::{pool_size, worker_share, SampleTaskGroup};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Dispatches one stage against its context.
///
/// The context is the stage's own copy; `run_whole` may rewrite it, and
/// `halt` is set if any requirement is missing or any body fails. Samples
/// that pass their checks still run when another sample is missing inputs.
pub async fn check_run(
    stage: &Arc<dyn Stage>,
    ctx: &mut PipelineContext,
    sink: &dyn EventSink,
) -> StageReport {
    let config = stage.config();
    let timer = SpanTimer::start(stage.name());
    let mut report = StageReport::new(stage.name(), config.mode, stage.output_prefix(ctx, ""));

    match config.mode {
        ExecutionMode::Whole => dispatch_whole(stage, ctx, sink, &mut report).await,
        ExecutionMode::Sequential | ExecutionMode::Parallel => {
            dispatch_samples(stage, ctx, sink, &mut report).await;
        }
    }

    report.halted = ctx.halt;
    report.duration_ms = timer.elapsed_ms();
    report
}

fn event(decision: DispatchDecision, report: &StageReport, sample: &str) -> DispatchEvent {
    DispatchEvent::new(decision, &report.stage, &report.output_prefix).with_sample(sample)
}

/// Emits one event per missing path and builds the outcome.
fn report_missing(
    sink: &dyn EventSink,
    report: &StageReport,
    sample: &str,
    paths: Vec<std::path::PathBuf>,
) -> SampleOutcome {
    for path in &paths {
        sink.emit(event(DispatchDecision::Missing, report, sample).with_detail(path.display().to_string()));
    }
    SampleOutcome::MissingRequirement { paths }
}

fn report_result(
    sink: &dyn EventSink,
    report: &StageReport,
    sample: &str,
    result: Result<(), StageError>,
) -> SampleOutcome {
    match result {
        Ok(()) => SampleOutcome::Ran,
        Err(e) => {
            let error = e.to_string();
            sink.emit(event(DispatchDecision::Failed, report, sample).with_detail(&error));
            SampleOutcome::Failed { error }
        }
    }
}

async fn dispatch_whole(
    stage: &Arc<dyn Stage>,
    ctx: &mut PipelineContext,
    sink: &dyn EventSink,
    report: &mut StageReport,
) {
    let check = match check_samples(stage, ctx, Arc::new(vec![String::new()])).await {
        Ok(mut checks) => checks.pop(),
        Err(e) => {
            record_check_failure(sink, report, ctx, &[String::new()], &e);
            return;
        }
    };
    let Some(check) = check else {
        return;
    };

    if !check.missing.is_empty() {
        let outcome = report_missing(sink, report, "", check.missing);
        ctx.halt = true;
        report.record("", outcome);
        return;
    }

    if check.skip {
        sink.emit(event(DispatchDecision::Skip, report, ""));
        report.record("", SampleOutcome::Skipped);
        return;
    }

    sink.emit(event(DispatchDecision::Run, report, ""));
    let workers = ctx.worker_budget;
    let result = stage.run_whole(ctx, workers).await;
    let outcome = report_result(sink, report, "", result);
    if outcome.is_halting() {
        ctx.halt = true;
    }
    report.record("", outcome);
}

/// Fails every sample of a stage whose pre-dispatch checks could not run.
fn record_check_failure(
    sink: &dyn EventSink,
    report: &mut StageReport,
    ctx: &mut PipelineContext,
    samples: &[String],
    error: &StageError,
) {
    let error = error.to_string();
    sink.emit(event(DispatchDecision::Failed, report, "").with_detail(&error));
    for sample in samples {
        report.record(sample.clone(), SampleOutcome::Failed { error: error.clone() });
    }
    ctx.halt = true;
}

async fn dispatch_samples(
    stage: &Arc<dyn Stage>,
    ctx: &mut PipelineContext,
    sink: &dyn EventSink,
    report: &mut StageReport,
) {
    let samples = Arc::clone(&ctx.samples);
    if samples.is_empty() {
        warn!(stage = %report.stage, path = %report.output_prefix, "no samples to dispatch");
        return;
    }

    let checks = match check_samples(stage, ctx, Arc::clone(&samples)).await {
        Ok(checks) => checks,
        Err(e) => {
            record_check_failure(sink, report, ctx, &samples, &e);
            return;
        }
    };

    // Decided outcomes in sample order; `None` marks samples still to run.
    let mut decided: Vec<(String, Option<SampleOutcome>)> = Vec::with_capacity(checks.len());
    let mut work: Vec<String> = Vec::new();

    for check in checks {
        let sample = check.sample;
        if !check.missing.is_empty() {
            let outcome = report_missing(sink, report, &sample, check.missing);
            ctx.halt = true;
            decided.push((sample, Some(outcome)));
        } else if check.skip {
            sink.emit(event(DispatchDecision::Skip, report, &sample));
            decided.push((sample, Some(SampleOutcome::Skipped)));
        } else {
            work.push(sample.clone());
            decided.push((sample, None));
        }
    }

    let results = match stage.config().mode {
        ExecutionMode::Parallel => run_parallel(stage, ctx, sink, report, &work).await,
        _ => run_sequential(stage, ctx, sink, report, &work).await,
    };

    if results.iter().any(SampleOutcome::is_halting) {
        ctx.halt = true;
    }

    let mut results = results.into_iter();
    for (sample, outcome) in decided {
        let outcome = outcome.or_else(|| results.next()).unwrap_or(SampleOutcome::Ran);
        report.record(sample, outcome);
    }
}

async fn run_sequential(
    stage: &Arc<dyn Stage>,
    ctx: &PipelineContext,
    sink: &dyn EventSink,
    report: &StageReport,
    work: &[String],
) -> Vec<SampleOutcome> {
    let mut outcomes = Vec::with_capacity(work.len());
    for sample in work {
        sink.emit(event(DispatchDecision::Run, report, sample));
        let result = stage.run_for_sample(ctx, sample, ctx.worker_budget).await;
        outcomes.push(report_result(sink, report, sample, result));
    }
    outcomes
}

async fn run_parallel(
    stage: &Arc<dyn Stage>,
    ctx: &PipelineContext,
    sink: &dyn EventSink,
    report: &StageReport,
    work: &[String],
) -> Vec<SampleOutcome> {
    if work.is_empty() {
        return Vec::new();
    }

    let share = worker_share(ctx.worker_budget, work.len());
    let group = SampleTaskGroup::new(pool_size(ctx.worker_budget, work.len()));
    let shared = Arc::new(ctx.clone());
    debug!(
        stage = %report.stage,
        tasks = work.len(),
        pool = group.capacity(),
        workers_per_task = share,
        "dispatching samples to pool"
    );

    // Bodies run on the blocking pool and drive their own future there, so a
    // body that blocks on an external tool holds a pool slot, not a runtime
    // worker thread.
    let runtime = Handle::current();
    for sample in work {
        sink.emit(event(DispatchDecision::Run, report, sample));
        let stage = Arc::clone(stage);
        let ctx = Arc::clone(&shared);
        let name = sample.clone();
        let runtime = runtime.clone();
        group.spawn_blocking(sample.clone(), move || {
            runtime.block_on(stage.run_for_sample(&ctx, &name, share))
        });
    }

    group
        .join()
        .await
        .into_iter()
        .map(|(sample, result)| report_result(sink, report, &sample, result))
        .collect()
}
