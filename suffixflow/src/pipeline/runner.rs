//! Linear chain runner.

use super::dispatch::check_run;
use super::report::{PipelineReport, StageReport};
use crate::context::PipelineContext;
use crate::events::{DispatchDecision, DispatchEvent, EventSink, LoggingEventSink};
use crate::observability::SpanTimer;
use crate::stages::Stage;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// Drives an ordered list of stages over a shared context.
///
/// For each stage the runner hands over a copy of the context (with `force`
/// OR-merged), runs `before_run`, dispatch and `after_run`, then either stops
/// the chain on halt or adopts the stage's context and appends its suffix
/// fragment. Stage `i + 1` never starts before stage `i` has fully drained.
#[derive(Clone)]
pub struct PipelineRunner {
    sink: Arc<dyn EventSink>,
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner").finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// Creates a runner logging decisions through tracing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(LoggingEventSink::default()),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs `stages` in order against `ctx`.
    ///
    /// On return `ctx` holds the context left by the last completed stage.
    /// If a stage halts, `ctx` keeps its pre-stage values with `halt` set and
    /// no later stage runs.
    pub async fn run(&self, ctx: &mut PipelineContext, stages: &[Arc<dyn Stage>]) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id, stages = stages.len());
        self.run_stages(run_id, ctx, stages).instrument(span).await
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        ctx: &mut PipelineContext,
        stages: &[Arc<dyn Stage>],
    ) -> PipelineReport {
        let timer = SpanTimer::start("pipeline");
        let mut report = PipelineReport::new(run_id);

        for stage in stages {
            let config = stage.config();
            let mut stage_ctx = ctx.inherit(config.force);

            let stage_report = match stage.before_run(&mut stage_ctx) {
                Ok(()) => {
                    let mut stage_report = check_run(stage, &mut stage_ctx, self.sink.as_ref()).await;
                    stage.after_run(&mut stage_ctx);
                    stage_report.halted |= stage_ctx.halt;
                    stage_report
                }
                Err(e) => {
                    let mut stage_report =
                        StageReport::new(stage.name(), config.mode, stage.output_prefix(&stage_ctx, ""));
                    self.sink.emit(
                        DispatchEvent::new(DispatchDecision::Failed, stage.name(), &stage_report.output_prefix)
                            .with_detail(e.to_string()),
                    );
                    stage_report.error = Some(e.to_string());
                    stage_report.halted = true;
                    stage_report
                }
            };

            if stage_report.halted {
                self.sink.emit(DispatchEvent::new(
                    DispatchDecision::Halt,
                    stage.name(),
                    &stage_report.output_prefix,
                ));
                report.halted_at = Some(stage_report.stage.clone());
                report.stages.push(stage_report);
                ctx.halt = true;
                break;
            }

            report.stages.push(stage_report);
            *ctx = stage_ctx;
            ctx.suffix.push_str(&config.suffix_add);
            debug!(stage = %stage.name(), suffix = %ctx.suffix, "stage complete");
        }

        report.duration_ms = timer.elapsed_ms();
        report
    }
}
