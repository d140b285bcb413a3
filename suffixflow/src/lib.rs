//! # Suffixflow
//!
//! An incremental, suffix-addressed pipeline runner.
//!
//! Every artifact lives at a path computed from a base folder, a stage label,
//! an optional sample name and an accumulated dotted suffix:
//!
//! ```text
//! <base>/<stage>[.<sample>]<suffix>
//! ```
//!
//! Each stage appends its own fragment to the suffix, so a chain of stages
//! `Bwa -> SortBam -> StatBam` reads `data/tmp.s1.bwa.sort` and writes
//! `data/tmp.s1.bwa.sort.stat.*`. A stage whose output family already exists
//! on disk is skipped, which makes reruns incremental.
//!
//! - **Three execution modes**: once per chain, per sample in order, or per
//!   sample on a bounded worker pool
//! - **Skip caching** driven by file existence, overridable with `force`
//! - **Halting** on missing inputs or failed bodies
//! - **Rename** stages that re-base the naming scheme through symlinks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use suffixflow::prelude::*;
//!
//! let stages: Vec<Arc<dyn Stage>> = vec![
//!     Arc::new(SampleSheet::new()),
//!     Arc::new(CommandStage::new(
//!         "Bwa",
//!         StageConfig::parallel(".bwa"),
//!         "bwa mem -t {threads} hg38.fa {input}.R1.fq.gz {input}.R2.fq.gz > {output}.bam",
//!     )),
//!     Arc::new(Rename::new(ExecutionMode::Sequential).with_stage("tmp2").with_suffix("")),
//! ];
//!
//! let config = RunnerConfig::from_env()?;
//! config.init_logging()?;
//! let mut ctx = config.into_context();
//! let report = PipelineRunner::new().run(&mut ctx, &stages).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod tasks;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::RunnerConfig;
    pub use crate::context::PipelineContext;
    pub use crate::core::{ArtifactMatcher, ExecutionMode, PathAddress};
    pub use crate::errors::{StageError, SuffixflowError};
    pub use crate::events::{
        CollectingEventSink, DispatchDecision, DispatchEvent, EventSink, LoggingEventSink,
        NoOpEventSink,
    };
    pub use crate::observability::{init_logging, LogFormat};
    pub use crate::pipeline::{PipelineReport, PipelineRunner, SampleOutcome, StageReport};
    pub use crate::stages::{CommandStage, Rename, SampleSheet, SetSamples, Stage, StageConfig};
}
