//! Contact discovery orchestration for DealScout.
//!
//! This crate runs the scheduled search passes into two buckets, validates
//! their links, lays the result out (or falls back to a broad sweep), and
//! places the champion first.

pub mod bucket;
pub mod champion;
pub mod pipeline;
pub mod render;
pub mod schedule;
pub mod validation;

pub use bucket::{Bucket, SeenSet};
pub use champion::Champion;
pub use pipeline::{
    ContactPipeline, ContactReport, ContactRequest, MANUAL_RESEARCH_NOTICE, ProgressReporter,
    ReportMode, SilentProgress,
};
pub use schedule::{PassReport, ProviderKind};
pub use validation::{ProfileValidator, SkipValidation, ValidationSummary};
