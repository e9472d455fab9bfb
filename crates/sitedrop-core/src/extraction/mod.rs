//! Archive extraction under a resource budget.

mod engine;
mod plan;

pub use engine::ExtractionEngine;
pub(crate) use engine::check_input;
pub use plan::ArchivePlan;
pub use plan::PlannedEntry;
pub use plan::plan_archive;
