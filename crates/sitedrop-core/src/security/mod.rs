//! Security checks applied while extracting.

pub mod budget;
pub mod inspector;

pub use budget::ExtractionBudget;
pub use inspector::EntryInspector;
pub use inspector::SkipReason;
pub use inspector::Verdict;
pub use inspector::classify;
