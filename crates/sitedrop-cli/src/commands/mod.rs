//! Subcommand implementations.

pub mod completion;
pub mod deploy;
pub mod inspect;
