//! Subcommands of the exporter binary beyond the long-running service.

pub mod inspect;

pub use inspect::InspectArgs;
