//! CLI subcommand implementations for the chronosweep binary.

pub mod doctor;
pub mod output;
pub mod sweep_cmd;
