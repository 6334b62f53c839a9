//! # Kshetra CLI
//!
//! The `kshetra` binary drives region selection and drill-down reports over
//! a JSON fixture, as a given user would see them.

pub mod commands;
pub mod config;

pub use commands::{DrillReport, SelectReport, render_levels, run_drill, run_select};
pub use config::{Cli, CliConfig, Command, GrantArg, KindArg, SessionArgs};
