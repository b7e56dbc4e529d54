//! `eco-audit` command-line front end
//!
//! Wires TOML/CLI configuration into the compliance-engine pipeline and
//! renders the final report.

pub mod commands;
pub mod config;
pub mod reporter;

pub use config::{Config, NarrativeMode, Overrides};
pub use reporter::{OutputFormat, Reporter};
