//! CLI commands

pub mod package;
