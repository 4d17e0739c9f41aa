//! Command line interface module
//!
//! This module provides argument parsing and the runner that executes the
//! push, list, status and delete commands against a registry transport.

pub mod args;
pub mod runner;

pub use args::{Args, Command};
pub use runner::{CommandOutput, Runner};
