//! Defines the command-line arguments and subcommands for the `subcase` CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{OrderBy, ReportFormat};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "subcase",
    version,
    about = "Runs the built-in sample suite through the subcase replay engine."
)]
pub struct SubcaseArgs {
    /// Load the run configuration from a YAML file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter for engine diagnostics, e.g. `debug` or `subcase=trace`.
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the test cases and report results.
    Run(RunArgs),
    /// List the test cases with their suite and source location.
    List,
    /// Run the test cases silently and print each discovered subcase tree.
    Tree {
        /// Only test cases whose name or suite contains this substring.
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Only test cases whose name or suite contains this substring.
    #[arg(long)]
    pub filter: Option<String>,

    /// Only test cases of this suite.
    #[arg(long)]
    pub suite: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    #[arg(long, value_enum)]
    pub order: Option<OrderBy>,

    /// Seed for `--order random`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop the run after this many failed assertions.
    #[arg(long)]
    pub abort_after: Option<usize>,

    /// Upper bound of passes per test case.
    #[arg(long)]
    pub max_passes: Option<usize>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Print every pass and entered subcase.
    #[arg(long, short)]
    pub verbose: bool,
}
