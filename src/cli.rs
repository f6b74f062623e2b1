//!
//! This module is the main entry point for all CLI commands and drives the
//! runner over the built-in sample suite.

use std::process;

use clap::Parser;

use crate::{
    cli::args::{Command, RunArgs, SubcaseArgs},
    config::{ReportFormat, RunConfig},
    logging,
    report::{ConsoleReporter, JsonReporter, NullReporter, Reporter},
    runner::{skip_reason, TestRunner},
    scenarios::sample_suite,
    SubcaseError,
};

pub mod args;

/// The main entry point for the CLI.
pub fn run() {
    let args = SubcaseArgs::parse();
    match dispatch(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(2);
        }
    }
}

fn dispatch(args: SubcaseArgs) -> Result<i32, SubcaseError> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_yaml_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(level) = &args.log {
        config.log_level = level.clone();
    }
    logging::init(&config.log_level)?;

    match args.command {
        Command::Run(run_args) => run_suite(config, run_args),
        Command::List => {
            list_cases();
            Ok(0)
        }
        Command::Tree { filter } => {
            if filter.is_some() {
                config.filter = filter;
            }
            print_trees(config);
            Ok(0)
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_suite(mut config: RunConfig, args: RunArgs) -> Result<i32, SubcaseError> {
    apply_run_args(&mut config, &args);
    config.validate()?;

    let cases = sample_suite();
    let mut reporter: Box<dyn Reporter> = match config.format {
        ReportFormat::Console => {
            Box::new(ConsoleReporter::new(config.use_colors).verbose(args.verbose))
        }
        ReportFormat::Json => Box::new(JsonReporter::stdout()),
    };
    let summary = TestRunner::new(config, reporter.as_mut()).run_all(&cases);
    Ok(if summary.has_failures() { 1 } else { 0 })
}

fn list_cases() {
    let cases = sample_suite();
    for case in &cases {
        let suite = case
            .suite
            .as_deref()
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        let skip = if case.skip { " (skip)" } else { "" };
        println!("  {}{}{} ({})", case.name, suite, skip, case.site);
    }
    println!("{} test cases", cases.len());
}

fn print_trees(config: RunConfig) {
    let cases = sample_suite();
    let mut reporter = NullReporter;
    let mut runner = TestRunner::new(config.clone(), &mut reporter);
    for case in &cases {
        if skip_reason(case, &config).is_some() {
            continue;
        }
        let completed = runner.run_test_case(case);
        let report = &completed.report;
        if report.branches.is_empty() {
            println!("{} ({} pass)", report.name, report.passes);
        } else {
            println!("{} {} ({} passes)", report.name, report.branches, report.passes);
        }
        print!("{}", completed.render_tree(Some(case.site.file)));
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn apply_run_args(config: &mut RunConfig, args: &RunArgs) {
    if args.filter.is_some() {
        config.filter = args.filter.clone();
    }
    if args.suite.is_some() {
        config.suite = args.suite.clone();
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(order) = args.order {
        config.order = order;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.abort_after.is_some() {
        config.abort_after = args.abort_after;
    }
    if let Some(max_passes) = args.max_passes {
        config.max_passes = max_passes;
    }
    if args.no_color {
        config.use_colors = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrderBy;

    #[test]
    fn run_args_override_config() {
        let mut config = RunConfig {
            filter: Some("from file".to_string()),
            max_passes: 3,
            ..RunConfig::default()
        };
        let args = RunArgs {
            filter: Some("nested".to_string()),
            order: Some(OrderBy::Name),
            no_color: true,
            ..RunArgs::default()
        };
        apply_run_args(&mut config, &args);
        assert_eq!(config.filter.as_deref(), Some("nested"));
        assert_eq!(config.order, OrderBy::Name);
        assert_eq!(config.max_passes, 3);
        assert!(!config.use_colors);
    }
}
