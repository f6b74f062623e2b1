pub use crate::diagnostics::{ErrorContext, FailureKind, SubcaseError};
pub use crate::engine::{Decision, Pass, PassOutcome, PassResult, TestCaseState};
pub use crate::runner::{TestCase, TestRunner};

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod logging;
pub mod report;
pub mod runner;
pub mod scenarios;
