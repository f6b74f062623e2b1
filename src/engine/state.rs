use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, debug_span};

use super::pass::{Pass, PassOutcome, PassResult};
use super::tree::SubcaseTree;
use crate::report::{Event, Reporter};
use crate::{err_msg, SubcaseError};

/// Everything the engine remembers about one test case between its passes.
#[derive(Debug, Clone)]
pub struct TestCaseState {
    name: String,
    tree: SubcaseTree,
    passes: usize,
    should_continue: bool,
    any_failed: bool,
    any_failed_this_pass: bool,
    passed_assertions: usize,
    failed_assertions: usize,
    aborted_passes: usize,
    structural: Option<String>,
}

impl TestCaseState {
    /// Starts a test case with an empty discovery tree.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            tree: SubcaseTree::new(name.clone()),
            name,
            passes: 0,
            should_continue: true,
            any_failed: false,
            any_failed_this_pass: false,
            passed_assertions: 0,
            failed_assertions: 0,
            aborted_passes: 0,
            structural: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &SubcaseTree {
        &self.tree
    }

    pub fn into_tree(self) -> SubcaseTree {
        self.tree
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// True while some discovered part of the tree still needs a pass.
    pub fn should_continue(&self) -> bool {
        self.should_continue
    }

    /// Whether any pass so far recorded a failure.
    pub fn failed(&self) -> bool {
        self.any_failed
    }

    pub fn failed_this_pass(&self) -> bool {
        self.any_failed_this_pass
    }

    pub fn passed_assertions(&self) -> usize {
        self.passed_assertions
    }

    pub fn failed_assertions(&self) -> usize {
        self.failed_assertions
    }

    pub fn aborted_passes(&self) -> usize {
        self.aborted_passes
    }

    /// The non-determinism that stopped this test case, if any.
    pub fn structural_error(&self) -> Option<&str> {
        self.structural.as_deref()
    }

    /// Runs the body once, taking exactly one path through the tree.
    ///
    /// Failures never escape: a returned error or a panic inside `body` ends
    /// the pass and is summarized in the returned [`PassResult`].
    pub fn run_pass<F>(&mut self, mut body: F, reporter: &mut dyn Reporter) -> PassResult
    where
        F: FnMut(&mut Pass<'_>) -> Result<(), SubcaseError>,
    {
        if !self.should_continue {
            return PassResult {
                number: self.passes,
                path: Vec::new(),
                outcome: PassOutcome::Exhausted,
                passed_assertions: 0,
                failed_assertions: 0,
                discovered: 0,
            };
        }

        self.passes += 1;
        let number = self.passes;
        let span = debug_span!("pass", test = %self.name, pass = number);
        let _guard = span.enter();

        reporter.report(&Event::PassStarted {
            test: self.name.clone(),
            pass: number,
        });

        let result = {
            let mut pass = Pass::new(&mut self.tree, &mut *reporter, &self.name, number);
            let returned = panic::catch_unwind(AssertUnwindSafe(|| body(&mut pass)));
            let error = match returned {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err),
                Err(payload) => Some(err_msg!(
                    Fatal,
                    "panicked: {}",
                    panic_message(payload.as_ref())
                )),
            };
            pass.finish(error)
        };

        self.tree.clear_pass_flags();
        self.any_failed_this_pass = result.failed();
        self.any_failed |= result.failed();
        self.passed_assertions += result.passed_assertions;
        self.failed_assertions += result.failed_assertions;
        match &result.outcome {
            PassOutcome::Aborted { .. } => self.aborted_passes += 1,
            PassOutcome::NonDeterministic { message, .. } => {
                self.structural = Some(message.clone())
            }
            PassOutcome::Completed | PassOutcome::Exhausted => {}
        }
        self.should_continue = self.structural.is_none() && !self.tree.is_exhausted();

        debug!(
            path = ?result.path,
            outcome = ?result.outcome,
            discovered = result.discovered,
            should_continue = self.should_continue,
            "pass finished"
        );
        reporter.report(&Event::PassFinished {
            test: self.name.clone(),
            pass: number,
            outcome: result.outcome.clone(),
        });
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
