//! The outer driver: runs registered test cases pass by pass.
//!
//! [`TestRunner`] owns the operational policy the engine leaves open:
//! filtering and skipping, ordering, the per test case pass limit and the
//! run-wide failure threshold (`abort_after`). It is the only place that loops
//! over [`TestCaseState::run_pass`].

use std::fmt;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{OrderBy, RunConfig};
use crate::engine::{Pass, PassOutcome, Site, SubcaseTree, TestCaseState};
use crate::report::{render_tree, BranchSummary, Event, Reporter};
use crate::{err_msg, SubcaseError};

pub type TestBody = dyn Fn(&mut Pass<'_>) -> Result<(), SubcaseError> + Send + Sync;

/// A registered test case: metadata plus a body that can be replayed.
pub struct TestCase {
    pub name: String,
    pub suite: Option<String>,
    pub description: Option<String>,
    pub skip: bool,
    pub site: Site,
    body: Box<TestBody>,
}

impl TestCase {
    #[track_caller]
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Pass<'_>) -> Result<(), SubcaseError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            suite: None,
            description: None,
            skip: false,
            site: Site::caller(),
            body: Box::new(body),
        }
    }

    /// A BDD scenario; the name gets the `Scenario: ` prefix.
    #[track_caller]
    pub fn scenario<F>(name: &str, body: F) -> Self
    where
        F: Fn(&mut Pass<'_>) -> Result<(), SubcaseError> + Send + Sync + 'static,
    {
        Self::new(format!("Scenario: {name}"), body)
    }

    pub fn in_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn skipped(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn body(&self) -> &TestBody {
        &*self.body
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("suite", &self.suite)
            .field("description", &self.description)
            .field("skip", &self.skip)
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

/// Outcome of one test case across all of its passes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseReport {
    pub name: String,
    pub suite: Option<String>,
    pub passes: usize,
    /// Failure is aggregated over all passes, not just the last one.
    pub failed: bool,
    pub passed_assertions: usize,
    pub failed_assertions: usize,
    pub aborted_passes: usize,
    pub branches: BranchSummary,
    pub duration_secs: f64,
    /// Why the test case was stopped before exhausting its tree.
    pub error: Option<String>,
}

/// A finished test case with its discovered tree.
#[derive(Debug, Clone)]
pub struct CompletedTestCase {
    pub report: TestCaseReport,
    pub tree: SubcaseTree,
}

impl CompletedTestCase {
    pub fn render_tree(&self, test_file: Option<&str>) -> String {
        render_tree(&self.tree, test_file)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// The failure threshold was reached and the rest of the run was skipped.
    pub aborted: bool,
    pub seed: Option<u64>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Test cases that actually ran.
    pub fn total_tests(&self) -> usize {
        self.passed + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_tests() == 0 {
            return 0.0;
        }
        (self.passed as f64 / self.total_tests() as f64) * 100.0
    }
}

/// Why a test case will not run under `config`, if it won't.
pub fn skip_reason(case: &TestCase, config: &RunConfig) -> Option<String> {
    if case.skip {
        return Some("Marked 'skip'".to_string());
    }
    if let Some(suite) = &config.suite {
        if case.suite.as_deref() != Some(suite.as_str()) {
            return Some(format!("Not in suite '{suite}'"));
        }
    }
    if let Some(filter) = &config.filter {
        let needle = filter.to_lowercase();
        let in_name = case.name.to_lowercase().contains(&needle);
        let in_suite = case
            .suite
            .as_ref()
            .is_some_and(|s| s.to_lowercase().contains(&needle));
        if !in_name && !in_suite {
            return Some(format!("Filtered out by substring: {filter}"));
        }
    }
    None
}

/// Orders `cases` per `order`. Returns the seed used for random order.
pub fn order_cases<'c>(
    cases: &'c [TestCase],
    order: OrderBy,
    seed: Option<u64>,
) -> (Vec<&'c TestCase>, Option<u64>) {
    let mut ordered: Vec<&TestCase> = cases.iter().collect();
    match order {
        OrderBy::File => (ordered, None),
        OrderBy::Name => {
            ordered.sort_by(|a, b| a.name.cmp(&b.name));
            (ordered, None)
        }
        OrderBy::Random => {
            let seed = seed.unwrap_or_else(rand::random);
            let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
            ordered.shuffle(&mut rng);
            (ordered, Some(seed))
        }
    }
}

pub struct TestRunner<'r> {
    config: RunConfig,
    reporter: &'r mut dyn Reporter,
    failed_assertions: usize,
}

impl<'r> TestRunner<'r> {
    pub fn new(config: RunConfig, reporter: &'r mut dyn Reporter) -> Self {
        Self {
            config,
            reporter,
            failed_assertions: 0,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn limit_reached(&self) -> bool {
        self.config
            .abort_after
            .is_some_and(|limit| self.failed_assertions >= limit)
    }

    /// Drives one test case until its tree is exhausted, it is stopped by a
    /// structural error, or a limit is hit between passes.
    pub fn run_test_case(&mut self, case: &TestCase) -> CompletedTestCase {
        let started = Instant::now();
        self.reporter.report(&Event::TestCaseStarted {
            test: case.name.clone(),
            suite: case.suite.clone(),
        });

        let mut state = TestCaseState::new(case.name.clone());
        let mut error: Option<SubcaseError> = None;
        while state.should_continue() {
            if state.passes() >= self.config.max_passes {
                let err = err_msg!(
                    PassLimit,
                    "'{}' still had unexplored subcases after {} passes",
                    case.name,
                    state.passes()
                )
                .with_help("raise max_passes or check for subcases generated without bound");
                warn!("{err}");
                error = Some(err);
                break;
            }
            if self.limit_reached() {
                info!(test = %case.name, "abandoning test case, failure limit reached");
                break;
            }
            let result = state.run_pass(case.body(), &mut *self.reporter);
            self.failed_assertions += result.failed_assertions;
            if let PassOutcome::Aborted { .. } = result.outcome {
                if result.failed_assertions == 0 {
                    self.failed_assertions += 1;
                }
            }
        }

        let error = error.map(|e| e.to_string()).or_else(|| {
            state
                .structural_error()
                .map(|m| format!("Non-deterministic subcase tree: {m}"))
        });
        let tree = state.tree().clone();
        let report = TestCaseReport {
            name: case.name.clone(),
            suite: case.suite.clone(),
            passes: state.passes(),
            failed: state.failed() || error.is_some(),
            passed_assertions: state.passed_assertions(),
            failed_assertions: state.failed_assertions(),
            aborted_passes: state.aborted_passes(),
            branches: BranchSummary::of(&tree),
            duration_secs: started.elapsed().as_secs_f64(),
            error,
        };
        self.reporter.report(&Event::TestCaseFinished {
            report: report.clone(),
        });
        CompletedTestCase { report, tree }
    }

    /// Runs every selected test case and reports the summary.
    pub fn run_all(&mut self, cases: &[TestCase]) -> RunSummary {
        let (ordered, seed) = order_cases(cases, self.config.order, self.config.seed);
        let mut summary = RunSummary {
            seed,
            ..RunSummary::default()
        };
        self.reporter.report(&Event::RunStarted {
            total: ordered.len(),
            seed,
        });

        for case in ordered {
            let reason = if summary.aborted {
                Some("Run aborted after reaching the failure limit".to_string())
            } else {
                skip_reason(case, &self.config)
            };
            if let Some(reason) = reason {
                summary.skipped += 1;
                self.reporter.report(&Event::TestCaseSkipped {
                    test: case.name.clone(),
                    reason,
                });
                continue;
            }

            let completed = self.run_test_case(case);
            if completed.report.failed {
                summary.failed += 1;
            } else {
                summary.passed += 1;
            }
            if self.limit_reached() {
                summary.aborted = true;
            }
        }

        self.reporter.report(&Event::RunFinished {
            summary: summary.clone(),
        });
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> TestCase {
        TestCase::new(name, |_| Ok(()))
    }

    #[test]
    fn skip_reasons() {
        let config = RunConfig {
            filter: Some("Suite1".to_string()),
            ..RunConfig::default()
        };
        assert!(skip_reason(&noop("a").in_suite("suite1"), &config).is_none());
        assert!(skip_reason(&noop("in suite1 name"), &config).is_none());
        assert_eq!(
            skip_reason(&noop("b"), &config).as_deref(),
            Some("Filtered out by substring: Suite1")
        );
        assert_eq!(
            skip_reason(&noop("a").in_suite("suite1").skipped(true), &config).as_deref(),
            Some("Marked 'skip'")
        );
    }

    #[test]
    fn suite_filter_is_exact() {
        let config = RunConfig {
            suite: Some("suite1".to_string()),
            ..RunConfig::default()
        };
        assert!(skip_reason(&noop("a").in_suite("suite1"), &config).is_none());
        assert!(skip_reason(&noop("a").in_suite("suite11"), &config).is_some());
        assert!(skip_reason(&noop("a"), &config).is_some());
    }

    #[test]
    fn random_order_is_reproducible() {
        let cases: Vec<TestCase> = (0..20).map(|i| noop(&format!("case {i}"))).collect();
        let names = |order: Vec<&TestCase>| {
            order.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
        };

        let (first, seed) = order_cases(&cases, OrderBy::Random, Some(99));
        let (second, _) = order_cases(&cases, OrderBy::Random, Some(99));
        assert_eq!(seed, Some(99));
        assert_eq!(names(first), names(second));

        let (by_file, seed) = order_cases(&cases, OrderBy::File, Some(99));
        assert_eq!(seed, None);
        assert_eq!(by_file[0].name, "case 0");
        assert_eq!(by_file[19].name, "case 19");
    }

    #[test]
    fn success_rate_of_empty_run_is_zero() {
        let summary = RunSummary::default();
        assert_eq!(summary.success_rate(), 0.0);
        assert!(!summary.has_failures());
    }
}
