//! Runs the built-in sample suite through `TestRunner` and checks the
//! observable behavior of every test case.

use subcase::config::{OrderBy, RunConfig};
use subcase::report::{BranchSummary, Event, RecordingReporter};
use subcase::runner::{CompletedTestCase, TestCase, TestRunner};
use subcase::scenarios::*;

fn config() -> RunConfig {
    RunConfig {
        use_colors: false,
        ..RunConfig::default()
    }
}

fn find(cases: &[TestCase], name: &str) -> usize {
    cases
        .iter()
        .position(|c| c.name == name)
        .unwrap_or_else(|| panic!("no test case named {name}"))
}

fn run_one(name: &str) -> (CompletedTestCase, RecordingReporter) {
    let cases = sample_suite();
    let case = &cases[find(&cases, name)];
    let mut reporter = RecordingReporter::default();
    let completed = TestRunner::new(config(), &mut reporter).run_test_case(case);
    (completed, reporter)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod test_case_tests {
    use super::*;

    #[test]
    fn test_lots_of_nested_subcases() {
        let (completed, reporter) = run_one(LOTS_OF_NESTED);
        let report = &completed.report;

        assert_eq!(report.passes, 5);
        assert_eq!(
            reporter.messages_by_pass(LOTS_OF_NESTED),
            vec![
                strings(&["root", "1", "1.1"]),
                strings(&["root", "2", "2.1"]),
                strings(&["root", "2"]),
                strings(&["root", "2", "2.3"]),
                strings(&["root", "2", "2.4"]),
            ]
        );
        let messages = reporter.messages(LOTS_OF_NESTED);
        assert!(messages.iter().all(|m| !m.starts_with("2.2")));
        assert_eq!(completed.tree.len(), 7);
        assert!(report.failed);
        assert_eq!(report.failed_assertions, 1);
        assert_eq!(report.branches, BranchSummary { failed: 1, passed: 4 });
        assert_eq!(report.branches.to_string(), "[✘1|✔︎4]");
    }

    #[test]
    fn test_subcases_from_a_helper_function() {
        let (completed, reporter) = run_one(FROM_FUNCTION);
        assert_eq!(completed.report.passes, 2);
        assert!(!completed.report.failed);
        assert_eq!(
            reporter.messages_by_pass(FROM_FUNCTION),
            vec![
                strings(&["print me twice", "hello! from sc1", "lala"]),
                strings(&["print me twice", "hello! from sc2", "lala"]),
            ]
        );
    }

    #[test]
    fn test_vector_scenario_reports_both_wrong_expectations() {
        let (completed, reporter) = run_one(VECTORS);
        let report = &completed.report;

        assert_eq!(report.passes, 4);
        assert_eq!(report.failed_assertions, 2);
        assert_eq!(report.branches, BranchSummary { failed: 2, passed: 2 });
        assert_eq!(
            reporter.failures(VECTORS),
            vec![
                (
                    strings(&[
                        "Given: A vector with some items",
                        "When: the size is increased",
                        "Then: the size and capacity change",
                    ]),
                    false
                ),
                (
                    strings(&[
                        "Given: A vector with some items",
                        "When: less capacity is reserved",
                        "Then: neither size nor capacity are changed",
                    ]),
                    false
                ),
            ]
        );
    }

    #[test]
    fn test_failure_is_kept_when_the_last_subcase_passes() {
        let (completed, reporter) = run_one(FAIL_DESPITE_LAST);
        assert_eq!(completed.report.passes, 2);
        assert!(completed.report.failed);
        assert_eq!(completed.report.branches.to_string(), "[✘1|✔︎1]");

        let leaves: Vec<(Vec<String>, bool)> = reporter
            .events
            .iter()
            .filter_map(|e| match e {
                Event::LeafCompleted { path, failed, .. } => Some((path.clone(), *failed)),
                _ => None,
            })
            .collect();
        assert_eq!(leaves, vec![(strings(&["one"]), true), (strings(&["two"]), false)]);
    }

    #[test]
    fn test_fatal_siblings_are_re_entered() {
        let (completed, reporter) = run_one(REENTERED);
        assert_eq!(
            reporter.entered(REENTERED),
            vec![
                strings(&["level zero"]),
                strings(&["level zero", "one"]),
                strings(&["level zero"]),
                strings(&["level zero", "two"]),
                strings(&["level zero"]),
            ]
        );
        assert_eq!(completed.report.passes, 3);
        assert_eq!(completed.report.aborted_passes, 2);
        assert_eq!(completed.report.branches, BranchSummary { failed: 2, passed: 0 });
    }

    #[test]
    fn test_identically_named_variants_each_run_both_checks() {
        let (completed, reporter) = run_one(NESTED_HELPERS);
        assert_eq!(completed.report.passes, 4);
        assert!(!completed.report.failed);

        let entered = reporter.entered(NESTED_HELPERS);
        let first_check = strings(&["generate data variant 1", "check data 1"]);
        let second_check = strings(&["generate data variant 1", "check data 2"]);
        assert_eq!(entered.iter().filter(|p| **p == first_check).count(), 2);
        assert_eq!(entered.iter().filter(|p| **p == second_check).count(), 2);
    }

    #[test]
    fn test_case_without_subcases_runs_once() {
        let (completed, _) = run_one(WITH_DESC);
        assert_eq!(completed.report.passes, 1);
        assert!(completed.report.branches.is_empty());
        assert_eq!(completed.render_tree(None), "");
    }

    #[test]
    fn test_tree_rendering_marks_leaves() {
        let cases = sample_suite();
        let case = &cases[find(&cases, LOTS_OF_NESTED)];
        let mut reporter = RecordingReporter::default();
        let completed = TestRunner::new(config(), &mut reporter).run_test_case(case);
        let rendered = completed.render_tree(Some(case.site.file));

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("⮑ \"\" (at line "));
        assert!(lines[1].starts_with("   ⮑  ✅ \"\" (at line "));
        assert_eq!(lines.iter().filter(|l| l.contains("❌")).count(), 1);
        assert_eq!(lines.iter().filter(|l| l.contains("✅")).count(), 4);
    }
}

#[cfg(test)]
mod run_tests {
    use super::*;

    fn names_started(reporter: &RecordingReporter) -> Vec<String> {
        reporter
            .events
            .iter()
            .filter_map(|e| match e {
                Event::TestCaseStarted { test, .. } => Some(test.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_full_run_summary() {
        let cases = sample_suite();
        let mut reporter = RecordingReporter::default();
        let summary = TestRunner::new(config(), &mut reporter).run_all(&cases);

        assert_eq!(summary.passed, 6);
        assert_eq!(summary.failed, 4);
        assert_eq!(summary.skipped, 1);
        assert!(summary.has_failures());
        assert!(!summary.aborted);
        assert_eq!(summary.seed, None);
        assert!(reporter.events.iter().any(|e| matches!(
            e,
            Event::TestCaseSkipped { test, reason } if test == SKIPPED && reason == "Marked 'skip'"
        )));
        assert!(matches!(reporter.events.last(), Some(Event::RunFinished { .. })));
    }

    #[test]
    fn test_filter_selects_suite_cases() {
        let cases = sample_suite();
        let mut reporter = RecordingReporter::default();
        let config = RunConfig {
            filter: Some("SUITE1".to_string()),
            ..config()
        };
        let summary = TestRunner::new(config, &mut reporter).run_all(&cases);
        assert_eq!(summary.passed, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.skipped, 8);
        assert!(names_started(&reporter).iter().all(|n| n == SUITE_CASE));
    }

    #[test]
    fn test_suite_selection_is_exact() {
        let cases = sample_suite();
        let mut reporter = RecordingReporter::default();
        let config = RunConfig {
            suite: Some("suite1".to_string()),
            ..config()
        };
        let summary = TestRunner::new(config, &mut reporter).run_all(&cases);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.skipped, 9);
    }

    #[test]
    fn test_abort_after_stops_the_run() {
        let cases = sample_suite();
        let mut reporter = RecordingReporter::default();
        let config = RunConfig {
            abort_after: Some(1),
            ..config()
        };
        let summary = TestRunner::new(config, &mut reporter).run_all(&cases);

        assert!(summary.aborted);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.passed, 0);
        assert_eq!(summary.skipped, 10);
        let finished: Vec<usize> = reporter
            .events
            .iter()
            .filter_map(|e| match e {
                Event::TestCaseFinished { report } => Some(report.passes),
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec![3]);
    }

    #[test]
    fn test_pass_limit_stops_a_test_case() {
        let cases = sample_suite();
        let case = &cases[find(&cases, LOTS_OF_NESTED)];
        let mut reporter = RecordingReporter::default();
        let config = RunConfig {
            max_passes: 2,
            ..config()
        };
        let completed = TestRunner::new(config, &mut reporter).run_test_case(case);
        assert_eq!(completed.report.passes, 2);
        assert!(completed.report.failed);
        assert!(completed
            .report
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Pass limit exceeded")));
    }

    #[test]
    fn test_random_order_is_reproducible_with_a_seed() {
        let run = || {
            let cases = sample_suite();
            let mut reporter = RecordingReporter::default();
            let config = RunConfig {
                order: OrderBy::Random,
                seed: Some(7),
                ..config()
            };
            let summary = TestRunner::new(config, &mut reporter).run_all(&cases);
            (summary, names_started(&reporter))
        };
        let (first, first_order) = run();
        let (second, second_order) = run();
        assert_eq!(first.seed, Some(7));
        assert_eq!(first, second);
        assert_eq!(first_order, second_order);
    }

    #[test]
    fn test_name_order_sorts_test_cases() {
        let cases = sample_suite();
        let mut reporter = RecordingReporter::default();
        let config = RunConfig {
            order: OrderBy::Name,
            ..config()
        };
        TestRunner::new(config, &mut reporter).run_all(&cases);
        let started = names_started(&reporter);
        let mut sorted = started.clone();
        sorted.sort();
        assert_eq!(started, sorted);
    }
}
