//! Human readable, colored console output.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::{Event, Reporter};
use crate::runner::{RunSummary, TestCaseReport};

/// Prints test case results, failures and messages to stdout.
pub struct ConsoleReporter {
    stdout: StandardStream,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(use_colors: bool) -> Self {
        let choice = if use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            stdout: StandardStream::stdout(choice),
            verbose: false,
        }
    }

    /// Also print pass boundaries and every entered subcase.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) {
        let _ = self
            .stdout
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
        let _ = write!(self.stdout, "{text}");
        let _ = self.stdout.reset();
    }

    fn print_case(&mut self, report: &TestCaseReport) {
        if report.failed {
            self.colored(Color::Red, false, "✗");
        } else {
            self.colored(Color::Green, false, "✓");
        }
        let _ = write!(self.stdout, " {}", report.name);
        if !report.branches.is_empty() {
            let _ = write!(self.stdout, " {}", report.branches);
        }
        let _ = writeln!(
            self.stdout,
            " ({} pass{}, {:.3}s)",
            report.passes,
            if report.passes == 1 { "" } else { "es" },
            report.duration_secs
        );
        if let Some(error) = &report.error {
            self.colored(Color::Red, false, "    error: ");
            let _ = writeln!(self.stdout, "{error}");
        }
    }

    fn print_summary(&mut self, summary: &RunSummary) {
        let _ = writeln!(self.stdout);
        self.colored(Color::White, true, "Test Summary\n");
        let _ = writeln!(self.stdout, "═══════════════");
        if summary.passed > 0 {
            self.colored(Color::Green, false, &format!("✓ Passed:   {} tests\n", summary.passed));
        }
        if summary.failed > 0 {
            self.colored(Color::Red, false, &format!("✗ Failed:   {} tests\n", summary.failed));
        }
        if summary.skipped > 0 {
            self.colored(Color::Yellow, false, &format!("- Skipped:  {} tests\n", summary.skipped));
        }
        if summary.aborted {
            self.colored(Color::Yellow, false, "Run aborted after reaching the failure limit\n");
        }
        let _ = writeln!(
            self.stdout,
            "\nSuccess Rate: {:.1}% ({}/{})",
            summary.success_rate(),
            summary.passed,
            summary.total_tests()
        );
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: &Event) {
        match event {
            Event::RunStarted { total, seed } => {
                if let Some(seed) = seed {
                    let _ = writeln!(self.stdout, "🔀 Randomness seeded to: {seed}");
                }
                let _ = writeln!(self.stdout, "Running {total} test cases");
            }
            Event::TestCaseSkipped { test, reason } => {
                self.colored(Color::Yellow, false, "SKIP");
                let _ = writeln!(self.stdout, " {test} ({reason})");
            }
            Event::PassStarted { test, pass } if self.verbose => {
                self.colored(Color::Blue, false, &format!("  {test}: pass {pass}\n"));
            }
            Event::SubcaseEntered { path, .. } if self.verbose => {
                let _ = writeln!(self.stdout, "    ⮑ {}", path.join(" / "));
            }
            Event::Message { site, text, .. } => {
                let _ = writeln!(self.stdout, "  {site}: MESSAGE: {text}");
            }
            Event::AssertionFailed {
                site,
                message,
                fatal,
                path,
                ..
            } => {
                let location = site.map_or_else(|| "<unknown>".to_string(), |s| s.to_string());
                let _ = write!(self.stdout, "  {location}: ");
                if *fatal {
                    self.colored(Color::Red, true, "FATAL ERROR: ");
                } else {
                    self.colored(Color::Red, false, "ERROR: ");
                }
                let _ = writeln!(self.stdout, "{message}");
                if !path.is_empty() {
                    let _ = writeln!(self.stdout, "    in subcase: {}", path.join(" / "));
                }
            }
            Event::TestCaseFinished { report } => self.print_case(report),
            Event::RunFinished { summary } => self.print_summary(summary),
            _ => {}
        }
        let _ = self.stdout.flush();
    }
}
