//! Engine events and the reporters that consume them.
//!
//! The engine and the runner emit [`Event`]s; a [`Reporter`] decides what to
//! do with them. The crate ships a colored console reporter, a JSON lines
//! reporter and an in-memory [`RecordingReporter`] for tests.

use serde::Serialize;

use crate::engine::{PassOutcome, Site};
use crate::runner::{RunSummary, TestCaseReport};

pub mod console;
pub mod json;
pub mod summary;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use summary::{render_tree, BranchSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    RunStarted {
        total: usize,
        seed: Option<u64>,
    },
    TestCaseStarted {
        test: String,
        suite: Option<String>,
    },
    TestCaseSkipped {
        test: String,
        reason: String,
    },
    PassStarted {
        test: String,
        pass: usize,
    },
    SubcaseEntered {
        test: String,
        pass: usize,
        path: Vec<String>,
        site: Site,
    },
    Message {
        test: String,
        pass: usize,
        path: Vec<String>,
        site: Site,
        text: String,
    },
    AssertionFailed {
        test: String,
        pass: usize,
        path: Vec<String>,
        site: Option<Site>,
        message: String,
        fatal: bool,
    },
    LeafCompleted {
        test: String,
        pass: usize,
        path: Vec<String>,
        failed: bool,
    },
    PassFinished {
        test: String,
        pass: usize,
        outcome: PassOutcome,
    },
    TestCaseFinished {
        report: TestCaseReport,
    },
    RunFinished {
        summary: RunSummary,
    },
}

/// Consumer of engine and runner events.
pub trait Reporter {
    fn report(&mut self, event: &Event);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _event: &Event) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    pub events: Vec<Event>,
}

impl RecordingReporter {
    /// Texts of all `Message` events of `test`, in order.
    pub fn messages(&self, test: &str) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Message { test: t, text, .. } if t == test => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Messages of `test` grouped by pass number (index 0 is pass 1).
    pub fn messages_by_pass(&self, test: &str) -> Vec<Vec<String>> {
        let mut passes: Vec<Vec<String>> = Vec::new();
        for event in &self.events {
            match event {
                Event::PassStarted { test: t, .. } if t == test => passes.push(Vec::new()),
                Event::Message { test: t, text, .. } if t == test => {
                    if let Some(current) = passes.last_mut() {
                        current.push(text.clone());
                    }
                }
                _ => {}
            }
        }
        passes
    }

    /// Paths of every subcase entered for `test`, in order.
    pub fn entered(&self, test: &str) -> Vec<Vec<String>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::SubcaseEntered { test: t, path, .. } if t == test => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self, test: &str) -> Vec<(Vec<String>, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::AssertionFailed {
                    test: t,
                    path,
                    fatal,
                    ..
                } if t == test => Some((path.clone(), *fatal)),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}
