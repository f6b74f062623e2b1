use std::collections::HashMap;
use std::fmt::{self, Debug, Display};

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::site::{Site, SiteKey};
use super::tree::{NodeId, NodeStatus, SubcaseTree};
use crate::diagnostics::FailureKind;
use crate::report::{Event, Reporter};
use crate::{err_at, err_msg, SubcaseError};

/// What the body should do with a subcase site on this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Enter,
    Skip,
}

impl Decision {
    pub fn is_enter(self) -> bool {
        matches!(self, Decision::Enter)
    }
}

/// How a pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum PassOutcome {
    /// The body ran to its end.
    Completed,
    /// A fatal failure ended the pass early.
    Aborted { message: String, site: Option<Site> },
    /// The call sequence disagreed with the recorded tree. The test case is
    /// stopped.
    NonDeterministic { message: String, site: Option<Site> },
    /// `run_pass` was called on a test case with nothing left to run.
    Exhausted,
}

/// Summary of one execution of a test case body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassResult {
    pub number: usize,
    /// Names of the subcases entered on this pass, outermost first.
    pub path: Vec<String>,
    pub outcome: PassOutcome,
    pub passed_assertions: usize,
    pub failed_assertions: usize,
    /// Nodes attached to the tree during this pass.
    pub discovered: usize,
}

impl PassResult {
    pub fn failed(&self) -> bool {
        self.failed_assertions > 0
            || matches!(
                self.outcome,
                PassOutcome::Aborted { .. } | PassOutcome::NonDeterministic { .. }
            )
    }

    pub fn aborted(&self) -> bool {
        matches!(self.outcome, PassOutcome::Aborted { .. })
    }
}

struct Frame {
    node: NodeId,
    entered_child: bool,
    seen: usize,
    occurrences: HashMap<Site, u32>,
}

impl Frame {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            entered_child: false,
            seen: 0,
            occurrences: HashMap::new(),
        }
    }
}

/// The cursor threaded through a test case body during one pass.
///
/// Every subcase site calls [`Pass::subcase`] (or the lower level
/// [`Pass::enter_subcase`] / [`Pass::leave_subcase`] pair). Assertions are
/// recorded through [`Pass::check`] and friends.
///
/// Once a fatal failure has been observed, every further site is skipped for
/// the rest of the pass, even if the body swallowed the error.
pub struct Pass<'a> {
    tree: &'a mut SubcaseTree,
    reporter: &'a mut dyn Reporter,
    test: &'a str,
    number: usize,
    frames: Vec<Frame>,
    deepest: NodeId,
    aborted: Option<SubcaseError>,
    structural: Option<SubcaseError>,
    passed_assertions: usize,
    failed_assertions: usize,
    discovered: usize,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(
        tree: &'a mut SubcaseTree,
        reporter: &'a mut dyn Reporter,
        test: &'a str,
        number: usize,
    ) -> Self {
        tree.mark_entered(NodeId::ROOT);
        Self {
            tree,
            reporter,
            test,
            number,
            frames: vec![Frame::new(NodeId::ROOT)],
            deepest: NodeId::ROOT,
            aborted: None,
            structural: None,
            passed_assertions: 0,
            failed_assertions: 0,
            discovered: 0,
        }
    }

    pub fn test_name(&self) -> &str {
        self.test
    }

    /// 1-based number of this pass within its test case.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Names of the currently entered subcases, outermost first.
    pub fn path(&self) -> Vec<String> {
        self.tree.path_names(self.current())
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some() || self.structural.is_some()
    }

    fn current(&self) -> NodeId {
        self.frames.last().map_or(NodeId::ROOT, |f| f.node)
    }

    /// Runs `body` as a nested subcase if this pass selects it.
    ///
    /// Skipped subcases return `Ok(())` without running `body`. An error
    /// returned by `body` ends the pass and is handed back for `?`.
    #[track_caller]
    pub fn subcase<F>(&mut self, name: impl Into<String>, body: F) -> Result<(), SubcaseError>
    where
        F: FnOnce(&mut Self) -> Result<(), SubcaseError>,
    {
        let site = Site::caller();
        match self.enter_subcase_at(site, name)? {
            Decision::Skip => Ok(()),
            Decision::Enter => match body(self) {
                Ok(()) => {
                    self.leave_subcase();
                    Ok(())
                }
                Err(err) => {
                    self.abort(&err);
                    Err(err)
                }
            },
        }
    }

    /// `GIVEN` step of a BDD scenario.
    #[track_caller]
    pub fn given<F>(&mut self, name: &str, body: F) -> Result<(), SubcaseError>
    where
        F: FnOnce(&mut Self) -> Result<(), SubcaseError>,
    {
        self.subcase(format!("Given: {name}"), body)
    }

    #[track_caller]
    pub fn when<F>(&mut self, name: &str, body: F) -> Result<(), SubcaseError>
    where
        F: FnOnce(&mut Self) -> Result<(), SubcaseError>,
    {
        self.subcase(format!("When: {name}"), body)
    }

    #[track_caller]
    pub fn then<F>(&mut self, name: &str, body: F) -> Result<(), SubcaseError>
    where
        F: FnOnce(&mut Self) -> Result<(), SubcaseError>,
    {
        self.subcase(format!("Then: {name}"), body)
    }

    /// Decides whether the subcase declared at the caller's location runs on
    /// this pass. An `Enter` must be paired with [`Pass::leave_subcase`] once
    /// the nested block completes.
    #[track_caller]
    pub fn enter_subcase(&mut self, name: impl Into<String>) -> Result<Decision, SubcaseError> {
        self.enter_subcase_at(Site::caller(), name)
    }

    pub fn enter_subcase_at(
        &mut self,
        site: Site,
        name: impl Into<String>,
    ) -> Result<Decision, SubcaseError> {
        let name = name.into();
        if let Some(err) = &self.structural {
            return Err(err.clone());
        }
        if self.aborted.is_some() {
            trace!(
                test = self.test,
                pass = self.number,
                %site,
                "skipping subcase after fatal failure"
            );
            return Ok(Decision::Skip);
        }

        let (parent, position, occurrence) = {
            let Some(frame) = self.frames.last_mut() else {
                return Err(err_at!(
                    Internal,
                    site,
                    "subcase '{}' declared outside of a pass",
                    name
                ));
            };
            let counter = frame.occurrences.entry(site).or_insert(0);
            let occurrence = *counter;
            *counter += 1;
            let position = frame.seen;
            frame.seen += 1;
            (frame.node, position, occurrence)
        };
        let key = SiteKey { site, occurrence };

        let id = match self.tree.children(parent).get(position).copied() {
            Some(recorded) => {
                let node = self.tree.node(recorded);
                if node.key() != Some(key) || node.name() != name {
                    let message = format!(
                        "expected subcase '{}' declared at {} as child #{} of '{}', \
                         found '{}' at {}",
                        node.name(),
                        node.key().map_or_else(|| "<root>".to_string(), |k| k.to_string()),
                        position + 1,
                        self.tree.node(parent).name(),
                        name,
                        key,
                    );
                    return Err(self.record_structural(site, message));
                }
                recorded
            }
            None => {
                let id = self.tree.attach(parent, key, name);
                self.discovered += 1;
                debug!(
                    test = self.test,
                    pass = self.number,
                    subcase = self.tree.node(id).name(),
                    %key,
                    "discovered subcase"
                );
                id
            }
        };

        let entered_sibling = self.frames.last().is_some_and(|f| f.entered_child);
        if entered_sibling || self.tree.node(id).status().is_explored() {
            trace!(
                test = self.test,
                pass = self.number,
                subcase = self.tree.node(id).name(),
                status = ?self.tree.node(id).status(),
                "skip"
            );
            return Ok(Decision::Skip);
        }

        if let Some(frame) = self.frames.last_mut() {
            frame.entered_child = true;
        }
        self.tree.mark_entered(id);
        self.frames.push(Frame::new(id));
        self.deepest = id;

        let path = self.tree.path_names(id);
        debug!(test = self.test, pass = self.number, path = ?path, "enter");
        self.reporter.report(&Event::SubcaseEntered {
            test: self.test.to_string(),
            pass: self.number,
            path,
            site,
        });
        Ok(Decision::Enter)
    }

    /// Closes the innermost entered subcase after its block completed
    /// normally.
    pub fn leave_subcase(&mut self) {
        if self.frames.len() <= 1 {
            warn!(test = self.test, pass = self.number, "leave_subcase without a matching enter");
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if self.is_aborted() {
            return;
        }
        self.complete(frame);
    }

    fn complete(&mut self, frame: Frame) {
        let recorded = self.tree.children(frame.node).len();
        if frame.seen < recorded {
            let node = self.tree.node(frame.node);
            let site = node.key().map(|k| k.site);
            let message = format!(
                "subcase '{}' declared {} nested subcases on an earlier pass \
                 but only {} on pass {}",
                node.name(),
                recorded,
                frame.seen,
                self.number,
            );
            match site {
                Some(site) => {
                    self.record_structural(site, message);
                }
                None => {
                    self.structural = Some(err_msg!(NonDeterministic, "{}", message));
                }
            }
            return;
        }
        if self.tree.all_children_explored(frame.node) {
            self.tree.set_status(frame.node, NodeStatus::Explored);
            debug!(
                test = self.test,
                pass = self.number,
                subcase = self.tree.node(frame.node).name(),
                "fully explored"
            );
        }
    }

    fn record_structural(&mut self, site: Site, message: String) -> SubcaseError {
        warn!(test = self.test, pass = self.number, %site, "{message}");
        let err = err_at!(NonDeterministic, site, "{}", message).with_help(
            "subcase declarations must happen in the same order on every pass; \
             avoid declaring subcases conditionally on state changed by earlier passes",
        );
        self.structural = Some(err.clone());
        err
    }

    /// Records a fatal failure at the innermost active subcase.
    ///
    /// The failing subcase is marked `Failed` when no nested subcase was
    /// entered below it on this pass. Otherwise the failure came from code
    /// after a completed child, so the node stays pending to give its
    /// remaining children their own passes.
    fn abort(&mut self, err: &SubcaseError) {
        if err.error_kind() == FailureKind::NonDeterministic {
            if self.structural.is_none() {
                self.structural = Some(err.clone());
            }
            return;
        }
        if self.is_aborted() {
            return;
        }
        self.aborted = Some(err.clone());

        let (origin, entered_child) = self
            .frames
            .last()
            .map_or((NodeId::ROOT, false), |f| (f.node, f.entered_child));
        if !entered_child {
            self.tree.set_status(origin, NodeStatus::Failed);
        }
        self.tree.mark_branch_failed(origin);
        debug!(
            test = self.test,
            pass = self.number,
            subcase = self.tree.node(origin).name(),
            marked_failed = !entered_child,
            "fatal failure: {}",
            err.message()
        );
        self.reporter.report(&Event::AssertionFailed {
            test: self.test.to_string(),
            pass: self.number,
            path: self.tree.path_names(origin),
            site: err.site(),
            message: err.message().to_string(),
            fatal: true,
        });
    }

    /// Ends the pass: records how the body returned, completes the root and
    /// reports the leaf this pass ran.
    pub(crate) fn finish(mut self, outcome: Option<SubcaseError>) -> PassResult {
        match outcome {
            Some(err) => self.abort(&err),
            None if !self.is_aborted() => {
                if self.frames.len() > 1 {
                    let open = self.frames.len() - 1;
                    let deepest = self.current();
                    let site = self.tree.node(deepest).key().map(|k| k.site);
                    let message = format!(
                        "{} subcase(s) entered but never left, innermost '{}'",
                        open,
                        self.tree.node(deepest).name()
                    );
                    match site {
                        Some(site) => {
                            self.record_structural(site, message);
                        }
                        None => self.structural = Some(err_msg!(NonDeterministic, "{}", message)),
                    }
                } else if let Some(root) = self.frames.pop() {
                    self.complete(root);
                }
            }
            None => {}
        }
        self.frames.clear();

        let leaf = self.tree.node(self.deepest);
        if self.deepest != NodeId::ROOT && leaf.is_leaf() {
            let failed = leaf.branch_failed() || leaf.status() == NodeStatus::Failed;
            self.reporter.report(&Event::LeafCompleted {
                test: self.test.to_string(),
                pass: self.number,
                path: self.tree.path_names(self.deepest),
                failed,
            });
        }

        let outcome = if let Some(err) = &self.structural {
            PassOutcome::NonDeterministic {
                message: err.message().to_string(),
                site: err.site(),
            }
        } else if let Some(err) = &self.aborted {
            PassOutcome::Aborted {
                message: err.message().to_string(),
                site: err.site(),
            }
        } else {
            PassOutcome::Completed
        };

        PassResult {
            number: self.number,
            path: self.tree.path_names(self.deepest),
            outcome,
            passed_assertions: self.passed_assertions,
            failed_assertions: self.failed_assertions,
            discovered: self.discovered,
        }
    }

    /// Non-fatal assertion. Returns `condition` so callers can branch on it.
    #[track_caller]
    pub fn check(&mut self, condition: bool, expression: impl Display) -> bool {
        let site = Site::caller();
        self.record_check(site, condition, || expression.to_string())
    }

    /// Non-fatal equality assertion reporting both operands on failure.
    #[track_caller]
    pub fn check_eq<T: PartialEq + Debug>(&mut self, left: T, right: T) -> bool {
        let site = Site::caller();
        let condition = left == right;
        self.record_check(site, condition, || format!("{left:?} == {right:?}"))
    }

    /// Fatal assertion: a failure ends the pass once the error is propagated.
    #[track_caller]
    pub fn require(
        &mut self,
        condition: bool,
        expression: impl Display,
    ) -> Result<(), SubcaseError> {
        let site = Site::caller();
        if condition {
            self.passed_assertions += 1;
            return Ok(());
        }
        self.record_failure();
        Err(err_at!(Fatal, site, "REQUIRE( {} ) is NOT correct!", expression))
    }

    #[track_caller]
    pub fn require_eq<T: PartialEq + Debug>(
        &mut self,
        left: T,
        right: T,
    ) -> Result<(), SubcaseError> {
        let site = Site::caller();
        if left == right {
            self.passed_assertions += 1;
            return Ok(());
        }
        self.record_failure();
        Err(err_at!(Fatal, site, "REQUIRE( {:?} == {:?} ) is NOT correct!", left, right))
    }

    /// Unconditional fatal failure.
    #[track_caller]
    pub fn fail(&mut self, message: impl Display) -> Result<(), SubcaseError> {
        let site = Site::caller();
        self.record_failure();
        Err(err_at!(Fatal, site, "{}", message))
    }

    /// Informational message attached to the current subcase path.
    #[track_caller]
    pub fn message(&mut self, text: impl Display) {
        let site = Site::caller();
        self.reporter.report(&Event::Message {
            test: self.test.to_string(),
            pass: self.number,
            path: self.path(),
            site,
            text: text.to_string(),
        });
    }

    fn record_check(
        &mut self,
        site: Site,
        condition: bool,
        expression: impl FnOnce() -> String,
    ) -> bool {
        if condition {
            self.passed_assertions += 1;
            return true;
        }
        self.record_failure();
        let err = err_at!(Assertion, site, "CHECK( {} ) is NOT correct!", expression());
        trace!(test = self.test, pass = self.number, %site, "{}", err.message());
        self.reporter.report(&Event::AssertionFailed {
            test: self.test.to_string(),
            pass: self.number,
            path: self.path(),
            site: err.site(),
            message: err.message().to_string(),
            fatal: err.error_kind() == FailureKind::Fatal,
        });
        false
    }

    /// Counts a failed assertion against the innermost active subcase. Only
    /// leaves are blamed in branch accounting, so a failure in ancestor code
    /// fails the test case without marking the leaf below it.
    fn record_failure(&mut self) {
        self.failed_assertions += 1;
        let current = self.current();
        if current != NodeId::ROOT {
            self.tree.mark_branch_failed(current);
        }
    }
}

impl fmt::Debug for Pass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("test", &self.test)
            .field("number", &self.number)
            .field("path", &self.path())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
