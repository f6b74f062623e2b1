//! The subcase execution engine.
//!
//! A test case body declares nested subcases. Instead of suspending inside a
//! subcase and resuming later, the engine re-runs the whole body once per
//! pass and, at each subcase site, decides whether to enter it or skip it.
//! Identity of a site is its source location plus an occurrence counter under
//! its parent, so the recorded tree can be matched against the live call
//! sequence on every replay.
//!
//! Selection is depth-first, leftmost-unexplored-first:
//!
//! 1. Under each entered node only the first not yet explored child is
//!    entered; every later sibling is skipped together with its subtree.
//! 2. A node becomes explored when a pass completes it and all of its
//!    discovered children are explored.
//! 3. A fatal failure ends the pass and marks the failing subcase as failed,
//!    which counts as explored.
//!
//! The engine never loops on its own. A driver calls
//! [`TestCaseState::run_pass`] until [`TestCaseState::should_continue`]
//! returns false:
//!
//! ```rust
//! use subcase::engine::TestCaseState;
//! use subcase::report::RecordingReporter;
//!
//! let mut state = TestCaseState::new("two branches");
//! let mut reporter = RecordingReporter::default();
//! while state.should_continue() {
//!     state.run_pass(
//!         |pass| {
//!             pass.subcase("one", |pass| {
//!                 pass.check(1 + 1 == 2, "1 + 1 == 2");
//!                 Ok(())
//!             })?;
//!             pass.subcase("two", |_| Ok(()))
//!         },
//!         &mut reporter,
//!     );
//! }
//! assert_eq!(state.passes(), 2);
//! assert!(!state.failed());
//! ```

mod pass;
mod site;
mod state;
mod tree;

pub use pass::{Decision, Pass, PassOutcome, PassResult};
pub use site::{Site, SiteKey};
pub use state::TestCaseState;
pub use tree::{NodeId, NodeStatus, SubcaseNode, SubcaseTree};
