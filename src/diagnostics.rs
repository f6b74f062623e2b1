//! Unified, `miette`-based error type for the subcase engine and its driver.
//!
//! Every failure the engine, the runner or the command line can produce is a
//! [`SubcaseError`]. Construct them with the `err_msg!` and `err_at!` macros:
//!
//! - `err_msg!(Config, "unknown order '{}'", name)` for message-only errors.
//! - `err_at!(Fatal, site, "expected {} got {}", a, b)` when a [`Site`] is known.
//!
//! Use [`SubcaseError::with_help`] to attach a help line afterwards.

use std::fmt;
use std::sync::Arc;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::engine::Site;

pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Type-safe classification of a [`SubcaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Non-fatal check failure: recorded, the pass keeps running.
    Assertion,
    /// Aborts the remainder of the current pass.
    Fatal,
    /// The live call sequence disagrees with the recorded subcase tree.
    NonDeterministic,
    /// A test case needed more passes than the configured limit.
    PassLimit,
    /// Invalid configuration or command line input.
    Config,
    /// I/O and other internal failures.
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Assertion => "assertion",
            FailureKind::Fatal => "fatal",
            FailureKind::NonDeterministic => "non-deterministic",
            FailureKind::PassLimit => "pass-limit",
            FailureKind::Config => "config",
            FailureKind::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an error happened and what to do about it.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub site: Option<Site>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at(site: Site) -> Self {
        Self {
            site: Some(site),
            help: None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SubcaseError {
    #[error("Assertion failed: {message}")]
    Assertion {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<ErrorSource>,
    },
    #[error("Fatal failure: {message}")]
    Fatal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<ErrorSource>,
    },
    #[error("Non-deterministic subcase tree: {message}")]
    NonDeterministic {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<ErrorSource>,
    },
    #[error("Pass limit exceeded: {message}")]
    PassLimit {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<ErrorSource>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<ErrorSource>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<ErrorSource>,
    },
}

impl SubcaseError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            SubcaseError::Assertion { ctx, .. }
            | SubcaseError::Fatal { ctx, .. }
            | SubcaseError::NonDeterministic { ctx, .. }
            | SubcaseError::PassLimit { ctx, .. }
            | SubcaseError::Config { ctx, .. }
            | SubcaseError::Internal { ctx, .. } => ctx,
        }
    }

    fn get_ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            SubcaseError::Assertion { ctx, .. }
            | SubcaseError::Fatal { ctx, .. }
            | SubcaseError::NonDeterministic { ctx, .. }
            | SubcaseError::PassLimit { ctx, .. }
            | SubcaseError::Config { ctx, .. }
            | SubcaseError::Internal { ctx, .. } => ctx,
        }
    }

    pub fn error_kind(&self) -> FailureKind {
        match self {
            SubcaseError::Assertion { .. } => FailureKind::Assertion,
            SubcaseError::Fatal { .. } => FailureKind::Fatal,
            SubcaseError::NonDeterministic { .. } => FailureKind::NonDeterministic,
            SubcaseError::PassLimit { .. } => FailureKind::PassLimit,
            SubcaseError::Config { .. } => FailureKind::Config,
            SubcaseError::Internal { .. } => FailureKind::Internal,
        }
    }

    /// The bare message, without the kind prefix of `Display`.
    pub fn message(&self) -> &str {
        match self {
            SubcaseError::Assertion { message, .. }
            | SubcaseError::Fatal { message, .. }
            | SubcaseError::NonDeterministic { message, .. }
            | SubcaseError::PassLimit { message, .. }
            | SubcaseError::Config { message, .. }
            | SubcaseError::Internal { message, .. } => message,
        }
    }

    pub fn site(&self) -> Option<Site> {
        self.get_ctx().site
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.get_ctx_mut().help = Some(help.into());
        self
    }

    pub fn with_source(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        let cause: ErrorSource = Arc::new(cause);
        match &mut self {
            SubcaseError::Assertion { source, .. }
            | SubcaseError::Fatal { source, .. }
            | SubcaseError::NonDeterministic { source, .. }
            | SubcaseError::PassLimit { source, .. }
            | SubcaseError::Config { source, .. }
            | SubcaseError::Internal { source, .. } => *source = Some(cause),
        }
        self
    }
}

impl Diagnostic for SubcaseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("subcase::{}", self.error_kind())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let ctx = self.get_ctx();
        match (&ctx.help, ctx.site) {
            (Some(help), Some(site)) => Some(Box::new(format!("{help} (at {site})"))),
            (Some(help), None) => Some(Box::new(help)),
            (None, Some(site)) => Some(Box::new(format!("at {site}"))),
            (None, None) => None,
        }
    }
}

/// Constructs a [`SubcaseError`] variant with a formatted message and no location.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($arg:tt)+) => {
        $crate::SubcaseError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a [`SubcaseError`] variant with a formatted message at a [`Site`].
#[macro_export]
macro_rules! err_at {
    ($variant:ident, $site:expr, $($arg:tt)+) => {
        $crate::SubcaseError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::at($site),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn test_code_and_help_rendered() {
        let site = Site::new("tests/sample.rs", 12, 5);
        let err = crate::err_at!(NonDeterministic, site, "expected subcase '{}'", "one")
            .with_help("subcase declarations must not depend on state mutated by earlier passes");
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("subcase::non-deterministic"));
        assert!(output.contains("expected subcase 'one'"));
        assert!(output.contains("tests/sample.rs:12:5"));
        assert!(output.contains("must not depend on state"));
    }

    #[test]
    fn test_error_chaining() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yaml");
        let err = crate::err_msg!(Config, "failed to read config").with_source(io);
        assert_eq!(err.error_kind(), FailureKind::Config);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("failed to read config"));
        assert!(output.contains("missing.yaml"));
    }

    #[test]
    fn test_message_without_prefix() {
        let err = crate::err_msg!(Fatal, "{} != {}", 1, 2);
        assert_eq!(err.message(), "1 != 2");
        assert_eq!(err.to_string(), "Fatal failure: 1 != 2");
        assert!(err.site().is_none());
    }
}
