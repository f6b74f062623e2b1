//! Run configuration: defaults, YAML loading and validation.
//!
//! ```yaml
//! filter: "subcases"     # case-insensitive substring of name or suite
//! suite: suite1          # only test cases of this suite
//! abort_after: 10        # stop the run after this many failed assertions
//! max_passes: 10000      # per test case
//! order: random          # file | name | random
//! seed: 42
//! format: console        # console | json
//! use_colors: true
//! log_level: warn
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{err_msg, SubcaseError};

pub const DEFAULT_MAX_PASSES: usize = 10_000;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Order in which test cases are run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// Declaration order.
    #[default]
    File,
    Name,
    /// Shuffled with `seed`, or with a fresh seed that gets reported.
    Random,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub filter: Option<String>,
    pub suite: Option<String>,
    pub abort_after: Option<usize>,
    pub max_passes: usize,
    pub order: OrderBy,
    pub seed: Option<u64>,
    pub format: ReportFormat,
    pub use_colors: bool,
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            filter: None,
            suite: None,
            abort_after: None,
            max_passes: DEFAULT_MAX_PASSES,
            order: OrderBy::File,
            seed: None,
            format: ReportFormat::Console,
            use_colors: atty::is(atty::Stream::Stdout),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, SubcaseError> {
        let config: RunConfig = serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Config, "invalid run configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, SubcaseError> {
        let text = fs::read_to_string(path).map_err(|e| {
            err_msg!(Config, "failed to read '{}'", path.display()).with_source(e)
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), SubcaseError> {
        if self.max_passes == 0 {
            return Err(err_msg!(Config, "max_passes must be at least 1"));
        }
        if self.abort_after == Some(0) {
            return Err(err_msg!(Config, "abort_after must be at least 1")
                .with_help("leave abort_after unset to never abort"));
        }
        Ok(())
    }
}
