//! Narrow interfaces over the two external batch tools.
//!
//! Each tool sits behind a small async trait returning a structured result,
//! so all exit-code-to-classification mapping stays in one place per tool:
//! - [`Planner`]: top-k plan generation ([`KstarPlanner`])
//! - [`Validator`]: plan validation ([`ValValidator`])
//!
//! In-memory fakes satisfying both contracts are provided for testing via
//! the `fakes` module.

pub mod fakes;
mod kstar;
mod val;

pub use kstar::{KstarPlanner, PlannerConfig};
pub use val::{ValValidator, ValidatorConfig};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use planeval_model::plan::Plan;
use planeval_model::verdict::Verdict;

/// Result type for tool invocations.
///
/// `Err` means the invocation itself broke (spawn failure, lost result
/// file); a tool running and saying "no" is a success value.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Failures of the invocation machinery, as opposed to tool verdicts.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("planner result file malformed: {0}")]
    MalformedPlans(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A classified planner refusal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanFailure {
    pub verdict: Verdict,
    pub message: String,
}

/// Outcome of a planner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The planner produced plans (possibly fewer than requested).
    Found(Vec<Plan>),
    /// The planner ran and failed in a classifiable way.
    Failed(PlanFailure),
}

/// External top-k planner.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Request the top-`k` plans for a domain file against a problem file.
    async fn plan(&self, domain: &Path, problem: &Path, k: usize) -> ToolResult<PlanOutcome>;

    /// Plan for a domain that only exists as text. Generated domains arrive
    /// as strings; the text is staged into a scratch file that lives only
    /// for the duration of the call.
    async fn plan_domain_text(
        &self,
        domain: &str,
        problem: &Path,
        k: usize,
    ) -> ToolResult<PlanOutcome> {
        let scratch = tempfile::Builder::new().prefix("planeval-domain-").tempdir()?;
        let domain_path = scratch.path().join("domain.pddl");
        tokio::fs::write(&domain_path, domain).await?;
        self.plan(&domain_path, problem, k).await
    }
}

/// Outcome of a validator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    /// Captured tool output when invalid; empty when valid.
    pub message: String,
}

impl Validation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// External plan validator.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate plan text against a domain file and problem file.
    async fn validate(
        &self,
        domain: &Path,
        problem: &Path,
        plan_text: &str,
    ) -> ToolResult<Validation>;

    /// Validate against a domain that only exists as text.
    async fn validate_domain_text(
        &self,
        domain: &str,
        problem: &Path,
        plan_text: &str,
    ) -> ToolResult<Validation> {
        let scratch = tempfile::Builder::new().prefix("planeval-domain-").tempdir()?;
        let domain_path = scratch.path().join("domain.pddl");
        tokio::fs::write(&domain_path, domain).await?;
        self.validate(&domain_path, problem, plan_text).await
    }
}

/// Resolve a path against the current directory. Children run inside their
/// scratch directory, so every path handed to them must be absolute.
pub(crate) fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
