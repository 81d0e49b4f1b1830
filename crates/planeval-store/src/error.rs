//! Store-level error taxonomy.
//!
//! Cache-build invariant violations abort the whole run: they indicate a
//! corrupt reference corpus, not a per-candidate condition.

use std::path::PathBuf;

use planeval_model::parser::ParseError;
use planeval_tools::ToolError;

/// Errors produced while building, persisting, or loading the caches.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not classify {path} as a PDDL domain or problem: {source}")]
    UnclassifiedInput {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("predicate description for domain {domain} not found at {path}")]
    MissingPredicateDescription { domain: String, path: PathBuf },

    #[error("domain {domain} is not in the knowledge store")]
    UnknownDomain { domain: String },

    #[error("reference planning failed for {domain} / {problem} ({verdict}): {message}")]
    ReferencePlanningFailed {
        domain: String,
        problem: PathBuf,
        verdict: String,
        message: String,
    },

    #[error("reference plan rejected by the validator for {domain} / {problem}: {message}")]
    InvalidReferencePlan {
        domain: String,
        problem: PathBuf,
        message: String,
    },

    #[error("tool invocation failed: {0}")]
    Tool(#[from] ToolError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
