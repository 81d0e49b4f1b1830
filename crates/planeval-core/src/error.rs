//! Evaluation-level errors.
//!
//! Everything here is an internal fatal condition. Per-candidate failures
//! never surface as errors: the prober folds them into its verdict.

use planeval_model::parser::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("domain {domain} has no cached reference plans")]
    UnknownDomain { domain: String },

    #[error("reference action {domain}/{action} failed to parse: {source}")]
    BadReferenceAction {
        domain: String,
        action: String,
        #[source]
        source: ParseError,
    },

    #[error(
        "candidate output for {domain}/{action} from {model} failed to parse \
         after upstream acceptance: {source}"
    )]
    BadCandidateAction {
        model: String,
        domain: String,
        action: String,
        #[source]
        source: ParseError,
    },
}

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
