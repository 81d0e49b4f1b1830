//! The closed outcome taxonomy for evaluated generation results.
//!
//! Exactly one verdict per result. The wire format used by the batch files
//! splits a verdict into two flat strings (`resultClass` / `errorSubclass`);
//! that projection lives here and nowhere else.

use serde::{Deserialize, Serialize};

/// Why candidate text failed to parse as PDDL (assigned upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntaxErrorKind {
    ParseError,
    ParenMismatch,
    NoEffect,
}

/// Parsed but violates planner-level well-formedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticErrorKind {
    BadPddl,
    DifActionName,
    TypeError,
    NegPrecond,
}

/// Parses and is well-formed, but plan probing disproved equivalence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifDomainKind {
    /// The candidate domain could not solve a reference problem (includes
    /// planner search timeouts).
    NoPlan,
    /// A candidate plan failed to replay in the reference domain.
    NewToOriginal,
    /// A reference plan failed to replay in the candidate domain.
    OriginalToNew,
    /// The candidate produced a different plan count than the reference.
    KDiff,
}

/// Final classification of one generation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    SyntaxError(SyntaxErrorKind),
    SemanticError(SemanticErrorKind),
    DifDomain(DifDomainKind),
    /// No probe found a divergence.
    EqDomain,
    /// Unclassified external-tool failure; inconclusive and excluded from
    /// equivalence statistics.
    PlanError,
}

impl Verdict {
    /// The wire `resultClass` label.
    pub fn class(&self) -> &'static str {
        match self {
            Verdict::SyntaxError(_) => "SyntaxError",
            Verdict::SemanticError(_) => "SemanticError",
            Verdict::DifDomain(_) => "DifDomain",
            Verdict::EqDomain => "EqDomain",
            Verdict::PlanError => "PlanError",
        }
    }

    /// The wire `errorSubclass` label; empty for classes without subclasses.
    pub fn subclass(&self) -> &'static str {
        match self {
            Verdict::SyntaxError(SyntaxErrorKind::ParseError) => "ParseError",
            Verdict::SyntaxError(SyntaxErrorKind::ParenMismatch) => "ParenMismatch",
            Verdict::SyntaxError(SyntaxErrorKind::NoEffect) => "NoEffect",
            Verdict::SemanticError(SemanticErrorKind::BadPddl) => "BadPDDL",
            Verdict::SemanticError(SemanticErrorKind::DifActionName) => "DifActionName",
            Verdict::SemanticError(SemanticErrorKind::TypeError) => "TypeError",
            Verdict::SemanticError(SemanticErrorKind::NegPrecond) => "NegPrecond",
            Verdict::DifDomain(DifDomainKind::NoPlan) => "NoPlan",
            Verdict::DifDomain(DifDomainKind::NewToOriginal) => "NewToOriginal",
            Verdict::DifDomain(DifDomainKind::OriginalToNew) => "OriginalToNew",
            Verdict::DifDomain(DifDomainKind::KDiff) => "k diff error",
            Verdict::EqDomain | Verdict::PlanError => "",
        }
    }

    /// Whether this verdict means the candidate matched the reference.
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Verdict::EqDomain)
    }

    /// Rebuild a verdict from its wire labels. Returns `None` for label
    /// combinations outside the taxonomy.
    pub fn from_labels(class: &str, subclass: &str) -> Option<Self> {
        match (class, subclass) {
            ("SyntaxError", "ParseError") => Some(Verdict::SyntaxError(SyntaxErrorKind::ParseError)),
            ("SyntaxError", "ParenMismatch") => {
                Some(Verdict::SyntaxError(SyntaxErrorKind::ParenMismatch))
            }
            ("SyntaxError", "NoEffect") => Some(Verdict::SyntaxError(SyntaxErrorKind::NoEffect)),
            ("SemanticError", "BadPDDL") => Some(Verdict::SemanticError(SemanticErrorKind::BadPddl)),
            ("SemanticError", "DifActionName") => {
                Some(Verdict::SemanticError(SemanticErrorKind::DifActionName))
            }
            ("SemanticError", "TypeError") => {
                Some(Verdict::SemanticError(SemanticErrorKind::TypeError))
            }
            ("SemanticError", "NegPrecond") => {
                Some(Verdict::SemanticError(SemanticErrorKind::NegPrecond))
            }
            ("DifDomain", "NoPlan") => Some(Verdict::DifDomain(DifDomainKind::NoPlan)),
            ("DifDomain", "NewToOriginal") => Some(Verdict::DifDomain(DifDomainKind::NewToOriginal)),
            ("DifDomain", "OriginalToNew") => Some(Verdict::DifDomain(DifDomainKind::OriginalToNew)),
            ("DifDomain", "k diff error") => Some(Verdict::DifDomain(DifDomainKind::KDiff)),
            ("EqDomain", "") => Some(Verdict::EqDomain),
            ("PlanError", "") => Some(Verdict::PlanError),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.subclass().is_empty() {
            write!(f, "{}", self.class())
        } else {
            write!(f, "{}/{}", self.class(), self.subclass())
        }
    }
}
