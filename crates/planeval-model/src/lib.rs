//! Planeval data model.
//!
//! Types shared across the pipeline: the PDDL syntax tree for reference
//! domains and problems, the s-expression parser that produces it, plan
//! containers matching the planner's JSON output, the closed verdict
//! taxonomy, and the task/result batch records exchanged with the upstream
//! parsing stage.

pub mod ast;
pub mod batch;
pub mod parser;
pub mod plan;
pub mod props;
pub mod verdict;

pub use ast::{Action, Domain, Formula, Predicate, PredicateSig, Problem};
pub use batch::{ResultRecord, TaskRecord};
pub use parser::{parse_action_text, parse_pddl_file, ParseError, PddlFile};
pub use plan::{Plan, PlanList, PlanSet};
pub use verdict::{DifDomainKind, SemanticErrorKind, SyntaxErrorKind, Verdict};
