//! Plan containers and the VAL plan-text rendering.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single plan: ordered ground action invocations exactly as the planner's
/// JSON emits them (`"pick-up a b"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<String>,
}

impl Plan {
    pub fn new(actions: Vec<String>) -> Self {
        Self { actions }
    }

    /// Render to the validator's plan-file format: one parenthesized ground
    /// action per line, in order.
    pub fn to_val_text(&self) -> String {
        let mut text = String::new();
        for action in &self.actions {
            text.push('(');
            text.push_str(action);
            text.push_str(")\n");
        }
        text
    }
}

/// The planner's JSON result payload: `{"plans": [{"actions": [...]}, ...]}`.
/// Unknown sibling fields (costs, statistics) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanList {
    pub plans: Vec<Plan>,
}

/// The validated reference plans for one (domain, problem) pair.
///
/// Immutable once cached: every contained plan passed the validator against
/// the reference domain and this problem at cache-build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSet {
    pub domain: String,
    pub problem: PathBuf,
    pub plans: Vec<Plan>,
}

impl PlanSet {
    /// Number of cached plans; the count a candidate domain must reproduce.
    pub fn expected_count(&self) -> usize {
        self.plans.len()
    }
}
