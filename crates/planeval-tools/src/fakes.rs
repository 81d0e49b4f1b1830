//! In-memory fakes for the planner and validator traits (testing only).
//!
//! `FakePlanner` replays scripted outcomes keyed by problem file name;
//! `FakeValidator` judges with a caller-supplied closure over the domain
//! text and plan text. Both satisfy the trait contracts without any
//! external binaries.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use planeval_model::plan::Plan;

use crate::{PlanOutcome, Planner, ToolError, ToolResult, Validation, Validator};

// ---------------------------------------------------------------------------
// FakePlanner
// ---------------------------------------------------------------------------

/// Scripted planner: maps problem file names to fixed outcomes.
#[derive(Default)]
pub struct FakePlanner {
    outcomes: HashMap<String, PlanOutcome>,
    calls: Mutex<Vec<String>>,
}

impl FakePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an outcome for a problem file name.
    pub fn with_outcome(mut self, problem_file: &str, outcome: PlanOutcome) -> Self {
        self.outcomes.insert(problem_file.to_string(), outcome);
        self
    }

    /// Convenience: script a successful plan list.
    pub fn with_plans(self, problem_file: &str, plans: Vec<Plan>) -> Self {
        self.with_outcome(problem_file, PlanOutcome::Found(plans))
    }

    /// Problem file names planned so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl Planner for FakePlanner {
    async fn plan(&self, _domain: &Path, problem: &Path, _k: usize) -> ToolResult<PlanOutcome> {
        let key = file_name(problem);
        self.calls.lock().unwrap().push(key.clone());
        self.outcomes.get(&key).cloned().ok_or_else(|| {
            ToolError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no scripted outcome for problem {key}"),
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// FakeValidator
// ---------------------------------------------------------------------------

type Judge = dyn Fn(&str, &str) -> Validation + Send + Sync;

/// Validator driven by a judgement closure over (domain text, plan text).
///
/// The domain argument is the *contents* of the domain file the caller
/// passed, so tests can discriminate reference domains from staged
/// candidate text.
pub struct FakeValidator {
    judge: Box<Judge>,
}

impl FakeValidator {
    pub fn new(judge: impl Fn(&str, &str) -> Validation + Send + Sync + 'static) -> Self {
        Self {
            judge: Box::new(judge),
        }
    }

    /// A validator that accepts every plan.
    pub fn accept_all() -> Self {
        Self::new(|_, _| Validation::valid())
    }

    /// A validator that rejects plans for which `reject` returns true.
    pub fn rejecting(
        reject: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
        message: &str,
    ) -> Self {
        let message = message.to_string();
        Self::new(move |domain, plan| {
            if reject(domain, plan) {
                Validation::invalid(message.clone())
            } else {
                Validation::valid()
            }
        })
    }
}

#[async_trait]
impl Validator for FakeValidator {
    async fn validate(
        &self,
        domain: &Path,
        _problem: &Path,
        plan_text: &str,
    ) -> ToolResult<Validation> {
        let domain_text = tokio::fs::read_to_string(domain).await.unwrap_or_default();
        Ok((self.judge)(&domain_text, plan_text))
    }
}
