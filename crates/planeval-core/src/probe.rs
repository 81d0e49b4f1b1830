//! Heuristic domain-equivalence prober.
//!
//! Probes a candidate domain against every cached reference problem, in
//! store order, short-circuiting on the first divergence. The reference
//! plan store is the ground truth: the candidate must reproduce each
//! problem's plan count, and each rank-aligned plan pair must validate in
//! both directions.

use std::sync::Arc;

use tracing::{debug, warn};

use planeval_model::verdict::{DifDomainKind, Verdict};
use planeval_store::{KnowledgeStore, PlanStore};
use planeval_tools::{PlanOutcome, Planner, ToolError, Validator};

use crate::error::{EvalError, Result};

/// The prober's answer for one candidate domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Plan pairs that replayed in both directions before the first
    /// observed divergence. Monotone over the probe; a coarse indicator of
    /// how much of the domain behaves correctly.
    pub working: u64,
    pub verdict: Verdict,
    pub message: String,
}

impl ProbeOutcome {
    fn diverged(working: u64, verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            working,
            verdict,
            message: message.into(),
        }
    }
}

/// Probes candidate domains against the reference caches.
///
/// Holds the two read-only stores plus the external tools; safe to share
/// across concurrent probes, which touch no mutable state.
pub struct DomainProber {
    knowledge: Arc<KnowledgeStore>,
    plans: Arc<PlanStore>,
    planner: Arc<dyn Planner>,
    validator: Arc<dyn Validator>,
    k: usize,
}

impl DomainProber {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        plans: Arc<PlanStore>,
        planner: Arc<dyn Planner>,
        validator: Arc<dyn Validator>,
        k: usize,
    ) -> Self {
        Self {
            knowledge,
            plans,
            planner,
            validator,
            k,
        }
    }

    /// Probe a candidate domain, given as text, against the reference
    /// domain it claims to reproduce.
    ///
    /// Always resolves to exactly one verdict; external-tool breakage is
    /// folded into `PlanError` here rather than raised. Only an unknown
    /// domain name is an error.
    pub async fn probe(&self, domain_name: &str, candidate: &str) -> Result<ProbeOutcome> {
        let entry = self
            .knowledge
            .domain(domain_name)
            .ok_or_else(|| EvalError::UnknownDomain {
                domain: domain_name.to_string(),
            })?;
        let plan_sets = self
            .plans
            .plan_sets(domain_name)
            .ok_or_else(|| EvalError::UnknownDomain {
                domain: domain_name.to_string(),
            })?;

        let mut working: u64 = 0;
        for set in plan_sets {
            let problem = set.problem.as_path();
            debug!(domain = %domain_name, problem = %problem.display(), "probing problem");

            let outcome = match self
                .planner
                .plan_domain_text(candidate, problem, self.k)
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => return Ok(self.tool_broke(working, err)),
            };
            let candidate_plans = match outcome {
                PlanOutcome::Found(plans) => plans,
                PlanOutcome::Failed(failure) => {
                    debug!(domain = %domain_name, verdict = %failure.verdict, "planner refused candidate");
                    return Ok(ProbeOutcome::diverged(
                        working,
                        failure.verdict,
                        failure.message,
                    ));
                }
            };

            // A different plan count is a structural mismatch that
            // precludes per-plan comparison.
            if candidate_plans.len() != set.expected_count() {
                return Ok(ProbeOutcome::diverged(
                    working,
                    Verdict::DifDomain(DifDomainKind::KDiff),
                    format!(
                        "reference has {} plans, candidate produced {}",
                        set.expected_count(),
                        candidate_plans.len()
                    ),
                ));
            }

            for (reference_plan, candidate_plan) in set.plans.iter().zip(&candidate_plans) {
                // (a) The candidate's plan must replay in the reference
                // domain.
                let forward = match self
                    .validator
                    .validate(&entry.path, problem, &candidate_plan.to_val_text())
                    .await
                {
                    Ok(v) => v,
                    Err(err) => return Ok(self.tool_broke(working, err)),
                };
                if !forward.valid {
                    return Ok(ProbeOutcome::diverged(
                        working,
                        Verdict::DifDomain(DifDomainKind::NewToOriginal),
                        forward.message,
                    ));
                }

                // (b) The reference's plan must replay in the candidate
                // domain.
                let backward = match self
                    .validator
                    .validate_domain_text(candidate, problem, &reference_plan.to_val_text())
                    .await
                {
                    Ok(v) => v,
                    Err(err) => return Ok(self.tool_broke(working, err)),
                };
                if !backward.valid {
                    // Direction (a) already succeeded, so this pair still
                    // counts as working before the probe stops.
                    working += 1;
                    return Ok(ProbeOutcome::diverged(
                        working,
                        Verdict::DifDomain(DifDomainKind::OriginalToNew),
                        backward.message,
                    ));
                }

                working += 1;
            }
        }

        Ok(ProbeOutcome {
            working,
            verdict: Verdict::EqDomain,
            message: String::new(),
        })
    }

    fn tool_broke(&self, working: u64, err: ToolError) -> ProbeOutcome {
        warn!(error = %err, "external tool failed mid-probe");
        ProbeOutcome::diverged(working, Verdict::PlanError, err.to_string())
    }
}
