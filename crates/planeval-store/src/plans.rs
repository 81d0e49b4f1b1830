//! The reference plan store.
//!
//! For every (domain, problem) pair in the knowledge store, asks the
//! planner for the top-k plans from the reference domain and re-validates
//! every plan independently before caching it. The cached counts are the
//! expected counts a candidate domain must reproduce; a reference corpus
//! that cannot plan and validate cleanly is corrupt, so every failure here
//! is fatal.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use planeval_model::plan::PlanSet;
use planeval_tools::{PlanOutcome, Planner, Validator};

use crate::error::{Result, StoreError};
use crate::knowledge::KnowledgeStore;

/// Validated reference plans, keyed by domain name with problem order
/// preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStore {
    plan_sets: BTreeMap<String, Vec<PlanSet>>,
}

impl PlanStore {
    /// Plan and validate the whole reference corpus.
    pub async fn build(
        k: usize,
        knowledge: &KnowledgeStore,
        planner: &dyn Planner,
        validator: &dyn Validator,
    ) -> Result<Self> {
        let mut plan_sets: BTreeMap<String, Vec<PlanSet>> = BTreeMap::new();
        for (name, entry) in knowledge.domains() {
            let mut sets = Vec::new();
            for problem in knowledge.problems(name) {
                info!(domain = %name, problem = %problem.path.display(), "planning reference problem");
                let outcome = planner.plan(&entry.path, &problem.path, k).await?;
                let plans = match outcome {
                    PlanOutcome::Found(plans) => plans,
                    PlanOutcome::Failed(failure) => {
                        return Err(StoreError::ReferencePlanningFailed {
                            domain: name.clone(),
                            problem: problem.path.clone(),
                            verdict: failure.verdict.to_string(),
                            message: failure.message,
                        })
                    }
                };

                // Hard invariant: every cached plan must independently pass
                // validation against the pair it was planned for.
                for plan in &plans {
                    let validation = validator
                        .validate(&entry.path, &problem.path, &plan.to_val_text())
                        .await?;
                    if !validation.valid {
                        return Err(StoreError::InvalidReferencePlan {
                            domain: name.clone(),
                            problem: problem.path.clone(),
                            message: validation.message,
                        });
                    }
                }
                debug!(domain = %name, plans = plans.len(), "reference plans validated");

                sets.push(PlanSet {
                    domain: name.clone(),
                    problem: problem.path.clone(),
                    plans,
                });
            }
            plan_sets.insert(name.clone(), sets);
        }
        Ok(Self { plan_sets })
    }

    /// Load the persisted plan cache, or build and persist it if absent.
    pub async fn load_or_build(
        artifact: &Path,
        k: usize,
        knowledge: &KnowledgeStore,
        planner: &dyn Planner,
        validator: &dyn Validator,
    ) -> Result<Self> {
        if artifact.exists() {
            debug!(artifact = %artifact.display(), "loading reference plan cache");
            return Self::load(artifact);
        }
        info!(artifact = %artifact.display(), "reference plan cache absent, building");
        let store = Self::build(k, knowledge, planner, validator).await?;
        store.save(artifact)?;
        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = crate::to_artifact_bytes(self)?;
        crate::write_artifact(path, &bytes)?;
        info!(artifact = %path.display(), "reference plan cache written");
        Ok(())
    }

    /// SHA-256 of the serialized cache.
    pub fn artifact_digest(&self) -> Result<String> {
        crate::artifact_digest(self)
    }

    // -- accessors ----------------------------------------------------------

    /// Plan sets for a domain, in problem order.
    pub fn plan_sets(&self, domain: &str) -> Option<&[PlanSet]> {
        self.plan_sets.get(domain).map(Vec::as_slice)
    }

    /// Total number of reference plans across all problems of a domain.
    pub fn total_plans(&self, domain: &str) -> usize {
        self.plan_sets(domain)
            .map(|sets| sets.iter().map(|s| s.plans.len()).sum())
            .unwrap_or(0)
    }
}
