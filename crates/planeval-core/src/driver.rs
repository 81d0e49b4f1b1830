//! Metric driver: sequences the comparator and the prober over a batch.
//!
//! Annotation is copy-on-write: the input batch is never mutated, each task
//! is cloned and the clone annotated. Results already flagged by the
//! upstream parse stage skip both metrics; everything else gets a
//! reconstruction distance and a probe verdict.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use planeval_model::batch::TaskRecord;
use planeval_model::parser::parse_action_text;

use crate::error::{EvalError, Result};
use crate::probe::DomainProber;
use crate::recons::reconstruction_error;

/// Default number of concurrent probes.
const DEFAULT_CONCURRENCY: usize = 4;

/// Batch annotator.
pub struct MetricDriver {
    prober: Arc<DomainProber>,
    concurrency: usize,
}

impl MetricDriver {
    pub fn new(prober: Arc<DomainProber>) -> Self {
        Self {
            prober,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Bound the probe worker pool. Probes for different results share no
    /// mutable state, so any width is safe.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Annotate a batch. Returns a new batch; the input stays untouched.
    pub async fn annotate(&self, tasks: &[TaskRecord]) -> Result<Vec<TaskRecord>> {
        let mut annotated = Vec::with_capacity(tasks.len());
        for task in tasks {
            annotated.push(self.annotate_task(task).await?);
        }
        info!(tasks = annotated.len(), "batch annotated");
        Ok(annotated)
    }

    async fn annotate_task(&self, task: &TaskRecord) -> Result<TaskRecord> {
        debug!(domain = %task.domain, action = %task.action, "annotating task");
        let mut out = task.clone();

        // The reference corpus is vetted; an unparsable reference action is
        // an internal fault, never a per-candidate condition.
        let reference =
            parse_action_text(&task.pddl).map_err(|source| EvalError::BadReferenceAction {
                domain: task.domain.clone(),
                action: task.action.clone(),
                source,
            })?;

        // Reconstruction distances first (cheap, synchronous); collect the
        // results that go on to probing.
        let mut probe_inputs: Vec<(usize, String)> = Vec::new();
        for (idx, result) in out.results.iter_mut().enumerate() {
            result.action_dif = None;
            result.working_plans = 0;
            if result.error {
                // Upstream parse failure: classification already assigned.
                continue;
            }
            let candidate = parse_action_text(&result.output).map_err(|source| {
                EvalError::BadCandidateAction {
                    model: result.model.clone(),
                    domain: task.domain.clone(),
                    action: task.action.clone(),
                    source,
                }
            })?;
            result.action_dif = Some(reconstruction_error(&reference, &candidate) as u32);
            probe_inputs.push((idx, result.new_domain.clone()));
        }

        // Probe the surviving results on a bounded, order-preserving pool.
        let outcomes: Vec<_> = stream::iter(
            probe_inputs
                .iter()
                .map(|(_, candidate)| self.prober.probe(&task.domain, candidate)),
        )
        .buffered(self.concurrency)
        .collect()
        .await;

        for ((idx, _), outcome) in probe_inputs.iter().zip(outcomes) {
            let outcome = outcome?;
            let result = &mut out.results[*idx];
            result.working_plans = outcome.working;
            result.error = !outcome.verdict.is_equivalent();
            result.error_msg = outcome.message;
            result.verdict = Some(outcome.verdict);
        }

        Ok(out)
    }
}
