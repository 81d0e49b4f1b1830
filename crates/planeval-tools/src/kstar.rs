//! K* planner subprocess wrapper.
//!
//! Invokes the K* driver with a bounded search time, reads the JSON plans
//! file it writes into the invocation's scratch directory, and maps its
//! exit codes into the verdict taxonomy. K* reuses the Fast Downward exit
//! code table.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use planeval_model::plan::PlanList;
use planeval_model::verdict::{DifDomainKind, SemanticErrorKind, Verdict};

use crate::{absolutize, PlanFailure, PlanOutcome, Planner, ToolError, ToolResult};

/// Configuration for the K* invocation.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Command prefix used to launch the planner driver.
    pub command: Vec<String>,

    /// Search time bound handed to the planner itself.
    pub search_time_limit: String,

    /// Hard wall-clock limit for the whole invocation, in seconds. Hitting
    /// it is treated like the planner's own search-timeout exit.
    pub timeout_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "python3".to_string(),
                "-m".to_string(),
                "kstar_planner.driver.main".to_string(),
            ],
            search_time_limit: "30s".to_string(),
            timeout_secs: 120,
        }
    }
}

/// K* planner behind the [`Planner`] trait.
pub struct KstarPlanner {
    config: PlannerConfig,
}

impl KstarPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }
}

impl Default for KstarPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

#[async_trait]
impl Planner for KstarPlanner {
    async fn plan(&self, domain: &Path, problem: &Path, k: usize) -> ToolResult<PlanOutcome> {
        let (exe, prefix_args) =
            self.config
                .command
                .split_first()
                .ok_or_else(|| ToolError::Spawn {
                    tool: "planner",
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "planner command is empty",
                    ),
                })?;
        let invocation = Uuid::new_v4();
        let domain = absolutize(domain)?;
        let problem = absolutize(problem)?;

        // Fresh scratch directory per invocation; the child runs inside it,
        // so planner side effects (the found_plans dump) die with it.
        let scratch = tempfile::Builder::new().prefix("planeval-kstar-").tempdir()?;
        let plans_path = scratch.path().join("plans.json");
        let search = format!(
            "kstar(lmcut(),k={k},dump_plan_files=false,json_file_to_dump={})",
            plans_path.display()
        );

        debug!(
            %invocation,
            domain = %domain.display(),
            problem = %problem.display(),
            k,
            "invoking planner"
        );

        let child = Command::new(exe)
            .args(prefix_args)
            .arg("--search-time-limit")
            .arg(&self.config.search_time_limit)
            .arg(&domain)
            .arg(&problem)
            .arg("--search")
            .arg(&search)
            .current_dir(scratch.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: "planner",
                source,
            })?;

        let output = match tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(output) => output?,
            Err(_) => {
                warn!(%invocation, "planner exceeded the hard timeout");
                return Ok(PlanOutcome::Failed(PlanFailure {
                    verdict: Verdict::DifDomain(DifDomainKind::NoPlan),
                    message: format!(
                        "planner timed out after {}s",
                        self.config.timeout_secs
                    ),
                }));
            }
        };

        if output.status.success() {
            let raw = tokio::fs::read(&plans_path).await?;
            let list: PlanList = serde_json::from_slice(&raw)?;
            debug!(%invocation, plans = list.plans.len(), "planner returned");
            return Ok(PlanOutcome::Found(list.plans));
        }

        let code = output.status.code().unwrap_or(-1);
        let captured = String::from_utf8_lossy(&output.stdout).to_string();
        debug!(%invocation, code, "planner exited non-zero");
        Ok(PlanOutcome::Failed(classify_exit(code, captured)))
    }
}

/// Exit-code contract, per the Fast Downward table the K* driver follows.
fn classify_exit(code: i32, output: String) -> PlanFailure {
    match code {
        // 12: search proved the task unsolvable. 23: the search hit its own
        // time bound before finding k plans.
        12 | 23 => PlanFailure {
            verdict: Verdict::DifDomain(DifDomainKind::NoPlan),
            message: output,
        },
        // Translation into SAS+ failed: the PDDL is not well formed.
        30 => PlanFailure {
            verdict: Verdict::SemanticError(SemanticErrorKind::BadPddl),
            message: output,
        },
        // Negated precondition reached the STRIPS translator.
        34 => PlanFailure {
            verdict: Verdict::SemanticError(SemanticErrorKind::NegPrecond),
            message: output,
        },
        _ => PlanFailure {
            verdict: Verdict::PlanError,
            message: format!("planner exit code {code}: {output}"),
        },
    }
}
