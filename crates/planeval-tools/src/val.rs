//! VAL plan validator subprocess wrapper.
//!
//! VAL takes a domain file, a problem file, and a plan file; exit code zero
//! means the plan is valid, anything else invalid with the captured output
//! as the explanation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{absolutize, ToolError, ToolResult, Validation, Validator};

/// Configuration for the VAL invocation.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Path to the `Validate` binary.
    pub binary: PathBuf,

    /// Hard wall-clock limit per invocation, in seconds.
    pub timeout_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("VAL/build/bin/Validate"),
            timeout_secs: 60,
        }
    }
}

/// VAL behind the [`Validator`] trait.
pub struct ValValidator {
    config: ValidatorConfig,
}

impl ValValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }
}

impl Default for ValValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

#[async_trait]
impl Validator for ValValidator {
    async fn validate(
        &self,
        domain: &Path,
        problem: &Path,
        plan_text: &str,
    ) -> ToolResult<Validation> {
        let invocation = Uuid::new_v4();
        let domain = absolutize(domain)?;
        let problem = absolutize(problem)?;
        let binary = absolutize(&self.config.binary)?;

        let scratch = tempfile::Builder::new().prefix("planeval-val-").tempdir()?;
        let plan_path = scratch.path().join("plan.pddl");
        tokio::fs::write(&plan_path, plan_text).await?;

        debug!(
            %invocation,
            domain = %domain.display(),
            problem = %problem.display(),
            "invoking validator"
        );

        let child = Command::new(&binary)
            .arg(&domain)
            .arg(&problem)
            .arg(&plan_path)
            .current_dir(scratch.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: "validator",
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
                warn!(%invocation, "validator exceeded the hard timeout");
                return Ok(Validation::invalid(format!(
                    "validator timed out after {}s",
                    self.config.timeout_secs
                )));
            }
        };

        if output.status.success() {
            Ok(Validation::valid())
        } else {
            Ok(Validation::invalid(
                String::from_utf8_lossy(&output.stdout).to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The real binary is exercised in deployment; here we only pin the
    // invocation contract that is visible without it.

    #[test]
    fn test_default_binary_location() {
        let config = ValidatorConfig::default();
        assert_eq!(config.binary, PathBuf::from("VAL/build/bin/Validate"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_error() {
        let validator = ValValidator::new(ValidatorConfig {
            binary: PathBuf::from("/nonexistent/Validate"),
            timeout_secs: 5,
        });
        let scratch = tempfile::tempdir().unwrap();
        let domain = scratch.path().join("d.pddl");
        let problem = scratch.path().join("p.pddl");
        std::fs::write(&domain, "(define (domain x))").unwrap();
        std::fs::write(&problem, "(define (problem y) (:domain x))").unwrap();

        let err = validator
            .validate(&domain, &problem, "(noop)\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { tool: "validator", .. }));
    }
}
