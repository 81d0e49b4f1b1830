//! Task/result batch records exchanged with the upstream parsing stage.
//!
//! Field names mirror the JSON batch files verbatim. The typed [`Verdict`]
//! is bridged to the flat `resultClass`/`errorSubclass` string pair during
//! (de)serialization; everything in between works with the enum.

use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// One evaluation task: a reference action and the per-model results
/// produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Reference domain name.
    pub domain: String,
    /// Reference action name.
    pub action: String,
    /// Canonical reference PDDL text for the action.
    pub pddl: String,
    /// Natural-language description class of the prompt.
    #[serde(rename = "class")]
    pub nl_class: String,
    pub results: Vec<ResultRecord>,
}

/// One model generation result within a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResultRecord", into = "RawResultRecord")]
pub struct ResultRecord {
    /// Model identifier.
    pub model: String,
    /// Generation parameters, opaque to the pipeline.
    pub parameters: serde_json::Value,
    /// Raw model output for the action reconstruction.
    pub output: String,
    /// Full generated domain text used for equivalence probing.
    pub new_domain: String,
    /// Error flag; true for upstream parse failures and for every verdict
    /// other than `EqDomain`.
    pub error: bool,
    pub error_msg: String,
    /// Classification, absent until annotated (or for clean upstream results).
    pub verdict: Option<Verdict>,
    /// Action reconstruction distance; `None` when not computed.
    pub action_dif: Option<u32>,
    /// Plan pairs that replayed in both directions before the first divergence.
    pub working_plans: u64,
}

/// Wire shape of a result record. `actionDif` is accepted as any JSON number
/// on input (legacy producers wrote floats) and always written as an integer
/// or null.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawResultRecord {
    model: String,
    #[serde(default)]
    parameters: serde_json::Value,
    #[serde(default)]
    output: String,
    #[serde(rename = "newDomain", default)]
    new_domain: String,
    #[serde(default)]
    error: bool,
    #[serde(rename = "errorMsg", default)]
    error_msg: String,
    #[serde(rename = "resultClass", default)]
    result_class: String,
    #[serde(rename = "errorSubclass", default)]
    error_subclass: String,
    #[serde(rename = "actionDif", default)]
    action_dif: Option<serde_json::Value>,
    #[serde(rename = "workingPlans", default)]
    working_plans: u64,
}

impl TryFrom<RawResultRecord> for ResultRecord {
    type Error = String;

    fn try_from(raw: RawResultRecord) -> Result<Self, Self::Error> {
        let verdict = if raw.result_class.is_empty() {
            None
        } else {
            Some(
                Verdict::from_labels(&raw.result_class, &raw.error_subclass).ok_or_else(|| {
                    format!(
                        "unknown result classification: {:?}/{:?}",
                        raw.result_class, raw.error_subclass
                    )
                })?,
            )
        };
        let action_dif = raw
            .action_dif
            .as_ref()
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
            .map(|v| v.round() as u32);
        Ok(ResultRecord {
            model: raw.model,
            parameters: raw.parameters,
            output: raw.output,
            new_domain: raw.new_domain,
            error: raw.error,
            error_msg: raw.error_msg,
            verdict,
            action_dif,
            working_plans: raw.working_plans,
        })
    }
}

impl From<ResultRecord> for RawResultRecord {
    fn from(record: ResultRecord) -> Self {
        let (result_class, error_subclass) = match record.verdict {
            Some(v) => (v.class().to_string(), v.subclass().to_string()),
            None => (String::new(), String::new()),
        };
        RawResultRecord {
            model: record.model,
            parameters: record.parameters,
            output: record.output,
            new_domain: record.new_domain,
            error: record.error,
            error_msg: record.error_msg,
            result_class,
            error_subclass,
            action_dif: record.action_dif.map(serde_json::Value::from),
            working_plans: record.working_plans,
        }
    }
}
