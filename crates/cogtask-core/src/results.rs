//! Result records produced by running an assessment, with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decode::{TAG_FORM, TAG_INSTRUCTION};
use crate::model::{Assessment, Choice, Step};
use crate::traits::Node;

/// A participant's run through an assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// Identifier the run is recorded under.
    pub identifier: String,
    /// Identifier of the assessment definition that produced the run.
    pub assessment_identifier: String,
    /// Version of the assessment definition.
    pub version_string: Option<String>,
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended. `None` while in progress.
    pub ended_at: Option<DateTime<Utc>>,
    /// Step results in the order the steps were taken.
    pub step_history: Vec<StepResult>,
}

/// A single step's contribution to a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Identifier of the step that produced this record.
    pub identifier: String,
    /// Canonical type tag of the step.
    pub step_type: String,
    /// When the step was shown.
    pub started_at: DateTime<Utc>,
    /// When the step was dismissed. `None` while in progress.
    pub ended_at: Option<DateTime<Utc>>,
    /// Answers recorded on the step, one per answered input field.
    pub answers: Vec<FieldAnswer>,
}

/// One input field's recorded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnswer {
    pub field_identifier: String,
    pub string_value: String,
    pub int_value: i64,
}

impl Assessment {
    /// Create a fresh, empty result for a run of this assessment.
    ///
    /// The run records under `resultIdentifier` when the document set one,
    /// otherwise under the assessment identifier. Each call is independent
    /// and carries its own run id and start timestamp.
    pub fn create_result(&self) -> AssessmentResult {
        AssessmentResult {
            identifier: self
                .result_identifier
                .clone()
                .unwrap_or_else(|| self.identifier.clone()),
            assessment_identifier: self.identifier.clone(),
            version_string: self.version_string.clone(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            ended_at: None,
            step_history: Vec::new(),
        }
    }
}

impl Step {
    /// Create a fresh result record for taking this step.
    pub fn create_result(&self) -> StepResult {
        let step_type = match self {
            Step::Instruction(_) => TAG_INSTRUCTION,
            Step::Form(_) => TAG_FORM,
        };
        StepResult {
            identifier: self.identifier().to_string(),
            step_type: step_type.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            answers: Vec::new(),
        }
    }
}

impl AssessmentResult {
    /// Mark the run as ended now.
    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    /// Save the result as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize result")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result to {}", path.display()))?;
        Ok(())
    }

    /// Load a result from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result from {}", path.display()))?;
        let result: AssessmentResult =
            serde_json::from_str(&content).context("failed to parse result JSON")?;
        Ok(result)
    }
}

impl StepResult {
    /// Mark the step as dismissed now.
    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }
}

impl FieldAnswer {
    /// Record `choice` as the answer to `field_identifier`.
    pub fn for_choice(field_identifier: &str, choice: &Choice) -> Self {
        Self {
            field_identifier: field_identifier.to_string(),
            string_value: choice.string_value.clone(),
            int_value: choice.int_value,
        }
    }
}
