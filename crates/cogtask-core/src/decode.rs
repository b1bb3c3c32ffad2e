//! Tagged assessment-document decoder.
//!
//! Decodes serialized assessment trees (tagged JSON) into the model types,
//! dispatching on each object's `type` tag through an explicit registry of
//! step constructors. Also provides the inverse encoding and an advisory
//! validation pass.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::model::{Assessment, FormStep, ImageInfo, InstructionStep, Orientation, Step};
use crate::traits::Node;

/// Canonical type tag of the root container.
pub const TAG_ASSESSMENT: &str = "assessment";
/// Canonical type tag of instruction steps.
pub const TAG_INSTRUCTION: &str = "instruction";
/// Canonical type tag of form steps.
pub const TAG_FORM: &str = "form";

/// How the decoder treats steps whose type tag has no registered constructor.
///
/// Malformed fields abort decoding under either policy; the policy only
/// governs unknown tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Abort the whole document on the first unknown step tag.
    #[default]
    Strict,
    /// Skip unknown steps (and their sequence labels) with a warning.
    Lenient,
}

/// Constructs a step from its raw document object.
pub type StepConstructor = fn(Value) -> Result<Step, DecodeError>;

/// Registry mapping document type tags to node constructors.
///
/// Seeded with the canonical tags; additional tags can be registered as
/// aliases onto the existing constructors, matching documents authored with
/// per-assessment serial names (e.g. `mfsOverview` for an instruction step).
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: HashMap<String, StepConstructor>,
    assessment_tags: HashSet<String>,
}

impl Default for StepRegistry {
    fn default() -> Self {
        let mut registry = Self {
            steps: HashMap::new(),
            assessment_tags: HashSet::new(),
        };
        registry.register_step(TAG_INSTRUCTION, instruction_from_value);
        registry.register_step(TAG_FORM, form_from_value);
        registry.register_assessment_tag(TAG_ASSESSMENT);
        registry
    }
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for a step tag.
    pub fn register_step(&mut self, tag: &str, constructor: StepConstructor) {
        self.steps.insert(tag.to_string(), constructor);
    }

    /// Register `alias` to decode exactly like an already-registered tag.
    ///
    /// Returns `false` without registering anything when `canonical` is not
    /// known to the registry.
    pub fn register_alias(&mut self, alias: &str, canonical: &str) -> bool {
        match self.steps.get(canonical).copied() {
            Some(constructor) => {
                self.steps.insert(alias.to_string(), constructor);
                true
            }
            None => false,
        }
    }

    /// Accept `tag` as a root-container tag in addition to the canonical one.
    pub fn register_assessment_tag(&mut self, tag: &str) {
        self.assessment_tags.insert(tag.to_string());
    }

    /// The constructor registered for a step tag, if any.
    pub fn step_constructor(&self, tag: &str) -> Option<StepConstructor> {
        self.steps.get(tag).copied()
    }

    /// Whether `tag` names the root container.
    pub fn is_assessment_tag(&self, tag: &str) -> bool {
        self.assessment_tags.contains(tag)
    }
}

/// Intermediate structure for the root object, before step dispatch.
///
/// Steps stay raw here; each one is decoded through the registry so alias
/// tags and the unknown-tag policy apply per step.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    identifier: Option<String>,
    #[serde(default)]
    steps: Vec<Value>,
    #[serde(default)]
    sequence_numbers: Option<Vec<Option<String>>>,
    #[serde(default)]
    task_orientation: Orientation,
    #[serde(default)]
    sequence_letters: Option<Vec<Option<String>>>,
    #[serde(default)]
    version_string: Option<String>,
    #[serde(default)]
    estimated_minutes: u32,
    #[serde(default)]
    result_identifier: Option<String>,
    #[serde(default)]
    image: Option<ImageInfo>,
    #[serde(default)]
    bundle_identifier: Option<String>,
}

/// Decode an assessment document from a JSON string with the canonical
/// registry and the strict policy.
pub fn decode_str(json: &str) -> Result<Assessment, DecodeError> {
    decode_str_with(json, &StepRegistry::default(), DecodePolicy::Strict)
}

/// Decode an assessment document from a JSON string.
pub fn decode_str_with(
    json: &str,
    registry: &StepRegistry,
    policy: DecodePolicy,
) -> Result<Assessment, DecodeError> {
    let value: Value = serde_json::from_str(json)?;
    decode_value_with(value, registry, policy)
}

/// Decode an assessment document from an already-parsed JSON value with the
/// canonical registry and the strict policy.
pub fn decode_value(value: Value) -> Result<Assessment, DecodeError> {
    decode_value_with(value, &StepRegistry::default(), DecodePolicy::Strict)
}

/// Decode an assessment document from an already-parsed JSON value.
pub fn decode_value_with(
    value: Value,
    registry: &StepRegistry,
    policy: DecodePolicy,
) -> Result<Assessment, DecodeError> {
    let root_id = raw_identifier(&value).unwrap_or_default();

    let Some(tag) = raw_type_tag(&value) else {
        return Err(missing_field("type", &root_id, "missing type tag on root object"));
    };
    if !registry.is_assessment_tag(&tag) {
        return Err(DecodeError::UnknownNodeType(tag));
    }

    let raw: RawAssessment =
        serde_json::from_value(value).map_err(|e| malformed(&root_id, e))?;

    let identifier = match raw.identifier {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            return Err(missing_field(
                "identifier",
                &root_id,
                "assessment identifier must be present and non-empty",
            ))
        }
    };

    // Label arrays run parallel to the authored step list; check the length
    // against the document before any lenient skipping can shorten it.
    let declared = raw.steps.len();
    check_labels("sequenceNumbers", raw.sequence_numbers.as_ref(), declared, &identifier)?;
    check_labels("sequenceLetters", raw.sequence_letters.as_ref(), declared, &identifier)?;

    let mut steps = Vec::with_capacity(declared);
    let mut kept = Vec::with_capacity(declared);
    for (index, step_value) in raw.steps.into_iter().enumerate() {
        let step_id =
            raw_identifier(&step_value).unwrap_or_else(|| format!("steps[{index}]"));
        let Some(step_tag) = raw_type_tag(&step_value) else {
            return Err(missing_field("type", &step_id, "missing type tag on step"));
        };
        match registry.step_constructor(&step_tag) {
            Some(construct) => {
                steps.push(construct(step_value)?);
                kept.push(index);
            }
            None => match policy {
                DecodePolicy::Strict => return Err(DecodeError::UnknownNodeType(step_tag)),
                DecodePolicy::Lenient => {
                    tracing::warn!(
                        "skipping step `{step_id}` with unknown type `{step_tag}`"
                    );
                }
            },
        }
    }

    let mut seen = HashSet::new();
    for step in &steps {
        if !seen.insert(step.identifier().to_string()) {
            return Err(DecodeError::MalformedDocument {
                field: "identifier".into(),
                node_id: step.identifier().into(),
                message: "duplicate step identifier within the assessment".into(),
            });
        }
    }

    // When lenient decoding dropped a step, drop its labels with it so the
    // arrays stay parallel to the steps that survived.
    let sequence_numbers = prune_labels(raw.sequence_numbers, &kept, declared);
    let sequence_letters = prune_labels(raw.sequence_letters, &kept, declared);

    Ok(Assessment {
        identifier,
        steps,
        sequence_numbers,
        task_orientation: raw.task_orientation,
        sequence_letters,
        version_string: raw.version_string,
        estimated_minutes: raw.estimated_minutes,
        result_identifier: raw.result_identifier,
        image: raw.image,
        bundle_identifier: raw.bundle_identifier,
        context: None,
    })
}

/// Canonical constructor for instruction steps.
pub fn instruction_from_value(value: Value) -> Result<Step, DecodeError> {
    let node_id = raw_identifier(&value).unwrap_or_default();
    let step: InstructionStep =
        serde_json::from_value(value).map_err(|e| malformed(&node_id, e))?;
    require_identifier(&step.identifier, "step identifier must be non-empty")?;
    Ok(Step::Instruction(step))
}

/// Canonical constructor for form steps.
pub fn form_from_value(value: Value) -> Result<Step, DecodeError> {
    let node_id = raw_identifier(&value).unwrap_or_default();
    let step: FormStep = serde_json::from_value(value).map_err(|e| malformed(&node_id, e))?;
    require_identifier(&step.identifier, "step identifier must be non-empty")?;

    let mut seen_fields = HashSet::new();
    for field in &step.input_fields {
        if field.identifier.trim().is_empty() {
            return Err(missing_field(
                "identifier",
                &step.identifier,
                "input field identifier must be non-empty",
            ));
        }
        if !seen_fields.insert(field.identifier.as_str()) {
            return Err(DecodeError::MalformedDocument {
                field: "identifier".into(),
                node_id: field.identifier.clone(),
                message: format!(
                    "duplicate input field identifier within form `{}`",
                    step.identifier
                ),
            });
        }
        let mut seen_choices = HashSet::new();
        for choice in &field.choices {
            if !seen_choices.insert(choice.string_value.as_str()) {
                return Err(DecodeError::MalformedDocument {
                    field: "choices".into(),
                    node_id: field.identifier.clone(),
                    message: format!("duplicate choice key `{}`", choice.string_value),
                });
            }
        }
    }

    Ok(Step::Form(step))
}

/// Encode an assessment back into its document form.
///
/// Emits canonical type tags and omits fields that hold their documented
/// defaults, so documents authored in that style round-trip structurally.
pub fn encode_value(assessment: &Assessment) -> Result<Value, DecodeError> {
    let mut value = serde_json::to_value(assessment)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("type".into(), Value::String(TAG_ASSESSMENT.into()));
    }
    Ok(value)
}

/// Encode an assessment as pretty-printed JSON.
pub fn encode_str(assessment: &Assessment) -> Result<String, DecodeError> {
    let value = encode_value(assessment)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Load and decode a single assessment document from a `.json` file.
pub fn load_assessment(path: &Path) -> Result<Assessment> {
    load_assessment_with(path, &StepRegistry::default(), DecodePolicy::Strict)
}

/// Load and decode a single assessment document with an explicit registry
/// and policy.
pub fn load_assessment_with(
    path: &Path,
    registry: &StepRegistry,
    policy: DecodePolicy,
) -> Result<Assessment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assessment file: {}", path.display()))?;

    let assessment = decode_str_with(&content, registry, policy)
        .with_context(|| format!("failed to decode assessment: {}", path.display()))?;

    Ok(assessment)
}

/// Recursively load all `.json` assessment documents from a directory.
///
/// Files that fail to decode are skipped with a warning rather than
/// aborting the whole directory.
pub fn load_assessment_directory(dir: &Path) -> Result<Vec<Assessment>> {
    let mut assessments = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            assessments.extend(load_assessment_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match load_assessment(&path) {
                Ok(assessment) => assessments.push(assessment),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(assessments)
}

/// A warning from assessment validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The node identifier (if applicable).
    pub node_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a decoded assessment for issues that are suspicious but not
/// malformed.
pub fn validate_assessment(assessment: &Assessment) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if assessment.steps.is_empty() {
        warnings.push(ValidationWarning {
            node_id: Some(assessment.identifier.clone()),
            message: "assessment has no steps".into(),
        });
    }

    // Forms with no fields present nothing to answer
    for step in &assessment.steps {
        if let Step::Form(form) = step {
            if form.input_fields.is_empty() {
                warnings.push(ValidationWarning {
                    node_id: Some(form.identifier.clone()),
                    message: "form step has no input fields".into(),
                });
            }
        }
    }

    if assessment.estimated_minutes == 0 {
        warnings.push(ValidationWarning {
            node_id: Some(assessment.identifier.clone()),
            message: "no estimated duration set".into(),
        });
    }

    // A label array that is entirely null carries no information
    for (field, labels) in [
        ("sequenceNumbers", assessment.sequence_numbers.as_ref()),
        ("sequenceLetters", assessment.sequence_letters.as_ref()),
    ] {
        if let Some(labels) = labels {
            if !labels.is_empty() && labels.iter().all(Option::is_none) {
                warnings.push(ValidationWarning {
                    node_id: Some(assessment.identifier.clone()),
                    message: format!("{field} is present but every entry is null"),
                });
            }
        }
    }

    warnings
}

fn raw_type_tag(value: &Value) -> Option<String> {
    value.get("type").and_then(Value::as_str).map(str::to_string)
}

fn raw_identifier(value: &Value) -> Option<String> {
    value
        .get("identifier")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn require_identifier(identifier: &str, message: &str) -> Result<(), DecodeError> {
    if identifier.trim().is_empty() {
        return Err(missing_field("identifier", identifier, message));
    }
    Ok(())
}

fn missing_field(field: &str, node_id: &str, message: &str) -> DecodeError {
    DecodeError::MalformedDocument {
        field: field.into(),
        node_id: node_id.into(),
        message: message.into(),
    }
}

/// Build a `MalformedDocument` from a serde error, extracting the field name
/// from the message where the error format allows it.
fn malformed(node_id: &str, err: serde_json::Error) -> DecodeError {
    let message = err.to_string();
    let field = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
        .unwrap_or("document")
        .to_string();
    DecodeError::MalformedDocument {
        field,
        node_id: node_id.into(),
        message,
    }
}

fn check_labels(
    field: &str,
    labels: Option<&Vec<Option<String>>>,
    step_count: usize,
    node_id: &str,
) -> Result<(), DecodeError> {
    if let Some(labels) = labels {
        if labels.len() != step_count {
            return Err(DecodeError::MalformedDocument {
                field: field.into(),
                node_id: node_id.into(),
                message: format!("{} labels for {} steps", labels.len(), step_count),
            });
        }
    }
    Ok(())
}

fn prune_labels(
    labels: Option<Vec<Option<String>>>,
    kept: &[usize],
    declared: usize,
) -> Option<Vec<Option<String>>> {
    let labels = labels?;
    if kept.len() == declared {
        return Some(labels);
    }
    Some(kept.iter().map(|&index| labels[index].clone()).collect())
}
