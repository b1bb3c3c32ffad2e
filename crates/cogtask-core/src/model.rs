//! Core data model types for cogtask.
//!
//! These are the serializable types that represent a decoded assessment
//! document: the root container, its ordered steps, and the input fields of
//! form steps. Wire names follow the document format's camelCase keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::traits::{Node, ResourceContext};

/// Preferred device orientation while an assessment is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation: {other}")),
        }
    }
}

/// One selectable answer option of an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Display key, unique within the owning field.
    pub string_value: String,
    /// Scored value recorded when this choice is selected.
    pub int_value: i64,
}

/// Reference to an image resource, resolved against a bundle at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    /// Resource name, relative to the bundle that defines the node.
    pub image_name: String,
    /// Whether resolution must fail if the resource cannot be retrieved.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Context this reference was bound to by the resolution pass.
    ///
    /// `None` until resolved, and left `None` when an optional image turns
    /// out not to be retrievable.
    #[serde(skip)]
    pub context: Option<ResourceContext>,
}

impl ImageInfo {
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            required: false,
            context: None,
        }
    }

    /// Returns `true` once the resolution pass has bound this reference.
    pub fn is_bound(&self) -> bool {
        self.context.is_some()
    }
}

/// A choice-based input field of a form step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    /// Unique identifier within the owning form step.
    pub identifier: String,
    /// Selectable answer options, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Ambient context attached by the resolution pass.
    #[serde(skip)]
    pub context: Option<ResourceContext>,
}

impl Node for InputField {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn resolved_context(&self) -> Option<&ResourceContext> {
        self.context.as_ref()
    }
}

/// A single instruction screen. Carries display content but no children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionStep {
    /// Unique identifier within the assessment.
    pub identifier: String,
    /// Show this screen only when the participant asks for full instructions.
    #[serde(default, skip_serializing_if = "is_false")]
    pub full_instructions_only: bool,
    /// Short display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Illustration shown with the instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
    /// Bundle that defines this step, when it differs from the ambient one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_identifier: Option<String>,
    /// Effective context attached by the resolution pass.
    #[serde(skip)]
    pub context: Option<ResourceContext>,
}

impl Node for InstructionStep {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    fn resolved_context(&self) -> Option<&ResourceContext> {
        self.context.as_ref()
    }
}

/// A form step presenting an ordered list of input fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStep {
    /// Unique identifier within the assessment.
    pub identifier: String,
    /// Whether this form is a practice trial (answers are not scored).
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_practice: bool,
    /// Input fields, in display order. Missing in the document means none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_fields: Vec<InputField>,
    /// Display name of the sequence this form belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_name: Option<String>,
    /// Short display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Illustration shown with the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
    /// Bundle that defines this step, when it differs from the ambient one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_identifier: Option<String>,
    /// Effective context attached by the resolution pass.
    #[serde(skip)]
    pub context: Option<ResourceContext>,
}

impl Node for FormStep {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    fn resolved_context(&self) -> Option<&ResourceContext> {
        self.context.as_ref()
    }
}

/// A step of an assessment: the closed set of node variants.
///
/// Decoding goes through the step registry (see [`crate::decode`]) so that
/// alias tags can map onto these variants; serialization always emits the
/// canonical tag (`instruction` or `form`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    Instruction(InstructionStep),
    Form(FormStep),
}

impl Node for Step {
    fn identifier(&self) -> &str {
        match self {
            Step::Instruction(step) => step.identifier(),
            Step::Form(step) => step.identifier(),
        }
    }

    fn title(&self) -> Option<&str> {
        match self {
            Step::Instruction(step) => step.title(),
            Step::Form(step) => step.title(),
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            Step::Instruction(step) => step.detail(),
            Step::Form(step) => step.detail(),
        }
    }

    fn resolved_context(&self) -> Option<&ResourceContext> {
        match self {
            Step::Instruction(step) => step.resolved_context(),
            Step::Form(step) => step.resolved_context(),
        }
    }
}

impl Step {
    /// The image reference declared on this step, if any.
    pub fn image(&self) -> Option<&ImageInfo> {
        match self {
            Step::Instruction(step) => step.image.as_ref(),
            Step::Form(step) => step.image.as_ref(),
        }
    }
}

/// The root container: a complete assessment definition.
///
/// `steps` order is presentation order and is preserved by every copy and
/// by the resolution pass. The sequence-label arrays, when present, run
/// parallel to `steps`; a `None` entry means "no label for that step".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Unique identifier of this assessment.
    pub identifier: String,
    /// Top-level steps, in presentation order.
    pub steps: Vec<Step>,
    /// Per-step sequence-number labels, parallel to `steps`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_numbers: Option<Vec<Option<String>>>,
    /// Preferred device orientation. Defaults to portrait.
    #[serde(skip_serializing_if = "is_default_orientation")]
    pub task_orientation: Orientation,
    /// Per-step sequence-letter labels, parallel to `steps`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_letters: Option<Vec<Option<String>>>,
    /// Version of the assessment definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_string: Option<String>,
    /// Advisory estimated duration in minutes. Not load-bearing.
    #[serde(skip_serializing_if = "is_zero")]
    pub estimated_minutes: u32,
    /// Externally supplied identifier for result records, when it differs
    /// from the assessment identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_identifier: Option<String>,
    /// Icon or cover image for the assessment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
    /// Bundle that defines this assessment, overriding the base context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_identifier: Option<String>,
    /// Effective context attached by the resolution pass.
    #[serde(skip)]
    pub context: Option<ResourceContext>,
}

impl Node for Assessment {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn resolved_context(&self) -> Option<&ResourceContext> {
        self.context.as_ref()
    }
}

impl Assessment {
    /// Identifiers of the top-level steps, in presentation order.
    pub fn step_identifiers(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.identifier()).collect()
    }

    /// The sequence-number label for the step at `index`, if one is set.
    pub fn sequence_number(&self, index: usize) -> Option<&str> {
        label_at(self.sequence_numbers.as_ref(), index)
    }

    /// The sequence-letter label for the step at `index`, if one is set.
    pub fn sequence_letter(&self, index: usize) -> Option<&str> {
        label_at(self.sequence_letters.as_ref(), index)
    }
}

fn label_at(labels: Option<&Vec<Option<String>>>, index: usize) -> Option<&str> {
    labels?.get(index)?.as_deref()
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_default_orientation(value: &Orientation) -> bool {
    *value == Orientation::Portrait
}
