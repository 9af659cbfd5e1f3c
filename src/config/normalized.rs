//! The normalized schema dict consumed by export converters.
//!
//! Shape: `{controlName: {type, to_name, inputs, labels, labels_attrs,
//! conditionals?}}`. Converters (COCO, YOLO, VOC...) treat this as their only
//! view of the labeling config, so field names are part of the contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::LabelInterface;
use crate::error::LabelConfigError;
use crate::tags::{Conditionals, ControlTag};

/// One object input of a control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub kind: String,
    /// Task data key (or literal) without the leading `$`.
    pub value: String,
    #[serde(rename = "valueType", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

/// Normalized description of one control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub to_name: Vec<String>,
    pub inputs: Vec<InputSchema>,
    pub labels: Vec<String>,
    pub labels_attrs: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditionals: Option<Conditionals>,
}

/// Control name → normalized description.
pub type NormalizedSchema = BTreeMap<String, ControlSchema>;

impl LabelInterface {
    /// Builds the normalized schema dict.
    pub fn parsed_config(&self) -> NormalizedSchema {
        self.controls()
            .iter()
            .map(|control| (control.name.clone(), self.control_schema(control)))
            .collect()
    }

    fn control_schema(&self, control: &ControlTag) -> ControlSchema {
        let inputs = self
            .control_objects(control)
            .into_iter()
            .map(|object| InputSchema {
                kind: object.kind.clone(),
                value: object.value_key().to_string(),
                value_type: object.value_type.clone(),
            })
            .collect();

        ControlSchema {
            kind: control.kind.clone(),
            to_name: control.to_name.clone(),
            inputs,
            labels: control.labels.clone(),
            labels_attrs: control.labels_attrs.clone(),
            conditionals: control.conditionals.clone(),
        }
    }
}

/// Parses a config straight into the normalized schema dict.
///
/// Kept for callers that only ever needed the dict and never held a
/// [`LabelInterface`].
pub fn parse_config(config: &str) -> Result<NormalizedSchema, LabelConfigError> {
    Ok(LabelInterface::parse(config)?.parsed_config())
}
