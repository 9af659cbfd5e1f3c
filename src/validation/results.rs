//! Validation of annotation and prediction results against a config.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use super::{IssueCode, IssueContext, ValidationIssue, ValidationReport};
use crate::config::LabelInterface;
use crate::region::Direction;

const RELATION_TYPE: &str = "relation";

/// A result entry, read leniently so that every problem can be reported as
/// an issue instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
struct ResultEntry {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "type", default)]
    result_type: Option<String>,
    #[serde(default)]
    from_name: Option<String>,
    #[serde(default)]
    to_name: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    from_id: Option<Value>,
    #[serde(default)]
    to_id: Option<Value>,
    #[serde(default)]
    direction: Option<String>,
}

impl ResultEntry {
    fn is_relation(&self) -> bool {
        self.result_type.as_deref() == Some(RELATION_TYPE)
    }
}

/// Region ids may be strings or numbers in the wild.
fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_entry(entry: &Value, context: &IssueContext) -> Result<ResultEntry, ValidationIssue> {
    ResultEntry::deserialize(entry).map_err(|err| {
        ValidationIssue::error(
            IssueCode::MalformedResult,
            format!("result entry is malformed: {}", err),
            context.clone(),
        )
    })
}

impl LabelInterface {
    /// Returns true when `region` is a valid result for this config.
    pub fn validate_region(&self, region: &Value) -> bool {
        self.check_region(region).is_ok()
    }

    /// Checks a single region, explaining the first problem found.
    pub fn check_region(&self, region: &Value) -> Result<(), ValidationIssue> {
        self.check_region_at(0, region)
    }

    fn check_region_at(&self, index: usize, region: &Value) -> Result<(), ValidationIssue> {
        let entry = parse_entry(
            region,
            &IssueContext::Result {
                index,
                from_name: None,
            },
        )?;
        let context = IssueContext::Result {
            index,
            from_name: entry.from_name.clone(),
        };
        let fail = |code: IssueCode, message: String| {
            Err(ValidationIssue::error(code, message, context.clone()))
        };

        let Some(from_name) = entry.from_name.as_deref() else {
            return fail(IssueCode::MalformedResult, "missing 'from_name'".to_string());
        };
        let Some(control) = self.controls().get(from_name) else {
            return fail(
                IssueCode::UnknownControl,
                format!("from_name '{}' is not a control in the config", from_name),
            );
        };

        let Some(to_name) = entry.to_name.as_deref() else {
            return fail(IssueCode::MalformedResult, "missing 'to_name'".to_string());
        };
        if !self.objects().contains(to_name) {
            return fail(
                IssueCode::UnknownObject,
                format!("to_name '{}' is not an object in the config", to_name),
            );
        }

        let Some(result_type) = entry.result_type.as_deref() else {
            return fail(IssueCode::MalformedResult, "missing 'type'".to_string());
        };
        if !result_type.eq_ignore_ascii_case(&control.kind) {
            return fail(
                IssueCode::TypeMismatch,
                format!(
                    "type '{}' does not match control '{}' ({})",
                    result_type, control.name, control.kind
                ),
            );
        }

        if !control.to_name.iter().any(|t| t == to_name) {
            return fail(
                IssueCode::UnexpectedToName,
                format!(
                    "control '{}' does not target '{}' (toName: {})",
                    control.name,
                    to_name,
                    control.to_name.join(", ")
                ),
            );
        }

        let Some(value) = entry.value.as_ref() else {
            return fail(IssueCode::MalformedResult, "missing 'value'".to_string());
        };
        if let Err(err) = control.check_value(value) {
            return fail(
                IssueCode::InvalidValue,
                format!("Invalid value for control '{}': {}", control.name, err),
            );
        }

        Ok(())
    }

    /// Returns true when `relation` is well-formed and links two of `ids`.
    pub fn validate_relation(&self, relation: &Value, ids: &HashSet<String>) -> bool {
        self.check_relation_at(0, relation, ids).is_ok()
    }

    fn check_relation_at(
        &self,
        index: usize,
        relation: &Value,
        ids: &HashSet<String>,
    ) -> Result<(), ValidationIssue> {
        let context = IssueContext::Relation { index };
        let entry = parse_entry(relation, &context)?;
        let fail = |code: IssueCode, message: String| {
            Err(ValidationIssue::error(code, message, context.clone()))
        };

        if !entry.is_relation() {
            return fail(
                IssueCode::MalformedResult,
                format!("type must be '{}'", RELATION_TYPE),
            );
        }

        let Some(direction) = entry.direction.as_deref() else {
            return fail(IssueCode::InvalidDirection, "missing 'direction'".to_string());
        };
        if let Err(message) = direction.parse::<Direction>() {
            return fail(IssueCode::InvalidDirection, message);
        }

        for (field, id) in [("from_id", &entry.from_id), ("to_id", &entry.to_id)] {
            let Some(id) = id.as_ref().and_then(id_string) else {
                return fail(IssueCode::MalformedResult, format!("missing '{}'", field));
            };
            if !ids.contains(&id) {
                return fail(
                    IssueCode::UnknownRegionRef,
                    format!("{} '{}' does not reference a valid region", field, id),
                );
            }
        }

        Ok(())
    }

    /// Returns true when every entry of an annotation is valid.
    pub fn validate_annotation(&self, annotation: &Value) -> bool {
        self.check_annotation(annotation).is_ok()
    }

    /// Returns true when every entry of a prediction is valid.
    pub fn validate_prediction(&self, prediction: &Value) -> bool {
        self.check_prediction(prediction).is_ok()
    }

    /// Checks every entry of an annotation (`{"result": [...]}` or a bare
    /// result list).
    pub fn check_annotation(&self, annotation: &Value) -> ValidationReport {
        self.check_results(annotation)
    }

    /// Checks every entry of a prediction. Same rules as
    /// [`check_annotation`](Self::check_annotation); `score` and
    /// `model_version` are not inspected.
    pub fn check_prediction(&self, prediction: &Value) -> ValidationReport {
        self.check_results(prediction)
    }

    fn check_results(&self, payload: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();
        let entries = match payload {
            Value::Array(entries) => entries,
            Value::Object(map) => match map.get("result") {
                Some(Value::Array(entries)) => entries,
                _ => {
                    report.add(ValidationIssue::error(
                        IssueCode::MalformedResult,
                        "payload has no 'result' list",
                        IssueContext::Config,
                    ));
                    return report;
                }
            },
            _ => {
                report.add(ValidationIssue::error(
                    IssueCode::MalformedResult,
                    "payload must be an object with 'result' or a list of results",
                    IssueContext::Config,
                ));
                return report;
            }
        };

        // Regions first, so relations can only point at regions that passed.
        let mut valid_ids = HashSet::new();
        let mut relations = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.get("type").and_then(Value::as_str) == Some(RELATION_TYPE) {
                relations.push((index, entry));
                continue;
            }
            match self.check_region_at(index, entry) {
                Ok(()) => {
                    if let Some(id) = entry.get("id").and_then(id_string) {
                        valid_ids.insert(id);
                    }
                }
                Err(issue) => report.add(issue),
            }
        }

        for (index, relation) in relations {
            if let Err(issue) = self.check_relation_at(index, relation, &valid_ids) {
                report.add(issue);
            }
        }

        tracing::debug!(
            "checked {} result entries: {} error(s)",
            entries.len(),
            report.error_count()
        );
        report
    }
}
