//! Tag grammar checks.
//!
//! The config is converted to a badgerfish-style JSON value (`@attr` keys,
//! child element kinds as keys, repeated children as arrays, text under `$`)
//! and walked against a fixed rule table.

use roxmltree::{Document, Node};
use serde_json::{Map, Value};

use super::{IssueCode, IssueContext, ValidationIssue, ValidationReport};
use crate::error::LabelConfigError;
use crate::tags::{ControlKind, ObjectKind, LABEL_LEAF_KINDS};

const CHOICE_MODES: &[&str] = &["single", "single-radio", "multiple"];

/// Attributes that only accept `true` / `false`, on any element.
const BOOL_ATTRS: &[&str] = &[
    "perRegion",
    "required",
    "allowNested",
    "showInline",
    "smart",
    "smartOnly",
    "zoom",
    "zoomControl",
    "brightnessControl",
    "contrastControl",
    "rotateControl",
    "editable",
    "transcription",
    "skipDuplicates",
    "showSubmitButton",
    "leafsOnly",
    "selected",
];

struct EnumRule {
    kind: &'static str,
    attr: &'static str,
    allowed: &'static [&'static str],
}

const ENUM_RULES: &[EnumRule] = &[
    EnumRule {
        kind: "Choices",
        attr: "choice",
        allowed: CHOICE_MODES,
    },
    EnumRule {
        kind: "Choices",
        attr: "layout",
        allowed: &["select", "inline", "vertical"],
    },
    EnumRule {
        kind: "Paragraphs",
        attr: "layout",
        allowed: &["none", "dialogue"],
    },
];

/// `kind: "*"` applies the rule to every element.
struct NumericRule {
    kind: &'static str,
    attr: &'static str,
    min: f64,
    max: f64,
    integer: bool,
}

const NUMERIC_RULES: &[NumericRule] = &[
    NumericRule {
        kind: "Rating",
        attr: "maxRating",
        min: 1.0,
        max: f64::INFINITY,
        integer: true,
    },
    NumericRule {
        kind: "Video",
        attr: "minPlaybackSpeed",
        min: 0.0,
        max: 10.0,
        integer: false,
    },
    NumericRule {
        kind: "Video",
        attr: "defaultPlaybackSpeed",
        min: 0.0,
        max: 10.0,
        integer: false,
    },
    NumericRule {
        kind: "Video",
        attr: "maxPlaybackSpeed",
        min: 0.0,
        max: 10.0,
        integer: false,
    },
    NumericRule {
        kind: "Number",
        attr: "min",
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
        integer: false,
    },
    NumericRule {
        kind: "Number",
        attr: "max",
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
        integer: false,
    },
    NumericRule {
        kind: "TextArea",
        attr: "maxSubmissions",
        min: 0.0,
        max: f64::INFINITY,
        integer: true,
    },
    NumericRule {
        kind: "TextArea",
        attr: "rows",
        min: 1.0,
        max: f64::INFINITY,
        integer: true,
    },
    NumericRule {
        kind: "*",
        attr: "maxUsages",
        min: 1.0,
        max: f64::INFINITY,
        integer: true,
    },
    NumericRule {
        kind: "*",
        attr: "opacity",
        min: 0.0,
        max: 1.0,
        integer: false,
    },
    NumericRule {
        kind: "*",
        attr: "strokeWidth",
        min: 0.0,
        max: f64::INFINITY,
        integer: false,
    },
];

/// Attribute chains that must be non-decreasing where present.
const ORDER_RULES: &[(&str, &[&str])] = &[
    ("Number", &["min", "max"]),
    (
        "Video",
        &["minPlaybackSpeed", "defaultPlaybackSpeed", "maxPlaybackSpeed"],
    ),
];

/// Converts a config into its badgerfish JSON form: `{"View": {...}}`.
pub fn config_to_json(config: &str) -> Result<Value, LabelConfigError> {
    let document = Document::parse(config)?;
    let root = document.root_element();
    let mut tree = Map::new();
    tree.insert(root.tag_name().name().to_string(), element_to_json(root));
    Ok(Value::Object(tree))
}

fn element_to_json(node: Node<'_, '_>) -> Value {
    let mut map = Map::new();
    for attr in node.attributes() {
        map.insert(
            format!("@{}", attr.name()),
            Value::String(attr.value().to_string()),
        );
    }

    let text: String = node
        .children()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !text.is_empty() {
        map.insert("$".to_string(), Value::String(text));
    }

    for child in node.children().filter(Node::is_element) {
        let key = child.tag_name().name();
        let value = element_to_json(child);
        match map.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.to_string(), value);
            }
        }
    }

    Value::Object(map)
}

/// Parses a config and checks it against the tag grammar.
pub fn check_config(config: &str) -> Result<ValidationReport, LabelConfigError> {
    Ok(check_tree(&config_to_json(config)?))
}

/// Fuzz-only entrypoint for the conversion and grammar walk.
#[cfg(feature = "fuzzing")]
pub fn fuzz_check_config(input: &str) -> Result<(), LabelConfigError> {
    let _ = check_config(input)?;
    Ok(())
}

/// Walks a badgerfish tree against the rule table.
pub fn check_tree(tree: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(root) = tree.as_object() else {
        report.add(ValidationIssue::error(
            IssueCode::RootNotView,
            "config has no root element",
            IssueContext::Config,
        ));
        return report;
    };

    for (kind, element) in root {
        if kind != "View" {
            report.add(ValidationIssue::error(
                IssueCode::RootNotView,
                format!("root element must be <View>, found <{}>", kind),
                IssueContext::Config,
            ));
        }
        walk(kind, element, &mut Vec::new(), &mut report);
    }

    report
}

fn walk(kind: &str, element: &Value, ancestors: &mut Vec<String>, report: &mut ValidationReport) {
    let Some(map) = element.as_object() else {
        return;
    };

    check_element(kind, map, ancestors, report);

    ancestors.push(kind.to_string());
    for (child_kind, child) in children(map) {
        match child {
            Value::Array(items) => {
                for item in items {
                    walk(child_kind, item, ancestors, report);
                }
            }
            other => walk(child_kind, other, ancestors, report),
        }
    }
    ancestors.pop();
}

fn children(map: &Map<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    map.iter()
        .filter(|(key, _)| !key.starts_with('@') && key.as_str() != "$")
}

fn attr<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    map.get(&format!("@{}", name)).and_then(Value::as_str)
}

fn context(kind: &str, map: &Map<String, Value>, ancestors: &[String]) -> IssueContext {
    let mut path = ancestors.join(" > ");
    if !path.is_empty() {
        path.push_str(" > ");
    }
    path.push_str(kind);
    IssueContext::Tag {
        kind: kind.to_string(),
        name: attr(map, "name").map(str::to_string),
        path,
    }
}

fn check_element(
    kind: &str,
    map: &Map<String, Value>,
    ancestors: &[String],
    report: &mut ValidationReport,
) {
    let ctx = || context(kind, map, ancestors);
    let lower = kind.to_ascii_lowercase();
    let control = ControlKind::from_tag_name(&lower);

    // Required attributes
    if let Some(control) = control {
        if control != ControlKind::Relations {
            require(map, &["name", "toName"], &ctx, report);
        }
    } else if ObjectKind::from_tag_name(&lower).is_some() {
        require(map, &["name"], &ctx, report);
        if attr(map, "value").is_none() && attr(map, "valueList").is_none() {
            report.add(ValidationIssue::error(
                IssueCode::MissingAttribute,
                "missing required attribute 'value' (or 'valueList')",
                ctx(),
            ));
        }
    }

    for key in ["name", "toName"] {
        if attr(map, key).is_some_and(|v| v.trim().is_empty()) {
            report.add(ValidationIssue::error(
                IssueCode::EmptyAttribute,
                format!("attribute '{}' must not be empty", key),
                ctx(),
            ));
        }
    }

    // Label leaves
    if LABEL_LEAF_KINDS.contains(&kind) {
        check_leaf_placement(kind, ancestors, &ctx, report);
        if attr(map, "value").is_none() && attr(map, "alias").is_none() {
            report.add(ValidationIssue::warning(
                IssueCode::MissingLabelValue,
                format!("<{}> has neither 'value' nor 'alias' and will be ignored", kind),
                ctx(),
            ));
        }
    }

    if let Some(control) = control {
        check_label_set(control, map, &ctx, report);
    }

    // Attribute values
    for key in BOOL_ATTRS {
        if let Some(value) = attr(map, key) {
            if value != "true" && value != "false" {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidBoolean,
                    format!("attribute '{}' must be 'true' or 'false', got '{}'", key, value),
                    ctx(),
                ));
            }
        }
    }

    for rule in ENUM_RULES.iter().filter(|r| r.kind == kind) {
        if let Some(value) = attr(map, rule.attr) {
            if !rule.allowed.contains(&value) {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidEnumValue,
                    format!(
                        "attribute '{}' must be one of {}, got '{}'",
                        rule.attr,
                        rule.allowed.join(", "),
                        value
                    ),
                    ctx(),
                ));
            }
        }
    }

    for rule in NUMERIC_RULES
        .iter()
        .filter(|r| r.kind == "*" || r.kind == kind)
    {
        if let Some(raw) = attr(map, rule.attr) {
            check_number(rule, raw, &ctx, report);
        }
    }

    for (_, chain) in ORDER_RULES.iter().filter(|(k, _)| *k == kind) {
        let present: Vec<(&str, f64)> = chain
            .iter()
            .filter_map(|key| {
                attr(map, key)
                    .and_then(|raw| raw.trim().parse::<f64>().ok())
                    .map(|n| (*key, n))
            })
            .collect();
        for pair in present.windows(2) {
            let ((lo_key, lo), (hi_key, hi)) = (pair[0], pair[1]);
            if lo > hi {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidRangeOrder,
                    format!("{} ({}) must not exceed {} ({})", lo_key, lo, hi_key, hi),
                    ctx(),
                ));
            }
        }
    }
}

fn require(
    map: &Map<String, Value>,
    keys: &[&str],
    ctx: &dyn Fn() -> IssueContext,
    report: &mut ValidationReport,
) {
    for key in keys {
        if attr(map, key).is_none() {
            report.add(ValidationIssue::error(
                IssueCode::MissingAttribute,
                format!("missing required attribute '{}'", key),
                ctx(),
            ));
        }
    }
}

fn check_leaf_placement(
    kind: &str,
    ancestors: &[String],
    ctx: &dyn Fn() -> IssueContext,
    report: &mut ValidationReport,
) {
    let (placed, expected) = match kind {
        "Choice" => (
            ancestors.iter().any(|a| a == "Choices" || a == "Taxonomy"),
            "<Choices> or <Taxonomy>",
        ),
        "Label" => (
            ancestors
                .iter()
                .any(|a| a.to_ascii_lowercase().ends_with("labels")),
            "a *Labels control",
        ),
        "Relation" => (ancestors.iter().any(|a| a == "Relations"), "<Relations>"),
        _ => return,
    };

    if !placed {
        report.add(ValidationIssue::error(
            IssueCode::MisplacedLeaf,
            format!("<{}> must be nested inside {}", kind, expected),
            ctx(),
        ));
    }
}

fn check_label_set(
    control: ControlKind,
    map: &Map<String, Value>,
    ctx: &dyn Fn() -> IssueContext,
    report: &mut ValidationReport,
) {
    let leaf = match control {
        ControlKind::Choices | ControlKind::Taxonomy => "Choice",
        ControlKind::Relations => "Relation",
        other if other.label_attr().is_some() => "Label",
        _ => return,
    };

    let dynamic =
        attr(map, "value").is_some_and(|v| v.starts_with('$')) || attr(map, "apiUrl").is_some();
    if dynamic || count_descendants(map, leaf) > 0 {
        return;
    }

    if control == ControlKind::Choices {
        report.add(ValidationIssue::error(
            IssueCode::EmptyChoices,
            "<Choices> must contain at least one <Choice> unless its options are dynamic",
            ctx(),
        ));
    } else {
        report.add(ValidationIssue::warning(
            IssueCode::NoLabels,
            format!("control declares no <{}> entries", leaf),
            ctx(),
        ));
    }
}

fn count_descendants(map: &Map<String, Value>, kind: &str) -> usize {
    children(map)
        .map(|(child_kind, child)| {
            let items: &[Value] = match child {
                Value::Array(items) => items,
                single => std::slice::from_ref(single),
            };
            let own = if child_kind == kind { items.len() } else { 0 };
            own + items
                .iter()
                .filter_map(Value::as_object)
                .map(|item| count_descendants(item, kind))
                .sum::<usize>()
        })
        .sum()
}

fn check_number(
    rule: &NumericRule,
    raw: &str,
    ctx: &dyn Fn() -> IssueContext,
    report: &mut ValidationReport,
) {
    let Ok(number) = raw.trim().parse::<f64>() else {
        report.add(ValidationIssue::error(
            IssueCode::InvalidNumber,
            format!("attribute '{}' must be a number, got '{}'", rule.attr, raw),
            ctx(),
        ));
        return;
    };

    if !number.is_finite() || (rule.integer && number.fract() != 0.0) {
        let expected = if rule.integer { "an integer" } else { "a finite number" };
        report.add(ValidationIssue::error(
            IssueCode::InvalidNumber,
            format!("attribute '{}' must be {}, got '{}'", rule.attr, expected, raw),
            ctx(),
        ));
        return;
    }

    if number < rule.min || number > rule.max {
        report.add(ValidationIssue::error(
            IssueCode::OutOfRange,
            format!(
                "attribute '{}' = {} is out of range [{}, {}]",
                rule.attr, number, rule.min, rule.max
            ),
            ctx(),
        ));
    }
}
