//! Control tags: the elements that produce annotation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{value, Tag, ValueError};
use crate::region::Region;

/// Built-in control tag variants.
///
/// Unregistered element names map to [`ControlKind::Generic`], which has no
/// value shape and accepts any result object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Choices,
    Labels,
    Rectangle,
    RectangleLabels,
    Polygon,
    PolygonLabels,
    Ellipse,
    EllipseLabels,
    KeyPoint,
    KeyPointLabels,
    Brush,
    BrushLabels,
    VideoRectangle,
    Number,
    DateTime,
    HyperTextLabels,
    Pairwise,
    ParagraphLabels,
    Ranker,
    Rating,
    Relations,
    Taxonomy,
    TextArea,
    TimeSeriesLabels,
    Generic,
}

impl ControlKind {
    /// Looks up a built-in variant by lower-cased element name.
    pub fn from_tag_name(lower: &str) -> Option<Self> {
        let kind = match lower {
            "choices" => ControlKind::Choices,
            "labels" => ControlKind::Labels,
            "rectangle" => ControlKind::Rectangle,
            "rectanglelabels" => ControlKind::RectangleLabels,
            "polygon" => ControlKind::Polygon,
            "polygonlabels" => ControlKind::PolygonLabels,
            "ellipse" => ControlKind::Ellipse,
            "ellipselabels" => ControlKind::EllipseLabels,
            "keypoint" => ControlKind::KeyPoint,
            "keypointlabels" => ControlKind::KeyPointLabels,
            "brush" => ControlKind::Brush,
            "brushlabels" => ControlKind::BrushLabels,
            "videorectangle" => ControlKind::VideoRectangle,
            "number" => ControlKind::Number,
            "datetime" => ControlKind::DateTime,
            "hypertextlabels" => ControlKind::HyperTextLabels,
            "pairwise" => ControlKind::Pairwise,
            "paragraphlabels" => ControlKind::ParagraphLabels,
            "ranker" => ControlKind::Ranker,
            "rating" => ControlKind::Rating,
            "relations" => ControlKind::Relations,
            "taxonomy" => ControlKind::Taxonomy,
            "textarea" => ControlKind::TextArea,
            "timeserieslabels" => ControlKind::TimeSeriesLabels,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical element name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::Choices => "Choices",
            ControlKind::Labels => "Labels",
            ControlKind::Rectangle => "Rectangle",
            ControlKind::RectangleLabels => "RectangleLabels",
            ControlKind::Polygon => "Polygon",
            ControlKind::PolygonLabels => "PolygonLabels",
            ControlKind::Ellipse => "Ellipse",
            ControlKind::EllipseLabels => "EllipseLabels",
            ControlKind::KeyPoint => "KeyPoint",
            ControlKind::KeyPointLabels => "KeyPointLabels",
            ControlKind::Brush => "Brush",
            ControlKind::BrushLabels => "BrushLabels",
            ControlKind::VideoRectangle => "VideoRectangle",
            ControlKind::Number => "Number",
            ControlKind::DateTime => "DateTime",
            ControlKind::HyperTextLabels => "HyperTextLabels",
            ControlKind::Pairwise => "Pairwise",
            ControlKind::ParagraphLabels => "ParagraphLabels",
            ControlKind::Ranker => "Ranker",
            ControlKind::Rating => "Rating",
            ControlKind::Relations => "Relations",
            ControlKind::Taxonomy => "Taxonomy",
            ControlKind::TextArea => "TextArea",
            ControlKind::TimeSeriesLabels => "TimeSeriesLabels",
            ControlKind::Generic => "Generic",
        }
    }

    /// The key under which a result value carries its labels, if the variant
    /// is label-bearing.
    pub fn label_attr(&self) -> Option<&'static str> {
        match self {
            ControlKind::Choices => Some("choices"),
            ControlKind::Labels => Some("labels"),
            ControlKind::RectangleLabels => Some("rectanglelabels"),
            ControlKind::PolygonLabels => Some("polygonlabels"),
            ControlKind::EllipseLabels => Some("ellipselabels"),
            ControlKind::KeyPointLabels => Some("keypointlabels"),
            ControlKind::BrushLabels => Some("brushlabels"),
            ControlKind::HyperTextLabels => Some("hypertextlabels"),
            ControlKind::ParagraphLabels => Some("paragraphlabels"),
            ControlKind::TimeSeriesLabels => Some("timeserieslabels"),
            ControlKind::Taxonomy => Some("taxonomy"),
            _ => None,
        }
    }
}

/// Which kind of selection a per-region control is conditioned on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionalKind {
    Tag,
    Label,
    Choice,
}

/// Per-region visibility rule (`perRegion="true"` plus a `when*` attribute).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditionals {
    #[serde(rename = "type")]
    pub kind: ConditionalKind,
    pub name: String,
}

impl Conditionals {
    /// Extracts conditionals from a control's attributes.
    ///
    /// Only `perRegion="true"` controls are conditional. The first of
    /// `whenTagName`, `whenLabelValue`, `whenChoiceValue` wins.
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Option<Self> {
        if attributes.get("perRegion").map(String::as_str) != Some("true") {
            return None;
        }

        [
            ("whenTagName", ConditionalKind::Tag),
            ("whenLabelValue", ConditionalKind::Label),
            ("whenChoiceValue", ConditionalKind::Choice),
        ]
        .into_iter()
        .find_map(|(attr, kind)| {
            attributes.get(attr).map(|name| Conditionals {
                kind,
                name: name.clone(),
            })
        })
    }
}

/// A parsed control tag such as `<Choices name="sentiment" toName="text">`.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlTag {
    pub name: String,
    pub kind: String,
    pub variant: ControlKind,
    pub attributes: BTreeMap<String, String>,
    /// Declared targets, in order.
    pub to_name: Vec<String>,
    pub conditionals: Option<Conditionals>,
    /// True when labels come from task data or an API at runtime.
    pub dynamic_value: bool,
    /// Names of the object tags that `to_name` resolved to.
    pub objects: Vec<String>,
    /// Declared label vocabulary, in declaration order.
    pub labels: Vec<String>,
    pub labels_attrs: BTreeMap<String, BTreeMap<String, String>>,
}

impl ControlTag {
    /// Builds an unresolved control tag from an element's attributes.
    pub fn from_attributes(
        kind: impl Into<String>,
        variant: ControlKind,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        let name = attributes.get("name").cloned().unwrap_or_default();
        let to_name = attributes
            .get("toName")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let dynamic_value = attributes
            .get("value")
            .is_some_and(|v| v.starts_with('$'))
            || attributes.contains_key("apiUrl");

        Self {
            name,
            kind: kind.into(),
            variant,
            conditionals: Conditionals::from_attributes(&attributes),
            attributes,
            to_name,
            dynamic_value,
            objects: Vec::new(),
            labels: Vec::new(),
            labels_attrs: BTreeMap::new(),
        }
    }

    /// The `type` a result produced by this control must carry.
    pub fn result_type(&self) -> String {
        self.kind.to_lowercase()
    }

    /// True for `Choices` with `choice="multiple"`.
    pub fn is_multiple(&self) -> bool {
        self.attr("choice") == Some("multiple")
    }

    /// True when `required="true"`.
    pub fn is_required(&self) -> bool {
        self.attr("required") == Some("true")
    }

    /// Maximum rating for `Rating` controls (default 5).
    pub fn max_rating(&self) -> i64 {
        self.attr("maxRating")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(5)
    }

    /// Numeric attribute, if present and parseable.
    pub fn numeric_attr(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(|v| v.trim().parse::<f64>().ok())
    }

    /// True when the control's results carry no label vocabulary.
    pub fn is_label_free(&self) -> bool {
        self.variant.label_attr().is_none()
    }

    /// Checks that every label is declared by this control.
    ///
    /// Dynamic controls accept any label since their vocabulary is only known
    /// at runtime.
    pub fn validate_labels<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        self.undeclared_labels(labels).is_empty()
    }

    pub(crate) fn undeclared_labels<S: AsRef<str>>(&self, labels: &[S]) -> Vec<String> {
        if self.dynamic_value {
            return Vec::new();
        }
        labels
            .iter()
            .map(AsRef::as_ref)
            .filter(|label| !self.labels.iter().any(|known| known == label))
            .map(str::to_string)
            .collect()
    }

    /// Returns true when `value` is a valid result value for this control.
    pub fn validate_value(&self, value: &Value) -> bool {
        self.check_value(value).is_ok()
    }

    /// Checks a result value against the labels and the variant's value shape.
    pub fn check_value(&self, value: &Value) -> Result<(), ValueError> {
        value::check_value(self, value)
    }

    /// Creates a region targeting the first `toName` with the given value.
    pub fn region(&self, value: Value) -> Region {
        let to_name = self.to_name.first().cloned().unwrap_or_default();
        self.region_for(to_name, value)
    }

    /// Creates a region targeting a specific object.
    pub fn region_for(&self, to_name: impl Into<String>, value: Value) -> Region {
        Region::new(self.name.clone(), to_name, self.result_type(), value)
    }

    /// Creates a region whose value holds the given labels.
    ///
    /// For `Taxonomy` the labels form a single path. Label-free controls put
    /// them under a generic `labels` key.
    pub fn label<S: AsRef<str>>(&self, labels: &[S]) -> Region {
        let labels: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        let mut value = Map::new();
        match self.variant {
            ControlKind::Taxonomy => {
                value.insert("taxonomy".to_string(), json!([labels]));
            }
            variant => {
                let key = variant.label_attr().unwrap_or("labels");
                value.insert(key.to_string(), json!(labels));
            }
        }
        self.region(Value::Object(value))
    }
}

impl Tag for ControlTag {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}
