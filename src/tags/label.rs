use std::collections::BTreeMap;

use serde::Serialize;

/// Element names that declare label vocabulary.
pub(crate) const LABEL_LEAF_KINDS: [&str; 3] = ["Label", "Choice", "Relation"];

/// A `Label`, `Choice` or `Relation` child element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelLeaf {
    /// Element name (`Label`, `Choice` or `Relation`).
    pub kind: String,
    /// The label text: `alias` if present, otherwise `value`.
    pub value: String,
    /// Name of the nearest ancestor control.
    pub parent_control: String,
    /// All attributes of the element (colors, category ids, hints...).
    pub attributes: BTreeMap<String, String>,
}

impl LabelLeaf {
    /// Returns the label text for a leaf's attributes, or `None` when neither
    /// `alias` nor `value` is present.
    pub(crate) fn label_text(attributes: &BTreeMap<String, String>) -> Option<&str> {
        attributes
            .get("alias")
            .or_else(|| attributes.get("value"))
            .map(String::as_str)
    }
}
