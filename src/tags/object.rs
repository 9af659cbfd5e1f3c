//! Object tags: the data sources a control annotates.

use std::collections::BTreeMap;

use serde_json::Value;

use super::Tag;

/// Built-in object tag variants.
///
/// Kinds that are not registered map to [`ObjectKind::Generic`] and still take
/// part in reference resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Text,
    Image,
    Audio,
    Video,
    HyperText,
    List,
    Paragraphs,
    TimeSeries,
    Generic,
}

impl ObjectKind {
    /// Looks up a built-in variant by lower-cased element name.
    pub fn from_tag_name(lower: &str) -> Option<Self> {
        let kind = match lower {
            "text" => ObjectKind::Text,
            "image" => ObjectKind::Image,
            "audio" | "audioplus" => ObjectKind::Audio,
            "video" => ObjectKind::Video,
            "hypertext" => ObjectKind::HyperText,
            "list" => ObjectKind::List,
            "paragraphs" => ObjectKind::Paragraphs,
            "timeseries" => ObjectKind::TimeSeries,
            _ => return None,
        };
        Some(kind)
    }
}

/// The `value` of an object tag.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectValue {
    /// A literal value written directly in the config.
    Literal(String),
    /// A `$variable` reference into task data (stored without the `$`).
    Variable(String),
    /// A variable whose data was substituted by `load_task`.
    Loaded { name: String, data: Value },
}

impl ObjectValue {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('$') {
            Some(name) => ObjectValue::Variable(name.to_string()),
            None => ObjectValue::Literal(raw.to_string()),
        }
    }
}

/// A parsed object tag such as `<Image name="img" value="$image"/>`.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectTag {
    pub name: String,
    pub kind: String,
    pub variant: ObjectKind,
    pub attributes: BTreeMap<String, String>,
    pub value: ObjectValue,
    /// Optional hint about how the data is delivered (e.g. `url`).
    pub value_type: Option<String>,
}

impl ObjectTag {
    /// Builds an object tag from an element's attributes.
    ///
    /// The caller has already checked the object predicate (`name` plus
    /// `value` or `valueList`).
    pub fn from_attributes(
        kind: impl Into<String>,
        variant: ObjectKind,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        let name = attributes.get("name").cloned().unwrap_or_default();
        let raw = attributes
            .get("value")
            .or_else(|| attributes.get("valueList"))
            .map(String::as_str)
            .unwrap_or_default();
        let value_type = attributes
            .get("valueType")
            .or_else(|| attributes.get("valuetype"))
            .cloned();

        Self {
            name,
            kind: kind.into(),
            variant,
            value: ObjectValue::parse(raw),
            value_type,
            attributes,
        }
    }

    /// True when the value refers to task data (`$name`).
    pub fn value_is_variable(&self) -> bool {
        !matches!(self.value, ObjectValue::Literal(_))
    }

    /// The task data key this object reads, without the leading `$`.
    pub fn value_name(&self) -> Option<&str> {
        match &self.value {
            ObjectValue::Literal(_) => None,
            ObjectValue::Variable(name) | ObjectValue::Loaded { name, .. } => Some(name),
        }
    }

    /// The value as it appears in the normalized schema dict (`$` stripped).
    pub fn value_key(&self) -> &str {
        match &self.value {
            ObjectValue::Literal(raw) => raw.trim_start_matches('$'),
            ObjectValue::Variable(name) | ObjectValue::Loaded { name, .. } => name,
        }
    }

    /// Data substituted by `load_task`, if any.
    pub fn loaded_data(&self) -> Option<&Value> {
        match &self.value {
            ObjectValue::Loaded { data, .. } => Some(data),
            _ => None,
        }
    }

    /// True when data is delivered as a URL rather than inline.
    pub fn is_url(&self) -> bool {
        self.value_type.as_deref() == Some("url")
    }

    /// Returns a copy with the variable substituted from `data`.
    ///
    /// Literals and variables absent from `data` are returned unchanged.
    pub(crate) fn with_task_data(&self, data: &serde_json::Map<String, Value>) -> Self {
        let mut out = self.clone();
        if let Some(name) = self.value_name() {
            if let Some(found) = data.get(name) {
                out.value = ObjectValue::Loaded {
                    name: name.to_string(),
                    data: found.clone(),
                };
            }
        }
        out
    }
}

impl Tag for ObjectTag {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn variable_value_is_detected() {
        let tag = ObjectTag::from_attributes(
            "Image",
            ObjectKind::Image,
            attrs(&[("name", "img"), ("value", "$image")]),
        );
        assert!(tag.value_is_variable());
        assert_eq!(tag.value_name(), Some("image"));
        assert_eq!(tag.value_key(), "image");
    }

    #[test]
    fn literal_value_and_value_type() {
        let tag = ObjectTag::from_attributes(
            "Text",
            ObjectKind::Text,
            attrs(&[("name", "t"), ("value", "Hello"), ("valueType", "url")]),
        );
        assert!(!tag.value_is_variable());
        assert!(tag.is_url());
        assert_eq!(tag.value_name(), None);
    }

    #[test]
    fn value_list_is_accepted() {
        let tag = ObjectTag::from_attributes(
            "Image",
            ObjectKind::Image,
            attrs(&[("name", "gallery"), ("valueList", "$images")]),
        );
        assert_eq!(tag.value_name(), Some("images"));
    }

    #[test]
    fn task_data_substitution_leaves_original_untouched() {
        let tag = ObjectTag::from_attributes(
            "Text",
            ObjectKind::Text,
            attrs(&[("name", "t"), ("value", "$text")]),
        );
        let data = json!({"text": "hello"});
        let loaded = tag.with_task_data(data.as_object().expect("object"));

        assert_eq!(loaded.loaded_data(), Some(&json!("hello")));
        assert_eq!(tag.loaded_data(), None);
        assert_eq!(loaded.value_name(), Some("text"));
    }
}
