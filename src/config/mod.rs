//! The label interface: a parsed, linked labeling config.
//!
//! [`LabelInterface`] is built once from a config string and is immutable
//! afterwards. It owns the control and object tags, the label leaves, and the
//! raw config text (used by the grammar and name checks in
//! [`crate::validation`]).
//!
//! # Example
//!
//! ```
//! use labelconf::LabelInterface;
//!
//! let li = LabelInterface::parse(
//!     r#"<View>
//!          <Text name="doc" value="$text"/>
//!          <Choices name="sentiment" toName="doc">
//!            <Choice value="Positive"/>
//!            <Choice value="Negative"/>
//!          </Choices>
//!        </View>"#,
//! )
//! .unwrap();
//!
//! let control = li.get_control(Some("sentiment")).unwrap();
//! assert_eq!(control.labels, vec!["Positive", "Negative"]);
//! assert_eq!(control.objects, vec!["doc"]);
//! ```

pub mod normalized;
mod parse;
mod resolve;

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

pub use normalized::{parse_config, ControlSchema, InputSchema, NormalizedSchema};
pub use parse::EmbeddedExample;

use crate::error::LabelConfigError;
use crate::region::{serialize_results, Region};
use crate::tags::{AnyTag, ControlTag, LabelLeaf, ObjectTag, Tag, TagMap, TagRegistry};

/// A parsed and linked labeling configuration.
#[derive(Clone, Debug)]
pub struct LabelInterface {
    config: String,
    controls: TagMap<ControlTag>,
    objects: TagMap<ObjectTag>,
    leaves: BTreeMap<String, Vec<LabelLeaf>>,
    example: Option<EmbeddedExample>,
}

impl LabelInterface {
    /// Parses and links a config using the built-in tag registry.
    pub fn parse(config: &str) -> Result<Self, LabelConfigError> {
        Self::parse_with(config, &TagRegistry::new())
    }

    /// Parses and links a config, dispatching element names through `registry`.
    pub fn parse_with(config: &str, registry: &TagRegistry) -> Result<Self, LabelConfigError> {
        let mut parsed = parse::parse_tree(config, registry)?;
        resolve::resolve_references(&mut parsed.controls, &parsed.objects, &parsed.labels);

        tracing::debug!(
            "parsed labeling config: {} control(s), {} object(s)",
            parsed.controls.len(),
            parsed.objects.len()
        );

        Ok(Self {
            config: config.to_string(),
            controls: parsed.controls,
            objects: parsed.objects,
            leaves: parsed.labels,
            example: parsed.example,
        })
    }

    /// The raw config text.
    pub fn config(&self) -> &str {
        &self.config
    }

    pub fn controls(&self) -> &TagMap<ControlTag> {
        &self.controls
    }

    pub fn objects(&self) -> &TagMap<ObjectTag> {
        &self.objects
    }

    /// Label leaves grouped by parent control name.
    pub fn label_leaves(&self) -> &BTreeMap<String, Vec<LabelLeaf>> {
        &self.leaves
    }

    /// The sample bundle from a leading `<!-- {json} -->` comment, if any.
    pub fn embedded_example(&self) -> Option<&EmbeddedExample> {
        self.example.as_ref()
    }

    /// Looks up a control or object by name.
    pub fn get_tag(&self, name: &str) -> Result<AnyTag<'_>, LabelConfigError> {
        if let Some(control) = self.controls.get(name) {
            return Ok(AnyTag::Control(control));
        }
        if let Some(object) = self.objects.get(name) {
            return Ok(AnyTag::Object(object));
        }
        Err(LabelConfigError::TagNotFound {
            name: name.to_string(),
        })
    }

    /// Returns the named control, or the only control when `name` is `None`.
    pub fn get_control(&self, name: Option<&str>) -> Result<&ControlTag, LabelConfigError> {
        pick(&self.controls, name, "control")
    }

    /// Returns the named object, or the only object when `name` is `None`.
    pub fn get_object(&self, name: Option<&str>) -> Result<&ObjectTag, LabelConfigError> {
        pick(&self.objects, name, "object")
    }

    /// Controls whose element name matches `kind` (case-insensitive).
    pub fn find_controls_by_kind(&self, kind: &str) -> Vec<&ControlTag> {
        self.controls
            .iter()
            .filter(|c| c.kind.eq_ignore_ascii_case(kind))
            .collect()
    }

    /// Objects whose element name matches `kind` (case-insensitive).
    pub fn find_objects_by_kind(&self, kind: &str) -> Vec<&ObjectTag> {
        self.objects
            .iter()
            .filter(|o| o.kind.eq_ignore_ascii_case(kind))
            .collect()
    }

    /// The object tags a control resolved to.
    pub fn control_objects(&self, control: &ControlTag) -> Vec<&ObjectTag> {
        control
            .objects
            .iter()
            .filter_map(|name| self.objects.get(name))
            .collect()
    }

    /// Finds the first control/object pair matching the given kinds.
    ///
    /// An empty kind list matches anything. This is how model backends pick
    /// "the" image + rectangle pair out of a config.
    pub fn first_tag_occurrence(
        &self,
        control_kinds: &[&str],
        object_kinds: &[&str],
    ) -> Option<(&ControlTag, &ObjectTag)> {
        let matches = |kinds: &[&str], kind: &str| {
            kinds.is_empty() || kinds.iter().any(|k| k.eq_ignore_ascii_case(kind))
        };

        self.controls
            .iter()
            .filter(|control| matches(control_kinds, &control.kind))
            .find_map(|control| {
                self.control_objects(control)
                    .into_iter()
                    .find(|object| matches(object_kinds, &object.kind))
                    .map(|object| (control, object))
            })
    }

    /// Declared labels per control, in document order.
    pub fn labels(&self) -> Vec<(&str, &[String])> {
        self.controls
            .iter()
            .map(|c| (c.name.as_str(), c.labels.as_slice()))
            .collect()
    }

    /// Task data keys the config reads (`$variables` of objects and dynamic
    /// controls).
    pub fn data_keys(&self) -> BTreeSet<String> {
        let objects = self.objects.iter().filter_map(|o| o.value_name());
        let controls = self
            .controls
            .iter()
            .filter_map(|c| c.attr("value"))
            .filter_map(|v| v.strip_prefix('$'));
        objects.chain(controls).map(str::to_string).collect()
    }

    /// Maps each task data key to the kind of object that reads it.
    pub fn data_types(&self) -> BTreeMap<String, String> {
        self.objects
            .iter()
            .filter_map(|o| o.value_name().map(|name| (name.to_string(), o.kind.clone())))
            .collect()
    }

    /// Returns a copy with object values substituted from task data.
    ///
    /// `task` may be a full task (`{"data": {...}}`) or the data object itself.
    /// The receiver is left untouched.
    pub fn load_task(&self, task: &Value) -> Result<Self, LabelConfigError> {
        let data = match task.get("data") {
            Some(Value::Object(data)) => data,
            Some(_) => {
                return Err(LabelConfigError::InvalidTask {
                    message: "task.data must be an object".to_string(),
                })
            }
            None => task.as_object().ok_or_else(|| LabelConfigError::InvalidTask {
                message: "task must be a JSON object".to_string(),
            })?,
        };

        let mut loaded = self.clone();
        for object in loaded.objects.iter_mut() {
            *object = object.with_task_data(data);
        }
        Ok(loaded)
    }

    /// Builds one region per entry of `values` (control name → result value).
    pub fn create_regions(
        &self,
        values: &BTreeMap<String, Value>,
    ) -> Result<Vec<Region>, LabelConfigError> {
        values
            .iter()
            .map(|(name, value)| {
                let control = self.get_control(Some(name))?;
                Ok(control.region(value.clone()))
            })
            .collect()
    }

    /// Serializes regions as an annotation: `{"result": [...]}`.
    pub fn create_annotation(&self, regions: &[Region]) -> Result<Value, LabelConfigError> {
        let result = results_json(regions)?;
        Ok(json!({ "result": result }))
    }

    /// Serializes regions as a prediction with optional score and model version.
    pub fn create_prediction(
        &self,
        regions: &[Region],
        score: Option<f64>,
        model_version: Option<&str>,
    ) -> Result<Value, LabelConfigError> {
        let mut prediction = Map::new();
        prediction.insert("result".to_string(), results_json(regions)?);
        if let Some(score) = score {
            prediction.insert("score".to_string(), json!(score));
        }
        if let Some(version) = model_version {
            prediction.insert("model_version".to_string(), json!(version));
        }
        Ok(Value::Object(prediction))
    }
}

fn results_json(regions: &[Region]) -> Result<Value, LabelConfigError> {
    Ok(Value::Array(serialize_results(regions)?))
}

fn pick<'a, T: Tag>(
    tags: &'a TagMap<T>,
    name: Option<&str>,
    kind: &'static str,
) -> Result<&'a T, LabelConfigError> {
    match name {
        Some(name) => tags.get(name).ok_or_else(|| LabelConfigError::TagNotFound {
            name: name.to_string(),
        }),
        None => match tags.len() {
            1 => tags.iter().next().ok_or(LabelConfigError::AmbiguousTag { kind, count: 0 }),
            count => Err(LabelConfigError::AmbiguousTag { kind, count }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"<View>
      <Image name="image" value="$image"/>
      <Text name="caption" value="$caption"/>
      <RectangleLabels name="box" toName="image">
        <Label value="Car"/>
      </RectangleLabels>
      <Choices name="quality" toName="image,caption" value="$options"/>
    </View>"#;

    #[test]
    fn get_control_requires_name_when_ambiguous() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        let err = li.get_control(None).expect_err("two controls");
        assert!(matches!(err, LabelConfigError::AmbiguousTag { count: 2, .. }));
        assert_eq!(li.get_control(Some("box")).expect("box").kind, "RectangleLabels");
    }

    #[test]
    fn get_tag_covers_both_families() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        assert!(matches!(li.get_tag("box"), Ok(AnyTag::Control(_))));
        assert!(matches!(li.get_tag("image"), Ok(AnyTag::Object(_))));
        assert!(matches!(
            li.get_tag("nope"),
            Err(LabelConfigError::TagNotFound { .. })
        ));
    }

    #[test]
    fn first_tag_occurrence_matches_kinds() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        let (control, object) = li
            .first_tag_occurrence(&["Choices"], &["Text"])
            .expect("pair");
        assert_eq!(control.name, "quality");
        assert_eq!(object.name, "caption");
        assert!(li.first_tag_occurrence(&["Rating"], &[]).is_none());
    }

    #[test]
    fn data_keys_include_dynamic_controls() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        let keys: Vec<_> = li.data_keys().into_iter().collect();
        assert_eq!(keys, vec!["caption", "image", "options"]);
        assert_eq!(li.data_types()["image"], "Image");
    }

    #[test]
    fn load_task_returns_a_copy() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        let loaded = li
            .load_task(&json!({"data": {"image": "https://example.com/a.jpg"}}))
            .expect("load");

        let image = loaded.get_object(Some("image")).expect("image");
        assert_eq!(image.loaded_data(), Some(&json!("https://example.com/a.jpg")));
        assert!(loaded.get_object(Some("caption")).expect("caption").loaded_data().is_none());
        assert!(li.get_object(Some("image")).expect("image").loaded_data().is_none());
    }

    #[test]
    fn load_task_rejects_non_objects() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        assert!(matches!(
            li.load_task(&json!([1, 2])),
            Err(LabelConfigError::InvalidTask { .. })
        ));
    }

    #[test]
    fn create_prediction_includes_score_and_version() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        let mut values = BTreeMap::new();
        values.insert(
            "box".to_string(),
            json!({"x": 1, "y": 1, "width": 5, "height": 5, "rectanglelabels": ["Car"]}),
        );
        let regions = li.create_regions(&values).expect("regions");
        let prediction = li
            .create_prediction(&regions, Some(0.9), Some("v1"))
            .expect("prediction");

        assert_eq!(prediction["score"], json!(0.9));
        assert_eq!(prediction["model_version"], json!("v1"));
        assert_eq!(prediction["result"][0]["type"], json!("rectanglelabels"));
        assert_eq!(prediction["result"][0]["to_name"], json!("image"));
    }
}
