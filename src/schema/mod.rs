//! JSON Schema export for structured-output generation.
//!
//! Each supported control maps to an OpenAPI-3 compatible schema fragment
//! describing the value a model must produce for it.

use serde_json::{json, Map, Value};

use crate::config::LabelInterface;
use crate::error::LabelConfigError;
use crate::tags::{ControlKind, ControlTag};

impl ControlTag {
    /// The JSON Schema fragment for this control's output.
    ///
    /// Supported: `Choices`, `Labels`, `Number`, `Rating`, `Taxonomy`,
    /// `TextArea`, `Pairwise` and `DateTime`.
    pub fn to_json_schema(&self) -> Result<Value, LabelConfigError> {
        let targets = self.to_name.join(", ");
        let described = |mut schema: Value, description: String| {
            schema["description"] = Value::String(description);
            schema
        };

        let schema = match self.variant {
            ControlKind::Choices => {
                let choice = string_enum(&self.labels);
                let schema = if self.is_multiple() {
                    json!({"type": "array", "items": choice, "uniqueItems": true})
                } else {
                    choice
                };
                described(schema, format!("Choices for {}", targets))
            }
            ControlKind::Labels => described(
                json!({
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "start": {"type": "integer", "minimum": 0},
                            "end": {"type": "integer", "minimum": 0},
                            "labels": {"type": "array", "items": string_enum(&self.labels)},
                            "text": {"type": "string"}
                        },
                        "required": ["start", "end", "labels"]
                    }
                }),
                format!("Labels and span indices for {}", targets),
            ),
            ControlKind::Number => {
                let mut schema = Map::new();
                schema.insert("type".to_string(), json!("number"));
                if let Some(min) = self.numeric_attr("min") {
                    schema.insert("minimum".to_string(), json!(min));
                }
                if let Some(max) = self.numeric_attr("max") {
                    schema.insert("maximum".to_string(), json!(max));
                }
                described(Value::Object(schema), format!("Number for {}", targets))
            }
            ControlKind::Rating => described(
                json!({"type": "integer", "minimum": 0, "maximum": self.max_rating()}),
                format!("Rating for {}", targets),
            ),
            ControlKind::Taxonomy => described(
                json!({
                    "type": "array",
                    "items": {"type": "array", "items": string_enum(&self.labels)}
                }),
                format!("Taxonomy for {}", targets),
            ),
            ControlKind::TextArea => described(
                json!({
                    "oneOf": [
                        {"type": "string"},
                        {"type": "array", "items": {"type": "string"}}
                    ]
                }),
                format!("Text or list of texts for {}", targets),
            ),
            ControlKind::Pairwise => described(
                json!({"type": "string", "enum": ["left", "right"]}),
                format!("Pairwise choice for {}", targets),
            ),
            ControlKind::DateTime => described(
                json!({"type": "string", "format": "date-time"}),
                format!("Date and time for {}", targets),
            ),
            _ => {
                return Err(LabelConfigError::UnsupportedSchema {
                    name: self.name.clone(),
                    kind: self.kind.clone(),
                })
            }
        };

        Ok(schema)
    }
}

/// `{"type": "string", "enum": labels}`; the enum is omitted for dynamic
/// controls with no declared labels.
fn string_enum(labels: &[String]) -> Value {
    if labels.is_empty() {
        json!({"type": "string"})
    } else {
        json!({"type": "string", "enum": labels})
    }
}

impl LabelInterface {
    /// JSON Schema fragment for one control.
    pub fn control_json_schema(&self, name: &str) -> Result<Value, LabelConfigError> {
        self.get_control(Some(name))?.to_json_schema()
    }

    /// Object schema with one property per supported control.
    ///
    /// Controls without a schema mapping are left out. A control is listed in
    /// `required` when it carries `required="true"`.
    pub fn to_json_schema(&self) -> Result<Value, LabelConfigError> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for control in self.controls() {
            match control.to_json_schema() {
                Ok(schema) => {
                    properties.insert(control.name.clone(), schema);
                    if control.is_required() {
                        required.push(Value::String(control.name.clone()));
                    }
                }
                Err(LabelConfigError::UnsupportedSchema { name, kind }) => {
                    tracing::debug!("no JSON schema for control '{}' ({}); skipping", name, kind);
                }
                Err(other) => return Err(other),
            }
        }

        Ok(json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(config: &str, name: &str) -> ControlTag {
        LabelInterface::parse(config)
            .expect("parse")
            .get_control(Some(name))
            .expect("control")
            .clone()
    }

    #[test]
    fn single_choice_is_a_string_enum() {
        let schema = control(
            r#"<View>
                 <Choices name="sentiment" toName="doc">
                   <Choice value="Positive"/><Choice value="Negative"/><Choice value="Neutral"/>
                 </Choices>
                 <Text name="doc" value="$text"/>
               </View>"#,
            "sentiment",
        )
        .to_json_schema()
        .expect("schema");

        assert_eq!(
            schema,
            json!({
                "type": "string",
                "enum": ["Positive", "Negative", "Neutral"],
                "description": "Choices for doc"
            })
        );
    }

    #[test]
    fn multiple_choice_is_a_unique_array() {
        let schema = control(
            r#"<View><Text name="t" value="$t"/>
                 <Choices name="c" toName="t" choice="multiple"><Choice value="A"/><Choice value="B"/></Choices>
               </View>"#,
            "c",
        )
        .to_json_schema()
        .expect("schema");
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["uniqueItems"], true);
        assert_eq!(schema["items"]["enum"], json!(["A", "B"]));
    }

    #[test]
    fn number_copies_bounds() {
        let schema = control(
            r#"<View><Text name="t" value="$t"/><Number name="n" toName="t" min="1" max="10"/></View>"#,
            "n",
        )
        .to_json_schema()
        .expect("schema");
        assert_eq!(schema["minimum"], json!(1.0));
        assert_eq!(schema["maximum"], json!(10.0));
    }

    #[test]
    fn rating_defaults_to_five() {
        let schema = control(
            r#"<View><Text name="t" value="$t"/><Rating name="r" toName="t"/></View>"#,
            "r",
        )
        .to_json_schema()
        .expect("schema");
        assert_eq!(schema["maximum"], json!(5));
        assert_eq!(schema["type"], "integer");
    }

    #[test]
    fn labels_are_span_objects() {
        let schema = control(
            r#"<View><Text name="t" value="$t"/><Labels name="ner" toName="t"><Label value="PER"/></Labels></View>"#,
            "ner",
        )
        .to_json_schema()
        .expect("schema");
        assert_eq!(schema["items"]["required"], json!(["start", "end", "labels"]));
        assert_eq!(
            schema["items"]["properties"]["labels"]["items"]["enum"],
            json!(["PER"])
        );
    }

    #[test]
    fn unsupported_control() {
        let err = control(
            r#"<View><Image name="i" value="$i"/><Rectangle name="r" toName="i"/></View>"#,
            "r",
        )
        .to_json_schema()
        .expect_err("unsupported");
        assert!(matches!(err, LabelConfigError::UnsupportedSchema { .. }));
    }

    #[test]
    fn interface_schema_collects_required() {
        let li = LabelInterface::parse(
            r#"<View>
                 <Text name="t" value="$t"/>
                 <TextArea name="summary" toName="t" required="true"/>
                 <DateTime name="when" toName="t"/>
                 <Labels name="ner" toName="t"><Label value="PER"/></Labels>
               </View>"#,
        )
        .expect("parse");

        let schema = li.to_json_schema().expect("schema");
        assert_eq!(schema["required"], json!(["summary"]));
        assert_eq!(schema["properties"]["when"]["format"], "date-time");
        assert!(schema["properties"]["summary"]["oneOf"].is_array());
    }
}
