//! Sample task generation.
//!
//! Produces example task data for a config: one value per `$variable` the
//! config reads, taken from the bundled [`catalog`]. Time series data is
//! synthesized from the `<Channel>` columns of each `<TimeSeries>` tag.

mod catalog;
mod prediction;

pub use catalog::Catalog;

use rand::{rngs::StdRng, RngExt, SeedableRng};
use roxmltree::{Document, Node};
use serde_json::{json, Map, Value};

use crate::config::LabelInterface;
use crate::error::LabelConfigError;

/// Fallback for variables with no catalog entry.
const SOMETHING: &str = "Something";

/// Seed for synthesized time series, so samples are reproducible.
const TIME_SERIES_SEED: u64 = 42;
const TIME_SERIES_POINTS: usize = 20;
const TIME_SERIES_CSV: &str = "/samples/time-series.csv";

/// Where the sample task will be shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SampleMode {
    /// Data for importing as a real task.
    #[default]
    Upload,
    /// Data for the live preview next to a config editor.
    EditorPreview,
}

impl LabelInterface {
    /// Generates example task data for every `$variable` in the config.
    ///
    /// `secure_mode` forces URL-shaped values for text and hypertext objects.
    pub fn generate_sample_task(
        &self,
        mode: SampleMode,
        secure_mode: bool,
    ) -> Result<Map<String, Value>, LabelConfigError> {
        let document = Document::parse(self.config())?;
        let catalog = Catalog::global();
        let mut task = Map::new();

        for node in document.root_element().descendants().filter(Node::is_element) {
            let Some(key) = node.attribute("value").and_then(|v| v.strip_prefix('$')) else {
                continue;
            };
            if key.is_empty() || task.contains_key(key) {
                continue;
            }
            let value = sample_value(catalog, mode, secure_mode, node, key);
            task.insert(key.to_string(), value);
        }

        // Time series values depend on their channels, so they are rebuilt
        // after the generic pass.
        for node in document
            .root_element()
            .descendants()
            .filter(|n| n.has_tag_name("TimeSeries"))
        {
            if let Some(key) = node.attribute("value").and_then(|v| v.strip_prefix('$')) {
                task.insert(key.to_string(), time_series_value(node));
            }
        }

        tracing::debug!("generated sample task with {} key(s)", task.len());
        Ok(task)
    }
}

fn sample_value(
    catalog: &Catalog,
    mode: SampleMode,
    secure_mode: bool,
    node: Node<'_, '_>,
    key: &str,
) -> Value {
    let kind = node.tag_name().name();
    let wants_url = secure_mode
        || node
            .attribute("valueType")
            .is_some_and(|t| t.eq_ignore_ascii_case("url"));
    let is_video_hack = kind == "HyperText" && node.attribute("name") == Some("video");
    let lookup = |entry: &str| catalog.get(mode, entry).cloned();

    // URL-shaped text and hypertext take precedence over `$var` overrides.
    let url_entry = match kind {
        "HyperText" if wants_url && !is_video_hack => Some("HyperTextUrl"),
        "Text" if wants_url => Some("TextUrl"),
        _ => None,
    };
    if let Some(value) = url_entry.and_then(|entry| lookup(entry)) {
        return value;
    }

    if let Some(value) = catalog.get(mode, &format!("${}", key)) {
        return value.clone();
    }

    let value = match kind {
        "HyperText" if is_video_hack => lookup("$videoHack"),
        "HyperText" => lookup("HyperText"),
        "Text" => lookup("TextRaw"),
        "Paragraphs" => lookup("Paragraphs").map(|base| {
            rekey_paragraphs(
                &base,
                node.attribute("nameKey").unwrap_or("author"),
                node.attribute("textKey").unwrap_or("text"),
            )
        }),
        "Choices" if node.attribute("allowNested") == Some("true") => lookup("NestedChoices"),
        "Choices" => lookup("Choices"),
        other if other.to_ascii_lowercase().ends_with("labels") => lookup("Labels"),
        other => lookup(other),
    };

    value.unwrap_or_else(|| Value::String(SOMETHING.to_string()))
}

/// Renames the catalog's `author`/`text` keys to the tag's keys.
fn rekey_paragraphs(base: &Value, name_key: &str, text_key: &str) -> Value {
    let items = base
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let mut paragraph = Map::new();
                    paragraph.insert(
                        name_key.to_string(),
                        item.get("author").cloned().unwrap_or(Value::Null),
                    );
                    paragraph.insert(
                        text_key.to_string(),
                        item.get("text").cloned().unwrap_or(Value::Null),
                    );
                    Value::Object(paragraph)
                })
                .collect()
        })
        .unwrap_or_default();
    Value::Array(items)
}

fn time_series_value(node: Node<'_, '_>) -> Value {
    let time_column = node.attribute("timeColumn").unwrap_or("time");
    let columns: Vec<&str> = node
        .descendants()
        .filter(|n| n.has_tag_name("Channel"))
        .filter_map(|n| n.attribute("column"))
        .collect();
    let is_json = node
        .attribute("valueType")
        .is_some_and(|t| t.eq_ignore_ascii_case("json"));

    if is_json {
        time_series_table(time_column, &columns)
    } else {
        Value::String(time_series_url(
            time_column,
            &columns,
            node.attribute("sep"),
            node.attribute("timeFormat"),
        ))
    }
}

fn time_series_url(
    time_column: &str,
    columns: &[&str],
    sep: Option<&str>,
    time_format: Option<&str>,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("time", time_column);
    query.append_pair("values", &columns.join(","));
    if let Some(sep) = sep {
        query.append_pair("sep", sep);
    }
    if let Some(tf) = time_format {
        query.append_pair("tf", tf);
    }
    format!("{}?{}", TIME_SERIES_CSV, query.finish())
}

/// Column-oriented table: the time column plus one random column per channel.
fn time_series_table(time_column: &str, columns: &[&str]) -> Value {
    let mut rng = StdRng::seed_from_u64(TIME_SERIES_SEED);
    let mut table = Map::new();
    table.insert(
        time_column.to_string(),
        json!((0..TIME_SERIES_POINTS).collect::<Vec<_>>()),
    );
    for column in columns {
        let values: Vec<f64> = (0..TIME_SERIES_POINTS)
            .map(|_| rng.random_range(0.0..1.0))
            .collect();
        table.insert(column.to_string(), json!(values));
    }
    Value::Object(table)
}
