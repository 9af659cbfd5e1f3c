//! Single-pass classification of config elements.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LabelConfigError;
use crate::tags::{
    collect_attributes, ControlTag, LabelLeaf, ObjectTag, TagMap, TagRegistry, LABEL_LEAF_KINDS,
};

/// Element names that carry `name` and `toName` but never produce results.
const NOT_CONTROL_TAGS: [&str; 1] = ["Filter"];

/// Sample task bundle embedded as a leading `<!-- {json} -->` comment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedExample {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub annotations: Vec<Value>,
    #[serde(default)]
    pub predictions: Vec<Value>,
}

#[derive(Debug, Default)]
pub(crate) struct ParsedConfig {
    pub controls: TagMap<ControlTag>,
    pub objects: TagMap<ObjectTag>,
    pub labels: BTreeMap<String, Vec<LabelLeaf>>,
    pub example: Option<EmbeddedExample>,
}

pub(crate) fn is_control_node(node: Node<'_, '_>) -> bool {
    node.has_attribute("name")
        && node.has_attribute("toName")
        && !NOT_CONTROL_TAGS.contains(&node.tag_name().name())
}

pub(crate) fn is_object_node(node: Node<'_, '_>) -> bool {
    node.has_attribute("name") && (node.has_attribute("value") || node.has_attribute("valueList"))
}

pub(crate) fn parse_tree(
    config: &str,
    registry: &TagRegistry,
) -> Result<ParsedConfig, LabelConfigError> {
    let document = Document::parse(config)?;
    let mut parsed = ParsedConfig {
        example: extract_embedded_example(&document),
        ..Default::default()
    };

    for node in document.root_element().descendants().filter(Node::is_element) {
        let kind = node.tag_name().name();

        if is_control_node(node) {
            let tag = ControlTag::from_attributes(
                kind,
                registry.control_kind(kind),
                collect_attributes(node),
            );
            let name = tag.name.clone();
            if !parsed.controls.insert(tag) {
                tracing::warn!("duplicate control name '{}'; keeping the first one", name);
            }
        } else if is_object_node(node) {
            let tag = ObjectTag::from_attributes(
                kind,
                registry.object_kind(kind),
                collect_attributes(node),
            );
            let name = tag.name.clone();
            if !parsed.objects.insert(tag) {
                tracing::warn!("duplicate object name '{}'; keeping the first one", name);
            }
        } else if LABEL_LEAF_KINDS.contains(&kind) {
            if let Some(leaf) = parse_label_leaf(node, &parsed.controls) {
                parsed
                    .labels
                    .entry(leaf.parent_control.clone())
                    .or_default()
                    .push(leaf);
            }
        }
    }

    Ok(parsed)
}

/// Builds a label leaf, attaching it to the nearest ancestor control.
fn parse_label_leaf(node: Node<'_, '_>, controls: &TagMap<ControlTag>) -> Option<LabelLeaf> {
    let kind = node.tag_name().name();
    let parent = node
        .ancestors()
        .skip(1)
        .filter(Node::is_element)
        .find_map(|ancestor| {
            ancestor
                .attribute("name")
                .filter(|name| controls.contains(name))
        });

    let Some(parent) = parent else {
        tracing::debug!(
            "skipping <{}> (value={:?}): no enclosing control tag",
            kind,
            node.attribute("value")
        );
        return None;
    };

    let attributes = collect_attributes(node);
    let Some(value) = LabelLeaf::label_text(&attributes).map(str::to_string) else {
        tracing::debug!(
            "skipping <{}> under '{}': neither alias nor value is set",
            kind,
            parent
        );
        return None;
    };

    Some(LabelLeaf {
        kind: kind.to_string(),
        value,
        parent_control: parent.to_string(),
        attributes,
    })
}

/// Reads a JSON bundle from a comment that precedes the root element.
fn extract_embedded_example(document: &Document<'_>) -> Option<EmbeddedExample> {
    let comment = document
        .root()
        .children()
        .take_while(|node| !node.is_element())
        .find(Node::is_comment)?;
    let text = comment.text()?.trim();
    if !text.starts_with('{') {
        return None;
    }

    match serde_json::from_str::<EmbeddedExample>(text) {
        Ok(example) => Some(example),
        Err(err) => {
            tracing::warn!("ignoring leading config comment: not a valid example bundle: {err}");
            None
        }
    }
}
