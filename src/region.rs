//! Annotation result regions and the relations between them.

use std::fmt;
use std::str::FromStr;

use rand::RngExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const REGION_ID_LEN: usize = 10;
const REGION_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates an opaque region id.
pub fn generate_region_id() -> String {
    let mut rng = rand::rng();
    (0..REGION_ID_LEN)
        .map(|_| REGION_ID_ALPHABET[rng.random_range(0..REGION_ID_ALPHABET.len())] as char)
        .collect()
}

/// Direction of a relation between two regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Bi,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "bi" => Ok(Direction::Bi),
            other => Err(format!(
                "invalid relation direction '{other}' (expected left, right or bi)"
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Bi => "bi",
        };
        write!(f, "{s}")
    }
}

/// An outgoing relation from a region.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub to_id: String,
    pub direction: Direction,
    pub labels: Vec<String>,
}

/// A relation as serialized in a result list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationEntry {
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub result_type: String,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// One annotation/prediction result linking a control, an object and a value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default = "generate_region_id")]
    pub id: String,
    pub from_name: String,
    pub to_name: String,
    #[serde(rename = "type")]
    pub result_type: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip)]
    pub relations: Vec<Relation>,
}

impl Region {
    /// Creates a region with a freshly generated id.
    pub fn new(
        from_name: impl Into<String>,
        to_name: impl Into<String>,
        result_type: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            id: generate_region_id(),
            from_name: from_name.into(),
            to_name: to_name.into(),
            result_type: result_type.into(),
            value,
            score: None,
            relations: Vec::new(),
        }
    }

    /// Replaces the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets a per-region confidence score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Adds a relation from this region to `other`.
    pub fn add_relation(&mut self, other: &Region, direction: Direction, labels: Vec<String>) {
        self.relations.push(Relation {
            to_id: other.id.clone(),
            direction,
            labels,
        });
    }

    /// The relation entries that follow this region in a result list.
    pub fn relation_entries(&self) -> Vec<RelationEntry> {
        self.relations
            .iter()
            .map(|rel| RelationEntry {
                from_id: self.id.clone(),
                to_id: rel.to_id.clone(),
                result_type: "relation".to_string(),
                direction: rel.direction,
                labels: rel.labels.clone(),
            })
            .collect()
    }
}

/// Serializes regions into a result list: all regions first, then every
/// relation entry.
pub fn serialize_results(regions: &[Region]) -> Result<Vec<Value>, serde_json::Error> {
    let mut out = Vec::with_capacity(regions.len());
    for region in regions {
        out.push(serde_json::to_value(region)?);
    }
    for region in regions {
        for entry in region.relation_entries() {
            out.push(serde_json::to_value(entry)?);
        }
    }
    Ok(out)
}
