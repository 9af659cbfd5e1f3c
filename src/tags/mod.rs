//! Tag model for labeling configurations.
//!
//! A labeling config is made of three families of elements:
//!
//! - **Object tags** ([`ObjectTag`]) bind to task data (`<Image value="$image"/>`).
//! - **Control tags** ([`ControlTag`]) produce annotation results and point at
//!   one or more object tags through `toName`.
//! - **Label leaves** ([`LabelLeaf`]) declare the vocabulary of the nearest
//!   enclosing control (`<Label value="Cat"/>`, `<Choice value="Yes"/>`).
//!
//! Each control variant owns a value shape (see [`value`]) that result payloads
//! are checked against.

mod control;
mod label;
mod object;
mod registry;
pub mod value;

use std::collections::{BTreeMap, HashMap};

pub use control::{ConditionalKind, Conditionals, ControlKind, ControlTag};
pub use label::LabelLeaf;
pub(crate) use label::LABEL_LEAF_KINDS;
pub use object::{ObjectKind, ObjectTag, ObjectValue};
pub use registry::TagRegistry;
pub use value::ValueError;

/// Common accessors shared by control and object tags.
pub trait Tag {
    /// The unique `name` attribute.
    fn name(&self) -> &str;

    /// The element name as written in the config (e.g. `RectangleLabels`).
    fn kind(&self) -> &str;

    /// Raw attributes of the source element.
    fn attributes(&self) -> &BTreeMap<String, String>;

    /// Returns a single attribute value.
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes().get(key).map(String::as_str)
    }
}

/// A borrowed reference to either kind of named tag.
#[derive(Clone, Copy, Debug)]
pub enum AnyTag<'a> {
    Control(&'a ControlTag),
    Object(&'a ObjectTag),
}

impl AnyTag<'_> {
    pub fn name(&self) -> &str {
        match self {
            AnyTag::Control(tag) => tag.name(),
            AnyTag::Object(tag) => tag.name(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            AnyTag::Control(tag) => tag.kind(),
            AnyTag::Object(tag) => tag.kind(),
        }
    }
}

/// An insertion-ordered map of tags keyed by their `name`.
///
/// Document order matters for sample generation and for picking the "first"
/// control, so a plain hash map is not enough.
#[derive(Clone, Debug)]
pub struct TagMap<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for TagMap<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Tag> TagMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tag. Returns `false` (and keeps the existing tag) when the
    /// name is already taken.
    pub fn insert(&mut self, tag: T) -> bool {
        if self.index.contains_key(tag.name()) {
            return false;
        }
        self.index.insert(tag.name().to_string(), self.items.len());
        self.items.push(tag);
        true
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&idx| &self.items[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index.get(name) {
            Some(&idx) => self.items.get_mut(idx),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Tag::name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T: Tag> IntoIterator for &'a TagMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Collects the attributes of an XML element into an owned map.
pub(crate) fn collect_attributes(node: roxmltree::Node<'_, '_>) -> BTreeMap<String, String> {
    node.attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect()
}
