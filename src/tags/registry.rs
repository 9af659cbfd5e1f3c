//! Kind → variant dispatch.

use std::collections::HashMap;

use super::{ControlKind, ObjectKind};

/// Maps element names to tag variants.
///
/// The default registry knows every built-in control and object tag. Callers
/// can redefine or add kinds, e.g. to treat a custom `<MyLabels>` element as a
/// [`ControlKind::Labels`]:
///
/// ```
/// use labelconf::tags::{ControlKind, TagRegistry};
///
/// let registry = TagRegistry::new().with_control("MyLabels", ControlKind::Labels);
/// assert_eq!(registry.control_kind("MyLabels"), ControlKind::Labels);
/// assert_eq!(registry.control_kind("Unheard"), ControlKind::Generic);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    controls: HashMap<String, ControlKind>,
    objects: HashMap<String, ObjectKind>,
}

impl TagRegistry {
    /// Creates a registry with only the built-in mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or overrides) a control kind. Matching is case-insensitive.
    pub fn with_control(mut self, tag_name: &str, variant: ControlKind) -> Self {
        self.controls.insert(tag_name.to_lowercase(), variant);
        self
    }

    /// Registers (or overrides) an object kind. Matching is case-insensitive.
    pub fn with_object(mut self, tag_name: &str, variant: ObjectKind) -> Self {
        self.objects.insert(tag_name.to_lowercase(), variant);
        self
    }

    /// Resolves the control variant for an element name.
    pub fn control_kind(&self, tag_name: &str) -> ControlKind {
        let lower = tag_name.to_lowercase();
        self.controls
            .get(&lower)
            .copied()
            .or_else(|| ControlKind::from_tag_name(&lower))
            .unwrap_or(ControlKind::Generic)
    }

    /// Resolves the object variant for an element name.
    pub fn object_kind(&self, tag_name: &str) -> ObjectKind {
        let lower = tag_name.to_lowercase();
        self.objects
            .get(&lower)
            .copied()
            .or_else(|| ObjectKind::from_tag_name(&lower))
            .unwrap_or(ObjectKind::Generic)
    }
}
