//! The bundled catalog of sample task values.

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::SampleMode;

static CATALOG: Lazy<Catalog> = Lazy::new(|| {
    serde_json::from_str(include_str!("examples.json")).unwrap_or_else(|err| {
        tracing::warn!("bundled sample catalog is invalid, using an empty one: {err}");
        Catalog::default()
    })
});

/// Sample values keyed by `$variable` name or by tag kind.
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    upload: Map<String, Value>,
    #[serde(default)]
    editor_preview: Map<String, Value>,
}

impl Catalog {
    /// The process-wide catalog, parsed on first use.
    pub fn global() -> &'static Catalog {
        &CATALOG
    }

    /// Looks up a key; editor previews prefer their own section.
    pub fn get(&self, mode: SampleMode, key: &str) -> Option<&Value> {
        let preview = match mode {
            SampleMode::EditorPreview => self.editor_preview.get(key),
            SampleMode::Upload => None,
        };
        preview.or_else(|| self.upload.get(key))
    }
}
