//! Binds controls to their objects and label vocabulary.

use std::collections::BTreeMap;

use crate::tags::{ControlTag, LabelLeaf, ObjectTag, TagMap};

/// Populates `objects`, `labels` and `labels_attrs` on every control.
///
/// Dangling `toName` entries are skipped here; `validate()` is where they
/// become errors.
pub(crate) fn resolve_references(
    controls: &mut TagMap<ControlTag>,
    objects: &TagMap<ObjectTag>,
    leaves: &BTreeMap<String, Vec<LabelLeaf>>,
) {
    for control in controls.iter_mut() {
        control.objects.clear();
        for target in &control.to_name {
            if objects.contains(target) {
                control.objects.push(target.clone());
            } else {
                tracing::debug!(
                    "control '{}' targets unknown object '{}'",
                    control.name,
                    target
                );
            }
        }

        control.labels.clear();
        control.labels_attrs.clear();
        for leaf in leaves.get(&control.name).into_iter().flatten() {
            if !control.labels.contains(&leaf.value) {
                control.labels.push(leaf.value.clone());
            }
            control
                .labels_attrs
                .insert(leaf.value.clone(), leaf.attributes.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse::parse_tree;
    use crate::tags::TagRegistry;

    #[test]
    fn dangling_to_name_is_skipped() {
        let mut parsed = parse_tree(
            r#"<View>
                 <Image name="img" value="$image"/>
                 <Choices name="c" toName="img,missing"><Choice value="A"/></Choices>
               </View>"#,
            &TagRegistry::new(),
        )
        .expect("parse");
        resolve_references(&mut parsed.controls, &parsed.objects, &parsed.labels);

        let control = parsed.controls.get("c").expect("control");
        assert_eq!(control.to_name, vec!["img", "missing"]);
        assert_eq!(control.objects, vec!["img"]);
    }

    #[test]
    fn labels_are_deduplicated_in_order() {
        let mut parsed = parse_tree(
            r#"<View>
                 <Text name="t" value="$text"/>
                 <Labels name="ner" toName="t">
                   <Label value="B" background="blue"/>
                   <Label value="A"/>
                   <Label value="B" background="green"/>
                 </Labels>
               </View>"#,
            &TagRegistry::new(),
        )
        .expect("parse");
        resolve_references(&mut parsed.controls, &parsed.objects, &parsed.labels);

        let control = parsed.controls.get("ner").expect("control");
        assert_eq!(control.labels, vec!["B", "A"]);
        assert_eq!(control.labels_attrs["B"]["background"], "green");
    }
}
