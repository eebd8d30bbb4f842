//! CSS-like locators for recorded targets
//!
//! The result is a best-effort fingerprint, not a guaranteed-unique selector.

use crate::dom::Element;

/// Build a selector for `element`.
///
/// 1. `#id` when the element has an id.
/// 2. `tag.class1.class2` when it has classes.
/// 3. Otherwise an ancestor path up to (not including) `body`, joined with
///    `" > "`. An ancestor with an id contributes `tag#id` and ends the walk;
///    others contribute `tag[.classes]` plus `:nth-child(n)` when they have
///    element siblings.
pub fn selector(element: &Element) -> String {
    let id = element.id();
    if !id.is_empty() {
        return format!("#{}", id);
    }

    let classes = element.class_list();
    if !classes.is_empty() {
        return format!("{}.{}", element.tag_name(), classes.join("."));
    }

    path_selector(element)
}

fn path_selector(element: &Element) -> String {
    let mut path: Vec<String> = Vec::new();
    let mut current = Some(element.clone());

    while let Some(node) = current {
        if node.tag_name() == "body" {
            break;
        }

        let mut segment = node.tag_name().to_string();

        let id = node.id();
        if !id.is_empty() {
            segment.push('#');
            segment.push_str(&id);
            path.push(segment);
            break;
        }

        let classes = node.class_list();
        if !classes.is_empty() {
            segment.push('.');
            segment.push_str(&classes.join("."));
        }

        let parent = node.parent_element();
        if let Some(parent) = &parent {
            let siblings = parent.children();
            if siblings.len() > 1 {
                if let Some(index) = siblings.iter().position(|s| s == &node) {
                    segment.push_str(&format!(":nth-child({})", index + 1));
                }
            }
        }

        path.push(segment);
        current = parent;
    }

    path.reverse();
    path.join(" > ")
}
