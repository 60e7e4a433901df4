//! Normalization of the element tree for one target API.
//!
//! Strip mode drops every element whose `api` attribute does not name the
//! target. Merge mode folds the variants written for a list of source APIs
//! into the target API, keeping the best-matching variant of each
//! definition.

use std::collections::VecDeque;

use crate::tree::{Element, Node};
use crate::types::FatalError;
use crate::util::api_name_match;

/// Removes every element with an `api` attribute that does not list `api`.
/// Elements without the attribute always stay.
pub fn strip_nonmatching_apis(root: &mut Element, api: &str) {
    let mut queue: VecDeque<&mut Element> = VecDeque::new();
    queue.push_back(root);
    while let Some(parent) = queue.pop_front() {
        parent.children.retain(|node| match node {
            Node::Element(e) => match e.attr("api") {
                Some(list) => api_name_match(api, Some(list)),
                None => true,
            },
            Node::Text(_) => true,
        });
        queue.extend(parent.elements_mut());
    }
}

/// Merges the variants for `from_apis` into `to_api`. The priority order
/// is `to_api` first, then `from_apis` in the given order.
pub fn merge_apis(root: &mut Element, from_apis: &[String], to_api: &str) -> Result<(), FatalError> {
    let mut priority = vec![String::from(to_api)];
    priority.extend(from_apis.iter().filter(|a| a.as_str() != to_api).cloned());

    let mut queue: VecDeque<(String, &mut Element)> = VecDeque::new();
    queue.push_back((format!("/{}", root.name), root));
    while let Some((xpath, parent)) = queue.pop_front() {
        merge_children(parent, &xpath, &priority)?;
        for child in parent.elements_mut() {
            let path = format!("{}/{}", xpath, child.name);
            queue.push_back((path, child));
        }
    }
    Ok(())
}

/// Name a definition variant is matched on, when the tag takes part in merging.
fn definition_name(element: &Element) -> Option<String> {
    match element.name.as_str() {
        "type" => element
            .attr("name")
            .map(String::from)
            .or_else(|| element.child_text("name")),
        "member" | "param" => element.child_text("name"),
        "enum" | "feature" => element.attr("name").map(String::from),
        "require" => element
            .attr("depends")
            .or_else(|| element.attr("feature"))
            .map(String::from),
        "command" => element
            .attr("name")
            .map(String::from)
            .or_else(|| element.find("proto").and_then(|p| p.child_text("name"))),
        _ => None,
    }
}

fn merge_children(parent: &mut Element, xpath: &str, priority: &[String]) -> Result<(), FatalError> {
    let to_api = priority[0].as_str();

    parent
        .children
        .retain(|n| !matches!(n, Node::Element(e) if e.name == "remove"));

    for child in parent.elements_mut() {
        if let Some(supported) = child.attr("supported") {
            if priority.iter().any(|a| api_name_match(a, Some(supported))) {
                child.set_attr("supported", to_api);
            }
        }
        // Unnamed require blocks are never collapsed, only retargeted.
        if child.name == "require" && definition_name(child).is_none() {
            if let Some(api) = child.attr("api") {
                if priority.iter().any(|a| api_name_match(a, Some(api))) {
                    child.set_attr("api", to_api);
                }
            }
        }
    }

    let len = parent.children.len();
    let mut removed = vec![false; len];
    for idx in 0..len {
        if removed[idx] {
            continue;
        }
        let (tag, name) = match &parent.children[idx] {
            Node::Element(e) if e.attr("api").is_some() => match definition_name(e) {
                Some(name) => (e.name.clone(), name),
                None if matches!(e.name.as_str(), "type" | "member" | "param" | "command") => {
                    return Err(FatalError::SchemaViolation {
                        xpath: format!("{}/{}", xpath, e.name),
                        desc: String::from("element has no discoverable name"),
                    });
                }
                None => continue,
            },
            _ => continue,
        };

        let variants: Vec<usize> = (idx..len)
            .filter(|&j| !removed[j])
            .filter(|&j| match &parent.children[j] {
                Node::Element(e) => {
                    e.name == tag
                        && e.attr("api").is_some()
                        && definition_name(e).as_deref() == Some(name.as_str())
                }
                Node::Text(_) => false,
            })
            .collect();

        let variant = |j: usize| match &parent.children[j] {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        };

        let mut best_api = None;
        let mut requires = None;
        for api in priority.iter() {
            for &j in variants.iter() {
                if let Some(e) = variant(j) {
                    if requires.is_none() && e.attr("api") == Some(api.as_str()) {
                        requires = e.attr("requires").map(String::from);
                    }
                    if best_api.is_none() && api_name_match(api, e.attr("api")) {
                        best_api = e.attr("api").map(String::from);
                    }
                }
            }
        }

        let best_api = match best_api {
            Some(api) => api,
            None => {
                return Err(FatalError::NoMatchingVariant {
                    xpath: format!("{}/{}", xpath, tag),
                    name,
                });
            }
        };

        let best: Vec<usize> = variants
            .iter()
            .copied()
            .filter(|&j| variant(j).and_then(|e| e.attr("api")) == Some(best_api.as_str()))
            .collect();
        if best.len() > 1 {
            return Err(FatalError::AmbiguousVariant {
                xpath: format!("{}/{}", xpath, tag),
                name,
                api: best_api,
            });
        }

        for &j in variants.iter() {
            if best.contains(&j) {
                if let Node::Element(e) = &mut parent.children[j] {
                    if let (Some(requires), None) = (&requires, e.attr("requires")) {
                        let requires = requires.clone();
                        e.set_attr("requires", &requires);
                    }
                    e.set_attr("api", to_api);
                }
            } else {
                removed[j] = true;
            }
        }
    }

    let mut idx = 0;
    parent.children.retain(|_| {
        let keep = !removed[idx];
        idx += 1;
        keep
    });
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn ty(name: &str, api: &str) -> Element {
        Element::new("type").with_attr("name", name).with_attr("api", api)
    }

    fn names_and_apis(parent: &Element) -> Vec<(String, Option<String>)> {
        parent
            .elements()
            .map(|e| (e.attr("name").unwrap_or("").to_string(), e.attr("api").map(String::from)))
            .collect()
    }

    #[test]
    fn test_strip() {
        let mut root = Element::new("registry").with_child(
            Element::new("types")
                .with_child(ty("Vec3", "graphics"))
                .with_child(ty("Vec3", "compute"))
                .with_child(Element::new("type").with_attr("name", "Plain"))
                .with_child(ty("Both", "compute,graphics")),
        );
        strip_nonmatching_apis(&mut root, "graphics");
        let types = root.find("types").unwrap();
        assert_eq!(
            names_and_apis(types),
            vec![
                ("Vec3".into(), Some("graphics".into())),
                ("Plain".into(), None),
                ("Both".into(), Some("compute,graphics".into())),
            ]
        );
    }

    #[test]
    fn test_merge_best_match() {
        let mut root = Element::new("registry").with_child(
            Element::new("types")
                .with_child(ty("Foo", "vulkansc").with_attr("requires", "Bar"))
                .with_child(ty("Foo", "vulkanbase")),
        );
        merge_apis(&mut root, &["vulkanbase".into()], "vulkansc").unwrap();
        let types = root.find("types").unwrap();
        assert_eq!(names_and_apis(types), vec![("Foo".into(), Some("vulkansc".into()))]);
        assert_eq!(types.find("type").unwrap().attr("requires"), Some("Bar"));
    }

    #[test]
    fn test_merge_propagates_requires_and_drops_remove() {
        let mut root = Element::new("registry")
            .with_child(
                Element::new("types")
                    .with_child(ty("Foo", "vulkanbase"))
                    .with_child(ty("Foo", "vulkan").with_attr("requires", "Bar")),
            )
            .with_child(
                Element::new("feature")
                    .with_attr("name", "VK_VERSION_1_0")
                    .with_child(Element::new("remove")),
            )
            .with_child(Element::new("extension").with_attr("supported", "vulkanbase"));
        merge_apis(&mut root, &["vulkanbase".into(), "vulkan".into()], "vulkansc").unwrap();
        let survivor = root.find("types").unwrap().find("type").unwrap();
        assert_eq!(survivor.attr("api"), Some("vulkansc"));
        assert_eq!(survivor.attr("requires"), Some("Bar"));
        assert!(root.find("feature").unwrap().find("remove").is_none());
        assert_eq!(root.find("extension").unwrap().attr("supported"), Some("vulkansc"));
    }

    #[test]
    fn test_merge_ambiguous_is_fatal() {
        let mut root = Element::new("registry").with_child(
            Element::new("types")
                .with_child(ty("Foo", "vulkan"))
                .with_child(ty("Foo", "vulkan")),
        );
        match merge_apis(&mut root, &[], "vulkan") {
            Err(FatalError::AmbiguousVariant { name, .. }) => assert_eq!(name, "Foo"),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_merge_without_matching_variant_is_fatal() {
        let mut root = Element::new("registry").with_child(
            Element::new("types")
                .with_child(ty("Foo", "vulkan"))
                .with_child(ty("Other", "xr")),
        );
        match merge_apis(&mut root, &["vulkan".into()], "vulkansc") {
            Err(FatalError::NoMatchingVariant { xpath, name }) => {
                assert_eq!(xpath, "/registry/types/type");
                assert_eq!(name, "Other");
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_merge_retargets_unnamed_require() {
        let mut root = Element::new("registry").with_child(
            Element::new("feature")
                .with_attr("name", "VK_VERSION_1_0")
                .with_attr("api", "vulkan,vulkansc")
                .with_child(Element::new("require"))
                .with_child(Element::new("require").with_attr("api", "vulkan"))
                .with_child(Element::new("require").with_attr("api", "vulkan"))
                .with_child(Element::new("require").with_attr("api", "xr")),
        );
        merge_apis(&mut root, &["vulkan".into()], "vulkansc").unwrap();
        let apis: Vec<_> = root
            .find("feature")
            .unwrap()
            .elements()
            .map(|e| e.attr("api").map(String::from))
            .collect();
        assert_eq!(
            apis,
            vec![None, Some("vulkansc".into()), Some("vulkansc".into()), Some("xr".into())]
        );
    }

    #[test]
    fn test_merge_order_independent() {
        let build = || {
            Element::new("registry").with_child(
                Element::new("types")
                    .with_child(ty("A", "b1"))
                    .with_child(ty("B", "b2")),
            )
        };
        let mut first = build();
        let mut second = build();
        merge_apis(&mut first, &["b1".into(), "b2".into()], "t").unwrap();
        merge_apis(&mut second, &["b2".into(), "b1".into()], "t").unwrap();
        assert_eq!(first, second);
    }
}
