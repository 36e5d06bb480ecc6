use xmltree::Element;

fn name_matches(raw_name: &str, target: &str) -> bool {
    if raw_name.eq_ignore_ascii_case(target) {
        return true;
    }

    raw_name
        .rsplit_once(':')
        .map(|(_, suffix)| suffix.eq_ignore_ascii_case(target))
        .unwrap_or(false)
}

/// Get child element by name (case-insensitive)
pub(crate) fn get_child_ci<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    child_elements(el).find(|c| name_matches(&c.name, name))
}

/// Iterate over element children, skipping text and comments
pub(crate) fn child_elements(el: &Element) -> impl Iterator<Item = &Element> {
    el.children.iter().filter_map(|n| n.as_element())
}

/// Iterate over children with the given name (case-insensitive)
pub(crate) fn children_named<'a>(
    el: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    child_elements(el).filter(move |c| name_matches(&c.name, name))
}

/// Text of a named child; `None` when the child is missing or empty
pub(crate) fn child_text(el: &Element, name: &str) -> Option<String> {
    get_child_ci(el, name)
        .and_then(|e| e.get_text())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}
