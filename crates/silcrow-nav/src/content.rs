// File: silcrow-nav/src/content.rs
// Purpose: Turns the shared template into one page's mountable content

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::display::ScopeRegistry;
use crate::error::{NavError, NavResult};
use crate::markup::{Element, Fragment, Node};

/// Prefix of ids the core assigns to named sections
pub const RESERVED_PREFIX: &str = "sc-rsvd-";
/// Named slot receiving replacement content
pub const SECTION_TAG: &str = "sc-section";
/// Replacement content for the section named by its `target`
pub const REPLACE_TAG: &str = "sc-replace";
/// Authoring-only definitions, never mounted
pub const DEFINE_TAG: &str = "sc-define";
/// Attribute naming the display scope an element belongs to
pub const BELONG_ATTR: &str = "sc-belong";

static INVALID_SECTION_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{Nd}-]").expect("valid section name regex"));

static TITLE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("valid title placeholder regex"));

/// Id given to the section named `name`
pub fn section_id(name: &str) -> String {
    format!("{}{}", RESERVED_PREFIX, name)
}

/// Validates every section name and gives each section its reserved id
///
/// Names are trimmed and may contain only letters, digits and `-`.
pub fn prepare_sections(template: &mut Fragment) -> NavResult<usize> {
    let mut count = 0;
    template.try_for_each_element_mut(&mut |element: &mut Element| -> NavResult<()> {
        if !element.is(SECTION_TAG) {
            return Ok(());
        }

        let name = element.attr("name").unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(NavError::EmptySlotName);
        }
        if let Some(bad) = INVALID_SECTION_CHAR.find(&name) {
            let ch = bad.as_str().chars().next().unwrap_or_default();
            return Err(NavError::InvalidSlotName { name, ch });
        }

        element.set_attr("id", section_id(&name));
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

/// Checks that every `sc-belong` value in the template names a registered
/// scope, wherever it sits
pub fn check_belong_scopes(template: &Fragment, registry: &ScopeRegistry) -> NavResult<usize> {
    fn walk(nodes: &[Node], registry: &ScopeRegistry, checked: &mut usize) -> NavResult<()> {
        for element in nodes.iter().filter_map(Node::as_element) {
            if let Some(scope_id) = element.attr(BELONG_ATTR) {
                registry.scope(scope_id)?;
                *checked += 1;
            }
            walk(element.children(), registry, checked)?;
        }
        Ok(())
    }

    let mut checked = 0;
    walk(template.nodes(), registry, &mut checked)?;
    Ok(checked)
}

/// Builds the content of `page_id` from the prepared template
///
/// Drops definitions, removes content of scopes the page is not in, moves
/// replacement blocks into their sections and unwraps the sections.
pub fn render_page(
    template: &Fragment,
    registry: &ScopeRegistry,
    page_id: &str,
) -> NavResult<Fragment> {
    let mut content = template.clone();
    content.remove_by_tag(DEFINE_TAG);
    prune(content.nodes_mut(), registry, page_id)?;
    resolve_replacements(&mut content)?;
    content.unwrap_by_tag(SECTION_TAG);
    Ok(content)
}

/// Removes every element, with its whole subtree, whose `sc-belong` scope
/// does not contain `page_id`
pub fn prune(nodes: &mut Vec<Node>, registry: &ScopeRegistry, page_id: &str) -> NavResult<()> {
    let mut i = 0;
    while i < nodes.len() {
        let Node::Element(element) = &mut nodes[i] else {
            i += 1;
            continue;
        };

        let keep = match element.attr(BELONG_ATTR) {
            Some(scope_id) => registry.belongs(scope_id, page_id)?,
            None => true,
        };

        if keep {
            prune(element.children_mut(), registry, page_id)?;
            i += 1;
        } else {
            nodes.remove(i);
        }
    }
    Ok(())
}

/// Moves each `sc-replace` block's children into its target section
pub fn resolve_replacements(content: &mut Fragment) -> NavResult<()> {
    for mut replacement in content.remove_by_tag(REPLACE_TAG) {
        let target = replacement
            .attr("target")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(NavError::MissingReplaceTarget)?
            .to_string();

        match content.find_by_id_mut(&section_id(&target)) {
            Some(section) => section.set_children(replacement.take_children()),
            None => tracing::warn!(target = %target, "no section for replacement, dropped"),
        }
    }
    Ok(())
}

/// Fills `{name}` placeholders of a title template from route parameters
///
/// Unknown placeholders are kept verbatim.
pub fn format_title(template: &str, params: &HashMap<String, String>) -> String {
    TITLE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            params
                .get(caps[1].trim())
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
