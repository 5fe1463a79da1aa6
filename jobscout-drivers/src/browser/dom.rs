use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How deep [`DomNode`] subtrees are captured below an indexed element.
pub const SNAPSHOT_DEPTH: u32 = 4;

/// Snapshot of a DOM element as seen by the agent.
///
/// Indexed elements carry `index`; their descendants are captured for lookups
/// such as [`DomNode::file_upload_element`] and carry `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    #[serde(default)]
    pub index: Option<usize>,
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Absolute XPath used to find the live element again.
    pub xpath: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<DomNode>,
}

impl DomNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_file_input(&self) -> bool {
        self.tag.eq_ignore_ascii_case("input")
            && self
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("file"))
    }

    /// This node if it is a file input, otherwise the first file input below it
    /// in document order.
    ///
    /// ```
    /// use jobscout_drivers::DomNode;
    /// use std::collections::BTreeMap;
    ///
    /// let input = DomNode {
    ///     index: None,
    ///     tag: "input".into(),
    ///     attributes: BTreeMap::from([("type".to_string(), "file".to_string())]),
    ///     xpath: "/html/body/label/input".into(),
    ///     text: String::new(),
    ///     children: vec![],
    /// };
    /// let label = DomNode {
    ///     index: Some(3),
    ///     tag: "label".into(),
    ///     attributes: BTreeMap::new(),
    ///     xpath: "/html/body/label".into(),
    ///     text: "Upload resume".into(),
    ///     children: vec![input.clone()],
    /// };
    /// assert_eq!(label.file_upload_element(), Some(&input));
    /// ```
    pub fn file_upload_element(&self) -> Option<&DomNode> {
        if self.is_file_input() {
            return Some(self);
        }
        self.children.iter().find_map(DomNode::file_upload_element)
    }

    /// One line per element for the agent's view of the page.
    pub fn describe(&self) -> String {
        let mut line = format!("[{}]<{}", self.index.map_or("-".into(), |i| i.to_string()), self.tag);
        for key in ["type", "name", "aria-label", "placeholder", "href"] {
            if let Some(v) = self.attr(key) {
                line.push_str(&format!(" {key}=\"{}\"", truncate(v, 80)));
            }
        }
        line.push('>');
        line.push_str(&truncate(self.text.trim(), 80));
        line
    }
}

/// Handle to a live element, resolved through its XPath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub xpath: String,
}

/// Result row of a CSS selector query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub tag: String,
    #[serde(default)]
    pub text: String,
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}

/// Shared prelude: which elements are indexed, and how nodes are serialized.
const DOM_PRELUDE: &str = r#"
    const INTERACTIVE = 'a[href], button, input:not([type=hidden]), select, textarea, label, '
        + '[role=button], [role=link], [role=checkbox], [onclick], [contenteditable=true]';
    const xpathOf = (el) => {
        const parts = [];
        for (let n = el; n && n.nodeType === 1; n = n.parentNode) {
            let i = 1;
            for (let s = n.previousElementSibling; s; s = s.previousElementSibling) {
                if (s.tagName === n.tagName) i++;
            }
            parts.unshift(n.tagName.toLowerCase() + '[' + i + ']');
        }
        return '/' + parts.join('/');
    };
    const visible = (el) => {
        const r = el.getBoundingClientRect();
        return r.width > 0 && r.height > 0 && getComputedStyle(el).visibility !== 'hidden';
    };
    const snapshot = (el, index, depth) => {
        const attributes = {};
        for (const a of el.attributes) attributes[a.name] = a.value;
        return {
            index: index,
            tag: el.tagName.toLowerCase(),
            attributes: attributes,
            xpath: xpathOf(el),
            text: (el.innerText || el.value || '').trim().slice(0, 200),
            children: depth > 0
                ? Array.from(el.children).map((c) => snapshot(c, null, depth - 1))
                : [],
        };
    };
    const indexed = Array.from(document.querySelectorAll(INTERACTIVE)).filter(visible);
"#;

pub(crate) fn list_interactive_script() -> String {
    format!("{DOM_PRELUDE}\n    return indexed.map((el, i) => snapshot(el, i, 0));")
}

pub(crate) fn element_by_index_script() -> String {
    format!(
        "{DOM_PRELUDE}\n    const el = indexed[arguments[0]];\n    return el ? snapshot(el, arguments[0], {SNAPSHOT_DEPTH}) : null;"
    )
}

pub(crate) const FIND_ELEMENTS_SCRIPT: &str = r#"
    return Array.from(document.querySelectorAll(arguments[0])).map((el) => ({
        tag: el.tagName.toLowerCase(),
        text: (el.innerText || '').trim().slice(0, 200),
    }));
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(tag: &str, attrs: &[(&str, &str)], children: Vec<DomNode>) -> DomNode {
        DomNode {
            index: None,
            tag: tag.into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            xpath: format!("/html/body/{tag}"),
            text: String::new(),
            children,
        }
    }

    #[test]
    fn finds_nested_file_input() {
        let tree = node(
            "div",
            &[],
            vec![
                node("span", &[], vec![]),
                node("div", &[], vec![node("input", &[("type", "FILE")], vec![])]),
            ],
        );
        let found = tree.file_upload_element().expect("file input");
        assert_eq!(found.tag, "input");
    }

    #[test]
    fn text_inputs_are_not_upload_controls() {
        let tree = node("form", &[], vec![node("input", &[("type", "text")], vec![])]);
        assert!(tree.file_upload_element().is_none());
    }

    #[test]
    fn snapshot_json_deserializes() {
        let raw = json!({
            "index": 7,
            "tag": "button",
            "attributes": { "aria-label": "Easy Apply" },
            "xpath": "/html[1]/body[1]/button[2]",
            "text": "Easy Apply",
            "children": []
        });
        let n: DomNode = serde_json::from_value(raw).unwrap();
        assert_eq!(n.index, Some(7));
        assert_eq!(n.describe(), "[7]<button aria-label=\"Easy Apply\">Easy Apply");
    }

    #[test]
    fn scripts_embed_depth_and_return() {
        assert!(element_by_index_script().contains("snapshot(el, arguments[0], 4)"));
        assert!(list_interactive_script().trim_end().ends_with("snapshot(el, i, 0));"));
    }
}
