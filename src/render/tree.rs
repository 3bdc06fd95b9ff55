/// Indented tree rendering of nested records.
use console::style;
use serde_json::Value;

/// Label used for each element of a sequence.
pub const LIST_ITEM_LABEL: &str = "┐";

/// A node of a renderable tree. Labels may span several lines (e.g. an
/// embedded table); continuation lines are indented under the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Append a child and return `self` for chaining.
    #[must_use]
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: TreeNode) {
        self.children.push(child);
    }
}

/// Build a tree from a record. Mapping keys become bold labels; scalars
/// render as `key: value`; sequences as `key (n items)` with one child per
/// element.
#[must_use]
pub fn build_tree(data: &Value, label: Option<&str>) -> TreeNode {
    let mut root = TreeNode::new(label.map(|l| style(l).bold().to_string()).unwrap_or_default());
    add_children(&mut root, data);
    root
}

fn add_children(tree: &mut TreeNode, data: &Value) {
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                let key_label = style(key).bold();
                match value {
                    Value::Object(_) => {
                        let mut subtree = TreeNode::new(key_label.to_string());
                        add_children(&mut subtree, value);
                        tree.push(subtree);
                    }
                    Value::Array(items) => {
                        let mut subtree = TreeNode::new(format!(
                            "{key_label} {}",
                            style(format!("({} items)", items.len())).dim()
                        ));
                        add_children(&mut subtree, value);
                        tree.push(subtree);
                    }
                    scalar => tree.push(TreeNode::new(format!("{key_label}: {}", scalar_text(scalar)))),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let mut subtree = TreeNode::new(LIST_ITEM_LABEL);
                add_children(&mut subtree, item);
                tree.push(subtree);
            }
        }
        scalar => tree.push(TreeNode::new(scalar_text(scalar))),
    }
}

/// Scalar as display text: strings unquoted, everything else as JSON.
#[must_use]
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_owned(),
        other => other.to_string(),
    }
}

/// Render a tree with box-drawing connectors. An empty root label is omitted
/// and its children are drawn at the top level.
#[must_use]
pub fn render_tree(root: &TreeNode) -> String {
    let mut out = String::new();

    if root.label.is_empty() {
        write_children(&root.children, "", &mut out);
    } else {
        let mut lines = root.label.lines();
        if let Some(first) = lines.next() {
            out.push_str(first);
            out.push('\n');
        }
        let cont_prefix = if root.children.is_empty() { "" } else { "│ " };
        for line in lines {
            out.push_str(cont_prefix);
            out.push_str(line);
            out.push('\n');
        }
        write_children(&root.children, "", &mut out);
    }

    out
}

fn write_children(children: &[TreeNode], prefix: &str, out: &mut String) {
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        write_node(child, prefix, i + 1 == count, out);
    }
}

fn write_node(node: &TreeNode, prefix: &str, is_last: bool, out: &mut String) {
    let connector = if is_last { "└── " } else { "├── " };
    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });

    let mut lines = node.label.lines();
    out.push_str(prefix);
    out.push_str(connector);
    out.push_str(lines.next().unwrap_or_default());
    out.push('\n');

    let cont_prefix = if node.children.is_empty() {
        child_prefix.clone()
    } else {
        format!("{child_prefix}│ ")
    };
    for line in lines {
        out.push_str(&cont_prefix);
        out.push_str(line);
        out.push('\n');
    }

    write_children(&node.children, &child_prefix, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_render_nested_record() {
        console::set_colors_enabled(false);
        let data = json!({"a": 1, "b": {"c": "two"}, "l": [1, 2]});
        let rendered = render_tree(&build_tree(&data, None));
        let expected = "\
├── a: 1
├── b
│   └── c: two
└── l (2 items)
    ├── ┐
    │   └── 1
    └── ┐
        └── 2
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_with_root_label() {
        console::set_colors_enabled(false);
        let rendered = render_tree(&build_tree(&json!({"x": null}), Some("Root")));
        assert_eq!(rendered, "Root\n└── x: None\n");
    }

    #[test]
    fn test_multiline_label_is_indented() {
        let tree = TreeNode::new("")
            .with_child(TreeNode::new("Services").with_child(TreeNode::new("row1\nrow2")))
            .with_child(TreeNode::new("End"));
        let expected = "\
├── Services
│   └── row1
│       row2
└── End
";
        assert_eq!(render_tree(&tree), expected);
    }
}
