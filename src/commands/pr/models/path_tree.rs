//! Directory tree view of changed file paths.

use std::collections::BTreeMap;

use serde::Serialize;

use super::snapshot::normalize_path;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PathTree {
    dirs: BTreeMap<String, PathTree>,
    /// File name to full path.
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl PathTree {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = Self::default();
        for path in paths {
            root.insert(path.as_ref());
        }
        root
    }

    fn insert(&mut self, path: &str) {
        let normalized = normalize_path(path);
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        let Some((file, dirs)) = segments.split_last() else {
            return;
        };

        let mut node = self;
        for dir in dirs {
            node = node.dirs.entry((*dir).to_string()).or_default();
        }
        node.files.insert((*file).to_string(), normalized.clone());
    }

    /// Directories first, then files; each group alphabetical.
    pub fn nodes(&self) -> Vec<TreeNode> {
        let dirs = self.dirs.iter().map(|(name, subtree)| TreeNode {
            name: format!("{name}/"),
            path: None,
            children: subtree.nodes(),
        });
        let files = self.files.iter().map(|(name, path)| TreeNode {
            name: name.clone(),
            path: Some(path.clone()),
            children: Vec::new(),
        });
        dirs.chain(files).collect()
    }

    /// Render as an indented listing. `annotate` may append a suffix to
    /// each file line given its full path.
    pub fn render(&self, annotate: impl Fn(&str) -> Option<String>) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes(), 0, &annotate, &mut out);
        out
    }
}

fn render_nodes(
    nodes: &[TreeNode],
    depth: usize,
    annotate: &dyn Fn(&str) -> Option<String>,
    out: &mut String,
) {
    for node in nodes {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.name);
        if let Some(suffix) = node.path.as_deref().and_then(annotate) {
            out.push_str("  ");
            out.push_str(&suffix);
        }
        out.push('\n');
        render_nodes(&node.children, depth + 1, annotate, out);
    }
}
