//! Parsed configuration trees.
//!
//! Nodes live in a flat arena indexed by position; parent/child links are
//! indices, which keeps ownership trivial and makes subtree selection cheap.

use crate::dialect::DialectKind;

/// What a parsed line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An ordinary configuration statement.
    Command,
    /// A comment line (`!`, `#`, `/* */` depending on dialect).
    Comment,
    /// A closing brace line in braced dialects.
    Closing,
}

/// One configuration statement, verbatim.
#[derive(Debug, Clone)]
pub struct Node {
    /// The source line exactly as read, including indentation.
    pub raw: String,
    /// Normalized text used for matching: trimmed, trailing `{`/`;` stripped,
    /// comment markers stripped. `None` for closing braces.
    pub match_text: Option<String>,
    pub kind: NodeKind,
    pub parent: Option<usize>,
    pub depth: usize,
    /// 1-based source line number.
    pub line: usize,
}

/// The parse result for one input file. Immutable once built.
#[derive(Debug)]
pub struct ConfigTree {
    pub dialect: DialectKind,
    pub nodes: Vec<Node>,
    /// Children of each node, in source order. Indexed in parallel with `nodes`.
    pub children: Vec<Vec<usize>>,
}

impl ConfigTree {
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            nodes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append a node, wiring it under its parent. Returns the new index.
    pub fn push(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        if let Some(parent) = node.parent {
            self.children[parent].push(idx);
        }
        self.nodes.push(node);
        self.children.push(Vec::new());
        idx
    }

    /// Top-level nodes in source order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(idx, _)| idx)
    }

    /// Existing child of `parent` (or root when `None`) whose match text
    /// equals `text`. Used by the set-style parser to merge prefixes.
    pub fn find_child(&self, parent: Option<usize>, text: &str) -> Option<usize> {
        let matches = |idx: &usize| {
            let node = &self.nodes[*idx];
            node.kind == NodeKind::Command && node.match_text.as_deref() == Some(text)
        };
        match parent {
            Some(p) => self.children[p].iter().copied().find(|i| matches(i)),
            None => self.roots().find(|i| matches(i)),
        }
    }

    /// Command texts from the root down to `idx`, inclusive.
    pub fn path_of(&self, idx: usize) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            if let Some(text) = &self.nodes[i].match_text {
                path.push(text.clone());
            }
            current = self.nodes[i].parent;
        }
        path.reverse();
        path
    }

    /// The top-level ancestor of `idx` (or `idx` itself if it is a root).
    pub fn top_ancestor(&self, idx: usize) -> usize {
        let mut current = idx;
        while let Some(parent) = self.nodes[current].parent {
            current = parent;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str, parent: Option<usize>, depth: usize) -> Node {
        Node {
            raw: text.to_string(),
            match_text: Some(text.to_string()),
            kind: NodeKind::Command,
            parent,
            depth,
            line: 1,
        }
    }

    #[test]
    fn push_wires_children_in_order() {
        let mut tree = ConfigTree::new(DialectKind::CiscoIos);
        let root = tree.push(node("interfaces", None, 0));
        let a = tree.push(node("ge-0/0/0", Some(root), 1));
        let b = tree.push(node("ge-0/0/1", Some(root), 1));
        assert_eq!(tree.children[root], vec![a, b]);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![root]);
    }

    #[test]
    fn path_climbs_to_root() {
        let mut tree = ConfigTree::new(DialectKind::JuniperJunos);
        let root = tree.push(node("protocols", None, 0));
        let mid = tree.push(node("ospf", Some(root), 1));
        let leaf = tree.push(node("area 0.0.0.0", Some(mid), 2));
        assert_eq!(tree.path_of(leaf), vec!["protocols", "ospf", "area 0.0.0.0"]);
        assert_eq!(tree.top_ancestor(leaf), root);
    }
}
