//! Match expression compilation and tree walking.
//!
//! An expression is a `||`-separated path through the configuration
//! hierarchy. Each segment is a regex anchored at both ends unless the author
//! anchored it explicitly; the reserved segment `|>>|` selects the whole
//! subtree at that point (or, mid-expression, lets the following segment
//! match at any depth below), and a `|#|` prefix targets comment lines.

use std::collections::BTreeSet;
use std::collections::VecDeque;

use regex::Regex;

use crate::errors::CfgError;
use crate::tree::{ConfigTree, NodeKind};

/// Comment prefix that embeds a match expression inside an input file.
pub const DIRECTIVE_PREFIX: &str = "cfgslice:";

#[derive(Debug, Clone)]
pub struct MatchExpression {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Command(Regex),
    Comment(Regex),
    Descend,
}

impl MatchExpression {
    /// Compile a raw expression.
    pub fn compile(raw: &str) -> Result<Self, CfgError> {
        if raw.trim().is_empty() {
            return Err(CfgError::compile(raw, "expression is empty"));
        }

        let mut segments = Vec::new();
        for base in raw.split("||") {
            let mut remainder = base;
            loop {
                if remainder.is_empty() {
                    break;
                }

                if let Some(pos) = remainder.find("|>>|") {
                    let before = &remainder[..pos];
                    if !before.trim().is_empty() {
                        segments.push(command_segment(raw, before)?);
                    }
                    segments.push(Segment::Descend);
                    remainder = &remainder[pos + 4..];
                    continue;
                }

                if let Some(stripped) = remainder.strip_prefix("|#|") {
                    segments.push(comment_segment(raw, stripped)?);
                } else if !remainder.trim().is_empty() {
                    segments.push(command_segment(raw, remainder)?);
                }
                break;
            }
        }

        if segments.is_empty() {
            return Err(CfgError::compile(raw, "expression has no segments"));
        }
        if matches!(segments[0], Segment::Descend) {
            return Err(CfgError::compile(
                raw,
                "descendant marker needs a preceding segment to anchor it",
            ));
        }

        Ok(Self { segments })
    }

    /// Walk `tree` against this expression, merging hits into `selection`.
    pub fn apply(&self, tree: &ConfigTree, selection: &mut Selection) {
        let roots: Vec<usize> = tree.roots().collect();
        for root in roots {
            self.walk(tree, root, 0, selection);
        }
    }

    fn walk(&self, tree: &ConfigTree, idx: usize, segment: usize, selection: &mut Selection) {
        match &self.segments[segment] {
            Segment::Descend => {
                if segment + 1 == self.segments.len() {
                    selection.record_subtree(tree, idx);
                } else {
                    self.descend(tree, idx, segment + 1, selection);
                }
            }
            Segment::Command(_) | Segment::Comment(_) => {
                if !self.segment_matches(tree, idx, segment) {
                    return;
                }
                if segment + 1 == self.segments.len() {
                    selection.record_line(tree, idx);
                } else if matches!(self.segments[segment + 1], Segment::Descend) {
                    self.walk(tree, idx, segment + 1, selection);
                } else {
                    for &child in &tree.children[idx] {
                        self.walk(tree, child, segment + 1, selection);
                    }
                }
            }
        }
    }

    /// Shortest-path descent: on each branch, the next segment is tried at
    /// every level and descent stops at the first level where it matches.
    fn descend(&self, tree: &ConfigTree, idx: usize, segment: usize, selection: &mut Selection) {
        for &child in &tree.children[idx] {
            if self.segment_matches(tree, child, segment) {
                self.walk(tree, child, segment, selection);
            } else {
                self.descend(tree, child, segment, selection);
            }
        }
    }

    fn segment_matches(&self, tree: &ConfigTree, idx: usize, segment: usize) -> bool {
        let node = &tree.nodes[idx];
        let (regex, wanted) = match &self.segments[segment] {
            Segment::Command(re) => (re, NodeKind::Command),
            Segment::Comment(re) => (re, NodeKind::Comment),
            Segment::Descend => return true,
        };
        if node.kind != wanted {
            return false;
        }
        node.match_text
            .as_deref()
            .is_some_and(|text| regex.is_match(text))
    }
}

fn command_segment(raw: &str, fragment: &str) -> Result<Segment, CfgError> {
    Ok(Segment::Command(compile_fragment(raw, fragment)?))
}

fn comment_segment(raw: &str, fragment: &str) -> Result<Segment, CfgError> {
    Ok(Segment::Comment(compile_fragment(raw, fragment)?))
}

fn compile_fragment(raw: &str, fragment: &str) -> Result<Regex, CfgError> {
    let mut pattern = fragment.trim().to_string();
    if !pattern.starts_with('^') {
        pattern = format!("^(?:{pattern})");
    }
    if !pattern.ends_with('$') {
        pattern.push('$');
    }
    Regex::new(&pattern).map_err(|err| CfgError::compile(raw, err.to_string()))
}

// ============================================================================
// SELECTION - The merged result of walking one tree
// ============================================================================

/// Indices selected by one or more expressions, in source order.
///
/// Matches always carry their ancestor chain (and the closing braces of every
/// ancestor) so a hit renders inside its hierarchical context. A node under
/// an already-selected subtree is never recorded twice.
#[derive(Debug, Default)]
pub struct Selection {
    pub matched: bool,
    pub indices: BTreeSet<usize>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single matched line, with context.
    pub fn record_line(&mut self, tree: &ConfigTree, idx: usize) {
        self.add_ancestors(tree, idx);
        self.indices.insert(idx);
        self.add_closings(tree, idx);
        self.matched = true;
    }

    /// Record a whole matched subtree, with context.
    pub fn record_subtree(&mut self, tree: &ConfigTree, root: usize) {
        self.add_ancestors(tree, root);
        let mut queue = VecDeque::from([root]);
        while let Some(idx) = queue.pop_front() {
            self.indices.insert(idx);
            for &child in &tree.children[idx] {
                queue.push_back(child);
            }
        }
        self.matched = true;
    }

    fn add_ancestors(&mut self, tree: &ConfigTree, idx: usize) {
        let mut current = idx;
        while let Some(parent) = tree.nodes[current].parent {
            self.indices.insert(parent);
            self.add_closings(tree, parent);
            current = parent;
        }
    }

    fn add_closings(&mut self, tree: &ConfigTree, idx: usize) {
        for &child in &tree.children[idx] {
            if tree.nodes[child].kind == NodeKind::Closing {
                self.indices.insert(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{dialect_for, Dialect, DialectKind};
    use crate::errors::SourceContext;

    fn junos_tree(text: &str) -> ConfigTree {
        let source = SourceContext::from_file("test.conf", text);
        dialect_for(DialectKind::JuniperJunos)
            .parse(text, &source)
            .expect("parses")
    }

    fn select(tree: &ConfigTree, expr: &str) -> Selection {
        let compiled = MatchExpression::compile(expr).expect("compiles");
        let mut selection = Selection::new();
        compiled.apply(tree, &mut selection);
        selection
    }

    #[test]
    fn trailing_descend_selects_the_whole_subtree() {
        let tree = junos_tree("system {\n  host-name vsrx;\n}\ninterfaces {\n  ge-0/0/0;\n}\n");
        let selection = select(&tree, "system|>>|");
        assert!(selection.matched);
        let texts: Vec<&str> = selection
            .indices
            .iter()
            .map(|&i| tree.nodes[i].raw.as_str())
            .collect();
        assert_eq!(texts, vec!["system {", "  host-name vsrx;", "}"]);
    }

    #[test]
    fn leaf_match_carries_ancestor_context() {
        let tree = junos_tree("interfaces {\n  ge-0/0/0 {\n    unit 0;\n  }\n}\n");
        let selection = select(&tree, "interfaces||ge-.*||unit 0");
        let texts: Vec<&str> = selection
            .indices
            .iter()
            .map(|&i| tree.nodes[i].raw.as_str())
            .collect();
        assert_eq!(
            texts,
            vec!["interfaces {", "  ge-0/0/0 {", "    unit 0;", "  }", "}"]
        );
    }

    #[test]
    fn comment_pattern_matches() {
        let tree = junos_tree("## Last changed: today\nsystem {\n}\n");
        let selection = select(&tree, "|#|Last changed: .*");
        assert!(selection.matched);
    }

    #[test]
    fn mid_expression_descend_stops_at_the_first_matching_depth() {
        let tree = junos_tree("a {\n  b {\n    b {\n      c;\n    }\n  }\n}\n");
        let selection = select(&tree, "a|>>|b");
        // Only the outer b: descent stops where the segment first matches.
        let matched: Vec<usize> = selection
            .indices
            .iter()
            .copied()
            .filter(|&i| tree.nodes[i].match_text.as_deref() == Some("b"))
            .collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(tree.nodes[matched[0]].depth, 1);
    }

    #[test]
    fn zero_matches_is_not_an_error() {
        let tree = junos_tree("system {\n}\n");
        let selection = select(&tree, "nosuchblock|>>|");
        assert!(!selection.matched);
        assert!(selection.indices.is_empty());
    }

    #[test]
    fn empty_expression_fails_to_compile() {
        assert!(MatchExpression::compile("").is_err());
        assert!(MatchExpression::compile("  ").is_err());
    }

    #[test]
    fn leading_descend_marker_fails_to_compile() {
        assert!(MatchExpression::compile("|>>|").is_err());
        assert!(MatchExpression::compile("|>>|interfaces").is_err());
    }

    #[test]
    fn invalid_regex_fails_to_compile() {
        assert!(MatchExpression::compile("interfaces||ge-[").is_err());
    }

    #[test]
    fn matching_is_idempotent() {
        let tree = junos_tree("interfaces {\n  ge-0/0/0 {\n    unit 0;\n  }\n}\n");
        let first = select(&tree, "interfaces|>>|");
        let second = select(&tree, "interfaces|>>|");
        assert_eq!(first.indices, second.indices);
        assert_eq!(first.matched, second.matched);
    }
}
