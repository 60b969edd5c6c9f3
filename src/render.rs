//! Serialization of selected nodes back to configuration text.
//!
//! Raw lines are emitted verbatim in source order (or grouped by path in
//! path-sorted mode), so output stays dialect-faithful without re-indenting.
//! Anonymization and token capture both hook into this pass.

use std::collections::HashMap;

use crate::anonymize::Anonymizer;
use crate::dialect::{dialect_for, Dialect};
use crate::matcher::{Selection, DIRECTIVE_PREFIX};
use crate::tokens::{TokenCapture, TokenLog, TokenSpan};
use crate::tree::{ConfigTree, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputOrder {
    /// Source order: ascending position in the input file.
    Source,
    /// Grouped by top-level subtree, groups ordered by their command text.
    PathSorted,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub with_comments: bool,
    pub order: OutputOrder,
}

/// Render the selected nodes of one tree.
pub fn render(
    tree: &ConfigTree,
    selection: &Selection,
    options: RenderOptions,
    mut anonymizer: Option<&mut Anonymizer>,
    mut log: Option<&mut TokenLog>,
) -> String {
    let ordered: Vec<usize> = match options.order {
        OutputOrder::Source => selection.indices.iter().copied().collect(),
        OutputOrder::PathSorted => path_sorted(tree, selection),
    };

    let dialect = dialect_for(tree.dialect);
    let mut out = String::new();

    for idx in ordered {
        let node = &tree.nodes[idx];
        match node.kind {
            NodeKind::Closing => {
                out.push_str(&node.raw);
                out.push('\n');
            }
            NodeKind::Comment => {
                if is_directive(tree, idx) || !options.with_comments {
                    continue;
                }
                let text = match anonymizer.as_deref_mut() {
                    Some(tool) => {
                        let spans = dialect.classify(&node.raw);
                        scrub_line(&node.raw, &spans, Some(tool), false).0
                    }
                    None => node.raw.clone(),
                };
                out.push_str(&text);
                out.push('\n');
            }
            NodeKind::Command => {
                let want_tokens = log.is_some();
                if anonymizer.is_none() && !want_tokens {
                    out.push_str(&node.raw);
                    out.push('\n');
                    continue;
                }
                let spans = dialect.classify(&node.raw);
                let (text, captures) =
                    scrub_line(&node.raw, &spans, anonymizer.as_deref_mut(), want_tokens);
                if let Some(log) = log.as_deref_mut() {
                    log.record(tree, idx, &captures);
                }
                out.push_str(&text);
                out.push('\n');
            }
        }
    }
    out
}

/// Whether a comment node embeds a match directive. Directives are control
/// lines, never output.
pub fn is_directive(tree: &ConfigTree, idx: usize) -> bool {
    let node = &tree.nodes[idx];
    node.kind == NodeKind::Comment
        && node
            .match_text
            .as_deref()
            .is_some_and(|text| text.starts_with(DIRECTIVE_PREFIX))
}

/// Rewrite one line through the anonymizer, collecting captures.
fn scrub_line(
    raw: &str,
    spans: &[TokenSpan],
    mut anonymizer: Option<&mut Anonymizer>,
    want_captures: bool,
) -> (String, Vec<TokenCapture>) {
    let mut ordered: Vec<TokenSpan> = spans.to_vec();
    ordered.sort_by_key(|span| (span.start, span.end));

    let mut text = String::new();
    let mut captures = Vec::new();
    let mut last = 0;

    for span in ordered {
        if span.start < last {
            continue;
        }
        let original = &raw[span.start..span.end];
        let anonymized = match anonymizer.as_mut() {
            Some(tool) => tool.placeholder(span.kind, original),
            None => None,
        };
        if want_captures {
            captures.push(TokenCapture {
                kind: span.kind,
                original: original.to_string(),
                anonymized: anonymized.clone(),
            });
        }
        if let Some(replacement) = anonymized {
            text.push_str(&raw[last..span.start]);
            text.push_str(&replacement);
            last = span.end;
        }
    }
    text.push_str(&raw[last..]);
    (text, captures)
}

/// Selected indices grouped by top-level subtree, groups sorted by the
/// subtree root's command text. Within a group, source order is kept.
fn path_sorted(tree: &ConfigTree, selection: &Selection) -> Vec<usize> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut group_index: HashMap<usize, usize> = HashMap::new();

    for &idx in &selection.indices {
        let root = tree.top_ancestor(idx);
        let slot = *group_index.entry(root).or_insert_with(|| {
            let key = tree.nodes[root]
                .match_text
                .clone()
                .unwrap_or_else(|| tree.nodes[root].raw.trim().to_string());
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(idx);
    }

    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups.into_iter().flat_map(|(_, indices)| indices).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{parse_with_detect, DialectKind};
    use crate::errors::SourceContext;
    use crate::matcher::MatchExpression;

    fn tree_of(text: &str) -> ConfigTree {
        let source = SourceContext::from_file("test.conf", text);
        parse_with_detect(text, &source).expect("parses")
    }

    fn select(tree: &ConfigTree, exprs: &[&str]) -> Selection {
        let mut selection = Selection::new();
        for expr in exprs {
            MatchExpression::compile(expr)
                .expect("compiles")
                .apply(tree, &mut selection);
        }
        selection
    }

    const SOURCE_ORDER: RenderOptions = RenderOptions {
        with_comments: false,
        order: OutputOrder::Source,
    };

    #[test]
    fn source_order_reproduces_the_block_verbatim() {
        let text = "interfaces {\n  ge-0/0/0 {\n    unit 0;\n  }\n}\n";
        let tree = tree_of(text);
        let selection = select(&tree, &["interfaces|>>|"]);
        assert_eq!(render(&tree, &selection, SOURCE_ORDER, None, None), text);
    }

    #[test]
    fn comments_are_gated_by_the_flag() {
        let text = "! note\ninterface GigabitEthernet1\n ip address dhcp\n";
        let tree = tree_of(text);
        let selection = select(&tree, &["|#|note", "interface .*|>>|"]);

        let without = render(&tree, &selection, SOURCE_ORDER, None, None);
        assert!(!without.contains("! note"));

        let with = render(
            &tree,
            &selection,
            RenderOptions {
                with_comments: true,
                order: OutputOrder::Source,
            },
            None,
            None,
        );
        assert!(with.starts_with("! note\n"));
    }

    #[test]
    fn path_sorted_groups_subtrees_alphabetically() {
        let text = "interface GigabitEthernet2\n no shutdown\ninterface GigabitEthernet1\n no shutdown\n";
        let tree = tree_of(text);
        assert_eq!(tree.dialect, DialectKind::CiscoIos);
        let selection = select(&tree, &["interface .*|>>|"]);
        let rendered = render(
            &tree,
            &selection,
            RenderOptions {
                with_comments: false,
                order: OutputOrder::PathSorted,
            },
            None,
            None,
        );
        assert_eq!(
            rendered,
            "interface GigabitEthernet1\n no shutdown\ninterface GigabitEthernet2\n no shutdown\n"
        );
    }

    #[test]
    fn anonymizer_rewrites_sensitive_values_in_place() {
        let text = "username admin password 0 adminpass\n";
        let tree = tree_of(text);
        let selection = select(&tree, &[".*"]);
        let mut tool = Anonymizer::new();
        let rendered = render(&tree, &selection, SOURCE_ORDER, Some(&mut tool), None);
        assert_eq!(rendered, "username user1 password 0 scrambled1\n");
    }

    #[test]
    fn token_log_attributes_captures_to_their_path() {
        let text = "router bgp 65000\n neighbor 192.0.2.1 remote-as 65001\n";
        let tree = tree_of(text);
        let selection = select(&tree, &["router bgp .*|>>|"]);
        let mut log = TokenLog::new(tree.dialect);
        render(&tree, &selection, SOURCE_ORDER, None, Some(&mut log));
        let records = log.finish();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].path, vec!["router bgp 65000"]);
        assert_eq!(
            records[1].path,
            vec!["router bgp 65000", "neighbor 192.0.2.1 remote-as 65001"]
        );
        assert!(records.iter().all(|r| r.anonymized.is_none()));
    }
}
