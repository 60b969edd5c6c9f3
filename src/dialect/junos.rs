//! Brace-delimited Junos configuration parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::{Dialect, DialectKind};
use crate::errors::{CfgError, SourceContext};
use crate::tokens::{TokenKind, TokenSpan};
use crate::tree::{ConfigTree, Node, NodeKind};

pub struct JunosDialect;

static INTERFACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:ge|xe|et|em|fxp|st)-\d+/\d+/\d+(?:\.\d+)?|(?:lo|ae|irb|em)\d+(?:\.\d+)?)\b")
        .unwrap()
});

impl Dialect for JunosDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::JuniperJunos
    }

    fn comment_marker(&self) -> &'static str {
        "#"
    }

    fn parse(&self, text: &str, source: &SourceContext) -> Result<ConfigTree, CfgError> {
        let mut tree = ConfigTree::new(DialectKind::JuniperJunos);
        // Indices of the currently open scope nodes, outermost first.
        let mut stack: Vec<usize> = Vec::new();
        let mut last_open_line = 0;

        for (offset, raw) in text.lines().enumerate() {
            let line = offset + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let parent = stack.last().copied();
            let depth = stack.len();

            if let Some(comment) = comment_text(trimmed) {
                tree.push(Node {
                    raw: raw.to_string(),
                    match_text: Some(comment.to_string()),
                    kind: NodeKind::Comment,
                    parent,
                    depth,
                    line,
                });
                continue;
            }

            if trimmed == "}" || trimmed == "};" {
                let Some(open) = stack.pop() else {
                    return Err(CfgError::parse("unmatched closing brace", source, line));
                };
                tree.push(Node {
                    raw: raw.to_string(),
                    match_text: None,
                    kind: NodeKind::Closing,
                    parent: Some(open),
                    depth,
                    line,
                });
                continue;
            }

            if let Some(head) = trimmed.strip_suffix('{') {
                let idx = tree.push(Node {
                    raw: raw.to_string(),
                    match_text: Some(head.trim_end().to_string()),
                    kind: NodeKind::Command,
                    parent,
                    depth,
                    line,
                });
                stack.push(idx);
                last_open_line = line;
                continue;
            }

            let head = trimmed.strip_suffix(';').unwrap_or(trimmed);
            tree.push(Node {
                raw: raw.to_string(),
                match_text: Some(head.trim_end().to_string()),
                kind: NodeKind::Command,
                parent,
                depth,
                line,
            });
        }

        if !stack.is_empty() {
            return Err(CfgError::parse(
                format!("{} unclosed block(s) at end of input", stack.len()),
                source,
                last_open_line,
            ));
        }
        Ok(tree)
    }

    fn classify(&self, line: &str) -> Vec<TokenSpan> {
        let mut spans = crate::tokens::scan_common(line);
        for caps in INTERFACE_RE.captures_iter(line) {
            if let Some(group) = caps.get(1) {
                spans.push(TokenSpan {
                    kind: TokenKind::Interface,
                    start: group.start(),
                    end: group.end(),
                });
            }
        }
        spans
    }
}

/// The text of a comment line, with its markers stripped. `None` for
/// non-comment lines.
fn comment_text(trimmed: &str) -> Option<&str> {
    if trimmed.starts_with('#') {
        return Some(trimmed.trim_start_matches('#').trim());
    }
    if let Some(body) = trimmed.strip_prefix("/*") {
        return Some(body.strip_suffix("*/").unwrap_or(body).trim());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ConfigTree {
        let source = SourceContext::from_file("test.conf", text);
        JunosDialect.parse(text, &source).expect("parses")
    }

    #[test]
    fn statements_nest_under_open_braces() {
        let tree = parse("system {\n  host-name vsrx;\n}\n");
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[0].match_text.as_deref(), Some("system"));
        assert_eq!(tree.nodes[1].match_text.as_deref(), Some("host-name vsrx"));
        assert_eq!(tree.nodes[1].parent, Some(0));
        assert_eq!(tree.nodes[1].depth, 1);
        assert_eq!(tree.nodes[2].kind, NodeKind::Closing);
        assert_eq!(tree.nodes[2].parent, Some(0));
    }

    #[test]
    fn comments_keep_their_text() {
        let tree = parse("## Last changed: today\nsystem {\n}\n");
        assert_eq!(tree.nodes[0].kind, NodeKind::Comment);
        assert_eq!(
            tree.nodes[0].match_text.as_deref(),
            Some("Last changed: today")
        );
    }

    #[test]
    fn unmatched_closing_brace_is_a_parse_error() {
        let text = "system {\n}\n}\n";
        let source = SourceContext::from_file("bad.conf", text);
        let err = JunosDialect.parse(text, &source).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn unclosed_block_is_a_parse_error() {
        let text = "system {\n  services {\n  }\n";
        let source = SourceContext::from_file("bad.conf", text);
        let err = JunosDialect.parse(text, &source).unwrap_err();
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn interface_names_classify_as_interfaces() {
        let spans = JunosDialect.classify("  ge-0/0/0 {");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, TokenKind::Interface);
    }
}
