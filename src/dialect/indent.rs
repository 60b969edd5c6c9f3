//! Indentation-delimited parsing for the IOS family (IOS, NX-OS, EOS).
//!
//! Depth comes from leading-whitespace width against a stack of open scopes.
//! Each scope establishes the width of its children from the first child it
//! sees; a later line whose width falls between established levels cannot be
//! resolved to a depth and is a parse error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::{Dialect, DialectKind};
use crate::errors::{CfgError, SourceContext};
use crate::tokens::{TokenKind, TokenSpan};
use crate::tree::{ConfigTree, Node, NodeKind};

pub struct IndentDialect {
    pub kind: DialectKind,
}

static INTERFACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*interface\s+(\S+)").unwrap());

impl Dialect for IndentDialect {
    fn kind(&self) -> DialectKind {
        self.kind
    }

    fn comment_marker(&self) -> &'static str {
        "!"
    }

    fn parse(&self, text: &str, source: &SourceContext) -> Result<ConfigTree, CfgError> {
        let mut tree = ConfigTree::new(self.kind);
        // Open ancestor lines: (indent width, node index), outermost first.
        let mut stack: Vec<(usize, usize)> = Vec::new();
        // Established child width per node, and for the top level.
        let mut child_width: Vec<Option<usize>> = Vec::new();
        let mut root_width: Option<usize> = None;

        for (offset, raw) in text.lines().enumerate() {
            let line = offset + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let width = raw.len() - raw.trim_start().len();
            let trimmed = raw.trim();

            while let Some(&(open_width, _)) = stack.last() {
                if open_width >= width {
                    stack.pop();
                } else {
                    break;
                }
            }
            let parent = stack.last().map(|&(_, idx)| idx);
            let depth = stack.len();

            if let Some(comment) = trimmed.strip_prefix('!') {
                tree.push(Node {
                    raw: raw.to_string(),
                    match_text: Some(comment.trim().to_string()),
                    kind: NodeKind::Comment,
                    parent,
                    depth,
                    line,
                });
                child_width.push(None);
                continue;
            }

            // Sibling widths must agree with what this scope established.
            let established = match parent {
                Some(p) => &mut child_width[p],
                None => &mut root_width,
            };
            match *established {
                Some(expected) if expected != width => {
                    return Err(CfgError::parse(
                        format!(
                            "inconsistent indentation: expected width {expected}, found {width}"
                        ),
                        source,
                        line,
                    ));
                }
                Some(_) => {}
                None => *established = Some(width),
            }

            let idx = tree.push(Node {
                raw: raw.to_string(),
                match_text: Some(trimmed.to_string()),
                kind: NodeKind::Command,
                parent,
                depth,
                line,
            });
            child_width.push(None);
            stack.push((width, idx));
        }
        Ok(tree)
    }

    fn classify(&self, line: &str) -> Vec<TokenSpan> {
        let mut spans = crate::tokens::scan_common(line);
        if let Some(caps) = INTERFACE_RE.captures(line) {
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
