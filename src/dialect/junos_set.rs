//! Set-style Junos configuration parsing.
//!
//! Each `set ...` line is one root-to-leaf path; lines sharing a prefix merge
//! into one tree. Splitting a line into hierarchy levels needs a little
//! schema knowledge: some keywords pair with the following word to form a
//! single level (`unit 0`, `family inet`), and some absorb the whole rest of
//! the line (`description ...`, `address ...`).

use crate::dialect::{junos, Dialect, DialectKind};
use crate::errors::{CfgError, SourceContext};
use crate::tokens::TokenSpan;
use crate::tree::{ConfigTree, Node, NodeKind};

pub struct JunosSetDialect;

/// Keywords that take exactly one argument on the same hierarchy level.
const PAIR_KEYWORDS: &[&str] = &[
    "unit", "family", "vlan-id", "group", "term", "instance", "area", "interface", "neighbor",
    "policy", "rule", "zone", "pool",
];

/// Keywords that absorb the rest of the line as a single leaf level.
const TAIL_KEYWORDS: &[&str] = &[
    "address",
    "description",
    "host-name",
    "authentication-key",
    "encrypted-password",
    "community",
    "remote-as",
    "local-as",
    "peer-as",
    "key",
];

impl Dialect for JunosSetDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::JuniperJunosSet
    }

    fn comment_marker(&self) -> &'static str {
        "#"
    }

    fn parse(&self, text: &str, source: &SourceContext) -> Result<ConfigTree, CfgError> {
        let mut tree = ConfigTree::new(DialectKind::JuniperJunosSet);

        for (offset, raw) in text.lines().enumerate() {
            let line = offset + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with('#') {
                tree.push(Node {
                    raw: raw.to_string(),
                    match_text: Some(trimmed.trim_start_matches('#').trim().to_string()),
                    kind: NodeKind::Comment,
                    parent: None,
                    depth: 0,
                    line,
                });
                continue;
            }

            let rest = trimmed
                .strip_prefix("set ")
                .or_else(|| trimmed.strip_prefix("delete "))
                .ok_or_else(|| {
                    CfgError::parse("expected a set or delete statement", source, line)
                })?;

            let mut parent: Option<usize> = None;
            let mut prefix = String::from("set");
            for level in split_levels(rest) {
                prefix.push(' ');
                prefix.push_str(&level);
                parent = Some(match tree.find_child(parent, &level) {
                    Some(existing) => existing,
                    None => {
                        let depth = parent.map_or(0, |p| tree.nodes[p].depth + 1);
                        tree.push(Node {
                            raw: prefix.clone(),
                            match_text: Some(level),
                            kind: NodeKind::Command,
                            parent,
                            depth,
                            line,
                        })
                    }
                });
            }
        }
        Ok(tree)
    }

    fn classify(&self, line: &str) -> Vec<TokenSpan> {
        // Same lexical surface as braced Junos.
        junos::JunosDialect.classify(line)
    }
}

/// Split the body of a set statement into hierarchy levels.
fn split_levels(rest: &str) -> Vec<String> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let mut levels = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        if TAIL_KEYWORDS.contains(&word) && i + 1 < words.len() {
            levels.push(words[i..].join(" "));
            break;
        }
        if PAIR_KEYWORDS.contains(&word) && i + 1 < words.len() {
            levels.push(format!("{} {}", word, words[i + 1]));
            i += 2;
            continue;
        }
        levels.push(word.to_string());
        i += 1;
    }
    levels
}
