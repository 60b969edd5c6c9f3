//! Typed tokens extracted from matched configuration lines.
//!
//! Classification is lexical: a small set of keyword-context and literal-shape
//! rules shared across dialects, with each dialect adding its own interface
//! naming rule. Values in a sensitive position whose shape is unrecognizable
//! degrade to `literal` rather than aborting the run.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::dialect::DialectKind;
use crate::errors::CfgError;
use crate::tree::ConfigTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Interface,
    Username,
    Secret,
    Asn,
    Address,
    Literal,
}

impl TokenKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Username => "username",
            Self::Secret => "secret",
            Self::Asn => "asn",
            Self::Address => "address",
            Self::Literal => "literal",
        }
    }
}

/// One captured token. Field order is the serialized field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenRecord {
    pub dialect: DialectKind,
    pub path: Vec<String>,
    pub kind: TokenKind,
    pub original: String,
    pub anonymized: Option<String>,
    pub line: usize,
}

/// A classified byte range within one line.
#[derive(Debug, Clone, Copy)]
pub struct TokenSpan {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// A token lifted out of a line during rendering, before path attribution.
#[derive(Debug, Clone)]
pub struct TokenCapture {
    pub kind: TokenKind,
    pub original: String,
    pub anonymized: Option<String>,
}

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*user(?:name)?\s+(\S+)").unwrap());
static SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:authentication-key|encrypted-password|password|secret|community|md5|key)\s+(?:[0-9]\s+)?(\S+)",
    )
    .unwrap()
});
static SECRET_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9$./+=_:\-]+$").unwrap());
static ASN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:remote-as|local-as|peer-as|router bgp|bgp)\s+(\d+)\b").unwrap()
});
static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}(?:/\d{1,2})?").unwrap());
// Either a '::' compression somewhere, or four-plus uncompressed groups (a
// clock time only has three). The compressed form is tried first so the
// whole address wins over its uncompressed prefix.
static IPV6_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:[0-9A-Fa-f]{1,4}:){1,6}:(?:[0-9A-Fa-f]{1,4}(?::[0-9A-Fa-f]{1,4})*)?|(?:[0-9A-Fa-f]{1,4}:){3,7}[0-9A-Fa-f]{1,4})(?:/\d{1,3})?",
    )
    .unwrap()
});

/// Keyword-context and literal rules shared by every dialect.
pub fn scan_common(line: &str) -> Vec<TokenSpan> {
    let mut spans = Vec::new();

    if let Some(caps) = USERNAME_RE.captures(line) {
        if let Some(group) = caps.get(1) {
            spans.push(TokenSpan {
                kind: TokenKind::Username,
                start: group.start(),
                end: group.end(),
            });
        }
    }

    for caps in SECRET_RE.captures_iter(line) {
        if let Some(group) = caps.get(1) {
            let kind = if SECRET_SHAPE_RE.is_match(group.as_str()) {
                TokenKind::Secret
            } else {
                TokenKind::Literal
            };
            spans.push(TokenSpan {
                kind,
                start: group.start(),
                end: group.end(),
            });
        }
    }

    for caps in ASN_RE.captures_iter(line) {
        if let Some(group) = caps.get(1) {
            spans.push(TokenSpan {
                kind: TokenKind::Asn,
                start: group.start(),
                end: group.end(),
            });
        }
    }

    for m in IPV4_RE.find_iter(line) {
        spans.push(TokenSpan {
            kind: TokenKind::Address,
            start: m.start(),
            end: m.end(),
        });
    }

    for m in IPV6_RE.find_iter(line) {
        spans.push(TokenSpan {
            kind: TokenKind::Address,
            start: m.start(),
            end: m.end(),
        });
    }

    spans
}

/// Per-file accumulator attributing captures to their tree position.
pub struct TokenLog {
    dialect: DialectKind,
    records: Vec<TokenRecord>,
}

impl TokenLog {
    pub const fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, tree: &ConfigTree, idx: usize, captures: &[TokenCapture]) {
        if captures.is_empty() {
            return;
        }
        let path = tree.path_of(idx);
        let line = tree.nodes[idx].line;
        for capture in captures {
            self.records.push(TokenRecord {
                dialect: self.dialect,
                path: path.clone(),
                kind: capture.kind,
                original: capture.original.clone(),
                anonymized: capture.anonymized.clone(),
                line,
            });
        }
    }

    pub fn finish(self) -> Vec<TokenRecord> {
        self.records
    }
}

/// Persist records as JSON lines, in order. No file is created when there is
/// nothing to write.
pub fn write_token_log(path: &Path, records: &[TokenRecord]) -> Result<(), CfgError> {
    if records.is_empty() {
        return Ok(());
    }
    let mut file =
        File::create(path).map_err(|source| CfgError::io(path.to_path_buf(), source))?;
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|err| CfgError::invalid_request(err.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|source| CfgError::io(path.to_path_buf(), source))?;
        file.write_all(b"\n")
            .map_err(|source| CfgError::io(path.to_path_buf(), source))?;
    }
    Ok(())
}
