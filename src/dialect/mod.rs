//! Configuration dialects.
//!
//! Each supported vendor syntax implements the [`Dialect`] capability trait
//! (parse, comment syntax, token classification); the detector picks one
//! implementation per input from structural cues in the first lines, and the
//! rest of the pipeline is dialect-agnostic.

use serde::Serialize;

use crate::errors::{CfgError, SourceContext};
use crate::tokens::TokenSpan;
use crate::tree::ConfigTree;

mod indent;
mod junos;
mod junos_set;

pub use indent::IndentDialect;
pub use junos::JunosDialect;
pub use junos_set::JunosSetDialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    JuniperJunos,
    JuniperJunosSet,
    CiscoIos,
    CiscoNxos,
    AristaEos,
}

impl DialectKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JuniperJunos => "juniper_junos",
            Self::JuniperJunosSet => "juniper_junos_set",
            Self::CiscoIos => "cisco_ios",
            Self::CiscoNxos => "cisco_nxos",
            Self::AristaEos => "arista_eos",
        }
    }
}

/// What a vendor syntax must provide: structure and lexical rules.
pub trait Dialect {
    fn kind(&self) -> DialectKind;

    /// The marker introducing a standalone comment line.
    fn comment_marker(&self) -> &'static str;

    fn parse(&self, text: &str, source: &SourceContext) -> Result<ConfigTree, CfgError>;

    /// Classified token spans within one raw line.
    fn classify(&self, line: &str) -> Vec<TokenSpan> {
        crate::tokens::scan_common(line)
    }
}

static JUNOS: JunosDialect = JunosDialect;
static JUNOS_SET: JunosSetDialect = JunosSetDialect;
static IOS: IndentDialect = IndentDialect {
    kind: DialectKind::CiscoIos,
};
static NXOS: IndentDialect = IndentDialect {
    kind: DialectKind::CiscoNxos,
};
static EOS: IndentDialect = IndentDialect {
    kind: DialectKind::AristaEos,
};

#[must_use]
pub fn dialect_for(kind: DialectKind) -> &'static dyn Dialect {
    match kind {
        DialectKind::JuniperJunos => &JUNOS,
        DialectKind::JuniperJunosSet => &JUNOS_SET,
        DialectKind::CiscoIos => &IOS,
        DialectKind::CiscoNxos => &NXOS,
        DialectKind::AristaEos => &EOS,
    }
}

/// Classify raw text from structural cues in its first non-blank lines.
///
/// Returns `None` when no heuristic fires; callers turn that into an
/// `UnrecognizedDialect` error.
#[must_use]
pub fn detect(text: &str) -> Option<DialectKind> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(50)
        .collect();
    if lines.is_empty() {
        return None;
    }

    let set_like = lines
        .iter()
        .filter(|line| {
            let t = line.trim_start();
            t.starts_with("set ") || t.starts_with("delete ")
        })
        .count();
    if set_like * 2 > lines.len() {
        return Some(DialectKind::JuniperJunosSet);
    }

    let brace_like = lines.iter().any(|line| {
        let t = line.trim();
        t.ends_with('{') || t == "}" || t.ends_with(';') || t.starts_with('#') || t.starts_with("/*")
    });
    if brace_like {
        return Some(DialectKind::JuniperJunos);
    }

    let ios_like = lines.iter().any(|line| {
        let t = line.trim_start();
        t.starts_with('!') || t.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
    });
    if !ios_like {
        return None;
    }

    if lines
        .iter()
        .any(|line| line.trim_start().starts_with("feature "))
    {
        return Some(DialectKind::CiscoNxos);
    }

    // EOS running configs indent with three spaces; IOS uses one.
    let indent_unit = lines
        .iter()
        .filter_map(|line| {
            let width = line.len() - line.trim_start().len();
            (width > 0).then_some(width)
        })
        .min();
    if indent_unit == Some(3) {
        return Some(DialectKind::AristaEos);
    }
    Some(DialectKind::CiscoIos)
}

/// Detect the dialect of `text` and parse it in one step.
pub fn parse_with_detect(text: &str, source: &SourceContext) -> Result<ConfigTree, CfgError> {
    let kind = detect(text).ok_or_else(|| CfgError::unrecognized_dialect(source))?;
    dialect_for(kind).parse(text, source)
}
