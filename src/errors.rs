//! cfgslice error handling.
//!
//! One public error type for the whole pipeline; every failure carries enough
//! source context for miette to point at the offending line or expression.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Source context for error reporting: the file (or expression) an error
/// points into, kept alongside its content so diagnostics can render it.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when no source text applies (I/O errors, bad requests).
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "cfgslice".to_string(),
            content: context.to_string(),
        }
    }

    /// Convert to a NamedSource for use with miette error reporting.
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

/// The single error type: what went wrong, plus where.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct CfgError {
    pub kind: ErrorKind,
    pub source_info: SourceInfo,
    pub help: Option<String>,
}

/// All failure modes as a clean enum.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Input text matched no known configuration dialect.
    UnrecognizedDialect { path: String },
    /// Structurally invalid text for its dialect.
    Parse { message: String, line: usize },
    /// Malformed match expression.
    Compile { expression: String, message: String },
    /// Input path unreadable or missing.
    Io { path: PathBuf, message: String },
    /// The request itself is unusable (no inputs, no expressions, bad glob).
    InvalidRequest { message: String },
}

/// Where the error happened, in miette terms.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

impl ErrorKind {
    /// Error code suffix for diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnrecognizedDialect { .. } => "unrecognized_dialect",
            Self::Parse { .. } => "parse",
            Self::Compile { .. } => "compile",
            Self::Io { .. } => "io",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedDialect { path } => {
                write!(f, "unrecognized configuration dialect in '{path}'")
            }
            Self::Parse { message, line } => {
                write!(f, "parse error: {message} (line {line})")
            }
            Self::Compile {
                expression,
                message,
            } => {
                write!(f, "invalid match expression '{expression}': {message}")
            }
            Self::Io { path, message } => {
                write!(f, "failed to read '{}': {message}", path.display())
            }
            Self::InvalidRequest { message } => f.write_str(message),
        }
    }
}

impl Diagnostic for CfgError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("cfgslice::{}", self.kind.code_suffix())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

impl CfgError {
    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::UnrecognizedDialect { .. } => "no dialect heuristic matched".into(),
            ErrorKind::Parse { .. } => "invalid structure here".into(),
            ErrorKind::Compile { .. } => "malformed expression".into(),
            ErrorKind::Io { .. } => "unreadable input".into(),
            ErrorKind::InvalidRequest { .. } => "invalid request".into(),
        }
    }

    pub fn unrecognized_dialect(ctx: &SourceContext) -> Self {
        let first_line = ctx.content.lines().next().map_or(0, str::len);
        Self {
            kind: ErrorKind::UnrecognizedDialect {
                path: ctx.name.clone(),
            },
            source_info: SourceInfo {
                source: ctx.to_named_source(),
                primary_span: (0..first_line).into(),
            },
            help: Some(
                "supported dialects: Junos (braced and set-style), IOS, NX-OS, EOS".into(),
            ),
        }
    }

    pub fn parse(message: impl Into<String>, ctx: &SourceContext, line: usize) -> Self {
        Self {
            kind: ErrorKind::Parse {
                message: message.into(),
                line,
            },
            source_info: SourceInfo {
                source: ctx.to_named_source(),
                primary_span: line_span(&ctx.content, line),
            },
            help: None,
        }
    }

    pub fn compile(expression: &str, message: impl Into<String>) -> Self {
        let ctx = SourceContext::from_file("match expression", expression);
        Self {
            kind: ErrorKind::Compile {
                expression: expression.to_string(),
                message: message.into(),
            },
            source_info: SourceInfo {
                source: ctx.to_named_source(),
                primary_span: (0..expression.len()).into(),
            },
            help: Some(
                "segments are separated by '||'; '|>>|' selects a whole subtree and \
                 '|#|' targets comments"
                    .into(),
            ),
        }
    }

    pub fn io(path: PathBuf, source: io::Error) -> Self {
        let ctx = SourceContext::fallback(&path.display().to_string());
        Self {
            kind: ErrorKind::Io {
                path,
                message: source.to_string(),
            },
            source_info: SourceInfo {
                source: ctx.to_named_source(),
                primary_span: (0..0).into(),
            },
            help: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        let message = message.into();
        let ctx = SourceContext::fallback(&message);
        Self {
            kind: ErrorKind::InvalidRequest { message },
            source_info: SourceInfo {
                source: ctx.to_named_source(),
                primary_span: (0..0).into(),
            },
            help: None,
        }
    }
}

/// Byte span of a 1-based source line, for labeling parse errors.
pub fn line_span(content: &str, line: usize) -> SourceSpan {
    let mut offset = 0;
    for (idx, text) in content.lines().enumerate() {
        if idx + 1 == line {
            return (offset..offset + text.len()).into();
        }
        offset += text.len() + 1;
    }
    (0..0).into()
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a CfgError with full miette diagnostics.
///
/// Use this for user-facing error display in CLI contexts.
pub fn print_error(error: CfgError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_span_points_at_requested_line() {
        let content = "first\nsecond\nthird";
        let span = line_span(content, 2);
        assert_eq!(span.offset(), 6);
        assert_eq!(span.len(), 6);
    }

    #[test]
    fn display_carries_line_number() {
        let ctx = SourceContext::from_file("sample.conf", "a\nb\n}");
        let err = CfgError::parse("unmatched closing brace", &ctx, 3);
        assert!(err.to_string().contains("line 3"));
    }
}
