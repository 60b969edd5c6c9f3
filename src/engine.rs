//! The cfgslice execution pipeline.
//!
//! One invocation is a strict pipeline per input file: detect dialect, parse
//! to a tree, match every expression in a single set of walks, render the
//! selection, then merge per-file output in input order. Any error anywhere
//! aborts the whole run; a partial result would be misleading about match
//! completeness.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::Glob;
use walkdir::WalkDir;

use crate::anonymize::Anonymizer;
use crate::dialect::{dialect_for, parse_with_detect, Dialect};
use crate::errors::{CfgError, SourceContext};
use crate::matcher::{MatchExpression, Selection, DIRECTIVE_PREFIX};
use crate::render::{render, OutputOrder, RenderOptions};
use crate::tokens::{write_token_log, TokenLog, TokenRecord};
use crate::tree::{ConfigTree, NodeKind};

// ============================================================================
// REQUEST / OUTPUT TYPES
// ============================================================================

/// A full description of one invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Match expressions. May be empty, in which case inputs must carry
    /// inline directives.
    pub matches: Vec<String>,
    pub with_comments: bool,
    pub anonymize: bool,
    pub output_order: OutputOrder,
    /// Files, directories, or glob patterns, in output order.
    pub inputs: Vec<PathBuf>,
    pub token_output: Option<TokenDestination>,
}

#[derive(Debug, Clone)]
pub enum TokenDestination {
    Stdout,
    File(PathBuf),
}

/// Options for the [`run_cfg`] convenience entry point.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub with_comments: bool,
    pub tokens: bool,
    pub tokens_out: Option<PathBuf>,
    pub anonymize: bool,
}

/// The assembled result of one invocation. Immutable once returned.
#[derive(Debug, Default, PartialEq)]
pub struct RunOutput {
    pub matched: bool,
    pub stdout: String,
    pub tokens: Vec<TokenRecord>,
    pub warnings: Vec<String>,
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Execute a request over the provided inputs.
///
/// # Errors
/// Fails when match expressions are malformed, input paths cannot be
/// resolved or read, or any input cannot be parsed. Zero matches is a
/// normal outcome, reported through `RunOutput::matched`.
pub fn run(request: &RunRequest) -> Result<RunOutput, CfgError> {
    if request.inputs.is_empty() {
        return Err(CfgError::invalid_request("no input paths provided"));
    }

    let files = collect_inputs(&request.inputs)?;
    let expressions = request
        .matches
        .iter()
        .map(|raw| MatchExpression::compile(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut output = String::new();
    let mut tokens = Vec::new();
    let mut warnings = Vec::new();
    let mut matched_any = false;
    let mut any_expressions = !expressions.is_empty();
    let mut anonymizer = request.anonymize.then(Anonymizer::new);
    let multi_file = files.len() > 1;

    for path in &files {
        let content = fs::read_to_string(path).map_err(|source| CfgError::io(path.clone(), source))?;
        let source = SourceContext::from_file(path.display().to_string(), content.as_str());
        let tree = parse_with_detect(&content, &source)?;

        let inline = inline_expressions(&tree)?;
        let file_expressions: &[MatchExpression] = if expressions.is_empty() {
            any_expressions = any_expressions || !inline.is_empty();
            &inline
        } else {
            if !inline.is_empty() {
                warnings.push(format!(
                    "ignoring inline matches in '{}'; expressions were given explicitly",
                    path.display()
                ));
            }
            &expressions
        };

        let mut selection = Selection::new();
        for expression in file_expressions {
            expression.apply(&tree, &mut selection);
        }
        if selection.matched {
            matched_any = true;
        }

        let mut log = request
            .token_output
            .as_ref()
            .map(|_| TokenLog::new(tree.dialect));

        if selection.matched {
            let rendered = render(
                &tree,
                &selection,
                RenderOptions {
                    with_comments: request.with_comments,
                    order: request.output_order,
                },
                anonymizer.as_mut(),
                log.as_mut(),
            );
            if !rendered.is_empty() {
                let headed = if multi_file || request.output_order == OutputOrder::PathSorted {
                    format!("{}\n{rendered}", file_header(&tree, path))
                } else {
                    rendered
                };
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                output.push_str(&headed);
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
        }

        if let Some(log) = log {
            tokens.extend(log.finish());
        }
    }

    if !any_expressions {
        return Err(CfgError::invalid_request(
            "at least one match expression is required (via the request or inline directives)",
        ));
    }

    if let Some(TokenDestination::File(path)) = &request.token_output {
        write_token_log(path, &tokens)?;
    }

    Ok(RunOutput {
        matched: matched_any,
        stdout: output,
        tokens,
        warnings,
    })
}

/// Extract matching subtrees from configuration files.
///
/// The stable library entry point consumed by bindings and embedders; a thin
/// translation onto [`run`].
pub fn run_cfg(
    match_expressions: &[String],
    input_files: &[PathBuf],
    options: &RunOptions,
) -> Result<RunOutput, CfgError> {
    let token_output = options
        .tokens_out
        .clone()
        .map(TokenDestination::File)
        .or_else(|| options.tokens.then_some(TokenDestination::Stdout));

    let request = RunRequest {
        matches: match_expressions.to_vec(),
        with_comments: options.with_comments,
        anonymize: options.anonymize,
        output_order: OutputOrder::Source,
        inputs: input_files.to_vec(),
        token_output,
    };
    run(&request)
}

// ============================================================================
// INPUT COLLECTION
// ============================================================================

/// Resolve inputs to concrete files, preserving argument order. Directories
/// recurse in name order; glob patterns expand in name order; duplicates are
/// dropped.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CfgError> {
    let mut files = Vec::new();
    for input in inputs {
        let text = input.to_string_lossy();
        if text.contains('*') || text.contains('?') || text.contains('[') {
            expand_glob(&text, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            gather_dir(input, &mut files)?;
        } else {
            return Err(CfgError::io(
                input.clone(),
                io::Error::new(io::ErrorKind::NotFound, "input path not found"),
            ));
        }
    }

    let mut seen = HashSet::new();
    files.retain(|path| seen.insert(path.clone()));
    Ok(files)
}

fn expand_glob(pattern: &str, files: &mut Vec<PathBuf>) -> Result<(), CfgError> {
    let matcher = Glob::new(pattern)
        .map_err(|err| {
            CfgError::invalid_request(format!("invalid glob pattern '{pattern}': {err}"))
        })?
        .compile_matcher();

    let base = glob_base(pattern);
    let mut matched = Vec::new();
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().map_or_else(|| base.clone(), Path::to_path_buf);
            CfgError::io(path, err.into())
        })?;
        if entry.file_type().is_file() && matcher.is_match(entry.path()) {
            matched.push(entry.into_path());
        }
    }

    if matched.is_empty() {
        return Err(CfgError::invalid_request(format!(
            "glob pattern '{pattern}' matched no files"
        )));
    }
    files.extend(matched);
    Ok(())
}

/// The longest literal directory prefix of a glob pattern.
fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains('*') || text.contains('?') || text.contains('[') {
            break;
        }
        base.push(component);
    }
    if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base
    }
}

fn gather_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CfgError> {
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
            CfgError::io(path, err.into())
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(())
}

// ============================================================================
// PER-FILE HELPERS
// ============================================================================

/// Compile the match directives embedded in a tree's comments.
fn inline_expressions(tree: &ConfigTree) -> Result<Vec<MatchExpression>, CfgError> {
    let mut expressions = Vec::new();
    for node in &tree.nodes {
        if node.kind != NodeKind::Comment {
            continue;
        }
        let Some(text) = node.match_text.as_deref() else {
            continue;
        };
        if let Some(raw) = text.strip_prefix(DIRECTIVE_PREFIX) {
            expressions.push(MatchExpression::compile(raw.trim())?);
        }
    }
    Ok(expressions)
}

/// A one-line banner separating one file's matches from the next, in the
/// file's own comment syntax.
fn file_header(tree: &ConfigTree, path: &Path) -> String {
    let name = path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    let marker = dialect_for(tree.dialect).comment_marker();
    format!("{marker} cfgslice matches for {name}")
}
