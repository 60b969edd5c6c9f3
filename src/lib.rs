pub use crate::engine::{run, run_cfg, RunOptions, RunOutput, RunRequest, TokenDestination};
pub use crate::errors::{print_error, CfgError, ErrorKind, SourceContext};
pub use crate::tokens::{TokenKind, TokenRecord};

pub mod anonymize;
pub mod cli;
pub mod dialect;
pub mod engine;
pub mod errors;
pub mod matcher;
pub mod render;
pub mod tokens;
pub mod tree;
