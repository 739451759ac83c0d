//! Error types for class-scanner.
//!
//! Every failure that can reach a consumer of a scan is an [`Error`]. Errors
//! are yielded in place of the element that would have been produced, so a
//! consumer keeps everything it pulled before the failure.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("PHP grammar is incompatible with the tree-sitter runtime: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("filter stage failed: {0}")]
    Filter(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Wraps an error raised by a custom filter stage.
    pub fn filter(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Filter(err.into())
    }
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("root path does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("cannot read root path: {}", path.display())]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid exclude pattern `{pattern}`")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("failed to walk source tree")]
    Walk(#[from] ignore::Error),
}

/// A source file that could not be turned into a syntax tree.
#[derive(Error, Debug)]
#[error("failed to parse {}", file.display())]
pub struct ParseError {
    pub file: PathBuf,
    #[source]
    pub cause: ParseCause,
}

#[derive(Error, Debug)]
pub enum ParseCause {
    #[error("cannot read file")]
    Read(#[source] std::io::Error),

    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("parser produced no syntax tree")]
    NoTree,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid name pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
