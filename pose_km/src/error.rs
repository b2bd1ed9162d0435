use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal loader failures. Anything scoped to a single table is a
/// [`LoadWarning`] instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data root {0} does not exist")]
    MissingRoot(PathBuf),
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A source table that was skipped. The run continues without it.
#[derive(Debug, Error)]
pub enum LoadWarning {
    #[error("{path}: unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: no data rows")]
    Empty { path: PathBuf },
    #[error("{path}:{line}: expected {expected} cells, found {found}")]
    Width {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{path}:{line}: cell {column} is not a number: {text:?}")]
    Cell {
        path: PathBuf,
        line: usize,
        column: usize,
        text: String,
    },
    #[error("{path}: label {text:?} is not an integer")]
    Label { path: PathBuf, text: String },
}

impl LoadWarning {
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadWarning::Unreadable { path, .. }
            | LoadWarning::Empty { path }
            | LoadWarning::Width { path, .. }
            | LoadWarning::Cell { path, .. }
            | LoadWarning::Label { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no labels left after loading")]
    EmptyLabelSet,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid axis remap {0:?}: {1}")]
    Remap(String, &'static str),
}
