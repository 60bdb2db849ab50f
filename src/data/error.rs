use std::path::PathBuf;

use thiserror::Error;

use super::locate::LocateError;

/// Failures raised while loading study data.
///
/// `DirectoryNotFound`, `WorkbookNotFound` and `Workbook` stop a load
/// outright; every other variant is recorded against one school and the rest
/// of the batch carries on.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("{school}: '{expected}' not found")]
    FileNotFound { school: String, expected: String },

    #[error("{school}: {} is missing column '{column}'", path.display())]
    MissingColumn {
        school: String,
        path: PathBuf,
        column: String,
    },

    #[error("{school}: none of the {total} rows in {} could be parsed", path.display())]
    NoValidRows {
        school: String,
        path: PathBuf,
        total: usize,
    },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("workbook '{0}' not found")]
    WorkbookNotFound(String),

    #[error("workbook {}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },
}

impl From<LocateError> for LoadError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::DirectoryNotFound(path) => Self::DirectoryNotFound(path),
            LocateError::Io { path, source } => Self::Io { path, source },
        }
    }
}
