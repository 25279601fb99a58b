use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors: anything here halts the run with no schedule on stdout.
/// Row-level problems never end up in this type, they become skip entries.
#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("Input file '{}' is not a CSV file", .0.display())]
    NotCsvFile(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
