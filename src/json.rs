use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading a JSON input
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{path}: failed to read input: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{path}: line {line}, column {column}: invalid JSON: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        column: usize,
        source: serde_json::Error,
    },
}

/// Read one JSON document from a file, or from stdin when `path` is `-`.
pub fn read_input(path: impl AsRef<Path>) -> Result<Value, InputError> {
    let path = path.as_ref();
    if path == Path::new("-") {
        return read_from(io::stdin().lock(), path);
    }

    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_from(BufReader::new(file), path)
}

fn read_from(reader: impl Read, path: &Path) -> Result<Value, InputError> {
    serde_json::from_reader(reader).map_err(|source| {
        if source.is_io() {
            return InputError::Io {
                path: path.to_path_buf(),
                source: source.into(),
            };
        }
        InputError::Json {
            path: path.to_path_buf(),
            line: source.line(),
            column: source.column(),
            source,
        }
    })
}
