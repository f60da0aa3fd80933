use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("No destination given")]
    NoDestination,

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum AntidelayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config file parsing error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Save failed: {0}")]
    Sink(#[from] SinkError),
}
