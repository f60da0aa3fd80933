//! Destinations for the saved timestamp file.
//!
//! Which sink is active is decided once at startup; callers only see
//! [`ArtifactSink`].

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;

use crate::error::SinkError;

/// File name used when the destination is a directory, and by downloads.
pub const DEFAULT_FILE_NAME: &str = "timestamps.txt";

pub trait ArtifactSink {
    fn name(&self) -> &'static str;

    /// Persists `content` verbatim and returns where it ended up.
    fn write(&self, destination: &str, content: &str) -> Result<PathBuf, SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Write to the destination path, overwriting any existing file
    #[default]
    File,
    /// Save `timestamps.txt` into the downloads directory
    Download,
}

impl SinkKind {
    pub fn build(self) -> Box<dyn ArtifactSink> {
        match self {
            SinkKind::File => Box::new(FileSink),
            SinkKind::Download => Box::new(DownloadSink::new(DownloadSink::default_dir())),
        }
    }
}

/// Native file write.
#[derive(Debug, Default)]
pub struct FileSink;

impl FileSink {
    fn resolve(destination: &str) -> Result<PathBuf, SinkError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(SinkError::NoDestination);
        }
        let path = PathBuf::from(destination);
        if destination.ends_with('/') || destination.ends_with('\\') || path.is_dir() {
            Ok(path.join(DEFAULT_FILE_NAME))
        } else {
            Ok(path)
        }
    }
}

impl ArtifactSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write(&self, destination: &str, content: &str) -> Result<PathBuf, SinkError> {
        let path = Self::resolve(destination)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, content).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        info!("wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }
}

/// Browser-style download: a fixed file name in the downloads directory,
/// never overwriting an earlier download.
#[derive(Debug)]
pub struct DownloadSink {
    dir: PathBuf,
}

impl DownloadSink {
    pub fn new(dir: PathBuf) -> Self {
        DownloadSink { dir }
    }

    pub fn default_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    fn next_free_path(&self) -> PathBuf {
        let first = self.dir.join(DEFAULT_FILE_NAME);
        if !first.exists() {
            return first;
        }
        let stem = Path::new(DEFAULT_FILE_NAME)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("timestamps");
        (1..)
            .map(|n| self.dir.join(format!("{} ({}).txt", stem, n)))
            .find(|p| !p.exists())
            .unwrap_or(first)
    }
}

impl ArtifactSink for DownloadSink {
    fn name(&self) -> &'static str {
        "download"
    }

    fn write(&self, destination: &str, content: &str) -> Result<PathBuf, SinkError> {
        debug!("download ignores destination {:?}", destination);
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.next_free_path();
        fs::write(&path, content).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        info!("downloaded {} bytes to {}", content.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        fs::write(&target, "old content that is longer").unwrap();

        let written = FileSink
            .write(target.to_str().unwrap(), "09:59:45\n10:04:45")
            .unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "09:59:45\n10:04:45");
    }

    #[test]
    fn test_file_sink_directory_destination() {
        let dir = tempfile::tempdir().unwrap();
        let written = FileSink.write(dir.path().to_str().unwrap(), "").unwrap();
        assert_eq!(written, dir.path().join(DEFAULT_FILE_NAME));
        assert_eq!(fs::read_to_string(written).unwrap(), "");
    }

    #[test]
    fn test_file_sink_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let destination = format!("{}/nested/deeper/", dir.path().display());
        let written = FileSink.write(&destination, "00:00:00").unwrap();
        assert_eq!(written, dir.path().join("nested/deeper").join(DEFAULT_FILE_NAME));
        assert!(written.exists());
    }

    #[test]
    fn test_file_sink_empty_destination() {
        assert!(matches!(
            FileSink.write("   ", "x"),
            Err(SinkError::NoDestination)
        ));
    }

    #[test]
    fn test_file_sink_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let destination = blocker.join("out.txt");
        let err = FileSink
            .write(destination.to_str().unwrap(), "x")
            .unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }

    #[test]
    fn test_download_sink_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DownloadSink::new(dir.path().to_path_buf());

        let first = sink.write("/ignored/path.txt", "a").unwrap();
        let second = sink.write("/ignored/path.txt", "b").unwrap();
        let third = sink.write("", "c").unwrap();

        assert_eq!(first, dir.path().join("timestamps.txt"));
        assert_eq!(second, dir.path().join("timestamps (1).txt"));
        assert_eq!(third, dir.path().join("timestamps (2).txt"));
        assert_eq!(fs::read_to_string(first).unwrap(), "a");
        assert_eq!(fs::read_to_string(third).unwrap(), "c");
    }

    #[test]
    fn test_sink_kind_build() {
        assert_eq!(SinkKind::File.build().name(), "file");
        assert_eq!(SinkKind::Download.build().name(), "download");
    }
}
