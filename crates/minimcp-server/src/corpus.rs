//! The text corpus provider.
//!
//! Supplies file contents and line-indexed search results to the tools.
//! The configured path can be overridden per call.

use std::io;
use std::path::{Path, PathBuf};

use log::warn;
use minimcp_core::RpcError;
use minimcp_core::logging::targets;

/// A line-oriented text corpus backed by a file on disk.
#[derive(Debug, Clone)]
pub struct Corpus {
    path: PathBuf,
}

impl Corpus {
    /// Creates a corpus reading from the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the configured path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn resolve<'a>(&'a self, override_path: Option<&'a Path>) -> &'a Path {
        override_path.unwrap_or(&self.path)
    }

    /// Returns the full text of the corpus.
    pub fn full_text(&self, override_path: Option<&Path>) -> Result<String, CorpusError> {
        let path = self.resolve(override_path);
        std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                CorpusError::NotFound(path.to_owned())
            } else {
                CorpusError::Io(path.to_owned(), err)
            }
        })
    }

    /// Returns `(line_number, line_text)` for every line containing `query`,
    /// case-insensitively, in ascending line order. Line numbers are 1-based.
    pub fn search(
        &self,
        query: &str,
        override_path: Option<&Path>,
    ) -> Result<Vec<(usize, String)>, CorpusError> {
        let text = self.full_text(override_path)?;
        let needle = query.to_lowercase();
        Ok(text
            .lines()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(index, line)| (index + 1, line.to_owned()))
            .collect())
    }
}

/// Corpus access error.
#[derive(Debug)]
pub enum CorpusError {
    /// The source file does not exist.
    NotFound(PathBuf),
    /// The source file exists but could not be read.
    Io(PathBuf, io::Error),
}

impl std::fmt::Display for CorpusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorpusError::NotFound(path) => write!(f, "file not found: {}", path.display()),
            CorpusError::Io(path, err) => {
                write!(f, "failed to read {}: {err}", path.display())
            }
        }
    }
}

impl std::error::Error for CorpusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CorpusError::Io(_, err) => Some(err),
            CorpusError::NotFound(_) => None,
        }
    }
}

impl From<CorpusError> for RpcError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::NotFound(path) => {
                RpcError::not_found(format!("file not found: {}", path.display()))
            }
            CorpusError::Io(path, cause) => {
                // The I/O cause stays in the log; the peer gets the path only.
                warn!(target: targets::SERVER, "corpus read failed: {}: {cause}", path.display());
                RpcError::server_error(format!("failed to read {}", path.display()))
            }
        }
    }
}
