use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no entry points declared")]
    NoEntryPoints,
    #[error("invalid entry name '{name}': use letters, digits, '-' or '_'")]
    InvalidEntryName { name: String },
    #[error("entry '{name}' does not point at an .html document: {path}")]
    EntryNotHtml { name: String, path: PathBuf },
    #[error("entry '{name}' HTML not found: {path}")]
    EntryHtmlMissing { name: String, path: PathBuf },
    #[error("assets dir must be a single path component, got '{dir}'")]
    InvalidAssetsDir { dir: String },
    #[error("output dir {out_dir} overlaps the sources of entry '{name}'")]
    OutputOverlapsSource { name: String, out_dir: PathBuf },
    #[error("failed to parse site config {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("io failure at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
