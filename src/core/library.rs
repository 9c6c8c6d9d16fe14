//! Subject library on disk.
//!
//! `input_root/<subject>/` holds the raw PDFs and `output_root/<subject>/`
//! holds their compressed copies, which are what the timeline edits.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::config::AppConfig;
use super::pdf::{PdfBackend, PdfError};
use crate::utils::{file_name_string, natural_cmp};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("subject code cannot be empty")]
    EmptySubject,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: PdfError,
    },
}

#[derive(Debug, Clone)]
pub struct Library {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl Library {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.input_root, &config.output_root)
    }

    /// Subject folders under the input root. Creates the root when missing.
    pub fn list_subjects(&self) -> Result<Vec<String>, LibraryError> {
        if !self.input_root.exists() {
            fs::create_dir_all(&self.input_root).map_err(|source| LibraryError::Io {
                path: self.input_root.clone(),
                source,
            })?;
            return Ok(Vec::new());
        }

        let mut subjects = Vec::new();
        for entry in read_dir(&self.input_root)? {
            if entry.is_dir() {
                subjects.extend(file_name_string(&entry));
            }
        }
        subjects.sort_by(|a, b| natural_cmp(a, b));
        Ok(subjects)
    }

    /// Raw PDFs waiting to be compressed.
    pub fn list_source_pdfs(&self, subject: &str) -> Result<Vec<String>, LibraryError> {
        list_pdfs(&self.input_root, subject)
    }

    /// Compressed PDFs available to the timeline.
    pub fn list_extracted_pdfs(&self, subject: &str) -> Result<Vec<String>, LibraryError> {
        list_pdfs(&self.output_root, subject)
    }

    pub fn compressed_path(&self, subject: &str, pdf: &str) -> PathBuf {
        self.output_root.join(subject).join(pdf)
    }

    /// Page count of a compressed PDF, used to size a new section.
    pub fn page_count<B: PdfBackend>(
        &self,
        backend: &B,
        subject: &str,
        pdf: &str,
    ) -> Result<usize, LibraryError> {
        let path = self.compressed_path(subject, pdf);
        let bytes = fs::read(&path).map_err(|source| LibraryError::Io {
            path: path.clone(),
            source,
        })?;
        let document = backend
            .load_document(&bytes)
            .map_err(|source| LibraryError::Pdf { path, source })?;
        Ok(backend.page_count(&document))
    }
}

fn list_pdfs(root: &Path, subject: &str) -> Result<Vec<String>, LibraryError> {
    if subject.trim().is_empty() {
        return Err(LibraryError::EmptySubject);
    }
    let dir = root.join(subject);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = read_dir(&dir)?
        .into_iter()
        .filter(|path| path.is_file() && is_pdf(path))
        .filter_map(|path| file_name_string(&path))
        .collect();
    names.sort_by(|a, b| natural_cmp(a, b));
    Ok(names)
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    let io_err = |source| LibraryError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    Ok(paths)
}

fn is_pdf(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first_raw()
        .map(|mime| mime == "application/pdf")
        .unwrap_or(false)
}
