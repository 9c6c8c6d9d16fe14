//! Section extraction
//!
//! Turns finalized sections into standalone PDFs. Sections are processed in
//! order, and each distinct source document is read and decoded at most once
//! per run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::pdf::{PdfBackend, PdfError};
use crate::state::Section;
use crate::utils::{is_plain_file_name, sha256_hex};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("source PDF not found at {0}; compress it first")]
    SourceNotFound(PathBuf),

    #[error(
        "invalid page range for section \"{title}\": {start_page}-{end_page}{}",
        page_count_suffix(.page_count)
    )]
    InvalidRange {
        title: String,
        start_page: u32,
        end_page: u32,
        page_count: Option<usize>,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("section {field} must be a plain file name, got {value:?}")]
    UnsafeName { field: &'static str, value: String },

    #[error(transparent)]
    Pdf(#[from] PdfError),
}

fn page_count_suffix(page_count: &Option<usize>) -> String {
    match page_count {
        Some(count) => format!(" (document has {} pages)", count),
        None => String::new(),
    }
}

/// A finalized section as handed to extraction and publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    pub id: String,
    pub title: String,
    /// File name inside the subject's output folder
    pub source_pdf: String,
    /// 1-indexed, inclusive
    pub start_page: u32,
    /// 1-indexed, inclusive
    pub end_page: u32,
}

impl From<&Section> for SectionSpec {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id.to_string(),
            title: section.display_title().to_string(),
            source_pdf: section.source_document.clone(),
            start_page: section.source_start_page,
            end_page: section.source_end_page,
        }
    }
}

impl SectionSpec {
    /// Output file name for this section.
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.id)
    }

    /// Reject ids and source names that would resolve outside their folder.
    fn check_names(&self) -> Result<(), ExtractError> {
        for (field, value) in [("id", &self.id), ("sourcePdf", &self.source_pdf)] {
            if !is_plain_file_name(value) {
                return Err(ExtractError::UnsafeName {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    fn invalid_range(&self, page_count: Option<usize>) -> ExtractError {
        ExtractError::InvalidRange {
            title: self.title.clone(),
            start_page: self.start_page,
            end_page: self.end_page,
            page_count,
        }
    }
}

/// A section rendered to PDF bytes.
#[derive(Debug, Clone)]
pub struct ExtractedSection {
    pub spec: SectionSpec,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`
    pub checksum: String,
}

/// Extracts sections from source PDFs under `source_root`.
pub struct Extractor<B: PdfBackend> {
    backend: B,
    source_root: PathBuf,
}

impl<B: PdfBackend> Extractor<B> {
    pub fn new(backend: B, source_root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            source_root: source_root.into(),
        }
    }

    /// Extract every section in order. The first failure aborts the run.
    pub fn extract_all(
        &self,
        sections: &[SectionSpec],
    ) -> Result<Vec<ExtractedSection>, ExtractError> {
        let mut cache: HashMap<&str, B::Document> = HashMap::new();
        let mut extracted = Vec::with_capacity(sections.len());

        for spec in sections {
            spec.check_names()?;
            if spec.start_page < 1 || spec.end_page < spec.start_page {
                return Err(spec.invalid_range(None));
            }

            let source = match cache.entry(spec.source_pdf.as_str()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.load_source(&spec.source_pdf)?),
            };

            let page_count = self.backend.page_count(source);
            if spec.end_page as usize > page_count {
                return Err(spec.invalid_range(Some(page_count)));
            }

            let first = spec.start_page as usize - 1;
            let indices: Vec<usize> = (first..spec.end_page as usize).collect();
            let mut document = self.backend.extract_pages(source, &indices)?;
            let bytes = self.backend.serialize(&mut document)?;
            let checksum = sha256_hex(&bytes);
            debug!(section = %spec.id, pages = indices.len(), %checksum, "extracted section");

            extracted.push(ExtractedSection {
                spec: spec.clone(),
                bytes,
                checksum,
            });
        }

        info!(sections = extracted.len(), sources = cache.len(), "extraction finished");
        Ok(extracted)
    }

    fn load_source(&self, source_pdf: &str) -> Result<B::Document, ExtractError> {
        let path = self.source_root.join(source_pdf);
        if !path.is_file() {
            return Err(ExtractError::SourceNotFound(path));
        }
        let bytes = fs::read(&path).map_err(|source| ExtractError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(self.backend.load_document(&bytes)?)
    }
}

/// Write extracted sections as `<id>.pdf` files into `dir`.
pub fn write_sections(
    extracted: &[ExtractedSection],
    dir: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    fs::create_dir_all(dir).map_err(|source| ExtractError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(extracted.len());
    for section in extracted {
        let path = dir.join(section.spec.file_name());
        fs::write(&path, &section.bytes).map_err(|source| ExtractError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pdf::{blank_pdf, LopdfBackend};
    use std::cell::Cell;
    use uuid::Uuid;

    fn spec(source: &str, start: u32, end: u32) -> SectionSpec {
        SectionSpec {
            id: Uuid::new_v4().to_string(),
            title: format!("{} {}-{}", source, start, end),
            source_pdf: source.to_string(),
            start_page: start,
            end_page: end,
        }
    }

    fn source_dir(files: &[(&str, usize)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, pages) in files {
            fs::write(dir.path().join(name), blank_pdf(*pages)).unwrap();
        }
        dir
    }

    /// Counts document loads while delegating to lopdf.
    #[derive(Default)]
    struct CountingBackend {
        loads: Cell<usize>,
    }

    impl PdfBackend for CountingBackend {
        type Document = lopdf::Document;

        fn load_document(&self, bytes: &[u8]) -> Result<Self::Document, PdfError> {
            self.loads.set(self.loads.get() + 1);
            LopdfBackend.load_document(bytes)
        }

        fn page_count(&self, document: &Self::Document) -> usize {
            LopdfBackend.page_count(document)
        }

        fn extract_pages(
            &self,
            document: &Self::Document,
            page_indices: &[usize],
        ) -> Result<Self::Document, PdfError> {
            LopdfBackend.extract_pages(document, page_indices)
        }

        fn serialize(&self, document: &mut Self::Document) -> Result<Vec<u8>, PdfError> {
            LopdfBackend.serialize(document)
        }
    }

    #[test]
    fn test_extract_all_produces_page_ranges() {
        let dir = source_dir(&[("book.pdf", 10)]);
        let extractor = Extractor::new(LopdfBackend, dir.path());
        let specs = vec![spec("book.pdf", 1, 4), spec("book.pdf", 5, 10)];

        let extracted = extractor.extract_all(&specs).unwrap();
        assert_eq!(extracted.len(), 2);
        for (section, expected_pages) in extracted.iter().zip([4, 6]) {
            let doc = LopdfBackend.load_document(&section.bytes).unwrap();
            assert_eq!(LopdfBackend.page_count(&doc), expected_pages);
            assert_eq!(section.checksum, sha256_hex(&section.bytes));
        }
    }

    #[test]
    fn test_each_source_decoded_once() {
        let dir = source_dir(&[("a.pdf", 6), ("b.pdf", 3)]);
        let extractor = Extractor::new(CountingBackend::default(), dir.path());
        let specs = vec![
            spec("a.pdf", 1, 2),
            spec("b.pdf", 1, 3),
            spec("a.pdf", 3, 6),
            spec("a.pdf", 2, 2),
        ];
        extractor.extract_all(&specs).unwrap();
        assert_eq!(extractor.backend.loads.get(), 2);
    }

    #[test]
    fn test_end_past_document_is_invalid_range() {
        let dir = source_dir(&[("book.pdf", 3)]);
        let extractor = Extractor::new(LopdfBackend, dir.path());
        let err = extractor.extract_all(&[spec("book.pdf", 2, 5)]).unwrap_err();
        match err {
            ExtractError::InvalidRange { title, start_page, end_page, page_count } => {
                assert_eq!(title, "book.pdf 2-5");
                assert_eq!((start_page, end_page, page_count), (2, 5, Some(3)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_range_fails_before_loading() {
        let dir = source_dir(&[]);
        let extractor = Extractor::new(LopdfBackend, dir.path());
        let err = extractor.extract_all(&[spec("missing.pdf", 4, 2)]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidRange { page_count: None, .. }));
        let err = extractor.extract_all(&[spec("missing.pdf", 0, 2)]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidRange { .. }));
    }

    #[test]
    fn test_missing_source() {
        let dir = source_dir(&[]);
        let extractor = Extractor::new(LopdfBackend, dir.path());
        let err = extractor.extract_all(&[spec("gone.pdf", 1, 1)]).unwrap_err();
        assert!(matches!(err, ExtractError::SourceNotFound(path) if path.ends_with("gone.pdf")));
    }

    #[test]
    fn test_write_sections_uses_ids() {
        let dir = source_dir(&[("book.pdf", 2)]);
        let extractor = Extractor::new(LopdfBackend, dir.path());
        let specs = vec![spec("book.pdf", 1, 2)];
        let extracted = extractor.extract_all(&specs).unwrap();

        let out = dir.path().join("out/sections");
        let written = write_sections(&extracted, &out).unwrap();
        assert_eq!(written, vec![out.join(format!("{}.pdf", specs[0].id))]);
        assert!(written[0].is_file());
    }

    #[test]
    fn test_names_that_escape_their_folder_are_rejected() {
        let dir = source_dir(&[("book.pdf", 2)]);
        let extractor = Extractor::new(LopdfBackend, dir.path());

        let err = extractor.extract_all(&[spec("../outside.pdf", 1, 1)]).unwrap_err();
        assert!(matches!(err, ExtractError::UnsafeName { field: "sourcePdf", .. }));

        let mut escaping = spec("book.pdf", 1, 1);
        escaping.id = "../../x".to_string();
        let err = extractor.extract_all(&[escaping]).unwrap_err();
        assert!(matches!(err, ExtractError::UnsafeName { field: "id", .. }));
    }

    #[test]
    fn test_spec_from_section_uses_display_title() {
        let section = Section::new("book.pdf", 2, 9, 0).with_title(" ");
        let spec = SectionSpec::from(&section);
        assert_eq!(spec.title, "Untitled Section");
        assert_eq!((spec.start_page, spec.end_page), (2, 9));
        assert_eq!(spec.id, section.id.to_string());
    }
}
