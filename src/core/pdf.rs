//! PDF capability used by extraction and the library.
//!
//! Page indices are 0-based at this boundary.

use std::collections::BTreeSet;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("page index {index} out of range for document with {page_count} pages")]
    PageOutOfRange { index: usize, page_count: usize },

    #[error("failed to write PDF: {0}")]
    Write(String),
}

/// Load, inspect, slice and write PDF documents.
pub trait PdfBackend {
    type Document: Clone;

    fn load_document(&self, bytes: &[u8]) -> Result<Self::Document, PdfError>;

    fn page_count(&self, document: &Self::Document) -> usize;

    /// New document holding only the given pages, in document order.
    fn extract_pages(
        &self,
        document: &Self::Document,
        page_indices: &[usize],
    ) -> Result<Self::Document, PdfError>;

    fn serialize(&self, document: &mut Self::Document) -> Result<Vec<u8>, PdfError>;
}

/// `PdfBackend` on top of lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl PdfBackend for LopdfBackend {
    type Document = lopdf::Document;

    fn load_document(&self, bytes: &[u8]) -> Result<Self::Document, PdfError> {
        lopdf::Document::load_mem(bytes).map_err(|err| PdfError::Parse(err.to_string()))
    }

    fn page_count(&self, document: &Self::Document) -> usize {
        document.get_pages().len()
    }

    fn extract_pages(
        &self,
        document: &Self::Document,
        page_indices: &[usize],
    ) -> Result<Self::Document, PdfError> {
        let page_count = self.page_count(document);
        let mut keep = BTreeSet::new();
        for &index in page_indices {
            if index >= page_count {
                return Err(PdfError::PageOutOfRange { index, page_count });
            }
            // lopdf numbers pages from 1.
            keep.insert(index as u32 + 1);
        }

        let mut extracted = document.clone();
        let drop: Vec<u32> = extracted
            .get_pages()
            .keys()
            .copied()
            .filter(|number| !keep.contains(number))
            .collect();
        if !drop.is_empty() {
            extracted.delete_pages(&drop);
        }
        extracted.prune_objects();
        extracted.renumber_objects();
        Ok(extracted)
    }

    fn serialize(&self, document: &mut Self::Document) -> Result<Vec<u8>, PdfError> {
        document.compress();
        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .map_err(|err| PdfError::Write(err.to_string()))?;
        Ok(bytes)
    }
}

/// Build an in-memory PDF with `pages` blank pages.
#[cfg(test)]
pub(crate) fn blank_pdf(pages: usize) -> Vec<u8> {
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        let backend = LopdfBackend;
        let doc = backend.load_document(&blank_pdf(5)).unwrap();
        assert_eq!(backend.page_count(&doc), 5);
    }

    #[test]
    fn test_extract_pages_round_trip() {
        let backend = LopdfBackend;
        let doc = backend.load_document(&blank_pdf(6)).unwrap();
        let mut extracted = backend.extract_pages(&doc, &[1, 2, 3]).unwrap();
        assert_eq!(backend.page_count(&extracted), 3);

        let bytes = backend.serialize(&mut extracted).unwrap();
        let reloaded = backend.load_document(&bytes).unwrap();
        assert_eq!(backend.page_count(&reloaded), 3);
        // Source is untouched.
        assert_eq!(backend.page_count(&doc), 6);
    }

    #[test]
    fn test_extract_out_of_range() {
        let backend = LopdfBackend;
        let doc = backend.load_document(&blank_pdf(2)).unwrap();
        assert!(matches!(
            backend.extract_pages(&doc, &[2]),
            Err(PdfError::PageOutOfRange { index: 2, page_count: 2 })
        ));
    }

    #[test]
    fn test_garbage_fails_to_parse() {
        assert!(matches!(
            LopdfBackend.load_document(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
