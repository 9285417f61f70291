//! Capabilities the extraction core consumes but does not implement.
//!
//! A PDF backend (or a test fixture) provides paginated text for page
//! location and a raw cell grid for a chosen page. Page numbers are 1-based
//! throughout.

use crate::RawGrid;

/// Errors raised by page text and table extraction backends.
#[derive(Debug, thiserror::Error)]
pub enum TableSourceError {
    /// The page exists but holds no detectable tabular structure, or the
    /// engine failed on it.
    #[error("table extraction failed on page {page}: {message}")]
    ExtractionFailed {
        /// 1-based page number.
        page: u32,
        /// Backend-specific description.
        message: String,
    },

    /// The requested page is outside the document.
    #[error("page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Requested 1-based page number.
        page: u32,
        /// Number of pages in the document.
        page_count: usize,
    },
}

/// Paginated text access used by the page locator.
pub trait PageTextSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Plain text of a 1-based page.
    ///
    /// # Errors
    ///
    /// Returns [`TableSourceError`] if the page does not exist or its text
    /// cannot be extracted.
    fn page_text(&self, page_number: u32) -> Result<String, TableSourceError>;
}

/// Raw table extraction for a single page.
///
/// Extraction is expensive; callers invoke it at most once per page and
/// implementations may memoise.
pub trait TableSource {
    /// Extracts the table grid on a 1-based page.
    ///
    /// # Errors
    ///
    /// Returns [`TableSourceError::ExtractionFailed`] if the page holds no
    /// tabular structure.
    fn extract_table(&self, page_number: u32) -> Result<RawGrid, TableSourceError>;
}

impl<T: PageTextSource + ?Sized> PageTextSource for &T {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_text(&self, page_number: u32) -> Result<String, TableSourceError> {
        (**self).page_text(page_number)
    }
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn extract_table(&self, page_number: u32) -> Result<RawGrid, TableSourceError> {
        (**self).extract_table(page_number)
    }
}

/// In-memory page texts, one string per page.
///
/// Lets callers that already hold extracted text (or tests) drive the page
/// locator without a PDF backend.
#[derive(Debug, Clone, Default)]
pub struct PageTexts(pub Vec<String>);

impl PageTextSource for PageTexts {
    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn page_text(&self, page_number: u32) -> Result<String, TableSourceError> {
        page_index(page_number, self.0.len())
            .map(|idx| self.0[idx].clone())
            .ok_or(TableSourceError::PageOutOfRange {
                page: page_number,
                page_count: self.0.len(),
            })
    }
}

/// Converts a 1-based page number into a 0-based index when in range.
#[must_use]
pub fn page_index(page_number: u32, page_count: usize) -> Option<usize> {
    let idx = usize::try_from(page_number).ok()?.checked_sub(1)?;
    (idx < page_count).then_some(idx)
}
