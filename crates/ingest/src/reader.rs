use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::chunk::Page;

/// Anything that can hand over a document as ordered pages.
pub trait PageSource {
    fn pages(&self) -> Result<Vec<Page>>;
}

/// Reads per-page text out of a PDF file.
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageSource for PdfReader {
    fn pages(&self) -> Result<Vec<Page>> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        if !extension.eq_ignore_ascii_case("pdf") {
            anyhow::bail!("Unsupported file format: {}", extension);
        }

        let texts = pdf_extract::extract_text_by_pages(&self.path)
            .with_context(|| format!("Failed to read PDF: {:?}", self.path))?;

        debug!(path = ?self.path, pages = texts.len(), "Extracted PDF text");

        Ok(number_pages(texts))
    }
}

impl PageSource for Vec<Page> {
    fn pages(&self) -> Result<Vec<Page>> {
        Ok(self.clone())
    }
}

fn number_pages(texts: Vec<String>) -> Vec<Page> {
    texts
        .into_iter()
        .zip(1u32..)
        .map(|(text, page_number)| Page { page_number, text })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_numbered_from_one() {
        let pages = number_pages(vec!["a".into(), String::new(), "c".into()]);
        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(pages[1].text, "");
    }

    #[test]
    fn test_rejects_non_pdf() {
        let reader = PdfReader::new("notes.txt");
        assert!(reader.pages().is_err());
    }
}
