use serde::{Deserialize, Serialize};

/// One page of extracted PDF text, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    /// Non-empty trimmed lines in reading order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub text: String,
    pub start_page: u32,
    pub end_page: u32,
}

impl Chunk {
    pub(crate) fn new(index: usize, text: &str, start_page: u32, end_page: u32) -> Self {
        Self {
            chunk_id: Self::chunk_id_for(index),
            text: text.trim().to_string(),
            start_page,
            end_page,
        }
    }

    pub fn chunk_id_for(index: usize) -> String {
        format!("chunk_{}", index)
    }

    /// Short prefix for previews, cut on a char boundary
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_lines_skip_blank() {
        let page = Page::new(1, "  first \n\n   \nsecond\r\n");
        let lines: Vec<&str> = page.lines().collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_preview_respects_char_boundary() {
        let chunk = Chunk::new(0, "héllo wörld", 1, 1);
        assert_eq!(chunk.chunk_id, "chunk_0");
        assert_eq!(chunk.preview(2), "hé");
        assert_eq!(chunk.preview(100), "héllo wörld");
    }
}
