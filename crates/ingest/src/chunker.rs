use crate::chunk::{Chunk, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Soft cap on accumulated characters per chunk
    pub chunk_size: usize,
    /// Trailing characters of an emitted chunk carried into the next one
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            overlap: 200,
        }
    }
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Split ordered pages into overlapping chunks.
    ///
    /// Lines are never split. When a line would push the buffer past
    /// `chunk_size`, the buffer is emitted and the next buffer starts with
    /// its last `overlap` characters. The next chunk's start page becomes
    /// the emitted chunk's end page, so page provenance overlaps as well.
    pub fn chunk_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        let Some(first) = pages.first() else {
            return chunks;
        };

        let mut buffer = String::new();
        let mut buffer_chars = 0usize;
        let mut start_page = first.page_number;
        let mut end_page = start_page;

        for page in pages {
            for line in page.lines() {
                let line_chars = line.chars().count();

                // An empty buffer is never flushed, so an oversized first
                // line becomes a chunk of its own instead of an empty one.
                if buffer_chars + line_chars > self.config.chunk_size
                    && !buffer.trim().is_empty()
                {
                    chunks.push(Chunk::new(chunks.len(), &buffer, start_page, end_page));

                    let carried = tail_chars(&buffer, self.config.overlap);
                    let carried_chars = carried.chars().count();
                    buffer = format!("{} {}", carried, line);
                    buffer_chars = carried_chars + 1 + line_chars;

                    start_page = end_page;
                } else {
                    buffer.push(' ');
                    buffer.push_str(line);
                    buffer_chars += 1 + line_chars;

                    end_page = page.page_number;
                }
            }
        }

        if !buffer.trim().is_empty() {
            chunks.push(Chunk::new(chunks.len(), &buffer, start_page, end_page));
        }

        chunks
    }
}

/// Last `n` characters of `text`
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkerConfig {
            chunk_size,
            overlap,
        })
    }

    #[test]
    fn test_basic_chunking() {
        let pages = vec![
            Page::new(1, "This is a test paragraph.\n\nThis is another paragraph."),
            Page::new(2, "Closing line."),
        ];
        let chunks = Chunker::new(ChunkerConfig::default()).chunk_pages(&pages);

        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].text,
            "This is a test paragraph. This is another paragraph. Closing line."
        );
        assert_eq!((chunks[0].start_page, chunks[0].end_page), (1, 2));
    }

    #[test]
    fn test_no_pages_no_chunks() {
        assert!(chunker(100, 10).chunk_pages(&[]).is_empty());
        let blank = vec![Page::new(1, ""), Page::new(2, "   \n \n")];
        assert!(chunker(100, 10).chunk_pages(&blank).is_empty());
    }

    #[test]
    fn test_overlap_carries_trailing_characters() {
        let pages = vec![Page::new(1, "aaaaaaaaaa\nbbbbbbbbbb\ncccccccccc")];
        let chunks = chunker(20, 3).chunk_pages(&pages);

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["aaaaaaaaaa", "aaa bbbbbbbbbb", "bbb cccccccccc"]
        );
    }

    #[test]
    fn test_chunk_ids_are_contiguous_and_pages_ordered() {
        let pages: Vec<Page> = (1..=6)
            .map(|n| Page::new(n, format!("line {n} alpha beta\nline {n} gamma delta")))
            .collect();
        let chunks = chunker(40, 8).chunk_pages(&pages);

        assert!(chunks.len() > 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, format!("chunk_{i}"));
            assert!(chunk.start_page <= chunk.end_page);
            assert!(!chunk.text.trim().is_empty());
        }
    }

    #[test]
    fn test_without_overlap_chunks_reconstruct_lines() {
        let pages = vec![
            Page::new(1, "one two three\nfour five\n\nsix"),
            Page::new(2, ""),
            Page::new(3, "seven eight nine ten\neleven"),
        ];
        let chunks = chunker(15, 0).chunk_pages(&pages);

        let rebuilt: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let expected: Vec<&str> = pages.iter().flat_map(|p| p.lines()).collect();
        assert_eq!(rebuilt.join(" "), expected.join(" "));
    }

    #[test]
    fn test_large_chunk_size_yields_single_chunk() {
        let pages = vec![Page::new(1, "alpha\nbeta"), Page::new(2, "gamma")];
        let chunks = chunker(10_000, 200).chunk_pages(&pages);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha beta gamma");
    }

    #[test]
    fn test_oversized_first_line_is_not_an_empty_chunk() {
        let pages = vec![Page::new(1, "x".repeat(50))];
        let chunks = chunker(10, 2).chunk_pages(&pages);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 50);
    }

    // The carried-over start page is the previous chunk's end page, even
    // when the new chunk's own text begins on a later page.
    #[test]
    fn test_start_page_carries_previous_end_page() {
        let pages = vec![
            Page::new(1, "aaaaaaaaaa"),
            Page::new(2, "bbbbbbbbbb\ncccc"),
        ];
        let chunks = chunker(20, 0).chunk_pages(&pages);

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start_page, chunks[0].end_page), (1, 1));
        assert_eq!(chunks[1].text, "bbbbbbbbbb cccc");
        assert_eq!((chunks[1].start_page, chunks[1].end_page), (1, 2));
    }

    #[test]
    fn test_tail_chars_counts_characters() {
        assert_eq!(tail_chars("abcdef", 0), "");
        assert_eq!(tail_chars("abcdef", 2), "ef");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(tail_chars("naïve", 3), "ïve");
    }
}
