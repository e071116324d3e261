//! Recursive text chunker for knowledge base documents.
//!
//! Splits on a prioritized list of separators tuned for FAQ-style
//! documents (section rules, Q&A markers, list items) before falling
//! back to paragraphs, lines, and words. Adjacent small splits are
//! merged up to the chunk size, and consecutive chunks share an
//! overlap so answers spanning a boundary stay retrievable.

/// Separator priority for FAQ-style source documents.
const SEPARATORS: &[&str] = &["\n---", "\n\nQ:", "\n-", ":\n", "\n\n", "\n", " "];

/// A character-budgeted recursive splitter.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker. Overlap larger than the chunk size is clamped.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Split a document into chunks of at most `chunk_size` characters.
    ///
    /// Whitespace-only chunks are dropped. Returns an empty vec for
    /// blank input.
    pub fn split(&self, text: &str) -> Vec<String> {
        let pieces = self.split_recursive(text, SEPARATORS);
        self.merge(pieces)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((sep, rest)) = separators.split_first() else {
            return hard_split(text, self.chunk_size);
        };

        if !text.contains(sep) {
            return self.split_recursive(text, rest);
        }

        let mut pieces = Vec::new();
        for part in split_keeping_separator(text, sep) {
            if char_len(&part) <= self.chunk_size {
                pieces.push(part);
            } else {
                pieces.extend(self.split_recursive(&part, rest));
            }
        }
        pieces
    }

    /// Merge small pieces into chunks, carrying `chunk_overlap` trailing
    /// characters from one chunk into the next.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for piece in pieces {
            let piece_len = char_len(&piece);
            if !current.is_empty() && char_len(&current) + piece_len > self.chunk_size {
                push_trimmed(&mut chunks, &current);
                // Carry overlap only as far as the next piece leaves room
                let budget = self.chunk_size.saturating_sub(piece_len);
                current = tail_chars(&current, self.chunk_overlap.min(budget));
            }
            current.push_str(&piece);
        }
        push_trimmed(&mut chunks, &current);

        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on `sep`, keeping the separator attached to the start of the
/// following segment so section markers survive chunking.
fn split_keeping_separator(text: &str, sep: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(sep) {
        if pos > start {
            parts.push(text[start..pos].to_string());
            start = pos;
        }
    }
    if start < text.len() {
        parts.push(text[start..].to_string());
    }
    parts
}

/// Last-resort split at exact character offsets.
fn hard_split(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

fn tail_chars(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = Chunker::new(400, 50);
        let chunks = chunker.split("Returns are accepted within 30 days.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Returns are accepted within 30 days.");
    }

    #[test]
    fn blank_input_yields_nothing() {
        let chunker = Chunker::new(400, 50);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n\n  ").is_empty());
    }

    #[test]
    fn splits_on_section_rules_first() {
        let chunker = Chunker::new(60, 0);
        let text = format!(
            "{}\n---\n{}",
            "Shipping takes 2-4 business days within Germany always.",
            "Returns are free of charge for thirty days after purchase."
        );
        let chunks = chunker.split(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("Shipping"));
        assert!(chunks[1].contains("Returns are free"));
    }

    #[test]
    fn qa_markers_stay_attached_to_their_answer() {
        let chunker = Chunker::new(80, 0);
        let text = "Q: How long is the warranty?\nTwo years on all devices.\n\nQ: Can I pay by invoice?\nYes, for registered customers.";
        let chunks = chunker.split(&text);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().any(|c| c.contains("warranty")));
        assert!(chunks.iter().any(|c| c.starts_with("Q: Can I pay")));
    }

    #[test]
    fn respects_chunk_size() {
        let chunker = Chunker::new(50, 10);
        let text = "word ".repeat(100);
        for chunk in chunker.split(&text) {
            assert!(chunk.chars().count() <= 50, "chunk too large: {chunk:?}");
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let chunker = Chunker::new(40, 15);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda";
        let chunks = chunker.split(&text);
        assert!(chunks.len() >= 2);
        // Some trailing text of chunk N reappears at the start of chunk N+1
        let tail: String = chunks[0].chars().rev().take(5).collect::<String>();
        let tail: String = tail.chars().rev().collect();
        assert!(
            chunks[1].contains(tail.trim()),
            "no overlap between {:?} and {:?}",
            chunks[0],
            chunks[1]
        );
    }

    #[test]
    fn unbroken_text_hard_splits() {
        let chunker = Chunker::new(20, 0);
        let text = "x".repeat(55);
        let chunks = chunker.split(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 20);
        assert_eq!(chunks[2].len(), 15);
    }

    #[test]
    fn overlap_clamped_below_chunk_size() {
        let chunker = Chunker::new(10, 50);
        // Must terminate rather than loop re-emitting overlap
        let chunks = chunker.split(&"ab ".repeat(30));
        assert!(!chunks.is_empty());
    }

    #[test]
    fn umlauts_counted_as_single_characters() {
        let chunker = Chunker::new(30, 0);
        let text = "Zubehör für Kühlschränke und Geräte überall verfügbar täglich";
        for chunk in chunker.split(&text) {
            assert!(chunk.chars().count() <= 30);
        }
    }
}
