//! Character chunking with overlap for over-long document content.

/// Splits `content` into chunks of at most `max_chars` characters, with
/// `overlap_chars` of trailing context repeated at the start of each
/// subsequent chunk. Content at or under the limit comes back as one chunk.
///
/// Operates on char boundaries so multi-byte text never splits mid-character.
#[must_use]
pub fn chunk_text(content: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return vec![content.to_owned()];
    }

    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= max_chars {
        return vec![content.to_owned()];
    }

    // Overlap must leave room to advance, or the scan would stall.
    let step = max_chars.saturating_sub(overlap_chars).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_is_single_chunk() {
        let chunks = chunk_text("short text", 1000, 200);
        assert_eq!(chunks, vec!["short text".to_owned()]);
    }

    #[test]
    fn test_long_content_splits_with_overlap() {
        let content = "abcdefghij";
        let chunks = chunk_text(content, 4, 2);

        assert_eq!(chunks[0], "abcd");
        // Each chunk restarts two chars back from the previous end.
        assert_eq!(chunks[1], "cdef");
        assert!(chunks.last().unwrap().ends_with('j'));

        for chunk in &chunks {
            assert!(chunk.chars().count() <= 4);
        }
    }

    #[test]
    fn test_multibyte_content_splits_on_char_boundaries() {
        let content = "日本語のテキストを分割する".repeat(3);
        let chunks = chunk_text(&content, 10, 2);
        let rejoined_len: usize = chunks.iter().map(|chunk| chunk.chars().count()).sum();
        // Overlap repeats characters, so the total is at least the input length.
        assert!(rejoined_len >= content.chars().count());
    }

    #[test]
    fn test_degenerate_overlap_still_advances() {
        // Overlap >= max would otherwise loop forever.
        let chunks = chunk_text("abcdef", 2, 5);
        assert!(chunks.len() <= 6);
        assert_eq!(chunks[0], "ab");
    }
}
