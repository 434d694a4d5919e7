use crate::models::IngestionOptions;

// Boundary separators in priority order: paragraph break, line break,
// sentence end, word break.
pub const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
    pub min_chars: usize,
}

impl From<IngestionOptions> for ChunkingConfig {
    fn from(value: IngestionOptions) -> Self {
        Self {
            max_chars: value.chunk_max_chars,
            overlap_chars: value.chunk_overlap_chars,
            min_chars: value.min_chunk_chars,
        }
    }
}

pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let window_end = (start + config.max_chars.max(1)).min(chars.len());
        let end = if window_end == chars.len() {
            window_end
        } else {
            find_break(&chars, start, window_end)
        };

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if trimmed.chars().count() >= config.min_chars.max(1) {
            chunks.push(trimmed.to_string());
        }

        if end == chars.len() {
            break;
        }

        // Step back by the overlap so the next chunk carries trailing
        // context, while guaranteeing forward progress.
        let next = end.saturating_sub(config.overlap_chars);
        start = if next > start { next } else { end };
    }

    chunks
}

fn find_break(chars: &[char], start: usize, window_end: usize) -> usize {
    for separator in SEPARATORS {
        let sep: Vec<char> = separator.chars().collect();
        if window_end < sep.len() {
            continue;
        }

        let mut position = window_end - sep.len();
        while position > start {
            if chars[position..position + sep.len()] == sep[..] {
                return position + sep.len();
            }
            position -= 1;
        }
    }

    // No separator in the window: hard cut at the size limit.
    window_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max: usize, overlap: usize, min: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_chars: max,
            overlap_chars: overlap,
            min_chars: min,
        }
    }

    #[test]
    fn chunks_never_exceed_the_size_limit() {
        let text = "The accused committed theft. The stolen property was recovered. \
                    The court convicted under Section 378. An appeal followed shortly after."
            .repeat(8);
        for chunk in split_text(&text, config(80, 10, 1)) {
            assert!(chunk.chars().count() <= 80, "oversize chunk: {chunk}");
        }
    }

    #[test]
    fn paragraph_breaks_win_over_word_breaks() {
        let text = "para one\n\nrest of the body text continues here";
        let chunks = split_text(text, config(20, 0, 1));
        assert_eq!(chunks[0], "para one");
    }

    #[test]
    fn sentence_breaks_are_preferred_over_spaces() {
        let text = "First sentence ends. Second sentence keeps going for a while";
        let chunks = split_text(text, config(30, 0, 1));
        assert_eq!(chunks[0], "First sentence ends.");
    }

    #[test]
    fn adjacent_full_size_chunks_share_the_configured_overlap() {
        // No separators anywhere, so every cut is a hard cut at max size.
        let text: String = ('0'..='9').cycle().take(40).collect();
        let chunks = split_text(&text, config(10, 3, 1));

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(3).collect::<Vec<_>>().iter().rev().collect();
            assert!(pair[1].starts_with(&tail), "{} does not continue {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn retained_chunks_cover_the_whole_input() {
        let text: String = ('a'..='z').cycle().take(100).collect();
        let overlap = 4;
        let chunks = split_text(&text, config(20, overlap, 1));

        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.push_str(&chunk.chars().skip(overlap).collect::<String>());
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn fragments_below_the_minimum_are_dropped() {
        let text = "a meaningful chunk of text here. ok";
        let chunks = split_text(text, config(32, 0, 10));
        assert_eq!(chunks, vec!["a meaningful chunk of text".to_string()]);
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert!(split_text("   \n\n  ", config(10, 2, 1)).is_empty());
        assert!(split_text("", config(10, 2, 1)).is_empty());
    }

    #[test]
    fn chunk_order_is_stable() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = split_text(text, config(12, 0, 1));
        let joined = chunks.join(" ");
        assert!(joined.find("alpha").unwrap() < joined.find("kappa").unwrap());
    }
}
