use regex::Regex;
use std::sync::OnceLock;

static PAGE_FURNITURE: OnceLock<Regex> = OnceLock::new();

const BULLET_GLYPHS: [char; 4] = ['\u{2022}', '\u{25e6}', '\u{25aa}', '\u{25cf}'];

fn page_furniture() -> &'static Regex {
    PAGE_FURNITURE.get_or_init(|| {
        Regex::new(r"(?i)page\s*\d+(\s*of\s*\d+)?").expect("page furniture pattern is valid")
    })
}

// Strips page numbers and bullet glyphs, then collapses every whitespace
// run (including non-breaking spaces) to a single space.
pub fn clean_text(text: &str) -> String {
    let without_pages = page_furniture().replace_all(text, " ");
    let without_bullets: String = without_pages
        .chars()
        .filter(|c| !BULLET_GLYPHS.contains(c))
        .collect();

    without_bullets
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::clean_text;

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        let input = "Section 378.  \t Theft \n\n is defined";
        assert_eq!(clean_text(input), "Section 378. Theft is defined");
    }

    #[test]
    fn page_numbers_are_removed() {
        assert_eq!(clean_text("before Page 12 after"), "before after");
        assert_eq!(clean_text("before PAGE 3 of 50 after"), "before after");
        assert_eq!(clean_text("before page2 after"), "before after");
    }

    #[test]
    fn page_pattern_spanning_a_line_break_is_removed() {
        assert_eq!(clean_text("before Page 1\nof 50 after"), "before after");
    }

    #[test]
    fn bullet_glyphs_are_removed() {
        assert_eq!(clean_text("• first ◦ second ▪ third ● fourth"), "first second third fourth");
    }

    #[test]
    fn output_is_trimmed_and_empty_input_is_fine() {
        assert_eq!(clean_text("   "), "");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("  word  "), "word");
    }
}
