//! Whitespace cleanup applied to raw script text before segmentation.

use regex::Regex;

/// Collapses blank lines and horizontal whitespace runs.
///
/// Blank-line spacing is not preserved, so scene boundaries must come from
/// explicit headers.
pub struct Normalizer {
    blank_lines: Regex,
    horizontal_space: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            blank_lines: Regex::new(r"\n{2,}").expect("Invalid regex"),
            // space, tab and the ideographic space
            horizontal_space: Regex::new(r"[ \t\x{3000}]+").expect("Invalid regex"),
        }
    }

    /// Return the cleaned text.
    pub fn normalize(&self, raw: &str) -> String {
        let collapsed = self.blank_lines.replace_all(raw, "\n");
        self.horizontal_space
            .replace_all(&collapsed, " ")
            .into_owned()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_lines() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("a\n\n\nb\nc\n\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_collapses_horizontal_whitespace() {
        let normalizer = Normalizer::new();
        assert_eq!(
            normalizer.normalize("华妃 \t\u{3000}：  放肆"),
            "华妃 ： 放肆"
        );
    }

    #[test]
    fn test_leaves_dialogue_characters_alone() {
        let normalizer = Normalizer::new();
        let line = "甄嬛（微笑）：臣妾惶恐";
        assert_eq!(normalizer.normalize(line), line);
    }
}
