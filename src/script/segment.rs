//! Scene segmentation of a cleaned episode transcript.

use super::{header_regex, SceneBlock};
use regex::Regex;

/// Splits a transcript into blocks, each opened by a `第N幕` header line.
pub struct SceneSegmenter {
    header: Regex,
}

impl SceneSegmenter {
    pub fn new() -> Self {
        Self {
            header: header_regex(),
        }
    }

    /// Check whether a (trimmed) line opens a new scene.
    pub fn is_header(&self, line: &str) -> bool {
        self.header.is_match(line)
    }

    /// Segment cleaned text into scene blocks, in source order.
    ///
    /// Blank lines are dropped and lines before the first header are
    /// discarded.
    pub fn segment(&self, text: &str) -> Vec<SceneBlock> {
        let mut blocks = Vec::new();
        let mut current: Option<Vec<String>> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if self.is_header(line) {
                if let Some(lines) = current.take() {
                    blocks.push(SceneBlock::from_lines(lines));
                }
                current = Some(vec![line.to_string()]);
            } else if let Some(lines) = current.as_mut() {
                lines.push(line.to_string());
            }
        }

        if let Some(lines) = current {
            blocks.push(SceneBlock::from_lines(lines));
        }

        blocks
    }
}

impl Default for SceneSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
