//! Recursive character splitting.
//!
//! Tries separators in order, merges small pieces up to the chunk size with
//! overlap between neighbours, and recurses on pieces that are still too
//! long. Lengths are measured in characters, not bytes.

use super::{ChunkingConfig, TextSplitter};
use std::collections::VecDeque;
use tracing::warn;

/// Recursive character splitter.
pub struct RecursiveCharacterSplitter {
    config: ChunkingConfig,
}

impl RecursiveCharacterSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for split in splits {
            if char_len(split) < self.config.chunk_size {
                pending.push(split);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(split.to_string());
            } else {
                chunks.extend(self.split_with(split, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }

        chunks
    }

    /// Greedily join pieces into chunks no longer than `chunk_size`,
    /// starting each new chunk with up to `chunk_overlap` characters of the
    /// previous one.
    fn merge(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let separator_len = char_len(separator);

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);
            let joined = if current.is_empty() { 0 } else { separator_len };

            if total + len + joined > size {
                if total > size {
                    warn!("Created a chunk of {} characters, longer than {}", total, size);
                }

                if !current.is_empty() {
                    if let Some(doc) = join(&current, separator) {
                        docs.push(doc);
                    }

                    loop {
                        let joined = if current.is_empty() { 0 } else { separator_len };
                        let too_big = total > overlap || (total + len + joined > size && total > 0);
                        if !too_big {
                            break;
                        }
                        let had_more = current.len() > 1;
                        match current.pop_front() {
                            Some(first) => {
                                total -= char_len(first) + if had_more { separator_len } else { 0 };
                            }
                            None => break,
                        }
                    }
                }
            }

            current.push_back(split);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

impl TextSplitter for RecursiveCharacterSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.config.separators)
    }

    fn chunk_overlap(&self) -> usize {
        self.config.chunk_overlap
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Join pieces, trimming surrounding whitespace; `None` if nothing remains.
fn join(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let text = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> RecursiveCharacterSplitter {
        let separators = vec!["\n\n", "\n", " ", ""]
            .into_iter()
            .map(String::from)
            .collect();
        RecursiveCharacterSplitter::new(ChunkingConfig::new(size, overlap, separators).unwrap())
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = splitter(300, 50).split_text("华妃：放肆\n颂芝：娘娘息怒");
        assert_eq!(chunks, vec!["华妃：放肆\n颂芝：娘娘息怒".to_string()]);
    }

    #[test]
    fn test_lines_are_packed_up_to_size() {
        let text = "甲：一二\n乙：三四\n丙：五六\n丁：七八";
        let chunks = splitter(9, 0).split_text(text);
        // each line is 4 characters, two lines plus a newline is 9
        assert_eq!(
            chunks,
            vec!["甲：一二\n乙：三四".to_string(), "丙：五六\n丁：七八".to_string()]
        );
    }

    #[test]
    fn test_long_line_falls_back_to_characters() {
        let line: String = "臣妾做不到啊".repeat(5);
        let chunks = splitter(8, 2).split_text(&line);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 8, "chunk too long: {}", chunk);
        }
        // consecutive chunks share the overlap
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(2).collect::<Vec<_>>().into_iter().rev().collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn test_chunk_size_counts_characters() {
        // 30 characters, 90 bytes
        let text = "一二三四五六七八九十".repeat(3);
        let chunks = splitter(30, 5).split_text(&text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_no_content_is_lost() {
        let text = "皇后：都起来吧\n（众妃起身）\n华妃（冷笑）：皇后娘娘真是宽厚\n（甄嬛低头不语）\n皇后：妹妹说笑了";
        let chunks = splitter(20, 5).split_text(text);

        for line in text.lines() {
            assert!(
                chunks.iter().any(|c| c.contains(line)),
                "line missing from chunks: {}",
                line
            );
        }
    }

    #[test]
    fn test_whitespace_only_is_dropped() {
        assert!(splitter(10, 2).split_text("  \n  \n ").is_empty());
    }
}
