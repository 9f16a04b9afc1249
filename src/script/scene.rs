//! Scene parsing: one scene block into a structured record.
//!
//! A block looks like:
//!
//! ```text
//! 第一幕
//! （翊坤宫）
//! 华妃（冷笑）：你也配？
//! （颂芝递茶）
//! 众人默然
//! ```
//!
//! The first line is the header, an optional fully bracketed second line is
//! the location, and every remaining line is either dialogue
//! (`speaker：text`), a bracketed action line, or free narration which is
//! wrapped in brackets on output.

use super::{header_regex, SceneBlock, SceneRecord};
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Separator between speaker and dialogue.
pub const SPEAKER_SEPARATOR: char = '：';

const OPEN_BRACKET: char = '（';
const CLOSE_BRACKET: char = '）';

/// Why a block produced no scene record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneRejection {
    #[error("empty scene block")]
    Empty,

    #[error("first line is not a scene header: {0}")]
    NotAHeader(String),

    #[error("scene number cannot be read from header: {0}")]
    MalformedHeader(String),
}

/// Parses scene blocks into [`SceneRecord`]s.
pub struct SceneParser {
    header: Regex,
    annotation: Regex,
}

impl SceneParser {
    pub fn new() -> Self {
        Self {
            header: header_regex(),
            annotation: Regex::new(r"（.*?）").expect("Invalid regex"),
        }
    }

    /// Parse a block, or `None` if it is not a usable scene.
    pub fn parse(&self, block: &SceneBlock) -> Option<SceneRecord> {
        self.try_parse(block).ok()
    }

    /// Parse a block, reporting why it was rejected.
    pub fn try_parse(&self, block: &SceneBlock) -> Result<SceneRecord, SceneRejection> {
        let lines: Vec<&str> = block
            .lines()
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        let header = *lines.first().ok_or(SceneRejection::Empty)?;
        if !(header.starts_with('第') && header.contains('幕')) {
            return Err(SceneRejection::NotAHeader(header.to_string()));
        }

        // Same pattern the segmenter opens blocks with.
        let scene_number = self
            .header
            .captures(header)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| SceneRejection::MalformedHeader(header.to_string()))?;

        let (location, body) = match lines.get(1).and_then(|l| strip_brackets(l)) {
            Some(location) => (location.to_string(), &lines[2..]),
            None => (String::new(), &lines[1..]),
        };

        let mut characters = BTreeSet::new();
        let mut content = Vec::with_capacity(body.len());

        for line in body {
            if let Some((raw_speaker, dialogue)) = line.split_once(SPEAKER_SEPARATOR) {
                match self.speaker_name(raw_speaker) {
                    Some(character) => {
                        content.push(format!(
                            "{}{}{}",
                            character,
                            SPEAKER_SEPARATOR,
                            dialogue.trim()
                        ));
                        characters.insert(character);
                    }
                    None => content.push(line.to_string()),
                }
            } else if strip_brackets(line).is_some() {
                content.push(line.to_string());
            } else {
                content.push(format!("{}{}{}", OPEN_BRACKET, line, CLOSE_BRACKET));
            }
        }

        debug!(
            "Parsed scene {} ({} lines, {} characters)",
            scene_number,
            content.len(),
            characters.len()
        );

        SceneRecord::new(scene_number, location, characters, content)
            .map_err(|e| SceneRejection::MalformedHeader(e.to_string()))
    }

    /// Speaker name from the text before the separator, with any
    /// `（...）` annotation removed. `None` when nothing is left.
    pub fn speaker_name(&self, raw: &str) -> Option<String> {
        let name = self.annotation.replace_all(raw.trim(), "");
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Re-derive the speaker set from reconstructed content lines.
    pub fn speakers<'a, I>(&self, lines: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .filter_map(|line| line.split_once(SPEAKER_SEPARATOR))
            .filter_map(|(raw, _)| self.speaker_name(raw))
            .collect()
    }
}

impl Default for SceneParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Inner text of a line fully wrapped in `（` … `）`.
fn strip_brackets(line: &str) -> Option<&str> {
    line.strip_prefix(OPEN_BRACKET)?.strip_suffix(CLOSE_BRACKET)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> SceneBlock {
        SceneBlock::from_lines(lines.iter().map(|l| l.to_string()))
    }

    #[test]
    fn test_dialogue_annotation_is_stripped() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&["第一幕", "甄嬛（微笑）：臣妾惶恐"]))
            .unwrap();

        assert_eq!(scene.characters, vec!["甄嬛".to_string()]);
        assert_eq!(scene.content, vec!["甄嬛：臣妾惶恐".to_string()]);
    }

    #[test]
    fn test_location_line() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&["第一幕", "（翊坤宫）", "华妃：都退下吧"]))
            .unwrap();

        assert_eq!(scene.scene_number, "一");
        assert_eq!(scene.location, "翊坤宫");
        assert_eq!(scene.content, vec!["华妃：都退下吧".to_string()]);
    }

    #[test]
    fn test_no_location_line() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&["第2幕", "华妃：都退下吧", "（众人退下）"]))
            .unwrap();

        assert_eq!(scene.scene_number, "2");
        assert_eq!(scene.location, "");
        assert_eq!(
            scene.content,
            vec!["华妃：都退下吧".to_string(), "（众人退下）".to_string()]
        );
    }

    #[test]
    fn test_action_and_narration_lines() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&["第三幕", "（御花园）", "（甄嬛独自赏花）", "一阵风吹过"]))
            .unwrap();

        assert!(scene.characters.is_empty());
        assert_eq!(
            scene.content,
            vec!["（甄嬛独自赏花）".to_string(), "（一阵风吹过）".to_string()]
        );
    }

    #[test]
    fn test_annotation_only_speaker_keeps_original_line() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&["第四幕", "（画外音）： 皇上驾到"]))
            .unwrap();

        assert!(scene.characters.is_empty());
        assert_eq!(scene.content, vec!["（画外音）： 皇上驾到".to_string()]);
    }

    #[test]
    fn test_dialogue_split_on_first_separator() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&["第五幕", "皇上 ： 传旨：封莞贵人"]))
            .unwrap();

        assert_eq!(scene.characters, vec!["皇上".to_string()]);
        assert_eq!(scene.content, vec!["皇上：传旨：封莞贵人".to_string()]);
    }

    #[test]
    fn test_characters_sorted_and_distinct() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&[
                "第六幕",
                "华妃：放肆",
                "甄嬛：臣妾不敢",
                "华妃（怒）：还敢顶嘴",
                "曹贵人：娘娘息怒",
            ]))
            .unwrap();

        let mut expected = vec!["华妃".to_string(), "甄嬛".to_string(), "曹贵人".to_string()];
        expected.sort();
        assert_eq!(scene.characters, expected);
        assert_eq!(scene.content.len(), 4);
    }

    #[test]
    fn test_rejects_non_header_block() {
        let parser = SceneParser::new();
        assert_eq!(parser.parse(&block(&["旁白文字", "华妃：放肆"])), None);
        assert_eq!(
            parser.try_parse(&block(&["旁白文字"])).unwrap_err(),
            SceneRejection::NotAHeader("旁白文字".to_string())
        );
        // contains 幕 but does not start with 第
        assert!(matches!(
            parser.try_parse(&block(&["序幕"])),
            Err(SceneRejection::NotAHeader(_))
        ));
    }

    #[test]
    fn test_rejects_empty_block() {
        let parser = SceneParser::new();
        assert_eq!(parser.try_parse(&block(&[])).unwrap_err(), SceneRejection::Empty);
        assert_eq!(parser.try_parse(&block(&["  "])).unwrap_err(), SceneRejection::Empty);
    }

    #[test]
    fn test_malformed_header_is_reported() {
        let parser = SceneParser::new();
        assert_eq!(
            parser.try_parse(&block(&["第某幕", "华妃：放肆"])).unwrap_err(),
            SceneRejection::MalformedHeader("第某幕".to_string())
        );
    }

    #[test]
    fn test_speakers_round_trip() {
        let parser = SceneParser::new();
        let scene = parser
            .parse(&block(&[
                "第七幕",
                "（碎玉轩）",
                "甄嬛（低声）：槿汐，你过来",
                "槿汐：小主",
                "（流朱掀帘进来）",
                "（画外音）：皇后娘娘到",
                "流朱（慌张）：小主，不好了",
                "窗外下起雨来",
            ]))
            .unwrap();

        let joined = scene.content.join("\n");
        let recovered: Vec<String> = parser.speakers(joined.lines()).into_iter().collect();
        assert_eq!(recovered, scene.characters);
    }
}
