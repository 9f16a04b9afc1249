//! Script parsing and normalization.
//!
//! Turns one raw episode script into an [`EpisodeDocument`]:
//! raw text -> [`Normalizer`] -> [`SceneSegmenter`] -> [`SceneParser`] per
//! block -> assembled document. The episode number comes from the file name
//! via [`EpisodeIdentifier`].

mod episode;
mod normalize;
mod scene;
mod segment;

pub use episode::{chinese_digit, numeral_value, EpisodeIdentifier};
pub use normalize::Normalizer;
pub use scene::{SceneParser, SceneRejection, SPEAKER_SEPARATOR};
pub use segment::SceneSegmenter;

use crate::error::{Result, ScriptRagError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Digits or Chinese numerals as used in `第N集` and `第N幕` markers.
pub(crate) const NUMERAL_RUN: &str = r"[一二三四五六七八九十零\d]+";

/// The scene header pattern. Segmentation and parsing share it so a block
/// the segmenter opens is always one the parser accepts.
pub(crate) fn header_regex() -> Regex {
    Regex::new(&format!("^第({})幕", NUMERAL_RUN)).expect("Invalid regex")
}

/// Consecutive non-blank lines of one scene, header first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneBlock {
    lines: Vec<String>,
}

impl SceneBlock {
    /// Build a block from its lines. Blocks produced by [`SceneSegmenter`]
    /// always start with a header line; hand-built ones may not.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The first line, if any.
    pub fn header(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A parsed scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SceneRecordRepr")]
pub struct SceneRecord {
    /// Numeral token from the header (`一`, `12`), not converted to an integer.
    pub scene_number: String,
    /// Location from a bracketed line after the header, or empty.
    pub location: String,
    /// Distinct speaker names, sorted.
    pub characters: Vec<String>,
    /// Reconstructed lines in source order. Serialized newline-joined.
    #[serde(with = "joined_lines")]
    pub content: Vec<String>,
}

impl SceneRecord {
    /// Create a scene record. Characters are deduplicated and sorted.
    pub fn new<C>(
        scene_number: String,
        location: String,
        characters: C,
        content: Vec<String>,
    ) -> Result<Self>
    where
        C: IntoIterator<Item = String>,
    {
        if scene_number.trim().is_empty() {
            return Err(ScriptRagError::InvalidRecord(
                "scene_number must not be empty".to_string(),
            ));
        }

        let mut characters: Vec<String> = characters.into_iter().collect();
        characters.sort();
        characters.dedup();

        Ok(Self {
            scene_number,
            location,
            characters,
            content,
        })
    }

    /// Content lines joined with newlines, as persisted.
    pub fn content_text(&self) -> String {
        self.content.join("\n")
    }
}

#[derive(Deserialize)]
struct SceneRecordRepr {
    scene_number: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    characters: Vec<String>,
    #[serde(default, with = "joined_lines")]
    content: Vec<String>,
}

impl TryFrom<SceneRecordRepr> for SceneRecord {
    type Error = ScriptRagError;

    fn try_from(repr: SceneRecordRepr) -> Result<Self> {
        SceneRecord::new(repr.scene_number, repr.location, repr.characters, repr.content)
    }
}

/// One episode's structured scenes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EpisodeDocumentRepr")]
pub struct EpisodeDocument {
    pub episode_number: u32,
    pub episode_title: String,
    pub scenes: Vec<SceneRecord>,
}

impl EpisodeDocument {
    /// Create a document for a resolved (non-zero) episode number.
    pub fn new(episode_number: u32, scenes: Vec<SceneRecord>) -> Result<Self> {
        if episode_number == 0 {
            return Err(ScriptRagError::InvalidRecord(
                "episode_number 0 is the unresolved sentinel".to_string(),
            ));
        }

        Ok(Self {
            episode_number,
            episode_title: episode_title(episode_number),
            scenes,
        })
    }

    /// Output file name, e.g. `episode_03.json`.
    pub fn file_name(&self) -> String {
        episode_file_name(self.episode_number)
    }

    /// Pretty-printed JSON as written to disk.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Deserialize)]
struct EpisodeDocumentRepr {
    episode_number: u32,
    episode_title: String,
    #[serde(default)]
    scenes: Vec<SceneRecord>,
}

impl TryFrom<EpisodeDocumentRepr> for EpisodeDocument {
    type Error = ScriptRagError;

    fn try_from(repr: EpisodeDocumentRepr) -> Result<Self> {
        if repr.episode_number == 0 {
            return Err(ScriptRagError::InvalidRecord(
                "episode_number 0 is the unresolved sentinel".to_string(),
            ));
        }
        Ok(Self {
            episode_number: repr.episode_number,
            episode_title: repr.episode_title,
            scenes: repr.scenes,
        })
    }
}

/// Display title for an episode (`第3集`).
pub fn episode_title(episode_number: u32) -> String {
    format!("第{}集", episode_number)
}

/// Output file name for an episode, zero-padded to two digits.
pub fn episode_file_name(episode_number: u32) -> String {
    format!("episode_{:02}.json", episode_number)
}

/// Runs the full text-to-document transformation for single files.
#[derive(Default)]
pub struct ScriptProcessor {
    normalizer: Normalizer,
    identifier: EpisodeIdentifier,
    segmenter: SceneSegmenter,
    parser: SceneParser,
}

impl ScriptProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    /// Episode number from a file name; 0 when unresolved.
    pub fn episode_number(&self, filename: &str) -> u32 {
        self.identifier.identify(filename)
    }

    /// Segment cleaned text and parse every block into an episode document.
    ///
    /// Rejected blocks are dropped; the episode is still produced from the
    /// remaining scenes.
    pub fn assemble(&self, cleaned: &str, episode_number: u32) -> Result<EpisodeDocument> {
        let blocks = self.segmenter.segment(cleaned);
        let mut scenes = Vec::with_capacity(blocks.len());

        for block in &blocks {
            match self.parser.try_parse(block) {
                Ok(scene) => scenes.push(scene),
                Err(e @ SceneRejection::MalformedHeader(_)) => {
                    warn!("Episode {}: dropping scene: {}", episode_number, e);
                }
                Err(e) => {
                    debug!("Episode {}: skipping block: {}", episode_number, e);
                }
            }
        }

        debug!(
            "Episode {}: {} of {} blocks parsed",
            episode_number,
            scenes.len(),
            blocks.len()
        );

        EpisodeDocument::new(episode_number, scenes)
    }

    /// Normalize raw text, resolve the episode from the file name, and
    /// assemble the document.
    pub fn process(&self, filename: &str, raw: &str) -> Result<EpisodeDocument> {
        let cleaned = self.normalize(raw);
        let episode_number = self.identifier.resolve(filename)?;
        self.assemble(&cleaned, episode_number)
    }
}

/// Serde adapter storing `Vec<String>` as one newline-joined string.
mod joined_lines {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(lines: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&lines.join("\n"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(text.split('\n').map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "甄嬛传 第一集\n\n\
        第一幕\n（养心殿）\n皇上（放下奏折）：何事\n苏培盛：回皇上，选秀的日子定了\n\n\n\
        序幕\n\
        第二幕\n（甄府）\n甄远道：嬛儿，过来\n甄嬛：爹爹\n夜色渐深\n\
        第某幕\n华妃：不会出现\n\
        第三幕\n（御花园）\n（众秀女候选）\n";

    #[test]
    fn test_assemble_episode() {
        let processor = ScriptProcessor::new();
        let cleaned = processor.normalize(SCRIPT);
        let doc = processor.assemble(&cleaned, 1).unwrap();

        assert_eq!(doc.episode_number, 1);
        assert_eq!(doc.episode_title, "第1集");
        // 第某幕 is not a header, so its lines fold into scene 二
        assert_eq!(doc.scenes.len(), 3);

        let numbers: Vec<&str> = doc.scenes.iter().map(|s| s.scene_number.as_str()).collect();
        assert_eq!(numbers, vec!["一", "二", "三"]);

        assert_eq!(doc.scenes[0].location, "养心殿");
        assert_eq!(doc.scenes[0].characters, vec!["皇上".to_string(), "苏培盛".to_string()]);
        assert_eq!(
            doc.scenes[1].content.last().map(String::as_str),
            Some("华妃：不会出现")
        );
        // 序幕 follows scene 一 and is kept as narration there
        assert_eq!(doc.scenes[0].content.last().map(String::as_str), Some("（序幕）"));
        assert!(doc.scenes[2].characters.is_empty());
    }

    #[test]
    fn test_process_requires_episode_marker() {
        let processor = ScriptProcessor::new();
        let err = processor.process("剧本.txt", SCRIPT).unwrap_err();
        assert!(matches!(err, ScriptRagError::UnresolvableEpisode(_)));

        let doc = processor.process("甄嬛传第十一集.txt", SCRIPT).unwrap();
        assert_eq!(doc.episode_number, 11);
        assert_eq!(doc.file_name(), "episode_11.json");
    }

    #[test]
    fn test_episode_document_rejects_sentinel() {
        assert!(EpisodeDocument::new(0, Vec::new()).is_err());
        assert_eq!(episode_file_name(3), "episode_03.json");
        assert_eq!(episode_file_name(120), "episode_120.json");
    }

    #[test]
    fn test_scene_record_requires_number() {
        let err = SceneRecord::new(String::new(), String::new(), Vec::new(), Vec::new());
        assert!(matches!(err, Err(ScriptRagError::InvalidRecord(_))));
    }

    #[test]
    fn test_json_layout() {
        let scene = SceneRecord::new(
            "一".to_string(),
            "翊坤宫".to_string(),
            vec!["颂芝".to_string(), "华妃".to_string()],
            vec!["华妃：放肆".to_string(), "颂芝：娘娘息怒".to_string()],
        )
        .unwrap();
        let doc = EpisodeDocument::new(2, vec![scene]).unwrap();
        let json = doc.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["episode_number"], 2);
        assert_eq!(value["episode_title"], "第2集");
        assert_eq!(value["scenes"][0]["content"], "华妃：放肆\n颂芝：娘娘息怒");
        assert_eq!(value["scenes"][0]["characters"][0], "华妃");

        // non-ASCII is written verbatim, fields in contract order
        assert!(json.contains("\"episode_title\": \"第2集\""));
        let number_at = json.find("episode_number").unwrap();
        let title_at = json.find("episode_title").unwrap();
        let scenes_at = json.find("scenes").unwrap();
        assert!(number_at < title_at && title_at < scenes_at);

        let parsed: EpisodeDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_deserialize_rejects_invalid_records() {
        let missing_number = r#"{"episode_number": 1, "episode_title": "第1集",
            "scenes": [{"scene_number": "", "location": "", "characters": [], "content": ""}]}"#;
        assert!(serde_json::from_str::<EpisodeDocument>(missing_number).is_err());

        let zero_episode = r#"{"episode_number": 0, "episode_title": "第0集", "scenes": []}"#;
        assert!(serde_json::from_str::<EpisodeDocument>(zero_episode).is_err());
    }
}
