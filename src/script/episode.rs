//! Episode number resolution from script file names.
//!
//! File names carry a `第<numeral>集` marker where the numeral is either
//! Arabic digits or Chinese numerals (`三`, `十一`, `二十`).

use super::NUMERAL_RUN;
use crate::error::{Result, ScriptRagError};
use regex::Regex;

/// Resolves the episode index encoded in a file name.
pub struct EpisodeIdentifier {
    marker: Regex,
}

impl EpisodeIdentifier {
    pub fn new() -> Self {
        let marker = Regex::new(&format!("第({})集", NUMERAL_RUN)).expect("Invalid regex");
        Self { marker }
    }

    /// Extract the episode number, or 0 if the name has no usable marker.
    ///
    /// 0 is a sentinel for "unresolved", never a real episode.
    pub fn identify(&self, filename: &str) -> u32 {
        let Some(caps) = self.marker.captures(filename) else {
            return 0;
        };
        numeral_value(&caps[1]).unwrap_or(0)
    }

    /// Like [`identify`](Self::identify), but the sentinel becomes an error.
    pub fn resolve(&self, filename: &str) -> Result<u32> {
        match self.identify(filename) {
            0 => Err(ScriptRagError::UnresolvableEpisode(filename.to_string())),
            n => Ok(n),
        }
    }
}

impl Default for EpisodeIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of a single Chinese digit character (`零` through `十`).
pub fn chinese_digit(c: char) -> Option<u32> {
    let value = match c {
        '零' => 0,
        '一' => 1,
        '二' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        '十' => 10,
        _ => return None,
    };
    Some(value)
}

/// Digit value of a string holding exactly one Chinese digit.
fn single_digit(s: &str) -> Option<u32> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => chinese_digit(c),
        _ => None,
    }
}

/// Convert a numeral run to an integer.
///
/// Handles ASCII digits, a single Chinese digit, and the `X十Y` compound
/// form (`十一` = 11, `二十` = 20, `二十三` = 23). Anything else is `None`.
pub fn numeral_value(run: &str) -> Option<u32> {
    if run.is_empty() {
        return None;
    }

    if run.chars().all(|c| c.is_ascii_digit()) {
        return run.parse().ok();
    }

    if let Some(value) = single_digit(run) {
        return Some(value);
    }

    let parts: Vec<&str> = run.split('十').collect();
    if parts.len() != 2 {
        return None;
    }

    let tens = if parts[0].is_empty() {
        1
    } else {
        single_digit(parts[0]).filter(|d| *d < 10)?
    };
    let units = if parts[1].is_empty() {
        0
    } else {
        single_digit(parts[1]).filter(|d| *d < 10)?
    };

    Some(tens * 10 + units)
}
