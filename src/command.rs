//! Control input from menus and voice recognition.

use crate::profile::ProfileSet;

/// Recognitions below this confidence are treated as unheard.
pub const CONFIDENCE_THRESHOLD: f32 = 0.3;

const EXPORT_KEYWORDS: &[&str] = &["EXPORT", "SAVE"];
const EXIT_KEYWORDS: &[&str] = &["EXIT", "QUIT"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch the active mask.
    SelectProfile(String),
    /// Write the current mesh to the configured export path.
    Export,
    /// Leave the face-tracking view.
    Exit,
}

impl Command {
    /// Turn a recognized keyword into a command.
    ///
    /// Returns `None` for low-confidence recognitions and unknown words.
    pub fn recognize(keyword: &str, confidence: f32, profiles: &ProfileSet) -> Option<Self> {
        if confidence < CONFIDENCE_THRESHOLD {
            return None;
        }
        Self::parse(keyword, profiles)
    }

    /// Map a keyword to a command regardless of confidence.
    pub fn parse(keyword: &str, profiles: &ProfileSet) -> Option<Self> {
        let keyword = keyword.trim();

        if let Some(profile) = profiles.by_keyword(keyword) {
            return Some(Command::SelectProfile(profile.name.clone()));
        }
        if EXPORT_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            return Some(Command::Export);
        }
        if EXIT_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            return Some(Command::Exit);
        }
        None
    }
}
