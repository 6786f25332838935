use std::fmt;

use serde::{Serialize, Serializer};

pub const MIN_DETECTABLE_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageLabel {
    English,
    Hindi,
    Kannada,
    Tamil,
    Telugu,
    Malayalam,
    Unknown,
}

impl LanguageLabel {
    pub const SUPPORTED: [LanguageLabel; 6] = [
        LanguageLabel::English,
        LanguageLabel::Hindi,
        LanguageLabel::Kannada,
        LanguageLabel::Tamil,
        LanguageLabel::Telugu,
        LanguageLabel::Malayalam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageLabel::English => "English",
            LanguageLabel::Hindi => "Hindi",
            LanguageLabel::Kannada => "Kannada",
            LanguageLabel::Tamil => "Tamil",
            LanguageLabel::Telugu => "Telugu",
            LanguageLabel::Malayalam => "Malayalam",
            LanguageLabel::Unknown => "Unknown",
        }
    }

    pub fn code(self) -> Option<&'static str> {
        match self {
            LanguageLabel::English => Some("en"),
            LanguageLabel::Hindi => Some("hi"),
            LanguageLabel::Kannada => Some("kn"),
            LanguageLabel::Tamil => Some("ta"),
            LanguageLabel::Telugu => Some("te"),
            LanguageLabel::Malayalam => Some("ml"),
            LanguageLabel::Unknown => None,
        }
    }
}

impl fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LanguageLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub fn detect_language(text: &str) -> LanguageLabel {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_DETECTABLE_CHARS {
        return LanguageLabel::Unknown;
    }

    // Tallies in `SUPPORTED` order.
    let mut tallies = [0usize; 6];
    for ch in trimmed.chars() {
        if let Some(label) = script_of(ch) {
            if let Some(slot) = LanguageLabel::SUPPORTED.iter().position(|l| *l == label) {
                tallies[slot] += 1;
            }
        }
    }

    let mut best = LanguageLabel::English;
    let mut best_count = 0;
    for (label, count) in LanguageLabel::SUPPORTED.into_iter().zip(tallies) {
        if count > best_count {
            best = label;
            best_count = count;
        }
    }
    best
}

fn script_of(ch: char) -> Option<LanguageLabel> {
    match ch {
        'a'..='z' | 'A'..='Z' => Some(LanguageLabel::English),
        '\u{0900}'..='\u{097F}' | '\u{A8E0}'..='\u{A8FF}' => Some(LanguageLabel::Hindi),
        '\u{0B80}'..='\u{0BFF}' => Some(LanguageLabel::Tamil),
        '\u{0C00}'..='\u{0C7F}' => Some(LanguageLabel::Telugu),
        '\u{0C80}'..='\u{0CFF}' => Some(LanguageLabel::Kannada),
        '\u{0D00}'..='\u{0D7F}' => Some(LanguageLabel::Malayalam),
        _ => None,
    }
}
