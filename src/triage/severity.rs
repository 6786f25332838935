use std::collections::BTreeSet;

use serde::Serialize;

const HIGH_THREAT_KEYWORDS: &[&str] = &[
    "kill", "murder", "death", "suicide", "bomb", "explosive", "weapon", "gun", "shoot", "attack",
    "assault", "rape", "abuse", "threat", "dangerous", "emergency", "urgent", "immediate", "help",
    "save", "rescue", "fire", "accident", "hospital", "ambulance",
];

const MEDIUM_THREAT_KEYWORDS: &[&str] = &[
    "harassment", "bully", "intimidate", "scare", "fear", "afraid", "worried", "concerned",
    "stolen", "theft", "robbery", "fraud", "cheat", "scam", "illegal", "criminal", "police", "law",
    "court", "legal", "justice", "rights", "violation",
];

const URGENCY_INDICATORS: &[&str] = &[
    "now", "immediately", "urgent", "emergency", "asap", "quick", "fast", "hurry", "critical",
    "serious", "important", "danger", "risk", "threat", "help",
];

const IMMEDIATE_ATTENTION_WORDS: &[&str] = &["emergency", "immediate", "urgent", "help"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Fearful,
    Sad,
    Happy,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Sad,
        Emotion::Happy,
        Emotion::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Sad => "sad",
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Emotion::Angry => &["angry", "furious", "mad", "rage", "hate", "disgust", "outrage"],
            Emotion::Fearful => &[
                "afraid", "scared", "fear", "terrified", "panic", "anxiety", "worried",
            ],
            Emotion::Sad => &["sad", "depressed", "unhappy", "crying", "tears", "grief", "sorrow"],
            Emotion::Happy => &["happy", "joy", "pleased", "satisfied", "content", "grateful"],
            Emotion::Neutral => &["neutral", "normal", "fine", "okay", "alright"],
        }
    }

    fn is_negative(self) -> bool {
        matches!(self, Emotion::Angry | Emotion::Fearful)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

pub type Priority = Level;
pub type ThreatLevel = Level;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityReport {
    pub emotion: Emotion,
    pub priority: Priority,
    pub threat_level: ThreatLevel,
    pub risk_factors: Vec<&'static str>,
    pub requires_immediate_attention: bool,
    pub exact_keywords: Vec<&'static str>,
}

pub fn analyze(text: &str) -> SeverityReport {
    let text = text.to_lowercase();
    let found_high = keyword_hits(&text, HIGH_THREAT_KEYWORDS);
    let found_medium = keyword_hits(&text, MEDIUM_THREAT_KEYWORDS);
    let urgency = keyword_hits(&text, URGENCY_INDICATORS).len();

    let mut threat_level = if !found_high.is_empty() {
        Level::High
    } else if found_medium.len() > 2 || urgency > 3 {
        Level::Medium
    } else {
        Level::Low
    };

    let priority = if threat_level == Level::High || urgency > 5 {
        Level::High
    } else if threat_level == Level::Medium || urgency > 2 {
        Level::Medium
    } else {
        Level::Low
    };

    // priority is settled before the emotion escalation
    let emotion = dominant_emotion(&text);
    if threat_level == Level::Low && emotion.is_negative() {
        threat_level = Level::Medium;
    }

    let mut risk_factors = Vec::new();
    if !found_high.is_empty() {
        risk_factors.push("high_threat_keywords");
    }
    if found_medium.len() > 2 {
        risk_factors.push("multiple_legal_issues");
    }
    if urgency > 3 {
        risk_factors.push("high_urgency");
    }
    if emotion.is_negative() {
        risk_factors.push("negative_emotion");
    }

    let requires_immediate_attention = threat_level == Level::High
        || urgency > 5
        || IMMEDIATE_ATTENTION_WORDS.iter().any(|word| text.contains(word));

    let exact_keywords: BTreeSet<&'static str> =
        found_high.into_iter().chain(found_medium).collect();

    SeverityReport {
        emotion,
        priority,
        threat_level,
        risk_factors,
        requires_immediate_attention,
        exact_keywords: exact_keywords.into_iter().collect(),
    }
}

fn keyword_hits(text: &str, keywords: &[&'static str]) -> Vec<&'static str> {
    keywords
        .iter()
        .copied()
        .filter(|keyword| text.contains(keyword))
        .collect()
}

fn dominant_emotion(text: &str) -> Emotion {
    let mut best = Emotion::Neutral;
    let mut best_hits = 0;
    for emotion in Emotion::ALL {
        let hits = keyword_hits(text, emotion.keywords()).len();
        if hits > best_hits {
            best = emotion;
            best_hits = hits;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bomb_is_high_threat_and_high_priority() {
        let report = analyze("There is a BOMB near the bus stand");
        assert_eq!(report.threat_level, Level::High);
        assert_eq!(report.priority, Level::High);
        assert!(report.risk_factors.contains(&"high_threat_keywords"));
        assert!(report.requires_immediate_attention);
        assert_eq!(report.exact_keywords, vec!["bomb"]);
    }

    #[test]
    fn several_legal_keywords_raise_threat_to_medium() {
        let report =
            analyze("My phone was stolen in a fraud, this is illegal and I went to the police");
        assert_eq!(report.threat_level, Level::Medium);
        assert_eq!(report.priority, Level::Medium);
        assert_eq!(report.risk_factors, vec!["multiple_legal_issues"]);
        assert_eq!(
            report.exact_keywords,
            vec!["fraud", "illegal", "legal", "police", "stolen"]
        );
        assert!(!report.requires_immediate_attention);
    }

    #[test]
    fn fearful_text_escalates_threat_but_not_priority() {
        let report = analyze("I am scared");
        assert_eq!(report.emotion, Emotion::Fearful);
        assert_eq!(report.threat_level, Level::Medium);
        assert_eq!(report.priority, Level::Low);
        assert_eq!(report.risk_factors, vec!["negative_emotion"]);
    }

    #[test]
    fn plain_text_is_low_and_neutral() {
        let report = analyze("The streetlight on our road has been off for a week");
        assert_eq!(report.emotion, Emotion::Neutral);
        assert_eq!(report.threat_level, Level::Low);
        assert_eq!(report.priority, Level::Low);
        assert!(report.risk_factors.is_empty());
        assert!(report.exact_keywords.is_empty());
        assert!(!report.requires_immediate_attention);
    }

    #[test]
    fn emotion_ties_follow_category_order() {
        // one angry hit ("furious") and one sad hit ("crying")
        assert_eq!(analyze("furious and crying").emotion, Emotion::Angry);
        // one sad hit ("grief") and one happy hit ("grateful")
        assert_eq!(analyze("grief, yet grateful").emotion, Emotion::Sad);
    }

    #[test]
    fn urgency_alone_drives_priority() {
        // "quick", "fast", "hurry" and "critical" are urgency-only words
        let report = analyze("quick fast hurry critical");
        assert_eq!(report.threat_level, Level::Medium);
        assert_eq!(report.priority, Level::Medium);
        assert_eq!(report.risk_factors, vec!["high_urgency"]);
        assert!(!report.requires_immediate_attention);
    }

    #[test]
    fn risk_factors_keep_fixed_order() {
        let report = analyze(
            "I am furious, there was an attack, fraud, theft and a court case, \
             please be quick, fast, hurry, this is critical",
        );
        assert_eq!(
            report.risk_factors,
            vec![
                "high_threat_keywords",
                "multiple_legal_issues",
                "high_urgency",
                "negative_emotion"
            ]
        );
    }

    #[test]
    fn single_urgency_word_does_not_need_immediate_attention() {
        let report = analyze("please reply asap");
        assert_eq!(report.priority, Level::Low);
        assert!(!report.requires_immediate_attention);
    }

    #[test]
    fn analysis_is_repeatable() {
        let text = "Someone threatened to kill me, please help now";
        assert_eq!(analyze(text), analyze(text));
    }
}
