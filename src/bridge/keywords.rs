//! # Keyword matching and a canned detection source.
//!
//! Real speech-to-text is out of scope. [`KeywordMatcher`] reproduces the
//! detector's decision rule on a transcription (case-insensitive substring,
//! first keyword in list order wins) and [`DetectionSimulator`] produces
//! plausible [`DetectionResult`]s for demos and manual testing.

use std::ops::Range;

use rand::Rng;

use super::detection::DetectionResult;

/// Keywords used when the user profile has none.
pub const DEFAULT_KEYWORDS: [&str; 6] = ["fire", "emergency", "evacuate", "danger", "warning", "alert"];

/// Case-insensitive keyword matcher.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    /// Builds a matcher from user keywords. Blank entries are ignored; an
    /// empty list falls back to [`DEFAULT_KEYWORDS`].
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Self::default();
        }
        Self { keywords }
    }

    /// Keywords in match order (lowercased).
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First keyword contained in `transcription`.
    pub fn find(&self, transcription: &str) -> Option<&str> {
        let haystack = transcription.to_lowercase();
        self.keywords
            .iter()
            .find(|k| haystack.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Classifies `transcription` with the given confidence.
    pub fn classify(&self, transcription: &str, confidence: f64) -> DetectionResult {
        match self.find(transcription) {
            Some(keyword) => DetectionResult::emergency(transcription, keyword, confidence),
            None => DetectionResult::normal(transcription, confidence),
        }
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

const EMERGENCY_PHRASES: [&str; 5] = [
    "Warning! Fire detected in the building. Please evacuate immediately.",
    "Emergency! Please proceed to the nearest exit.",
    "Attention all personnel. This is an emergency evacuation.",
    "Danger! Gas leak detected. Evacuate the premises immediately.",
    "Alert! Security breach on level 2. All personnel must evacuate.",
];

const NORMAL_PHRASES: [&str; 5] = [
    "The weather today is expected to be sunny with a high of 75 degrees.",
    "Welcome to our daily briefing. Today we'll discuss the quarterly results.",
    "Please remember to submit your reports by the end of the day.",
    "The cafeteria will be serving pizza and salad for lunch today.",
    "The next bus will arrive in approximately 5 minutes.",
];

/// Canned detection source.
#[derive(Debug, Clone, Default)]
pub struct DetectionSimulator {
    matcher: KeywordMatcher,
}

impl DetectionSimulator {
    /// Confidence range of simulated emergencies.
    pub const EMERGENCY_CONFIDENCE: Range<f64> = 0.85..1.0;
    /// Confidence range of simulated ordinary speech.
    pub const NORMAL_CONFIDENCE: Range<f64> = 0.5..0.8;

    /// Simulator that labels emergencies with `matcher`.
    pub fn new(matcher: KeywordMatcher) -> Self {
        Self { matcher }
    }

    /// A random emergency phrase, keyword taken from the matcher.
    pub fn emergency(&self) -> DetectionResult {
        let mut rng = rand::rng();
        let phrase = EMERGENCY_PHRASES[rng.random_range(0..EMERGENCY_PHRASES.len())];
        let confidence = rng.random_range(Self::EMERGENCY_CONFIDENCE);
        let keyword = self
            .matcher
            .find(phrase)
            .unwrap_or(super::detection::EmergencyLogEntry::DEFAULT_TYPE);
        DetectionResult::emergency(phrase, keyword, confidence)
    }

    /// A random ordinary phrase.
    pub fn normal(&self) -> DetectionResult {
        let mut rng = rand::rng();
        let phrase = NORMAL_PHRASES[rng.random_range(0..NORMAL_PHRASES.len())];
        DetectionResult::normal(phrase, rng.random_range(Self::NORMAL_CONFIDENCE))
    }

    /// Emergency with probability `emergency_ratio`, ordinary speech otherwise.
    pub fn next(&self, emergency_ratio: f64) -> DetectionResult {
        if rand::rng().random_bool(emergency_ratio.clamp(0.0, 1.0)) {
            self.emergency()
        } else {
            self.normal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_keyword_in_list_order_wins() {
        let m = KeywordMatcher::default();
        assert_eq!(
            m.find("Warning: Emergency situation detected."),
            Some("emergency")
        );
        assert_eq!(m.find("The FIRE alarm has been activated."), Some("fire"));
        assert_eq!(m.find("Please proceed to the nearest exit."), None);
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let m = KeywordMatcher::new(["  Tornado ", "", "flood"]);
        assert_eq!(m.keywords(), ["tornado", "flood"]);
        assert_eq!(m.find("fire!"), None);
        assert!(m.classify("Tornado warning issued", 0.9).is_emergency);

        let empty: [&str; 0] = [];
        assert_eq!(KeywordMatcher::new(empty).keywords().len(), DEFAULT_KEYWORDS.len());
    }

    #[test]
    fn simulated_results_stay_in_range() {
        let sim = DetectionSimulator::default();
        for _ in 0..50 {
            let e = sim.emergency();
            assert!(e.is_emergency);
            assert!(DetectionSimulator::EMERGENCY_CONFIDENCE.contains(&e.confidence));
            assert!(e.detected_keyword.is_some());
            assert!(e.validate().is_ok());

            let n = sim.normal();
            assert!(!n.is_emergency);
            assert!(DetectionSimulator::NORMAL_CONFIDENCE.contains(&n.confidence));
            assert_eq!(n.detected_keyword, None);
        }
        assert!(sim.next(1.0).is_emergency);
        assert!(!sim.next(0.0).is_emergency);
    }
}
