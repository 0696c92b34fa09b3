//! Analysis result types and outcome routing

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// `ansFilter` value the service uses for clips without a usable bark
pub const NOISE_FILTER: &str = "noise";

/// One analysis record as returned by the result endpoint.
///
/// Every field is optional on the wire; a record missing `ansDog` or
/// `ansFilter` is incomplete and the poller keeps waiting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "ansDog", default, deserialize_with = "lenient_string")]
    pub ans_dog: Option<String>,

    #[serde(rename = "ansFilter", default, deserialize_with = "lenient_string")]
    pub ans_filter: Option<String>,

    /// Filename the service saw on upload; echoes the correlation token
    #[serde(rename = "fileNameOrigin", default, deserialize_with = "lenient_string")]
    pub file_name_origin: Option<String>,

    #[serde(rename = "startTime", default, deserialize_with = "lenient_string")]
    pub start_time: Option<String>,

    #[serde(rename = "endTime", default, deserialize_with = "lenient_string")]
    pub end_time: Option<String>,
}

impl AnalysisResult {
    /// Both classification fields are present and non-empty
    pub fn is_complete(&self) -> bool {
        self.ans_dog.is_some() && self.ans_filter.is_some()
    }

    /// Route this record to what the user sees.
    ///
    /// The noise filter wins over any emotion code.
    pub fn outcome(&self) -> AnalysisOutcome {
        if self.ans_filter.as_deref() == Some(NOISE_FILTER) {
            return AnalysisOutcome::NoiseDetected;
        }
        let code = self.ans_dog.clone().unwrap_or_default();
        match Emotion::from_code(&code) {
            Some(emotion) => AnalysisOutcome::Emotion(emotion),
            None => AnalysisOutcome::Unrecognized(code),
        }
    }
}

/// Accept strings or numbers; treat null and blank strings as absent
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Emotions the service can report, `dog_1` through `dog_8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Energetic,
    Demanding,
    Angry,
    Defensive,
    Attention,
    Lonely,
    Talkative,
    Sick,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Energetic,
        Emotion::Demanding,
        Emotion::Angry,
        Emotion::Defensive,
        Emotion::Attention,
        Emotion::Lonely,
        Emotion::Talkative,
        Emotion::Sick,
    ];

    /// Parse `dog_N` or a bare `N`
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        let digits = code.strip_prefix("dog_").unwrap_or(code);
        let index: usize = digits.parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    pub fn code(&self) -> String {
        let index = Self::ALL
            .iter()
            .position(|e| e == self)
            .map_or(0, |i| i + 1);
        format!("dog_{}", index)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Energetic => "energetic",
            Emotion::Demanding => "demanding",
            Emotion::Angry => "angry",
            Emotion::Defensive => "defensive",
            Emotion::Attention => "attention seeking",
            Emotion::Lonely => "lonely",
            Emotion::Talkative => "talkative",
            Emotion::Sick => "unwell",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the caller should show for a finished analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// The clip was classified as noise, not a bark
    NoiseDetected,
    Emotion(Emotion),
    /// A code this client does not know
    Unrecognized(String),
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisOutcome::NoiseDetected => write!(f, "noise detected, no bark found"),
            AnalysisOutcome::Emotion(emotion) => write!(f, "{} ({})", emotion, emotion.code()),
            AnalysisOutcome::Unrecognized(code) => write!(f, "unrecognized result '{}'", code),
        }
    }
}

/// Acknowledgement returned by the upload endpoint.
///
/// The service body is opaque beyond being JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadAck {
    pub filename: String,
    pub body: serde_json::Value,
}
