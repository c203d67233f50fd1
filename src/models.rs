//! Data models and structures
//!
//! Defines the request payloads accepted from the learning client, the lesson
//! and pronunciation documents the model is asked to produce, and the runtime
//! configuration of the relay.

use crate::ai::gemini::DEFAULT_BASE_URL;
use crate::ai::DEFAULT_MODEL;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LANG: &str = "vi";

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

/// Language the learner reads translations and feedback in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Vi,
    En,
}

impl Lang {
    /// Only the exact code `vi` selects Vietnamese; everything else is English.
    pub fn from_code(code: &str) -> Self {
        if code == "vi" {
            Lang::Vi
        } else {
            Lang::En
        }
    }

    /// Label embedded into prompts wherever free text must be localized.
    pub fn display_label(self) -> &'static str {
        match self {
            Lang::Vi => "Vietnamese (Tiếng Việt)",
            Lang::En => "English",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonRequest {
    pub topic: String,
    pub level: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

impl LessonRequest {
    pub fn lang(&self) -> Lang {
        Lang::from_code(&self.lang)
    }
}

/// Pronunciation check assembled from the multipart upload.
#[derive(Debug, Clone)]
pub struct AudioAnalysisRequest {
    pub audio: Vec<u8>,
    pub target_text: String,
    pub target_pinyin: String,
    pub lang: String,
}

impl AudioAnalysisRequest {
    pub fn lang(&self) -> Lang {
        Lang::from_code(&self.lang)
    }
}

/// Typed view of a model document, used to validate what the model returned
/// before it is relayed.
pub trait ResponseSchema: DeserializeOwned {
    const NAME: &'static str;

    /// Gemini `responseSchema` describing the document, sent with the request
    /// so the model is constrained to the same shape that is validated here.
    fn gemini_schema() -> Value;

    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub hanzi: String,
    pub pinyin: String,
    pub translation: String,
    #[serde(rename = "type")]
    pub part_of_speech: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueLine {
    pub role: String,
    pub chinese: String,
    pub pinyin: String,
    pub translation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarPoint {
    pub structure: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonData {
    pub lesson_title: String,
    pub context_intro: String,
    pub vocabulary: Vec<VocabularyItem>,
    pub dialogue: Vec<DialogueLine>,
    pub grammar_point: GrammarPoint,
}

impl ResponseSchema for LessonData {
    const NAME: &'static str = "lesson";

    fn gemini_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "lesson_title": { "type": "STRING" },
                "context_intro": { "type": "STRING" },
                "vocabulary": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "hanzi": { "type": "STRING" },
                            "pinyin": { "type": "STRING" },
                            "translation": { "type": "STRING" },
                            "type": { "type": "STRING" }
                        },
                        "required": ["hanzi", "pinyin", "translation", "type"]
                    }
                },
                "dialogue": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "role": { "type": "STRING" },
                            "chinese": { "type": "STRING" },
                            "pinyin": { "type": "STRING" },
                            "translation": { "type": "STRING" }
                        },
                        "required": ["role", "chinese", "pinyin", "translation"]
                    }
                },
                "grammar_point": {
                    "type": "OBJECT",
                    "properties": {
                        "structure": { "type": "STRING" },
                        "explanation": { "type": "STRING" }
                    },
                    "required": ["structure", "explanation"]
                }
            },
            "required": ["lesson_title", "context_intro", "vocabulary", "dialogue", "grammar_point"]
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneAccuracy {
    Perfect,
    Good,
    #[serde(rename = "Needs Work")]
    NeedsWork,
    Bad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PronunciationError {
    pub word: String,
    #[serde(deserialize_with = "tone_string")]
    pub expected_tone: String,
    #[serde(deserialize_with = "tone_string")]
    pub heard_tone: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioAnalysis {
    pub heard_transcript: String,
    pub heard_pinyin: String,
    #[serde(deserialize_with = "whole_score")]
    pub score: u32,
    pub tone_accuracy: ToneAccuracy,
    pub errors: Vec<PronunciationError>,
    pub overall_feedback: String,
}

impl ResponseSchema for AudioAnalysis {
    const NAME: &'static str = "pronunciation analysis";

    fn gemini_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "heard_transcript": { "type": "STRING" },
                "heard_pinyin": { "type": "STRING" },
                "score": { "type": "NUMBER" },
                "tone_accuracy": {
                    "type": "STRING",
                    "enum": ["Perfect", "Good", "Needs Work", "Bad"]
                },
                "overall_feedback": { "type": "STRING" },
                "errors": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "word": { "type": "STRING" },
                            "expected_tone": { "type": "STRING" },
                            "heard_tone": { "type": "STRING" },
                            "comment": { "type": "STRING" }
                        },
                        "required": ["word", "expected_tone", "heard_tone", "comment"]
                    }
                }
            },
            "required": [
                "heard_transcript",
                "heard_pinyin",
                "score",
                "tone_accuracy",
                "overall_feedback",
                "errors"
            ]
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.score > 100 {
            return Err(format!("score {} is outside 0-100", self.score));
        }
        Ok(())
    }
}

// Models answer "Tone number (1-5)" as either "3" or 3.
fn tone_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tone {
        Text(String),
        Number(i64),
    }

    Ok(match Tone::deserialize(deserializer)? {
        Tone::Text(text) => text,
        Tone::Number(number) => number.to_string(),
    })
}

// Gemini types the score as NUMBER, so 85 may arrive as 85.0.
fn whole_score<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Whole(u64),
        Float(f64),
    }

    let whole = match Score::deserialize(deserializer)? {
        Score::Whole(n) => n,
        Score::Float(f) if f >= 0.0 && f.fract() == 0.0 => f as u64,
        Score::Float(f) => {
            return Err(D::Error::custom(format!(
                "score {} is not a non-negative whole number",
                f
            )))
        }
    };
    u32::try_from(whole).map_err(|_| D::Error::custom(format!("score {} is too large", whole)))
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub upstream_timeout: Duration,
    pub max_audio_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        check_env_file(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 = parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS", 60)?;
        if timeout_secs == 0 {
            return Err(Error::Config(
                "UPSTREAM_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 8000)?,
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            upstream_timeout: Duration::from_secs(timeout_secs),
            max_audio_bytes: parse_var(&lookup, "MAX_AUDIO_BYTES", 25 * 1024 * 1024)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A missing `.env` is fine; one that exists but cannot be read or parsed is not.
fn check_env_file<T>(loaded: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}
