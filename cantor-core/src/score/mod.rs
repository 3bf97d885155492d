//! Render input document
//!
//! A score is the structured document handed to the external renderer: a
//! global configuration plus a list of parts, each pairing a sound
//! descriptor with lines of note events.
//!
//! Scores are validated at the boundary, before a job is created, so the
//! worker never sees a malformed document.

mod validate;

pub use validate::{Check, Positive, Report, ScoreError, Validate, Violation, Within};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete render input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub config: ScoreConfig,
    pub parts: Vec<Part>,
}

impl Score {
    /// Parses a score from JSON and validates it
    ///
    /// # Errors
    /// Returns [`ScoreError::Malformed`] when the document does not have the
    /// expected shape (missing fields, note events that are not 3-tuples) and
    /// [`ScoreError::Invalid`] with every violation found otherwise.
    pub fn from_json(source: &str) -> Result<Self, ScoreError> {
        let score: Score = serde_json::from_str(source)?;
        score.validate()?;
        Ok(score)
    }

    /// Runs every structural check over the score
    pub fn validate(&self) -> Result<(), ScoreError> {
        let mut report = Report::default();
        self.validate_at("", &mut report);
        report.finish()
    }

    /// Total number of note events across all parts
    pub fn event_count(&self) -> usize {
        self.parts
            .iter()
            .flat_map(|part| part.events.iter())
            .map(Vec::len)
            .sum()
    }
}

/// Global render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Cycles per second
    pub cps: f64,
    /// Root frequency
    pub root: f64,
}

/// One voice of the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub sound: Sound,
    /// Lines of note events
    pub events: Vec<Vec<NoteEvent>>,
}

/// Sound descriptor for a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sound {
    pub timbre: Timbre,
    /// Duty cycle ratio in [0, 1]
    pub duty: f64,
    pub min_frequency: f64,
    pub max_frequency: f64,
}

/// `[duration, frequency, amplitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent(pub f64, pub f64, pub f64);

impl NoteEvent {
    pub fn duration(&self) -> f64 {
        self.0
    }

    pub fn frequency(&self) -> f64 {
        self.1
    }

    pub fn amplitude(&self) -> f64 {
        self.2
    }
}

/// Built-in oscillator shapes understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oscillator {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Oscillator {
    pub const ALL: [Oscillator; 4] = [
        Oscillator::Sine,
        Oscillator::Square,
        Oscillator::Sawtooth,
        Oscillator::Triangle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Oscillator::Sine => "sine",
            Oscillator::Square => "square",
            Oscillator::Sawtooth => "sawtooth",
            Oscillator::Triangle => "triangle",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|osc| osc.as_str() == name)
    }
}

/// Either a built-in oscillator or a path to a sample
///
/// Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Timbre {
    Oscillator(Oscillator),
    Sample(String),
}

impl From<String> for Timbre {
    fn from(value: String) -> Self {
        match Oscillator::parse(&value) {
            Some(osc) => Timbre::Oscillator(osc),
            None => Timbre::Sample(value),
        }
    }
}

impl From<Timbre> for String {
    fn from(value: Timbre) -> Self {
        match value {
            Timbre::Oscillator(osc) => osc.as_str().to_string(),
            Timbre::Sample(path) => path,
        }
    }
}

impl fmt::Display for Timbre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timbre::Oscillator(osc) => f.write_str(osc.as_str()),
            Timbre::Sample(path) => f.write_str(path),
        }
    }
}
