//! Structural validation for scores
//!
//! Checks are small predicates over a single value. Every type in the score
//! implements [`Validate`] by running checks against its fields and recording
//! each failure in a [`Report`] under a path such as
//! `parts[0].events[1][2].amplitude`.

use std::fmt;
use thiserror::Error;

use super::{NoteEvent, Part, Score, ScoreConfig, Sound, Timbre};

/// A single failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors produced when loading a score
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The document does not have the expected shape
    #[error("Malformed score: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document parsed but broke one or more rules
    #[error("Invalid score: {}", summarize(.0))]
    Invalid(Vec<Violation>),
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A predicate over a numeric value
pub trait Check {
    /// Returns a description of the failure, if any
    fn check(&self, value: f64) -> Result<(), String>;
}

/// Finite and strictly greater than zero
pub struct Positive;

impl Check for Positive {
    fn check(&self, value: f64) -> Result<(), String> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(format!("must be a finite number greater than 0, got {}", value))
        }
    }
}

/// Inside an inclusive range
pub struct Within {
    pub min: f64,
    pub max: f64,
}

impl Within {
    pub const UNIT: Within = Within { min: 0.0, max: 1.0 };
}

impl Check for Within {
    fn check(&self, value: f64) -> Result<(), String> {
        if (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(format!(
                "must be within [{}, {}], got {}",
                self.min, self.max, value
            ))
        }
    }
}

/// Accumulates violations while walking a score
#[derive(Debug, Default)]
pub struct Report {
    violations: Vec<Violation>,
}

impl Report {
    /// Runs `check` against `value` and records a violation at `path` on failure
    pub fn require(&mut self, path: impl fmt::Display, value: f64, check: &dyn Check) {
        if let Err(message) = check.check(value) {
            self.fail(path, message);
        }
    }

    /// Records a violation unconditionally
    pub fn fail(&mut self, path: impl fmt::Display, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn finish(self) -> Result<(), ScoreError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ScoreError::Invalid(self.violations))
        }
    }
}

/// Something that can check its own structure
pub trait Validate {
    /// Validates `self`, reporting violations relative to `path`
    fn validate_at(&self, path: &str, report: &mut Report);
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}

impl Validate for Score {
    fn validate_at(&self, path: &str, report: &mut Report) {
        self.config.validate_at(&join(path, "config"), report);

        let parts_path = join(path, "parts");
        if self.parts.is_empty() {
            report.fail(&parts_path, "must contain at least one part");
        }
        for (idx, part) in self.parts.iter().enumerate() {
            part.validate_at(&format!("{}[{}]", parts_path, idx), report);
        }
    }
}

impl Validate for ScoreConfig {
    fn validate_at(&self, path: &str, report: &mut Report) {
        report.require(join(path, "cps"), self.cps, &Positive);
        report.require(join(path, "root"), self.root, &Positive);
    }
}

impl Validate for Part {
    fn validate_at(&self, path: &str, report: &mut Report) {
        self.sound.validate_at(&join(path, "sound"), report);

        let events_path = join(path, "events");
        for (line_idx, line) in self.events.iter().enumerate() {
            for (idx, event) in line.iter().enumerate() {
                event.validate_at(&format!("{}[{}][{}]", events_path, line_idx, idx), report);
            }
        }
    }
}

impl Validate for Sound {
    fn validate_at(&self, path: &str, report: &mut Report) {
        self.timbre.validate_at(&join(path, "timbre"), report);
        report.require(join(path, "duty"), self.duty, &Within::UNIT);
        report.require(join(path, "minFrequency"), self.min_frequency, &Positive);
        report.require(join(path, "maxFrequency"), self.max_frequency, &Positive);

        if self.min_frequency > self.max_frequency {
            report.fail(
                join(path, "maxFrequency"),
                format!(
                    "must not be below minFrequency ({} < {})",
                    self.max_frequency, self.min_frequency
                ),
            );
        }
    }
}

impl Validate for Timbre {
    fn validate_at(&self, path: &str, report: &mut Report) {
        if let Timbre::Sample(sample) = self {
            if !sample.to_ascii_lowercase().ends_with(".wav") {
                report.fail(
                    path,
                    format!(
                        "must be one of sine, square, sawtooth, triangle or a .wav sample path, got '{}'",
                        sample
                    ),
                );
            }
        }
    }
}

impl Validate for NoteEvent {
    fn validate_at(&self, path: &str, report: &mut Report) {
        report.require(join(path, "duration"), self.duration(), &Positive);
        report.require(join(path, "frequency"), self.frequency(), &Positive);
        report.require(join(path, "amplitude"), self.amplitude(), &Within::UNIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive() {
        assert!(Positive.check(0.1).is_ok());
        assert!(Positive.check(0.0).is_err());
        assert!(Positive.check(-1.0).is_err());
        assert!(Positive.check(f64::NAN).is_err());
        assert!(Positive.check(f64::INFINITY).is_err());
    }

    #[test]
    fn test_within_is_inclusive() {
        assert!(Within::UNIT.check(0.0).is_ok());
        assert!(Within::UNIT.check(1.0).is_ok());
        assert!(Within::UNIT.check(1.01).is_err());
        assert!(Within::UNIT.check(f64::NAN).is_err());
    }

    #[test]
    fn test_report_paths() {
        let mut report = Report::default();
        NoteEvent(1.0, -2.0, 0.5).validate_at("line[3]", &mut report);
        assert!(!report.is_clean());

        let err = report.finish().unwrap_err();
        let ScoreError::Invalid(violations) = err else {
            panic!("expected violations");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "line[3].frequency");
    }

    #[test]
    fn test_error_message_lists_violations() {
        let err = ScoreError::Invalid(vec![
            Violation {
                path: "config.cps".to_string(),
                message: "bad".to_string(),
            },
            Violation {
                path: "config.root".to_string(),
                message: "worse".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid score: config.cps: bad; config.root: worse"
        );
    }
}
