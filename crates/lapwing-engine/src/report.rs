//! Batch outcomes: what happened to each input, and how long it took.
//!
//! A [`BatchReport`] holds one [`ImageOutcome`] per input, in input
//! order. Failures keep their typed error ([`ImageFailure`]) for callers
//! that want to match on them; serialization flattens them to their
//! `Display` text since arbitrary source/sink errors carry no serde
//! support.
//!
//! Durations are serialized as fractional seconds (`f64`).

use std::fmt::{self, Display, Write as _};
use std::time::Duration;

use serde::Serialize;
use serde::ser::Serializer;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }
}

/// Why a single image produced no output.
///
/// `L` is the image source's error type, `S` the pixel sink's.
#[derive(Debug, thiserror::Error)]
pub enum ImageFailure<L, S> {
    /// Opening or decoding the input failed.
    #[error("failed to load image: {0}")]
    Load(L),

    /// Creating or encoding the output failed.
    #[error("failed to store image: {0}")]
    Store(S),
}

impl<L, S> ImageFailure<L, S> {
    /// Short name of the stage that failed.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::Store(_) => "store",
        }
    }
}

/// Result of processing one input.
#[derive(Debug)]
pub struct ImageOutcome<L, S> {
    /// Human-readable identifier of the input (usually its path).
    pub label: String,
    /// Output name on success.
    pub result: Result<String, ImageFailure<L, S>>,
    /// Wall-clock time spent on this input, load through store.
    pub elapsed: Duration,
}

impl<L, S> ImageOutcome<L, S> {
    /// Returns `true` if an output was written.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        self.result.is_ok()
    }
}

/// Flat, serializable view of an [`ImageOutcome`].
#[derive(Serialize)]
struct OutcomeRecord<'a> {
    label: &'a str,
    output: Option<&'a str>,
    stage: Option<&'static str>,
    error: Option<String>,
    #[serde(with = "duration_serde")]
    elapsed: Duration,
}

impl<L: Display, S: Display> Serialize for ImageOutcome<L, S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let record = match &self.result {
            Ok(name) => OutcomeRecord {
                label: &self.label,
                output: Some(name),
                stage: None,
                error: None,
                elapsed: self.elapsed,
            },
            Err(failure) => OutcomeRecord {
                label: &self.label,
                output: None,
                stage: Some(failure.stage()),
                error: Some(failure.to_string()),
                elapsed: self.elapsed,
            },
        };
        record.serialize(serializer)
    }
}

/// Outcomes for a whole batch.
#[derive(Debug, Serialize)]
#[serde(bound(serialize = "L: Display, S: Display"))]
pub struct BatchReport<L, S> {
    /// One entry per input, in input order.
    pub outcomes: Vec<ImageOutcome<L, S>>,
    /// Wall-clock time for the whole batch.
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl<L, S> BatchReport<L, S> {
    /// Number of images written.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    /// Number of images skipped because of a failure.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.saved()
    }

    /// Outcomes that failed, with their inputs' labels.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ImageFailure<L, S>)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.label.as_str(), e)))
    }
}

impl<L: Display, S: Display> BatchReport<L, S> {
    /// Human-readable multi-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_summary(&mut out);
        out
    }

    fn write_summary(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            "{} of {} images saved in {:.3}ms",
            self.saved(),
            self.outcomes.len(),
            self.total_duration.as_secs_f64() * 1000.0,
        )?;
        for outcome in &self.outcomes {
            let ms = outcome.elapsed.as_secs_f64() * 1000.0;
            match &outcome.result {
                Ok(name) => writeln!(out, "  ok    {:<40} -> {name} ({ms:.3}ms)", outcome.label)?,
                Err(e) => writeln!(out, "  FAIL  {:<40} {e}", outcome.label)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    fn report() -> BatchReport<Boom, Boom> {
        BatchReport {
            outcomes: vec![
                ImageOutcome {
                    label: "a.png".into(),
                    result: Ok("a".into()),
                    elapsed: Duration::from_millis(2),
                },
                ImageOutcome {
                    label: "b.jpg".into(),
                    result: Err(ImageFailure::Load(Boom)),
                    elapsed: Duration::from_millis(1),
                },
                ImageOutcome {
                    label: "c.gif".into(),
                    result: Err(ImageFailure::Store(Boom)),
                    elapsed: Duration::from_millis(3),
                },
            ],
            total_duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn counts() {
        let report = report();
        assert_eq!(report.saved(), 1);
        assert_eq!(report.failed(), 2);
        let labels: Vec<&str> = report.failures().map(|(label, _)| label).collect();
        assert_eq!(labels, ["b.jpg", "c.gif"]);
    }

    #[test]
    fn failure_messages_name_stage() {
        let load: ImageFailure<Boom, Boom> = ImageFailure::Load(Boom);
        assert_eq!(load.to_string(), "failed to load image: boom");
        assert_eq!(load.stage(), "load");
        let store: ImageFailure<Boom, Boom> = ImageFailure::Store(Boom);
        assert_eq!(store.to_string(), "failed to store image: boom");
        assert_eq!(store.stage(), "store");
    }

    #[test]
    fn summary_lists_every_input() {
        let summary = report().summary();
        assert!(summary.starts_with("1 of 3 images saved"));
        assert!(summary.contains("a.png"));
        assert!(summary.contains("-> a"));
        assert!(summary.contains("b.jpg"));
        assert!(summary.contains("failed to load image: boom"));
        assert!(summary.contains("failed to store image: boom"));
    }

    #[test]
    fn serializes_flat_records() {
        let json: serde_json::Value = serde_json::to_value(report()).unwrap();
        let outcomes = json["outcomes"].as_array().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0]["output"], "a");
        assert!(outcomes[0]["error"].is_null());
        assert_eq!(outcomes[1]["stage"], "load");
        assert_eq!(outcomes[1]["error"], "failed to load image: boom");
        assert_eq!(outcomes[2]["stage"], "store");
        assert!((json["total_duration"].as_f64().unwrap() - 0.005).abs() < 1e-9);
    }
}
