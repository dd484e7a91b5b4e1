//! Band tables and classification.
//!
//! Numeric tables are ordered, closed-open `[lower, upper)` ranges that
//! together cover the whole real line: the first band has no lower bound and
//! the last has no upper bound. A boundary value therefore always belongs to
//! the band that starts at it.
//!
//! Choice tables map an enumerated value straight to a label and score.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Classification, Polarity};

/// Structural problems in a band or choice table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BandTableError {
    #[error("table has no bands")]
    Empty,

    #[error("first band must be unbounded below")]
    BoundedBelow,

    #[error("last band must be unbounded above")]
    BoundedAbove,

    #[error("band {index} is missing its {side} bound")]
    OpenInterior { index: usize, side: &'static str },

    #[error("band {index} bound is not finite")]
    NonFiniteBound { index: usize },

    #[error("band {index} is empty or inverted ({lower} >= {upper})")]
    Inverted { index: usize, lower: f64, upper: f64 },

    #[error("gap or overlap after band {index}: upper {upper} vs next lower {lower}")]
    Discontinuous { index: usize, upper: f64, lower: f64 },

    #[error("band {index} score {score} breaks {polarity:?} ordering")]
    NonMonotonic {
        index: usize,
        score: u8,
        polarity: Polarity,
    },

    #[error("score {score} for '{label}' outside range {min}..={max}")]
    ScoreOutOfRange {
        label: String,
        score: u8,
        min: u8,
        max: u8,
    },

    #[error("choice table has no choices")]
    NoChoices,

    #[error("choice value must not be blank")]
    BlankChoice,

    #[error("duplicate choice value: {0}")]
    DuplicateChoice(String),
}

/// Inclusive bounds every score must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u8,
    pub max: u8,
}

impl ScoreRange {
    pub fn contains(&self, score: u8) -> bool {
        (self.min..=self.max).contains(&score)
    }

    fn check(&self, label: &str, score: u8) -> Result<(), BandTableError> {
        if self.contains(score) {
            Ok(())
        } else {
            Err(BandTableError::ScoreOutOfRange {
                label: label.to_string(),
                score,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// One numeric range `[lower, upper)`; `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    pub label: String,
    pub score: u8,
}

impl Band {
    fn classification(&self) -> Classification {
        Classification {
            label: self.label.clone(),
            score: self.score,
        }
    }
}

/// A validated, total numeric band table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTable {
    polarity: Polarity,
    bands: Vec<Band>,
}

impl BandTable {
    /// Build a table, rejecting gaps, overlaps, out-of-range scores and
    /// orderings that contradict `polarity`.
    pub fn new(
        polarity: Polarity,
        bands: Vec<Band>,
        range: ScoreRange,
    ) -> Result<Self, BandTableError> {
        let last = bands.len().checked_sub(1).ok_or(BandTableError::Empty)?;

        for (index, band) in bands.iter().enumerate() {
            range.check(&band.label, band.score)?;

            match (index, band.lower) {
                (0, Some(_)) => return Err(BandTableError::BoundedBelow),
                (0, None) => {}
                (_, None) => {
                    return Err(BandTableError::OpenInterior {
                        index,
                        side: "lower",
                    })
                }
                (_, Some(_)) => {}
            }
            match (index == last, band.upper) {
                (true, Some(_)) => return Err(BandTableError::BoundedAbove),
                (true, None) => {}
                (false, None) => {
                    return Err(BandTableError::OpenInterior {
                        index,
                        side: "upper",
                    })
                }
                (false, Some(_)) => {}
            }

            if band.lower.is_some_and(|v| !v.is_finite())
                || band.upper.is_some_and(|v| !v.is_finite())
            {
                return Err(BandTableError::NonFiniteBound { index });
            }
            if let (Some(lower), Some(upper)) = (band.lower, band.upper) {
                if lower >= upper {
                    return Err(BandTableError::Inverted {
                        index,
                        lower,
                        upper,
                    });
                }
            }
        }

        for (index, pair) in bands.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            if let (Some(upper), Some(lower)) = (current.upper, next.lower) {
                if upper != lower {
                    return Err(BandTableError::Discontinuous {
                        index,
                        upper,
                        lower,
                    });
                }
            }

            let ordered = match polarity {
                Polarity::HigherIsRiskier => next.score >= current.score,
                Polarity::LowerIsRiskier => next.score <= current.score,
            };
            if !ordered {
                return Err(BandTableError::NonMonotonic {
                    index: index + 1,
                    score: next.score,
                    polarity,
                });
            }
        }

        Ok(Self { polarity, bands })
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Classify a metric. Total for any finite value.
    pub fn classify(&self, metric: f64) -> Classification {
        let band = self
            .bands
            .iter()
            .find(|band| band.upper.map_or(true, |upper| metric < upper))
            .or_else(|| self.bands.last());

        match band {
            Some(band) => band.classification(),
            // Unreachable: construction rejects empty tables.
            None => Classification {
                label: String::new(),
                score: 0,
            },
        }
    }

    /// Classify an optional metric; absence propagates.
    pub fn classify_opt(&self, metric: Option<f64>) -> Option<Classification> {
        metric.map(|m| self.classify(m))
    }
}

/// One enumerated choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub score: u8,
}

/// A validated choice → classification map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceTable {
    choices: Vec<Choice>,
}

impl ChoiceTable {
    pub fn new(choices: Vec<Choice>, range: ScoreRange) -> Result<Self, BandTableError> {
        if choices.is_empty() {
            return Err(BandTableError::NoChoices);
        }

        let mut seen = std::collections::HashSet::new();
        for choice in &choices {
            if choice.value.trim().is_empty() {
                return Err(BandTableError::BlankChoice);
            }
            if !seen.insert(choice.value.as_str()) {
                return Err(BandTableError::DuplicateChoice(choice.value.clone()));
            }
            range.check(&choice.label, choice.score)?;
        }

        Ok(Self { choices })
    }

    pub fn contains(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c.value == value)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.value.as_str())
    }

    pub fn classify(&self, value: &str) -> Option<Classification> {
        self.choices
            .iter()
            .find(|c| c.value == value)
            .map(|c| Classification {
                label: c.label.clone(),
                score: c.score,
            })
    }
}
