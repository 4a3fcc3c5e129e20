//! Passage text lookup.
//!
//! The readings table only carries citations. Turning `Lk 18:1-8` into verse
//! text goes through a [`ScriptureSource`]; the shipped source leaves a
//! visible marker in the post for the editor to replace.

use crate::readings::DayReadings;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptureError {
    #[error("Passage lookup failed for {reference}: {reason}")]
    Lookup { reference: String, reason: String },
}

/// Resolves a citation to passage text.
pub trait ScriptureSource {
    /// Passage text for `reference`. An empty reference yields empty text.
    fn passage(&self, reference: &str) -> Result<String, ScriptureError>;
}

/// Source that inserts a placeholder line per citation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderSource;

impl ScriptureSource for PlaceholderSource {
    fn passage(&self, reference: &str) -> Result<String, ScriptureError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("(Text for {reference} would be inserted here.)"))
    }
}

/// Passage texts for the five readings of a day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingTexts {
    pub first: String,
    pub psalm: String,
    pub second: String,
    pub alleluia: String,
    pub gospel: String,
}

impl ReadingTexts {
    pub fn fetch(source: &dyn ScriptureSource, day: &DayReadings) -> Result<Self, ScriptureError> {
        Ok(Self {
            first: source.passage(&day.first)?,
            psalm: source.passage(&day.psalm)?,
            second: source.passage(&day.second)?,
            alleluia: source.passage(&day.alleluia)?,
            gospel: source.passage(&day.gospel)?,
        })
    }
}
