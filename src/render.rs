//! Markdown body composition.
//!
//! The body lists the day's readings in liturgical order, each under a bold
//! heading carrying its citation, and ends with the reflection section:
//!
//! ```text
//! **Twenty-ninth Sunday in Ordinary Time**
//!
//! **First Reading — Ex 17:8-13**
//!
//! (passage text)
//!
//! **Gospel — Lk 18:1-8**
//!
//! (passage text)
//!
//! ### ChatGPT Response
//!
//! (reflection text)
//! ```
//!
//! Readings with an empty citation are left out entirely. The cover image
//! lives in front matter, never in the body.

use crate::config::ReflectionConfig;
use crate::readings::DayReadings;
use crate::scripture::ReadingTexts;

/// Compose the Markdown body for a day.
pub fn render_body(
    day: &DayReadings,
    texts: &ReadingTexts,
    reflection: &ReflectionConfig,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !day.title.is_empty() {
        parts.push(format!("**{}**\n", day.title));
    }

    let sections = [
        ("First Reading", &day.first, &texts.first),
        ("Responsorial Psalm", &day.psalm, &texts.psalm),
        ("Second Reading", &day.second, &texts.second),
        ("Alleluia", &day.alleluia, &texts.alleluia),
        ("Gospel", &day.gospel, &texts.gospel),
    ];
    for (label, citation, text) in sections {
        if citation.is_empty() {
            continue;
        }
        parts.push(format!("**{label} \u{2014} {citation}**\n"));
        parts.push(format!("{}\n", text.trim()));
    }

    parts.push(format!("### {}\n", reflection.heading));
    parts.push(reflection.text.trim().to_string());

    let mut body = parts.join("\n").trim().to_string();
    body.push('\n');
    body
}
