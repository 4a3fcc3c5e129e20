//! Slug and whitespace helpers for scripture citations.
//!
//! Post filenames and image public ids are derived from citations such as
//! `Mt 4:18-22` or `Lk 1:26—38`. Citations carry colons, ranges written
//! with typographic dashes, and the odd stray punctuation from the PDF the
//! readings table was extracted from, so they go through [`slugify`] before
//! they touch the filesystem or a URL.
//!
//! ## Slug rules
//!
//! - `Mt 4:18-22` → `mt-4_18-22` (colon becomes underscore, keeping verse
//!   boundaries readable)
//! - `Lk 1:26—38` → `lk-1_26-38` (em dash, en dash and minus sign fold to `-`)
//! - `1 Cor 12/31` → `1-cor-12-31` (slash becomes dash)
//! - anything outside `[a-z0-9-/ _:]` is dropped

/// Convert a citation or title into a filesystem- and URL-safe slug.
pub fn slugify(s: &str) -> String {
    let lowered = s.trim().to_lowercase();

    let mut mapped = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            '\u{2014}' | '\u{2013}' | '\u{2212}' => mapped.push('-'),
            '/' => mapped.push('-'),
            ':' => mapped.push('_'),
            c if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' => {
                mapped.push(c)
            }
            c if c.is_whitespace() => mapped.push(' '),
            _ => {}
        }
    }

    // Whitespace runs and dash runs both collapse to a single dash
    let mut slug = String::with_capacity(mapped.len());
    let mut prev_dash = false;
    for c in mapped.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' {
            if !prev_dash {
                slug.push('-');
            }
            prev_dash = true;
        } else {
            slug.push(c);
            prev_dash = false;
        }
    }

    slug.trim_matches('-').to_string()
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn norm_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
