//! Post metadata resolution.
//!
//! A day's readings carry up to five citations plus a calendar title, any of
//! which may be blank (weekdays have no second reading, some feasts list no
//! gospel in the source PDF). The post's title, slug, and cover image are all
//! picked from the same priority chain:
//!
//! - **Title**: gospel → first reading → calendar title → configured fallback
//! - **Slug**: gospel → first reading → calendar title → ISO date
//! - **Image reference**: gospel → first reading → calendar title → ISO date
//!
//! The gospel wins because it is the passage the reflection is written
//! against; the ISO date is the last resort so a slug is never empty.

use crate::config::LectionaryConfig;
use crate::naming::slugify;
use crate::readings::DayReadings;

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value (trimmed).
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Everything about a post that is derived from the readings row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub title: String,
    pub slug: String,
    /// Citation the cover image is generated for.
    pub image_ref: String,
    /// Media host id: `<folder>/<YYYY>/<MM>/<slug>`.
    pub public_id: String,
}

impl Selection {
    pub fn for_day(day: &DayReadings, config: &LectionaryConfig) -> Self {
        let iso = day.date.format("%Y-%m-%d").to_string();
        let chain = [
            Some(day.gospel.as_str()),
            Some(day.first.as_str()),
            Some(day.title.as_str()),
        ];

        let title = resolve(&[chain[0], chain[1], chain[2], Some(config.title_fallback.as_str())])
            .unwrap_or_else(|| iso.clone());
        let anchor = resolve(&[chain[0], chain[1], chain[2], Some(iso.as_str())])
            .unwrap_or_else(|| iso.clone());

        let mut slug = slugify(&anchor);
        if slug.is_empty() {
            // Citations made only of dropped characters still need a filename
            slug = iso.clone();
        }

        let public_id = format!(
            "{}/{}/{}",
            config.cloudinary.folder.trim_matches('/'),
            day.date.format("%Y/%m"),
            slug
        );

        Self {
            title,
            slug,
            image_ref: anchor,
            public_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::day;

    // =========================================================================
    // resolve() tests
    // =========================================================================

    #[test]
    fn resolve_picks_first_non_none() {
        assert_eq!(
            resolve(&[Some("Mt 5:1-12"), Some("Rev 7:2-4")]),
            Some("Mt 5:1-12".to_string())
        );
    }

    #[test]
    fn resolve_skips_none_and_blank() {
        assert_eq!(
            resolve(&[None, Some("  \t "), Some("Fallback")]),
            Some("Fallback".to_string())
        );
    }

    #[test]
    fn resolve_trims_whitespace() {
        assert_eq!(resolve(&[Some("  Jn 1:1  ")]), Some("Jn 1:1".to_string()));
    }

    #[test]
    fn resolve_returns_none_when_all_empty() {
        assert_eq!(resolve(&[None, Some("")]), None);
        assert_eq!(resolve(&[]), None);
    }

    // =========================================================================
    // Selection tests
    // =========================================================================

    #[test]
    fn gospel_drives_everything() {
        let d = day("2025-10-19", "Twenty-ninth Sunday", "Ex 17:8-13", "Lk 18:1-8");
        let s = Selection::for_day(&d, &LectionaryConfig::default());
        assert_eq!(s.title, "Lk 18:1-8");
        assert_eq!(s.slug, "lk-18_1-8");
        assert_eq!(s.image_ref, "Lk 18:1-8");
        assert_eq!(s.public_id, "matthew419/2025/10/lk-18_1-8");
    }

    #[test]
    fn first_reading_when_no_gospel() {
        let d = day("2025-03-05", "Ash Wednesday", "Jl 2:12-18", "");
        let s = Selection::for_day(&d, &LectionaryConfig::default());
        assert_eq!(s.title, "Jl 2:12-18");
        assert_eq!(s.slug, "jl-2_12-18");
    }

    #[test]
    fn calendar_title_when_no_citations() {
        let d = day("2025-04-19", "Holy Saturday", "", "");
        let s = Selection::for_day(&d, &LectionaryConfig::default());
        assert_eq!(s.title, "Holy Saturday");
        assert_eq!(s.slug, "holy-saturday");
        assert_eq!(s.public_id, "matthew419/2025/04/holy-saturday");
    }

    #[test]
    fn empty_row_falls_back_to_configured_title_and_date_slug() {
        let d = day("2025-01-02", "", "", "");
        let s = Selection::for_day(&d, &LectionaryConfig::default());
        assert_eq!(s.title, "Daily Readings");
        assert_eq!(s.slug, "2025-01-02");
        assert_eq!(s.image_ref, "2025-01-02");
    }

    #[test]
    fn unsluggable_citation_uses_date() {
        let d = day("2025-01-02", "", "", "—");
        let s = Selection::for_day(&d, &LectionaryConfig::default());
        assert_eq!(s.slug, "2025-01-02");
    }

    #[test]
    fn folder_slashes_are_normalised() {
        let mut config = LectionaryConfig::default();
        config.cloudinary.folder = "/posts/".to_string();
        let d = day("2025-12-25", "", "", "Jn 1:1-18");
        let s = Selection::for_day(&d, &config);
        assert_eq!(s.public_id, "posts/2025/12/jn-1_1-18");
    }
}
