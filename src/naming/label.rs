use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::dates;

/// Where the label of a proposed name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    Matchup,
    Event,
    CurrentName,
    Sport,
    Untitled,
}

impl LabelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSource::Matchup => "matchup",
            LabelSource::Event => "event",
            LabelSource::CurrentName => "current_name",
            LabelSource::Sport => "sport",
            LabelSource::Untitled => "untitled",
        }
    }
}

const NOISE_WORDS: &[&str] = &[
    "photos", "photo", "pics", "pictures", "gallery", "album", "images", "img", "dsc", "final",
    "edited", "edits", "export", "exports", "copy", "new", "untitled",
];

const ELLIPSIS: char = '…';

static ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\bhigh\s+school\b", "HS"),
        (r"(?i)\buniversity\b", "Univ."),
        (r"(?i)\bchampionships?\b", "Champ."),
        (r"(?i)\btournament\b", "Tourney"),
        (r"(?i)\binvitational\b", "Invite"),
        (r"(?i)\bversus\b", "vs"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("abbreviation pattern compiles"), replacement))
    .collect()
});

/// Names ranked by frequency, ties broken by first appearance. Spelling
/// and case of the first appearance win.
pub fn rank_by_frequency(values: &[String]) -> Vec<String> {
    let mut ranked: Vec<(String, String, usize, usize)> = Vec::new();
    for (index, raw) in values.iter().enumerate() {
        let value = collapse_whitespace(raw);
        if value.is_empty() {
            continue;
        }
        let key = value.to_lowercase();
        match ranked.iter_mut().find(|(k, ..)| *k == key) {
            Some(entry) => entry.2 += 1,
            None => ranked.push((key, value, 1, index)),
        }
    }
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.3.cmp(&b.3)));
    ranked.into_iter().map(|(_, value, ..)| value).collect()
}

pub fn choose_label(
    current_name: &str,
    team_names: &[String],
    event_names: &[String],
    sport_type: Option<&str>,
) -> (String, LabelSource) {
    let teams = rank_by_frequency(team_names);
    if teams.len() >= 2 {
        return (format!("{} vs {}", teams[0], teams[1]), LabelSource::Matchup);
    }

    if let Some(event) = rank_by_frequency(event_names).into_iter().next() {
        return (event, LabelSource::Event);
    }

    if let Some(cleaned) = clean_current_name(current_name) {
        return (cleaned, LabelSource::CurrentName);
    }

    if let Some(sport) = sport_type.map(title_case).filter(|s| !s.is_empty()) {
        return (sport, LabelSource::Sport);
    }

    ("Untitled".to_string(), LabelSource::Untitled)
}

/// The current name without date fragments, noise words or dangling
/// separators. `None` when nothing meaningful is left.
pub fn clean_current_name(name: &str) -> Option<String> {
    let remainder = dates::scan_name(name).remainder;

    let words: Vec<&str> = remainder
        .split_whitespace()
        .filter(|w| {
            let bare = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            !NOISE_WORDS.contains(&bare.as_str())
        })
        .collect();

    let joined = words.join(" ");
    let trimmed = joined
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | '|' | ',' | ':' | '/' | '.'))
        .to_string();
    // "Lions -  - Tigers" style leftovers once dates are gone
    let cleaned = collapse_whitespace(&trimmed.replace(" - - ", " - ").replace(" – – ", " – "));

    if cleaned.chars().any(|c| c.is_alphabetic()) {
        Some(cleaned)
    } else {
        None
    }
}

pub fn title_case(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn abbreviate(label: &str) -> String {
    let mut out = label.to_string();
    for (re, replacement) in ABBREVIATIONS.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    collapse_whitespace(&out)
}

pub fn compose(label: &str, date: Option<&str>) -> String {
    match date {
        Some(date) => format!("{} - {}", label, date),
        None => label.to_string(),
    }
}

/// Fit `label` plus `date` into `max_len` chars: abbreviate, then drop
/// trailing label words, then hard-cut. The date survives whenever it fits.
pub fn shorten(label: &str, date: Option<&str>, max_len: usize) -> String {
    let full = compose(label, date);
    if char_len(&full) <= max_len {
        return full;
    }

    let label = abbreviate(label);
    let full = compose(&label, date);
    if char_len(&full) <= max_len {
        return full;
    }

    let suffix = date.map(|d| format!(" - {}", d)).unwrap_or_default();
    // Room for at least one label char and the ellipsis
    let Some(budget) = max_len.checked_sub(char_len(&suffix) + 1).filter(|b| *b > 0) else {
        return hard_cut(&full, max_len);
    };

    let mut kept = String::new();
    for word in label.split_whitespace() {
        let candidate_len = if kept.is_empty() {
            char_len(word)
        } else {
            char_len(&kept) + 1 + char_len(word)
        };
        if candidate_len > budget {
            break;
        }
        if !kept.is_empty() {
            kept.push(' ');
        }
        kept.push_str(word);
    }

    let kept = trim_dangling(&kept);
    let kept = if kept.is_empty() {
        // A single word longer than the whole budget
        label.chars().take(budget).collect::<String>().trim_end().to_string()
    } else {
        kept
    };

    format!("{}{}{}", kept, ELLIPSIS, suffix)
}

fn trim_dangling(label: &str) -> String {
    let mut words: Vec<&str> = label.split_whitespace().collect();
    while let Some(last) = words.last() {
        let bare = last.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if bare.is_empty() || matches!(bare.as_str(), "vs" | "at" | "and" | "of" | "the") {
            words.pop();
        } else {
            break;
        }
    }
    words
        .join(" ")
        .trim_end_matches(|c: char| matches!(c, ',' | '-' | '–' | ':' | '&' | '/'))
        .trim_end()
        .to_string()
}

fn hard_cut(value: &str, max_len: usize) -> String {
    if char_len(value) <= max_len {
        return value.to_string();
    }
    if max_len == 0 {
        return String::new();
    }
    let mut out: String = value.chars().take(max_len - 1).collect();
    out.push(ELLIPSIS);
    out
}

pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matchup_uses_two_most_frequent_teams() {
        let teams = strings(&["Tigers", "Lions", "lions", "Bears", "Lions", "Tigers", "tigers", "Tigers"]);
        let (label, source) = choose_label("whatever", &teams, &[], None);
        assert_eq!(label, "Tigers vs Lions");
        assert_eq!(source, LabelSource::Matchup);
    }

    #[test]
    fn test_single_team_falls_through_to_event() {
        let teams = strings(&["Tigers", "tigers"]);
        let events = strings(&["Homecoming", "Senior Night", "Homecoming"]);
        let (label, source) = choose_label("x", &teams, &events, None);
        assert_eq!(label, "Homecoming");
        assert_eq!(source, LabelSource::Event);
    }

    #[test]
    fn test_current_name_cleaned() {
        let (label, source) = choose_label("Varsity Volleyball Photos 2024-10-05", &[], &[], None);
        assert_eq!(label, "Varsity Volleyball");
        assert_eq!(source, LabelSource::CurrentName);
    }

    #[test]
    fn test_canonical_name_reduces_to_label() {
        assert_eq!(
            clean_current_name("Lions vs Tigers - Oct 5–7, 2024").as_deref(),
            Some("Lions vs Tigers")
        );
    }

    #[test]
    fn test_sport_then_untitled() {
        let (label, source) = choose_label("IMG_20241005", &[], &[], Some("track_and_field"));
        assert_eq!(label, "Track And Field");
        assert_eq!(source, LabelSource::Sport);

        let (label, source) = choose_label("DSC 2024-10-05", &[], &[], None);
        assert_eq!(label, "Untitled");
        assert_eq!(source, LabelSource::Untitled);
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(
            abbreviate("Lincoln High School Invitational Tournament"),
            "Lincoln HS Invite Tourney"
        );
        assert_eq!(abbreviate("State University versus Tech"), "State Univ. vs Tech");
        assert_eq!(abbreviate("Conference Championships"), "Conference Champ.");
    }

    #[test]
    fn test_shorten_leaves_short_names() {
        assert_eq!(shorten("Lions vs Tigers", Some("Oct 5, 2024"), 45), "Lions vs Tigers - Oct 5, 2024");
        assert_eq!(shorten("Lions vs Tigers", None, 45), "Lions vs Tigers");
    }

    #[test]
    fn test_shorten_abbreviates_before_truncating() {
        let name = shorten("Lincoln High School Invitational", Some("Oct 5, 2024"), 45);
        assert_eq!(name, "Lincoln HS Invite - Oct 5, 2024");
    }

    #[test]
    fn test_shorten_truncates_at_word_boundary_keeping_date() {
        let label = "Northern Regional Girls Varsity Volleyball Semifinal Showdown";
        let name = shorten(label, Some("Sep 28 – Oct 2, 2024"), 45);
        assert!(char_len(&name) <= 45, "{} is too long", name);
        assert!(name.ends_with("… - Sep 28 – Oct 2, 2024"));
        assert!(name.starts_with("Northern Regional"));
        assert!(!name.contains("Varsit…"));
    }

    #[test]
    fn test_shorten_drops_dangling_connector() {
        let name = shorten("Westfield Academy Spartans vs Eastfield Rockets", Some("Oct 5, 2024"), 45);
        assert_eq!(name, "Westfield Academy Spartans… - Oct 5, 2024");
    }

    #[test]
    fn test_shorten_hard_cuts_single_long_word() {
        let name = shorten("Supercalifragilisticexpialidociousmegatournamentextravaganza", Some("Oct 5, 2024"), 45);
        assert_eq!(char_len(&name), 45);
        assert!(name.ends_with("… - Oct 5, 2024"));
    }

    #[test]
    fn test_shorten_never_exceeds_limit() {
        let labels = [
            "A",
            "Lincoln High School versus Jefferson High School Championship Tournament",
            "ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ ÄÖÜ",
            "word-word-word-word-word-word-word-word-word-word-word-word-word",
        ];
        let date_forms = [None, Some("Oct 5, 2024"), Some("Dec 30, 2023 – Jan 2, 2024")];
        for max in [0usize, 1, 5, 10, 20, 29, 30, 45, 60] {
            for label in labels {
                for date in date_forms {
                    let name = shorten(label, date, max);
                    assert!(char_len(&name) <= max, "{:?} exceeds {}", name, max);
                }
            }
        }
    }
}
