use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Below this many dated photos every day counts, however sparse.
pub const MIN_PHOTOS_FOR_DAY_FILTER: usize = 20;

/// Inclusive calendar-day range an album covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<Self> {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        let (start, end) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    /// `Oct 5, 2024`, `Oct 5–7, 2024`, `Sep 28 – Oct 2, 2024` or
    /// `Dec 30, 2023 – Jan 2, 2024`.
    pub fn format(&self) -> String {
        let (s, e) = (self.start, self.end);
        if s == e {
            s.format("%b %-d, %Y").to_string()
        } else if s.year() == e.year() && s.month() == e.month() {
            format!("{}–{}, {}", s.format("%b %-d"), e.day(), e.year())
        } else if s.year() == e.year() {
            format!("{} – {}, {}", s.format("%b %-d"), e.format("%b %-d"), e.year())
        } else {
            format!("{} – {}", s.format("%b %-d, %Y"), e.format("%b %-d, %Y"))
        }
    }
}

/// Calendar day of a stored `photo_date` (`YYYY-MM-DD ...` or EXIF-style
/// `YYYY:MM:DD ...`).
pub fn parse_photo_day(value: &str) -> Option<NaiveDate> {
    let day = value.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y:%m:%d"))
        .ok()
}

/// Span of the days that actually hold the shoot. With enough photos, days
/// holding less than `min_day_share` of them are dropped as clock noise.
pub fn span_from_photo_dates(dates: &[String], min_day_share: f64) -> Option<DateSpan> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for day in dates.iter().filter_map(|d| parse_photo_day(d)) {
        *per_day.entry(day).or_default() += 1;
    }

    let total: usize = per_day.values().sum();
    if total == 0 {
        return None;
    }

    if total >= MIN_PHOTOS_FOR_DAY_FILTER {
        let kept = per_day
            .iter()
            .filter(|(_, &count)| count as f64 / total as f64 >= min_day_share)
            .map(|(day, _)| *day);
        if let Some(span) = DateSpan::from_dates(kept) {
            return Some(span);
        }
    }

    DateSpan::from_dates(per_day.keys().copied())
}

/// Dates found in a free-form album name, plus the name with every matched
/// fragment blanked out.
#[derive(Debug, Clone, Default)]
pub struct NameDates {
    pub dates: Vec<NaiveDate>,
    pub remainder: String,
}

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

struct DatePattern {
    re: Regex,
    parse: fn(&Captures) -> Vec<NaiveDate>,
}

fn pattern(template: &str, parse: fn(&Captures) -> Vec<NaiveDate>) -> DatePattern {
    let source = format!("(?i){}", template.replace("{M}", MONTH));
    DatePattern {
        re: Regex::new(&source).expect("date pattern compiles"),
        parse,
    }
}

// Longest forms first so a range is never read as two partial dates.
static PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        // Sep 28 – Oct 2, 2024
        pattern(r"\b{M}\s+(\d{1,2})\s*[–-]\s*{M}\s+(\d{1,2}),?\s+(\d{4})\b", |c| {
            let year = num(c, 5);
            [
                ymd(year, month_num(c, 1), num(c, 2)),
                ymd(year, month_num(c, 3), num(c, 4)),
            ]
            .into_iter()
            .flatten()
            .collect()
        }),
        // Oct 5–7, 2024
        pattern(r"\b{M}\s+(\d{1,2})\s*[–-]\s*(\d{1,2}),?\s+(\d{4})\b", |c| {
            let (year, month) = (num(c, 4), month_num(c, 1));
            [ymd(year, month, num(c, 2)), ymd(year, month, num(c, 3))]
                .into_iter()
                .flatten()
                .collect()
        }),
        // Oct 5, 2024 / October 5th 2024
        pattern(r"\b{M}\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b", |c| {
            ymd(num(c, 3), month_num(c, 1), num(c, 2)).into_iter().collect()
        }),
        // 5 Oct 2024
        pattern(r"\b(\d{1,2})(?:st|nd|rd|th)?\s+{M},?\s+(\d{4})\b", |c| {
            ymd(num(c, 3), month_num(c, 2), num(c, 1)).into_iter().collect()
        }),
        // 2024-10-05
        pattern(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b", |c| {
            ymd(num(c, 1), num(c, 2), num(c, 3)).into_iter().collect()
        }),
        // 10/5/2024 and 10/5/24
        pattern(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b", |c| {
            let raw_year = c.get(3).map_or("", |m| m.as_str());
            let mut year = num(c, 3);
            if raw_year.len() == 2 {
                year += 2000;
            }
            ymd(year, num(c, 1), num(c, 2)).into_iter().collect()
        }),
        // 20241005
        pattern(r"\b((?:19|20)\d{2})(\d{2})(\d{2})\b", |c| {
            ymd(num(c, 1), num(c, 2), num(c, 3)).into_iter().collect()
        }),
    ]
});

fn num(c: &Captures, group: usize) -> u32 {
    c.get(group).and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
}

fn month_num(c: &Captures, group: usize) -> u32 {
    let name = c.get(group).map_or(String::new(), |m| m.as_str().to_lowercase());
    const ABBREVIATIONS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    ABBREVIATIONS
        .iter()
        .position(|abbr| name.starts_with(abbr))
        .map_or(0, |i| i as u32 + 1)
}

fn ymd(year: u32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// Heuristic date extraction from an album name.
pub fn scan_name(name: &str) -> NameDates {
    // Underscores are word characters to the regex engine; treat them as spaces
    let mut working = name.replace('_', " ");
    let mut dates = Vec::new();

    for pattern in PATTERNS.iter() {
        let mut matched = Vec::new();
        for caps in pattern.re.captures_iter(&working) {
            let found = (pattern.parse)(&caps);
            if !found.is_empty() {
                if let Some(m) = caps.get(0) {
                    matched.push(m.range());
                }
                dates.extend(found);
            }
        }
        for range in matched {
            let blank = " ".repeat(range.len());
            working.replace_range(range, &blank);
        }
    }

    NameDates {
        dates,
        remainder: working,
    }
}

pub fn span_from_name(name: &str) -> Option<DateSpan> {
    DateSpan::from_dates(scan_name(name).dates)
}
