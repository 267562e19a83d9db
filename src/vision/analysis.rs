//! Prompt for sports-photo analysis and tolerant parsing of the reply.

use serde_json::Value;

use super::provider::{TokenUsage, VisionError};
use crate::db::Enrichment;
use crate::taxonomy;

pub const PHOTO_CATEGORIES: &[&str] = &["action", "portrait", "celebration", "team", "candid", "venue", "other"];
pub const ACTION_INTENSITIES: &[&str] = &["low", "medium", "high", "peak"];
pub const TIMES_OF_DAY: &[&str] = &["morning", "afternoon", "evening", "night"];

const MAX_KEYWORDS: usize = 20;
const MAX_LABEL_CHARS: usize = 40;

fn base_prompt() -> &'static str {
    r#"You are tagging photos for a sports photography portfolio.
Look at the image and return ONLY one JSON object, no other text, with these fields:
{
  "sharpness": <number 0-10, focus on the main subject>,
  "composition_score": <number 0-10>,
  "emotional_impact": <number 0-10>,
  "sport_type": "<sport, e.g. volleyball, basketball, football, soccer, baseball, softball, wrestling, track, cross_country, swimming, lacrosse, tennis, golf, hockey>",
  "photo_category": "<one of: action, portrait, celebration, team, candid, venue, other>",
  "emotion": "<one word, e.g. joy, intensity, focus, determination, frustration, calm>",
  "action_intensity": "<one of: low, medium, high, peak>",
  "time_of_day": "<one of: morning, afternoon, evening, night>",
  "play_type": "<specific play if visible, e.g. spike, dunk, tackle, header, or null>",
  "keywords": ["<up to 12 lowercase keywords>"],
  "team_names": ["<team or school names readable on jerseys, banners or scoreboards>"],
  "event_name": "<event or tournament name if readable, otherwise null>"
}
Use null for anything you cannot judge."#
}

/// Full prompt for one photo, with optional run-wide context and the album
/// it belongs to.
pub fn build_prompt(context: Option<&str>, album_name: &str) -> String {
    let mut prompt = String::new();
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("Context: {}\n", context));
    }
    if !album_name.trim().is_empty() {
        prompt.push_str(&format!("Album: {}\n", album_name.trim()));
    }
    if !prompt.is_empty() {
        prompt.push('\n');
    }
    prompt.push_str(base_prompt());
    prompt
}

/// Extract JSON from a string that might contain markdown code blocks or
/// prose around the object.
pub fn extract_json(content: &str) -> String {
    let trimmed = content.trim();

    if trimmed.starts_with("```") {
        if let Some(start) = trimmed.find('\n') {
            let after_first_line = &trimmed[start + 1..];
            if let Some(end) = after_first_line.rfind("```") {
                return after_first_line[..end].trim().to_string();
            }
        }
    }

    if !trimmed.starts_with('{') {
        if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if start < end {
                return trimmed[start..=end].to_string();
            }
        }
    }

    trimmed.to_string()
}

pub fn parse_enrichment(provider: &'static str, content: &str) -> Result<Enrichment, VisionError> {
    let json = extract_json(content);
    let value: Value = serde_json::from_str(&json).map_err(|e| VisionError::Malformed {
        provider,
        message: format!("{} in {:?}", e, content.chars().take(200).collect::<String>()),
    })?;
    let Value::Object(obj) = value else {
        return Err(VisionError::Malformed {
            provider,
            message: "expected a JSON object".to_string(),
        });
    };

    static NULL: Value = Value::Null;
    let field = |name: &str| obj.get(name).unwrap_or(&NULL);

    Ok(Enrichment {
        sharpness: score(field("sharpness")),
        composition_score: score(field("composition_score")),
        emotional_impact: score(field("emotional_impact")),
        sport_type: text(field("sport_type")).and_then(|s| taxonomy::normalize_sport(&s)),
        photo_category: one_of(field("photo_category"), PHOTO_CATEGORIES),
        emotion: label(field("emotion")),
        action_intensity: one_of(field("action_intensity"), ACTION_INTENSITIES),
        time_of_day: one_of(field("time_of_day"), TIMES_OF_DAY),
        play_type: label(field("play_type")),
        keywords: keywords(field("keywords")),
        team_names: team_names(field("team_names")),
        event_name: text(field("event_name")),
    })
}

/// A 0-10 score. Numeric strings are accepted; out-of-range values clamp,
/// non-finite values become `None`.
fn score(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.clamp(0.0, 10.0))
}

/// Trimmed text, with the usual "no answer" spellings treated as absent.
fn text(value: &Value) -> Option<String> {
    let Value::String(s) = value else {
        return None;
    };
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    match s.to_lowercase().as_str() {
        "" | "null" | "none" | "unknown" | "n/a" | "na" => None,
        _ => Some(s),
    }
}

fn label(value: &Value) -> Option<String> {
    text(value)
        .map(|s| s.to_lowercase())
        .filter(|s| s.chars().count() <= MAX_LABEL_CHARS)
}

fn one_of(value: &Value, allowed: &[&str]) -> Option<String> {
    let s = text(value)?.to_lowercase();
    allowed.iter().find(|a| **a == s).map(|a| a.to_string())
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        // Some models answer "a, b, c"
        Value::String(s) => s
            .split(',')
            .filter_map(|part| text(&Value::String(part.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

fn keywords(value: &Value) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in string_list(value).into_iter().map(|k| k.to_lowercase()) {
        if !out.contains(&keyword) {
            out.push(keyword);
        }
        if out.len() == MAX_KEYWORDS {
            break;
        }
    }
    out
}

fn team_names(value: &Value) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in string_list(value) {
        if !out.iter().any(|existing| existing.eq_ignore_ascii_case(&name)) {
            out.push(name);
        }
    }
    out
}

/// USD cost of one call at per-million-token prices.
pub fn cost_usd(usage: &TokenUsage, input_per_mtok: f64, output_per_mtok: f64) -> f64 {
    let cost = usage.input_tokens as f64 * input_per_mtok / 1_000_000.0
        + usage.output_tokens as f64 * output_per_mtok / 1_000_000.0;
    cost.max(0.0)
}
