use serde::Serialize;

const EDIT_WEIGHT: f64 = 0.7;
const LENGTH_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftBand {
    Unchanged,
    Minor,
    Moderate,
    Major,
}

impl DriftBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => DriftBand::Unchanged,
            1..=20 => DriftBand::Minor,
            21..=60 => DriftBand::Moderate,
            _ => DriftBand::Major,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftBand::Unchanged => "unchanged",
            DriftBand::Minor => "minor",
            DriftBand::Moderate => "moderate",
            DriftBand::Major => "major",
        }
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Equal up to case and whitespace; such a pair scores 0.
pub fn same_name(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// How far `proposed` moved from `current`, 0 (same) to 100.
///
/// Weighted edit distance plus length change, both relative to the longer
/// name. Extending or cutting a name (one is a prefix of the other) counts
/// half. Names that differ after normalization never score 0.
pub fn drift_score(current: &str, proposed: &str) -> u8 {
    if same_name(current, proposed) {
        return 0;
    }
    let a = normalize(current);
    let b = normalize(proposed);

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b) as f64;

    let edit = strsim::levenshtein(&a, &b) as f64 / max_len;
    let length = len_a.abs_diff(len_b) as f64 / max_len;

    let mut score = 100.0 * (EDIT_WEIGHT * edit + LENGTH_WEIGHT * length);
    let is_prefix = !a.is_empty() && !b.is_empty() && (a.starts_with(&b) || b.starts_with(&a));
    if is_prefix {
        score /= 2.0;
    }

    score.round().clamp(1.0, 100.0) as u8
}
