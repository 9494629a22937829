use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::ranking::domain::{CandidateScore, Points, ScoreCategory, ScoreComponent, SubScores};

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

const PRIMARY_NAME_KEYS: &[&str] = &["candidate_name", "name"];
const NESTED_RECORD_KEYS: &[&str] = &["raw_data", "raw", "cv"];
const ALIAS_NAME_KEYS: &[&str] = &["full_name", "candidate", "cv_name", "filename"];
const SCORE_CONTAINER_KEYS: &[&str] = &["scores", "breakdown", "sub_scores"];
const TOTAL_KEYS: &[&str] = &["total_score", "score", "total"];
const EXPLANATION_KEYS: &[&str] = &["explanation", "reason"];
const ID_KEYS: &[&str] = &["candidate_id", "id", "cv_id"];

/// Why an upstream record was left out of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OmissionReason {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record carries no recognizable sub-score")]
    NoSubScores,
    #[error("sub-score '{category}' is not numeric")]
    NonNumericScore { category: String },
}

/// Canonical form of one upstream record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedRecord {
    pub score: CandidateScore,
    pub reported_total: Option<f64>,
}

/// Display name via the fallback chain, or `None` when nothing in the chain resolves.
///
/// Order: primary name fields, then the personal name inside a nested source record (or the
/// record itself when it is a CV), then alias fields. The sentinel never counts as a name.
pub fn resolve_display_name(record: &Value) -> Option<String> {
    let object = record.as_object()?;

    let nested = NESTED_RECORD_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .chain(std::iter::once(record))
        .filter_map(|source| {
            source
                .get("personal_info")
                .and_then(|info| info.get("full_name").or_else(|| info.get("name")))
        });

    PRIMARY_NAME_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .chain(nested)
        .chain(ALIAS_NAME_KEYS.iter().filter_map(|key| object.get(*key)))
        .find_map(name_text)
}

fn name_text(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    (!text.is_empty() && text != UNKNOWN_CANDIDATE).then(|| text.to_string())
}

pub(crate) fn normalize(record: &Value) -> Result<NormalizedRecord, OmissionReason> {
    let object = record.as_object().ok_or(OmissionReason::NotAnObject)?;
    let container = SCORE_CONTAINER_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_object));

    let mut scores = SubScores::default();
    let mut components = Vec::new();
    let mut recognized = 0usize;
    for category in ScoreCategory::ordered() {
        let raw = container
            .and_then(|inner| category_value(inner, category))
            .or_else(|| category_value(object, category));

        let value = match raw {
            None | Some(Value::Null) => continue,
            Some(value) => numeric(value).ok_or_else(|| OmissionReason::NonNumericScore {
                category: category.key().to_string(),
            })?,
        };

        recognized += 1;
        let (points, clamped) = Points::clamp_reporting(value, category.cap());
        if clamped {
            warn!(category = category.key(), value, "clamped out-of-range upstream sub-score");
        }
        scores.set(category, points);
        components.push(ScoreComponent {
            category,
            score: points,
            notes: String::new(),
        });
    }

    if recognized == 0 {
        return Err(OmissionReason::NoSubScores);
    }

    let name = resolve_display_name(record).unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string());
    let candidate_id = ID_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| name.clone());
    let explanation = EXPLANATION_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| value.as_str().map(str::to_string))
        .unwrap_or_default();
    let reported_total = TOTAL_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(Value::as_f64);
    let raw = NESTED_RECORD_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .cloned()
        .unwrap_or_else(|| record.clone());

    Ok(NormalizedRecord {
        score: CandidateScore::new(candidate_id, name, scores, explanation, components, raw),
        reported_total,
    })
}

fn category_value(object: &Map<String, Value>, category: ScoreCategory) -> Option<&Value> {
    object
        .get(category.key())
        .or_else(|| object.get(category.camel_key()))
}

/// Plain numbers, or `{"score": n}` objects as some exports nest them.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Object(inner) => inner.get("score").and_then(Value::as_f64),
        _ => None,
    }
}
