use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::ranking::aggregate::RankedResult;
use crate::ranking::domain::{Points, ScoreCategory, SubScores};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Bias,
    Inconsistency,
    MissingFactor,
    Weighting,
}

impl IssueKind {
    fn parse(value: &str) -> Option<Self> {
        let folded: String = value
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "bias" => Some(Self::Bias),
            "inconsistency" => Some(Self::Inconsistency),
            "missingfactor" => Some(Self::MissingFactor),
            "weighting" => Some(Self::Weighting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub description: String,
    pub affected_candidates: Vec<String>,
    pub recommendation: String,
}

/// Proposal for one category. Values are already clamped to the category cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Adjustment {
    NoChange,
    Set {
        value: Points,
        /// The out-of-range number the critic proposed, when clamping applied.
        #[serde(skip_serializing_if = "Option::is_none")]
        clamped_from: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateAdjustment {
    pub candidate: String,
    proposals: BTreeMap<ScoreCategory, Adjustment>,
}

impl CandidateAdjustment {
    pub fn get(&self, category: ScoreCategory) -> Adjustment {
        self.proposals
            .get(&category)
            .copied()
            .unwrap_or(Adjustment::NoChange)
    }

    /// `current` with every `Set` proposal applied. Does not touch the ranking itself.
    pub fn apply_to(&self, current: &SubScores) -> SubScores {
        ScoreCategory::ordered()
            .into_iter()
            .fold(*current, |scores, category| match self.get(category) {
                Adjustment::NoChange => scores,
                Adjustment::Set { value, .. } => scores.with(category, value),
            })
    }

    pub fn has_changes(&self) -> bool {
        self.proposals
            .values()
            .any(|adjustment| matches!(adjustment, Adjustment::Set { .. }))
    }
}

/// Advisory verdict on one ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub is_correct: bool,
    pub is_fair: bool,
    pub is_square: bool,
    pub issues: Vec<Issue>,
    pub adjustments: Vec<CandidateAdjustment>,
    pub overall_assessment: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Issues with an unknown severity or kind.
    pub dropped_issues: usize,
    /// Adjustments naming a candidate that is not in the ranking.
    pub dropped_adjustments: usize,
}

impl AuditReport {
    /// All three verdicts positive and nothing flagged.
    pub fn is_clean(&self) -> bool {
        self.is_correct && self.is_fair && self.is_square && self.issues.is_empty()
    }

    pub fn adjustment_for(&self, candidate: &str) -> Option<&CandidateAdjustment> {
        self.adjustments
            .iter()
            .find(|adjustment| adjustment.candidate == candidate)
    }
}

/// Why a critic reply could not be read as a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum VerdictError {
    NoJson,
    InvalidJson(String),
    MissingVerdict(&'static str),
}

impl std::fmt::Display for VerdictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictError::NoJson => write!(f, "reply contained no JSON object"),
            VerdictError::InvalidJson(err) => write!(f, "reply JSON is invalid: {err}"),
            VerdictError::MissingVerdict(key) => write!(f, "reply lacks boolean '{key}'"),
        }
    }
}

/// Validate a critic reply against `ranking`.
pub(super) fn parse(reply: &str, ranking: &RankedResult) -> Result<AuditReport, VerdictError> {
    let candidate = crate::ranking::completion::extract_json_object(reply).ok_or(VerdictError::NoJson)?;
    let value: Value =
        serde_json::from_str(candidate).map_err(|err| VerdictError::InvalidJson(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| VerdictError::InvalidJson("not an object".to_string()))?;

    let is_correct = verdict(object, "isCorrect", "is_correct")?;
    let is_fair = verdict(object, "isFair", "is_fair")?;
    let is_square = verdict(object, "isSquare", "is_square")?;

    let mut dropped_issues = 0;
    let issues: Vec<Issue> = array(object, "issues")
        .iter()
        .filter_map(|item| {
            let issue = parse_issue(item);
            if issue.is_none() {
                dropped_issues += 1;
            }
            issue
        })
        .collect();

    // Exact names first, then a case-insensitive fallback.
    let names: HashMap<String, &str> = ranking
        .iter()
        .map(|entry| (entry.score.name.trim().to_lowercase(), entry.score.name.as_str()))
        .collect();
    let mut dropped_adjustments = 0;
    let adjustments: Vec<CandidateAdjustment> = array(object, "adjustments")
        .iter()
        .filter_map(|item| {
            let adjustment = parse_adjustment(item, ranking, &names);
            if adjustment.is_none() {
                dropped_adjustments += 1;
            }
            adjustment
        })
        .collect();

    let confidence = field(object, "confidence", "confidence")
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let overall_assessment = field(object, "overallAssessment", "overall_assessment")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(AuditReport {
        is_correct,
        is_fair,
        is_square,
        issues,
        adjustments,
        overall_assessment,
        confidence,
        dropped_issues,
        dropped_adjustments,
    })
}

fn field<'a>(object: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    object.get(camel).or_else(|| object.get(snake))
}

fn verdict(object: &Map<String, Value>, camel: &'static str, snake: &str) -> Result<bool, VerdictError> {
    field(object, camel, snake)
        .and_then(Value::as_bool)
        .ok_or(VerdictError::MissingVerdict(camel))
}

fn array<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn text(object: &Map<String, Value>, camel: &str, snake: &str) -> String {
    field(object, camel, snake)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_issue(item: &Value) -> Option<Issue> {
    let object = item.as_object()?;
    let severity = object.get("severity").and_then(Value::as_str).and_then(Severity::parse)?;
    let kind = field(object, "type", "kind")
        .and_then(Value::as_str)
        .and_then(IssueKind::parse)?;
    let affected_candidates = field(object, "affectedCandidates", "affected_candidates")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Issue {
        severity,
        kind,
        description: text(object, "description", "description"),
        affected_candidates,
        recommendation: text(object, "recommendation", "recommendation"),
    })
}

fn parse_adjustment(
    item: &Value,
    ranking: &RankedResult,
    names: &HashMap<String, &str>,
) -> Option<CandidateAdjustment> {
    let object = item.as_object()?;
    let requested = ["candidate", "candidateName", "candidate_name", "name"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))?;
    let candidate = ranking
        .find_by_name(requested)
        .map(|entry| entry.score.name.clone())
        .or_else(|| {
            names
                .get(&requested.trim().to_lowercase())
                .map(|name| name.to_string())
        })?;

    // Proposals may sit at the top level or under "scores"/"changes".
    let nested = ["scores", "changes"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_object));
    let proposals = ScoreCategory::ordered()
        .into_iter()
        .map(|category| {
            let proposed = nested
                .and_then(|inner| field(inner, category.camel_key(), category.key()))
                .or_else(|| field(object, category.camel_key(), category.key()));
            (category, proposal(proposed, category))
        })
        .collect();

    Some(CandidateAdjustment {
        candidate,
        proposals,
    })
}

/// Numbers (or `{"suggested": n}` style objects) become clamped `Set`s; anything else is
/// `NoChange`.
fn proposal(value: Option<&Value>, category: ScoreCategory) -> Adjustment {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::Object(inner)) => ["suggested", "proposed", "value", "score"]
            .iter()
            .find_map(|key| inner.get(*key).and_then(Value::as_f64)),
        _ => None,
    };

    match number.filter(|value| value.is_finite()) {
        None => Adjustment::NoChange,
        Some(proposed) => {
            let (value, clamped) = Points::clamp_reporting(proposed, category.cap());
            Adjustment::Set {
                value,
                clamped_from: clamped.then_some(proposed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::aggregate::RankAggregator;
    use crate::ranking::domain::CandidateScore;
    use serde_json::json;

    fn ranking() -> RankedResult {
        let amina = SubScores::default()
            .with(ScoreCategory::ExperienceQuality, Points::whole(30))
            .with(ScoreCategory::TechnicalSkills, Points::whole(20));
        let omar = SubScores::default().with(ScoreCategory::ExperienceQuality, Points::whole(12));
        RankAggregator::new().rank(
            vec![
                CandidateScore::new("a", "Amina Idrissi", amina, "", Vec::new(), Value::Null),
                CandidateScore::new("o", "Omar Alaoui", omar, "", Vec::new(), Value::Null),
            ],
            None,
        )
    }

    #[test]
    fn clamps_out_of_range_proposals() {
        let reply = json!({
            "isCorrect": true,
            "isFair": false,
            "isSquare": true,
            "adjustments": [{
                "candidate": "Omar Alaoui",
                "technical_skills": 999,
                "signalConsistency": -5,
                "projects_impact": "more",
                "education_certifications": null
            }],
            "confidence": 0.7
        })
        .to_string();

        let report = parse(&reply, &ranking()).expect("report");
        let omar = report.adjustment_for("Omar Alaoui").expect("adjustment");
        assert_eq!(
            omar.get(ScoreCategory::TechnicalSkills),
            Adjustment::Set {
                value: Points::whole(25),
                clamped_from: Some(999.0)
            }
        );
        assert_eq!(
            omar.get(ScoreCategory::SignalConsistency),
            Adjustment::Set {
                value: Points::ZERO,
                clamped_from: Some(-5.0)
            }
        );
        assert_eq!(omar.get(ScoreCategory::ProjectsImpact), Adjustment::NoChange);
        assert_eq!(omar.get(ScoreCategory::EducationCertifications), Adjustment::NoChange);
        assert_eq!(omar.get(ScoreCategory::ExperienceQuality), Adjustment::NoChange);
        assert!(!report.is_fair);
        assert!((report.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn drops_unknown_issues_and_candidates() {
        let reply = r#"Verdict follows.
{"is_correct": true, "is_fair": true, "is_square": true,
 "issues": [
   {"severity": "HIGH", "type": "missing factor", "description": "Ignores certifications",
    "affected_candidates": ["Omar Alaoui"], "recommendation": "Weigh AWS certs"},
   {"severity": "critical", "type": "bias", "description": "?"},
   {"severity": "low", "type": "vibes"}
 ],
 "adjustments": [
   {"candidate": "amina idrissi", "scores": {"experienceQuality": 33}},
   {"candidate": "Nobody", "technical_skills": 10}
 ],
 "confidence": 4}"#;

        let report = parse(reply, &ranking()).expect("report");
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, Severity::High);
        assert_eq!(report.issues[0].kind, IssueKind::MissingFactor);
        assert_eq!(report.dropped_issues, 2);
        assert_eq!(report.adjustments.len(), 1);
        assert_eq!(report.adjustments[0].candidate, "Amina Idrissi");
        assert_eq!(report.dropped_adjustments, 1);
        assert_eq!(report.confidence, 1.0);
        assert!(!report.is_clean());
    }

    #[test]
    fn missing_verdict_is_an_error() {
        let err = parse(r#"{"isCorrect": true, "isFair": true}"#, &ranking()).expect_err("incomplete");
        assert_eq!(err, VerdictError::MissingVerdict("isSquare"));
        assert_eq!(parse("looks fine to me", &ranking()).expect_err("no json"), VerdictError::NoJson);
    }

    #[test]
    fn apply_to_leaves_untouched_categories() {
        let report = parse(
            r#"{"isCorrect": false, "isFair": true, "isSquare": true,
                "adjustments": [{"candidate": "Amina Idrissi", "technical_skills": {"current": 20, "suggested": 22.5}}]}"#,
            &ranking(),
        )
        .expect("report");
        let ranking = ranking();
        let amina = ranking.find_by_name("Amina Idrissi").expect("amina");
        let adjustment = report.adjustment_for("Amina Idrissi").expect("adjustment");
        assert!(adjustment.has_changes());

        let proposed = adjustment.apply_to(amina.score.scores());
        assert_eq!(proposed.get(ScoreCategory::TechnicalSkills), Points::from_hundredths(2250));
        assert_eq!(proposed.get(ScoreCategory::ExperienceQuality), Points::whole(30));
        assert_eq!(amina.score.scores().get(ScoreCategory::TechnicalSkills), Points::whole(20));
        assert_eq!(report.confidence, 0.0);
    }
}
