use serde::Serialize;
use std::collections::BTreeMap;

use crate::ranking::aggregate::RankedResult;
use crate::ranking::domain::{Points, ScoreCategory};
use crate::ranking::requirement::JobRequirement;

/// What the critic sees of one ranked candidate.
#[derive(Debug, Serialize)]
pub(super) struct ReducedEntry<'a> {
    pub rank: usize,
    pub name: &'a str,
    pub total: Points,
    pub scores: BTreeMap<&'static str, Points>,
    pub explanation: &'a str,
}

pub(super) fn reduce(ranking: &RankedResult) -> Vec<ReducedEntry<'_>> {
    ranking
        .iter()
        .map(|entry| ReducedEntry {
            rank: entry.rank,
            name: &entry.score.name,
            total: entry.score.total(),
            scores: ScoreCategory::ordered()
                .into_iter()
                .map(|category| (category.key(), entry.score.scores().get(category)))
                .collect(),
            explanation: &entry.score.explanation,
        })
        .collect()
}

pub(super) fn build(ranking: &RankedResult, requirement: &JobRequirement) -> Result<String, serde_json::Error> {
    let requirement_json = serde_json::to_string_pretty(requirement)?;
    let ranking_json = serde_json::to_string_pretty(&reduce(ranking))?;
    let caps = ScoreCategory::ordered()
        .into_iter()
        .map(|category| format!("- {} (max {})", category.key(), category.cap().as_f64()))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        r#"You are auditing a candidate ranking for correctness, fairness and consistency.

Job requirement:
{requirement_json}

Scoring categories:
{caps}

Ranking (rank 1 is best):
{ranking_json}

Check that scores follow from the requirement, that no candidate is favoured or penalised
for reasons unrelated to the job, and that similar profiles received similar scores.

Reply with a single JSON object and nothing else:
{{
  "isCorrect": true,
  "isFair": true,
  "isSquare": true,
  "issues": [
    {{
      "severity": "high | medium | low",
      "type": "bias | inconsistency | missing_factor | weighting",
      "description": "...",
      "affectedCandidates": ["candidate name"],
      "recommendation": "..."
    }}
  ],
  "adjustments": [
    {{
      "candidate": "candidate name",
      "experience_quality": null,
      "technical_skills": null,
      "projects_impact": null,
      "education_certifications": null,
      "signal_consistency": null
    }}
  ],
  "overallAssessment": "...",
  "confidence": 0.0
}}
Use a number only for categories you would change; keep every value within its maximum."#
    ))
}
