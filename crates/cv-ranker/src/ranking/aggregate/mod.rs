//! Reconciles scored candidates from one or more sources into a single ordered ranking.

mod normalizer;

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::domain::{CandidateScore, Points, Provenance, ScoreCategory};

pub use normalizer::{resolve_display_name, OmissionReason, UNKNOWN_CANDIDATE};

/// Reported totals further than this from the recomputed sum are logged as drift.
const DRIFT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone)]
enum BatchRecords {
    Scored(Vec<CandidateScore>),
    Upstream(Vec<Value>),
}

/// One source's worth of scored candidates.
#[derive(Debug, Clone)]
pub struct ScoreBatch {
    provenance: Provenance,
    records: BatchRecords,
}

impl ScoreBatch {
    /// Scores produced by this crate's engine.
    pub fn engine(scores: Vec<CandidateScore>) -> Self {
        Self {
            provenance: Provenance::Engine,
            records: BatchRecords::Scored(scores),
        }
    }

    /// Records in an upstream shape, normalized on aggregation.
    pub fn upstream(provenance: Provenance, records: Vec<Value>) -> Self {
        Self {
            provenance,
            records: BatchRecords::Upstream(records),
        }
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn len(&self) -> usize {
        match &self.records {
            BatchRecords::Scored(scores) => scores.len(),
            BatchRecords::Upstream(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    /// 1-based position.
    pub rank: usize,
    pub score: CandidateScore,
    pub provenance: Provenance,
    /// Total as stated by the source, when it differed from the recomputed sum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_total: Option<f64>,
}

/// A record skipped during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Omission {
    pub batch: usize,
    pub index: usize,
    pub provenance: Provenance,
    #[serde(flatten)]
    pub reason: OmissionReason,
}

/// Canonical ordered ranking. Built once by [`RankAggregator`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    entries: Vec<RankedEntry>,
    omissions: Vec<Omission>,
    considered: usize,
}

impl RankedResult {
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn omissions(&self) -> &[Omission] {
        &self.omissions
    }

    /// Number of valid candidates sorted before truncation.
    pub fn considered(&self) -> usize {
        self.considered
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedEntry> {
        self.entries.iter()
    }

    /// Entry whose display name matches `name` exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&RankedEntry> {
        self.entries.iter().find(|entry| entry.score.name == name)
    }
}

/// Total descending, then each sub-score in priority order descending, then name ascending.
pub fn ranking_order(left: &CandidateScore, right: &CandidateScore) -> Ordering {
    right
        .total()
        .cmp(&left.total())
        .then_with(|| {
            ScoreCategory::ordered()
                .into_iter()
                .map(|category| right.scores().get(category).cmp(&left.scores().get(category)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| left.name.cmp(&right.name))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RankAggregator;

impl RankAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Rank engine-produced scores.
    pub fn rank(&self, scores: Vec<CandidateScore>, limit: Option<usize>) -> RankedResult {
        self.aggregate(vec![ScoreBatch::engine(scores)], limit)
    }

    /// Normalize every batch, sort the combined set, then truncate to `limit`.
    pub fn aggregate(&self, batches: Vec<ScoreBatch>, limit: Option<usize>) -> RankedResult {
        let mut pending: Vec<(CandidateScore, Provenance, Option<f64>)> = Vec::new();
        let mut omissions = Vec::new();

        for (batch_index, batch) in batches.into_iter().enumerate() {
            let ScoreBatch {
                provenance,
                records,
            } = batch;
            match records {
                BatchRecords::Scored(scores) => {
                    pending.extend(
                        scores
                            .into_iter()
                            .map(|score| (score, provenance.clone(), None)),
                    );
                }
                BatchRecords::Upstream(records) => {
                    for (index, record) in records.iter().enumerate() {
                        match normalizer::normalize(record) {
                            Ok(normalized) => {
                                let drift = normalized.reported_total.filter(|reported| {
                                    (reported - normalized.score.total().as_f64()).abs()
                                        > DRIFT_TOLERANCE
                                });
                                if let Some(reported) = drift {
                                    warn!(
                                        candidate = %normalized.score.name,
                                        reported,
                                        recomputed = %normalized.score.total(),
                                        "upstream total disagrees with its sub-scores"
                                    );
                                }
                                pending.push((normalized.score, provenance.clone(), drift));
                            }
                            Err(reason) => {
                                warn!(batch = batch_index, index, %reason, "skipping malformed record");
                                omissions.push(Omission {
                                    batch: batch_index,
                                    index,
                                    provenance: provenance.clone(),
                                    reason,
                                });
                            }
                        }
                    }
                }
            }
        }

        pending.sort_by(|left, right| ranking_order(&left.0, &right.0));
        let considered = pending.len();
        if let Some(limit) = limit {
            pending.truncate(limit);
        }

        let entries: Vec<RankedEntry> = pending
            .into_iter()
            .enumerate()
            .map(|(position, (score, provenance, reported_total))| RankedEntry {
                rank: position + 1,
                score,
                provenance,
                reported_total,
            })
            .collect();

        info!(
            ranked = entries.len(),
            considered,
            omitted = omissions.len(),
            top_total = %entries.first().map(|entry| entry.score.total()).unwrap_or(Points::ZERO),
            "ranking aggregated"
        );

        RankedResult {
            entries,
            omissions,
            considered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::domain::SubScores;
    use serde_json::json;

    fn score(name: &str, values: [u32; 5]) -> CandidateScore {
        let scores = ScoreCategory::ordered()
            .into_iter()
            .zip(values)
            .fold(SubScores::default(), |acc, (category, value)| {
                acc.with(category, Points::whole(value))
            });
        CandidateScore::new(name, name, scores, "", Vec::new(), Value::Null)
    }

    #[test]
    fn tie_breaks_by_priority_then_name() {
        let aggregator = RankAggregator::new();
        let result = aggregator.rank(
            vec![
                score("Zed", [30, 20, 10, 6, 6]),
                score("Bea", [30, 22, 8, 6, 6]),
                score("Ali", [30, 20, 10, 6, 6]),
                score("Top", [35, 25, 20, 10, 10]),
            ],
            None,
        );

        let names: Vec<&str> = result.iter().map(|entry| entry.score.name.as_str()).collect();
        assert_eq!(names, vec!["Top", "Bea", "Ali", "Zed"]);
        assert_eq!(result.entries()[3].rank, 4);
    }

    #[test]
    fn truncates_after_sorting_all_batches() {
        let aggregator = RankAggregator::new();
        let engine = ScoreBatch::engine(vec![
            score("Low A", [5, 5, 5, 5, 5]),
            score("Low B", [4, 4, 4, 4, 4]),
        ]);
        let legacy = ScoreBatch::upstream(
            Provenance::Legacy,
            vec![
                json!({"name": "High", "scores": {"experience_quality": 35, "technical_skills": 25}}),
                json!({"name": "Mid", "scores": {"experience_quality": 20}}),
            ],
        );

        let result = aggregator.aggregate(vec![engine, legacy], Some(2));
        let names: Vec<&str> = result.iter().map(|entry| entry.score.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Low A"]);
        assert_eq!(result.considered(), 4);
        assert_eq!(result.entries()[0].provenance, Provenance::Legacy);
    }

    #[test]
    fn malformed_records_become_omissions() {
        let batch = ScoreBatch::upstream(
            Provenance::Imported("ats-export".to_string()),
            vec![
                json!("not a record"),
                json!({"candidate_name": "Kept", "total_score": 99, "scores": {"projects_impact": 12}}),
            ],
        );
        let result = RankAggregator::new().aggregate(vec![batch], None);

        assert_eq!(result.len(), 1);
        assert_eq!(result.entries()[0].reported_total, Some(99.0));
        assert_eq!(result.omissions().len(), 1);
        assert_eq!(result.omissions()[0].index, 0);
        assert_eq!(result.omissions()[0].reason, OmissionReason::NotAnObject);
    }

    #[test]
    fn different_naming_conventions_resolve_to_names() {
        let modern = ScoreBatch::upstream(
            Provenance::Engine,
            vec![json!({"candidate_name": "Amina Idrissi", "total_score": 10, "scores": {"signal_consistency": 10}})],
        );
        let legacy = ScoreBatch::upstream(
            Provenance::Legacy,
            vec![json!({"score": 9, "breakdown": {"signal_consistency": 9}, "raw": {"personal_info": {"full_name": "Omar Alaoui"}}})],
        );

        let result = RankAggregator::new().aggregate(vec![modern, legacy], None);
        assert!(result.find_by_name("Amina Idrissi").is_some());
        assert!(result.find_by_name("Omar Alaoui").is_some());
        assert!(result.find_by_name(UNKNOWN_CANDIDATE).is_none());
    }
}
