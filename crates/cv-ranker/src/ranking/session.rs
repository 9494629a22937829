use std::fmt;

use serde::Serialize;

use super::aggregate::{RankAggregator, RankedResult};
use super::audit::{AuditOutcome, AuditReport, FairnessAuditor};
use super::domain::CandidateRecord;
use super::requirement::{Extraction, JobRequirement};
use super::scoring::ScoringEngine;
use super::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Draft,
    Scored,
    Audited,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Draft => "draft",
            SessionState::Scored => "scored",
            SessionState::Audited => "audited",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} a ranking session in state '{state}'")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
    #[error(transparent)]
    Input(#[from] InputError),
}

#[derive(Debug, Clone)]
enum Stage {
    Draft,
    Scored(RankedResult),
    Audited(RankedResult, Vec<AuditOutcome>),
}

/// One job's pass through extraction, scoring and any number of audits.
///
/// `Draft -> Scored -> Audited`, where `Audited` can be re-entered by further audits. The
/// ranking is fixed once scored; audits only append outcomes.
#[derive(Debug, Clone)]
pub struct RankingSession {
    extraction: Extraction,
    stage: Stage,
}

impl RankingSession {
    pub fn new(extraction: Extraction) -> Self {
        Self {
            extraction,
            stage: Stage::Draft,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.stage {
            Stage::Draft => SessionState::Draft,
            Stage::Scored(_) => SessionState::Scored,
            Stage::Audited(..) => SessionState::Audited,
        }
    }

    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    pub fn requirement(&self) -> &JobRequirement {
        &self.extraction.requirement
    }

    pub fn ranking(&self) -> Option<&RankedResult> {
        match &self.stage {
            Stage::Draft => None,
            Stage::Scored(ranking) | Stage::Audited(ranking, _) => Some(ranking),
        }
    }

    pub fn audits(&self) -> &[AuditOutcome] {
        match &self.stage {
            Stage::Audited(_, audits) => audits,
            _ => &[],
        }
    }

    /// Most recent audit that produced a report.
    pub fn latest_report(&self) -> Option<&AuditReport> {
        self.audits().iter().rev().find_map(AuditOutcome::report)
    }

    /// Score `candidates` and fix the ranking. Only valid from `Draft`.
    pub fn score(
        &mut self,
        engine: &ScoringEngine,
        aggregator: &RankAggregator,
        candidates: &[CandidateRecord],
        limit: Option<usize>,
    ) -> Result<&RankedResult, SessionError> {
        self.ensure(SessionState::Draft, "score")?;
        let scores = engine.score_batch(candidates, &self.extraction.requirement)?;
        let ranking = aggregator.rank(scores, limit);
        self.enter_scored(ranking)
    }

    /// Adopt a ranking produced elsewhere, e.g. from aggregated upstream batches.
    pub fn attach_ranking(&mut self, ranking: RankedResult) -> Result<&RankedResult, SessionError> {
        self.ensure(SessionState::Draft, "attach a ranking to")?;
        self.enter_scored(ranking)
    }

    /// Run one audit pass and record its outcome, whatever it is.
    ///
    /// The session is only updated after the call completes, so a dropped future leaves it
    /// exactly as it was.
    pub async fn audit(&mut self, auditor: &FairnessAuditor) -> Result<&AuditOutcome, SessionError> {
        let ranking = match &self.stage {
            Stage::Scored(ranking) | Stage::Audited(ranking, _) => ranking,
            Stage::Draft => {
                return Err(SessionError::InvalidTransition {
                    state: SessionState::Draft,
                    action: "audit",
                })
            }
        };

        let outcome = auditor.audit(ranking, &self.extraction.requirement).await;
        self.record_audit(outcome)
    }

    /// Attach an outcome obtained outside the session.
    pub fn record_audit(&mut self, outcome: AuditOutcome) -> Result<&AuditOutcome, SessionError> {
        self.stage = match std::mem::replace(&mut self.stage, Stage::Draft) {
            Stage::Draft => {
                return Err(SessionError::InvalidTransition {
                    state: SessionState::Draft,
                    action: "audit",
                })
            }
            Stage::Scored(ranking) => Stage::Audited(ranking, vec![outcome]),
            Stage::Audited(ranking, mut audits) => {
                audits.push(outcome);
                Stage::Audited(ranking, audits)
            }
        };
        self.audits().last().ok_or(SessionError::InvalidTransition {
            state: SessionState::Audited,
            action: "audit",
        })
    }

    fn ensure(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { state, action })
        }
    }

    fn enter_scored(&mut self, ranking: RankedResult) -> Result<&RankedResult, SessionError> {
        self.stage = Stage::Scored(ranking);
        self.ranking().ok_or(SessionError::InvalidTransition {
            state: SessionState::Draft,
            action: "score",
        })
    }
}
