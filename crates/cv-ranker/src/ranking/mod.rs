//! Candidate ranking core: requirement extraction, scoring, aggregation and fairness audit.
//!
//! Data flows `RequirementExtractor -> ScoringEngine -> RankAggregator -> FairnessAuditor`.
//! Every stage is a pure function of its explicit inputs; the only suspension points are the
//! two bounded completion calls (enrichment and audit).

pub mod aggregate;
pub mod audit;
mod candidate;
pub mod completion;
pub mod domain;
pub mod requirement;
pub mod scoring;
pub mod session;
pub mod source;
mod vocabulary;

#[cfg(test)]
mod tests;

pub use aggregate::{
    ranking_order, Omission, OmissionReason, RankAggregator, RankedEntry, RankedResult, ScoreBatch,
    UNKNOWN_CANDIDATE,
};
pub use audit::{
    Adjustment, AuditOutcome, AuditReport, AuditUnavailable, CandidateAdjustment, FairnessAuditor,
    Issue, IssueKind, Severity,
};
pub use completion::{
    extract_json_object, CompletionClient, CompletionError, CompletionRequest, GenerationOptions,
    OllamaClient,
};
pub use domain::{
    CandidateRecord, CandidateScore, Points, Provenance, ScoreCategory, ScoreComponent, SubScores,
};
pub use requirement::{
    EnrichmentStatus, EnrichmentUnavailable, Extraction, JobRequirement, RequirementExtractor,
};
pub use scoring::ScoringEngine;
pub use session::{RankingSession, SessionError, SessionState};
pub use source::{CvSource, LoadedRecords, SkippedRecord, SourceError};

/// Caller mistakes reported before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("a job title or description is required")]
    MissingJobText,
    #[error("at least one candidate record is required")]
    EmptyBatch,
}
