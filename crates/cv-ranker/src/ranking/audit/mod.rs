//! Advisory fairness audit of a finished ranking.
//!
//! The auditor asks an external critic to judge a [`RankedResult`] and validates the reply into
//! an [`AuditReport`]. Nothing here mutates the ranking; proposed adjustments are clamped to
//! their category caps and left for a separate apply step.

mod prompt;
mod verdict;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::aggregate::RankedResult;
use super::completion::{CompletionClient, CompletionRequest, GenerationOptions};
use super::requirement::JobRequirement;
use crate::config::CompletionConfig;

pub use verdict::{Adjustment, AuditReport, CandidateAdjustment, Issue, IssueKind, Severity};

/// The critic could not be consulted.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AuditUnavailable {
    #[error("audit timed out")]
    Timeout,
    #[error("audit transport failed: {0}")]
    Transport(String),
    #[error("ranking has no entries to audit")]
    EmptyRanking,
    #[error("could not encode audit request: {0}")]
    Encoding(String),
}

/// Result of one audit pass. Only `Report` is a verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuditOutcome {
    Report(AuditReport),
    /// The critic answered but the answer could not be validated.
    Unparsed { raw: String, reason: String },
    Failed(AuditUnavailable),
}

impl AuditOutcome {
    pub fn report(&self) -> Option<&AuditReport> {
        match self {
            AuditOutcome::Report(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_report(&self) -> bool {
        matches!(self, AuditOutcome::Report(_))
    }
}

/// Stateless; each call produces an independent outcome.
#[derive(Clone)]
pub struct FairnessAuditor {
    client: Arc<dyn CompletionClient>,
    config: CompletionConfig,
}

impl FairnessAuditor {
    pub fn new(client: Arc<dyn CompletionClient>, config: CompletionConfig) -> Self {
        Self { client, config }
    }

    pub async fn audit(&self, ranking: &RankedResult, requirement: &JobRequirement) -> AuditOutcome {
        if ranking.is_empty() {
            return AuditOutcome::Failed(AuditUnavailable::EmptyRanking);
        }

        let prompt = match prompt::build(ranking, requirement) {
            Ok(prompt) => prompt,
            Err(err) => return AuditOutcome::Failed(AuditUnavailable::Encoding(err.to_string())),
        };
        let request = CompletionRequest::new(
            self.config.audit_model.clone(),
            prompt,
            GenerationOptions {
                temperature: self.config.temperature,
                max_tokens: self.config.audit_max_tokens,
            },
        );

        let reply = match tokio::time::timeout(self.config.audit_timeout, self.client.complete(&request)).await {
            Err(_) => {
                warn!(timeout_secs = self.config.audit_timeout.as_secs(), "audit timed out");
                return AuditOutcome::Failed(AuditUnavailable::Timeout);
            }
            Ok(Err(err)) => {
                warn!(error = %err, "audit call failed");
                return AuditOutcome::Failed(AuditUnavailable::Transport(err.to_string()));
            }
            Ok(Ok(reply)) => reply,
        };

        match verdict::parse(&reply, ranking) {
            Ok(report) => {
                info!(
                    correct = report.is_correct,
                    fair = report.is_fair,
                    square = report.is_square,
                    issues = report.issues.len(),
                    adjustments = report.adjustments.len(),
                    dropped_issues = report.dropped_issues,
                    dropped_adjustments = report.dropped_adjustments,
                    "audit completed"
                );
                AuditOutcome::Report(report)
            }
            Err(err) => {
                warn!(reason = %err, "audit reply could not be validated");
                AuditOutcome::Unparsed {
                    raw: reply,
                    reason: err.to_string(),
                }
            }
        }
    }
}
